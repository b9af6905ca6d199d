// ABOUTME: The GSM driver: capability negotiation and outbound SMS over an AT channel
// ABOUTME: Sends single PDUs, text mode messages and concatenated multi-part messages

use crate::channel::{AtChannel, CommandOptions, InitOptions};
use crate::driver::config::{GsmConfig, Mode};
use crate::driver::error::{GsmError, GsmResult, PartialSend};
use crate::driver::response::{parse_capabilities, parse_message_reference};
use crate::pdu::{Encoder, EncoderOption, PduMode, Tpdu};
use std::sync::Arc;
use tracing::{debug, info};

/// A GSM modem driven over an AT channel
///
/// All operations take `&self`; the channel is shared with the receive task
/// started by [`Gsm::start_message_rx`].
#[derive(Debug)]
pub struct Gsm<C> {
    pub(crate) channel: Arc<C>,
    pub(crate) config: GsmConfig,
    encoder: Encoder,
}

impl<C: AtChannel> Gsm<C> {
    /// Creates a driver in PDU mode with default settings
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, GsmConfig::default())
    }

    pub fn with_config(channel: C, config: GsmConfig) -> Self {
        Self::from_shared(Arc::new(channel), config)
    }

    /// Creates a driver over a channel that is also used elsewhere
    pub fn from_shared(channel: Arc<C>, config: GsmConfig) -> Self {
        Self {
            channel,
            config,
            encoder: Encoder::new(),
        }
    }

    pub fn config(&self) -> &GsmConfig {
        &self.config
    }

    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    /// Initialises the channel, checks the modem speaks the GSM command set
    /// and selects the configured message mode with verbose errors
    ///
    /// The first failing step aborts with its error. Safe to call again,
    /// which repeats every step.
    pub async fn init(&self, options: &InitOptions) -> GsmResult<()> {
        self.channel.init(options).await?;

        let defaults = CommandOptions::default();
        let lines = self.channel.command("+GCAP", &defaults).await?;
        let capabilities = parse_capabilities(&lines);
        debug!(?capabilities, "Modem capabilities");
        if !capabilities.iter().any(|cap| cap == "+CGSM") {
            return Err(GsmError::NotCapable);
        }

        let cmgf = match self.config.mode() {
            Mode::Pdu => "+CMGF=0",
            Mode::Text => "+CMGF=1",
        };
        for cmd in [cmgf, "+CMEE=2"] {
            self.channel.command(cmd, &defaults).await?;
        }
        info!(mode = ?self.config.mode(), "GSM modem initialised");
        Ok(())
    }

    /// Sends `text` to `number` as a single SMS, returning the message reference
    ///
    /// In PDU mode the text must fit one PDU, otherwise [`GsmError::Overlength`]
    /// is returned and nothing is sent. In text mode the text is handed to the
    /// modem as is.
    pub async fn send_short_message(
        &self,
        number: &str,
        text: &str,
        options: &CommandOptions,
    ) -> GsmResult<String> {
        match self.config.mode() {
            Mode::Pdu => {
                let tpdus = self.encode(number, text)?;
                let [tpdu] = tpdus.as_slice() else {
                    return Err(GsmError::Overlength);
                };
                self.send_pdu(&tpdu.marshal_binary()?, options).await
            }
            Mode::Text => {
                let cmd = format!("+CMGS=\"{number}\"");
                debug!(number, "Sending text mode SMS");
                let lines = self.channel.sms_command(&cmd, text, options).await?;
                parse_message_reference(&lines)
            }
        }
    }

    /// Sends `text` to `number`, split into as many concatenated PDUs as needed
    ///
    /// Parts are sent one after another, each waiting for the previous
    /// acknowledgment. Returns the message reference of every part in order;
    /// on failure the references of the parts already sent are kept in the
    /// [`PartialSend`].
    pub async fn send_long_message(
        &self,
        number: &str,
        text: &str,
        options: &CommandOptions,
    ) -> Result<Vec<String>, PartialSend> {
        if self.config.mode() != Mode::Pdu {
            return Err(GsmError::WrongMode.into());
        }
        let tpdus = self.encode(number, text)?;
        let total = tpdus.len();
        let mut references = Vec::with_capacity(total);
        for (i, tpdu) in tpdus.iter().enumerate() {
            debug!(part = i + 1, total, "Sending SMS part");
            let sent = match tpdu.marshal_binary() {
                Ok(bytes) => self.send_pdu(&bytes, options).await,
                Err(e) => Err(e.into()),
            };
            match sent {
                Ok(reference) => references.push(reference),
                Err(error) => return Err(PartialSend { references, error }),
            }
        }
        Ok(references)
    }

    /// Sends a binary TPDU, returning the message reference
    ///
    /// The TPDU is prefixed with the configured SMSC address, or the SIM
    /// default when none is set.
    pub async fn send_pdu(&self, tpdu: &[u8], options: &CommandOptions) -> GsmResult<String> {
        if self.config.mode() != Mode::Pdu {
            return Err(GsmError::WrongMode);
        }
        let pdu = PduMode::new(self.config.sca().cloned(), tpdu.to_vec());
        let hex = pdu.marshal_hex_string()?;
        let cmd = format!("+CMGS={}", tpdu.len());
        debug!(length = tpdu.len(), "Sending PDU");
        let lines = self.channel.sms_command(&cmd, &hex, options).await?;
        parse_message_reference(&lines)
    }

    fn encode(&self, number: &str, text: &str) -> GsmResult<Vec<Tpdu>> {
        let mut options = self.config.encoder_options().to_vec();
        options.push(EncoderOption::To(number.to_string()));
        Ok(self.encoder.encode(text, &options)?)
    }
}
