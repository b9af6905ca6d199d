// ABOUTME: Loopback example sending an SMS through an in-memory modem that delivers it straight back
// ABOUTME: Shows driver initialisation, long message sending and reception without any hardware

//! # Loopback modem
//!
//! The in-memory channel answers `+GCAP` as a GSM modem, acknowledges every
//! `+CMGS` and turns each submitted TPDU into a `+CMT` indication from the
//! destination number, so everything sent is received again.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example loopback -- --message "Hello from the loopback modem"
//!
//! # Long messages are split and reassembled
//! cargo run --example loopback -- -d --repeat 5
//! ```

use argh::FromArgs;
use gsm_modem::channel::{
    AtChannel, ChannelError, ChannelResult, CommandOptions, IndicationOptions, InitOptions,
};
use gsm_modem::driver::{CMT_PREFIX, Gsm, GsmConfig, RxEvent};
use gsm_modem::pdu::{MessageType, PduError, PduMode, Tpdu};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Send an SMS through a loopback modem and receive it again
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the recipient telephone number (default: +61409894000)
    #[argh(option, short = 't')]
    to: Option<String>,

    /// the message text (default: "Hello World")
    #[argh(option, short = 'm')]
    message: Option<String>,

    /// how many times to repeat the message text (default: 1)
    #[argh(option)]
    repeat: Option<usize>,
}

/// An AT channel with a modem that delivers every submit back to itself
#[derive(Debug, Default)]
struct LoopbackChannel {
    indications: Mutex<HashMap<String, mpsc::UnboundedSender<Vec<String>>>>,
    next_reference: Mutex<u8>,
}

impl LoopbackChannel {
    fn deliver(&self, body: &str) -> ChannelResult<()> {
        let invalid = |e: PduError| ChannelError::Cms(format!("invalid PDU: {e}"));
        let pdu = PduMode::unmarshal_hex_string(body).map_err(invalid)?;
        let mut tpdu = Tpdu::unmarshal_binary(&pdu.tpdu).map_err(invalid)?;
        // the destination becomes the originator of the delivered copy
        tpdu.message_type = MessageType::Deliver;
        let bytes = tpdu.marshal_binary().map_err(invalid)?;
        let hex = PduMode::new(None, bytes.clone())
            .marshal_hex_string()
            .map_err(invalid)?;

        let indications = self.indications.lock().map_err(|_| ChannelError::Closed)?;
        if let Some(tx) = indications.get(CMT_PREFIX) {
            debug!(length = bytes.len(), "Delivering +CMT");
            tx.send(vec![format!("+CMT: ,{}", bytes.len()), hex])
                .map_err(|_| ChannelError::Closed)?;
        }
        Ok(())
    }
}

impl AtChannel for LoopbackChannel {
    async fn init(&self, options: &InitOptions) -> ChannelResult<()> {
        debug!(?options, "AT init");
        Ok(())
    }

    async fn command(&self, cmd: &str, _options: &CommandOptions) -> ChannelResult<Vec<String>> {
        debug!("-> AT{cmd}");
        match cmd {
            "+GCAP" => Ok(vec!["+GCAP: +CGSM,+DS,+ES".to_string()]),
            _ => Ok(Vec::new()),
        }
    }

    async fn sms_command(
        &self,
        cmd: &str,
        body: &str,
        _options: &CommandOptions,
    ) -> ChannelResult<Vec<String>> {
        debug!("-> AT{cmd}\n{body}");
        self.deliver(body)?;
        let mut reference = self.next_reference.lock().map_err(|_| ChannelError::Closed)?;
        *reference = reference.wrapping_add(1);
        Ok(vec![format!("+CMGS: {reference}")])
    }

    fn add_indication(
        &self,
        prefix: &str,
        _options: IndicationOptions,
    ) -> ChannelResult<mpsc::UnboundedReceiver<Vec<String>>> {
        let mut indications = self.indications.lock().map_err(|_| ChannelError::Closed)?;
        if indications.contains_key(prefix) {
            return Err(ChannelError::IndicationExists(prefix.to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        indications.insert(prefix.to_string(), tx);
        Ok(rx)
    }

    fn cancel_indication(&self, prefix: &str) {
        if let Ok(mut indications) = self.indications.lock() {
            indications.remove(prefix);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let to = cli_args.to.unwrap_or_else(|| "+61409894000".to_owned());
    let text = cli_args
        .message
        .unwrap_or_else(|| "Hello World".to_owned())
        .repeat(cli_args.repeat.unwrap_or(1).max(1));

    let gsm = Gsm::with_config(LoopbackChannel::default(), GsmConfig::new());
    gsm.init(&InitOptions::default()).await?;
    let mut rx = gsm.start_message_rx().await?;

    let references = gsm
        .send_long_message(&to, &text, &CommandOptions::default())
        .await?;
    info!("Sent {} part(s), references {:?}", references.len(), references);

    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(RxEvent::Message(message))) => {
            info!("Received from {}: {}", message.number, message.text)
        }
        Ok(Some(RxEvent::Error(e))) => error!("Receive error: {e}"),
        Ok(None) => error!("Receive queues closed"),
        Err(_) => error!("Timed out waiting for the message"),
    }

    gsm.stop_message_rx().await;
    Ok(())
}
