// ABOUTME: Construction-time configuration for the GSM driver: message mode, SMSC override and encoder options
// ABOUTME: Built once with with_* methods and read-only once handed to the driver

use crate::pdu::{Address, EncoderOption};
use std::time::Duration;

/// Message format the modem is switched to by `+CMGF`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Binary TPDUs exchanged as hex (`+CMGF=0`)
    #[default]
    Pdu,
    /// Plain text (`+CMGF=1`); sending only, no concatenation
    Text,
}

/// Configuration for a [`Gsm`](crate::driver::Gsm) driver
///
/// # Example
///
/// ```rust
/// use gsm_modem::driver::{GsmConfig, Mode};
/// use gsm_modem::pdu::{Address, EncoderOption};
///
/// let config = GsmConfig::new()
///     .with_sca(Address::international("61409894000"))
///     .with_encoder_option(EncoderOption::StatusReportRequest);
/// assert_eq!(config.mode(), Mode::Pdu);
///
/// // Text mode has no use for an SMSC address
/// let config = config.with_text_mode();
/// assert!(config.sca().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GsmConfig {
    mode: Mode,
    sca: Option<Address>,
    encoder_options: Vec<EncoderOption>,
    report_ack_errors: bool,
    reassembly_timeout: Option<Duration>,
}

impl GsmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdu_mode(mut self) -> Self {
        self.mode = Mode::Pdu;
        self
    }

    /// Switches to text mode, dropping any SMSC address
    pub fn with_text_mode(mut self) -> Self {
        self.mode = Mode::Text;
        self.sca = None;
        self
    }

    /// Overrides the SIM's SMSC address for outbound PDUs
    ///
    /// The address only has meaning in PDU mode, so this also selects PDU mode.
    pub fn with_sca(mut self, sca: Address) -> Self {
        self.mode = Mode::Pdu;
        self.sca = Some(sca);
        self
    }

    /// Appends an option applied to every outbound encode, ahead of the destination
    pub fn with_encoder_option(mut self, option: EncoderOption) -> Self {
        self.encoder_options.push(option);
        self
    }

    /// Forward `+CNMA` failures to the receive error queue instead of only logging them
    pub fn with_ack_error_reporting(mut self, enabled: bool) -> Self {
        self.report_ack_errors = enabled;
        self
    }

    /// Evict partially received concatenated messages after `timeout`
    pub fn with_reassembly_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = Some(timeout);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sca(&self) -> Option<&Address> {
        self.sca.as_ref()
    }

    pub fn encoder_options(&self) -> &[EncoderOption] {
        &self.encoder_options
    }

    pub fn report_ack_errors(&self) -> bool {
        self.report_ack_errors
    }

    pub fn reassembly_timeout(&self) -> Option<Duration> {
        self.reassembly_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GsmConfig::new();
        assert_eq!(config.mode(), Mode::Pdu);
        assert!(config.sca().is_none());
        assert!(config.encoder_options().is_empty());
        assert!(!config.report_ack_errors());
        assert_eq!(config.reassembly_timeout(), None);
    }

    #[test]
    fn test_sca_selects_pdu_mode() {
        let config = GsmConfig::new()
            .with_text_mode()
            .with_sca(Address::international("61409894000"));
        assert_eq!(config.mode(), Mode::Pdu);
        assert_eq!(config.sca().map(|a| a.to_string()), Some("+61409894000".into()));
    }

    #[test]
    fn test_encoder_options_keep_order() {
        let config = GsmConfig::new()
            .with_encoder_option(EncoderOption::ConcatRef16)
            .with_encoder_option(EncoderOption::StatusReportRequest);
        assert_eq!(
            config.encoder_options(),
            &[EncoderOption::ConcatRef16, EncoderOption::StatusReportRequest]
        );
    }
}
