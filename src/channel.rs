// ABOUTME: The AT command channel the GSM driver is layered on, expressed as a trait
// ABOUTME: Covers commands, prompted SMS commands and unsolicited indication registration

//! AT command channel
//!
//! The driver never touches a serial port. It issues commands through an
//! [`AtChannel`] implementation, which owns framing, response collection,
//! timeouts and the routing of unsolicited result codes.
//!
//! Commands are passed without the leading `AT`, so `"+CMGF=0"` is sent as
//! `AT+CMGF=0`. A successful command resolves to the information lines
//! returned before the final `OK`.

use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by an AT channel
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No final result code arrived in time
    #[error("command timed out")]
    Timeout,

    /// The modem returned a bare `ERROR`
    #[error("modem returned ERROR")]
    Error,

    /// The modem returned `+CME ERROR: <err>`
    #[error("CME error: {0}")]
    Cme(String),

    /// The modem returned `+CMS ERROR: <err>`
    #[error("CMS error: {0}")]
    Cms(String),

    #[error("channel closed")]
    Closed,

    /// An indication with this prefix is already registered
    #[error("indication already registered: {0}")]
    IndicationExists(String),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Per-command options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Overrides the channel's default command timeout
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for channel initialisation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Replaces the channel's default initialisation commands
    pub commands: Option<Vec<String>>,
    pub timeout: Option<Duration>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = Some(commands.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for an indication registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicationOptions {
    /// Lines following the prefixed line that belong to the same indication
    pub trailing_lines: usize,
}

impl IndicationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trailing_lines(mut self, lines: usize) -> Self {
        self.trailing_lines = lines;
        self
    }
}

/// An AT command channel to a modem
///
/// Implementations must be safe to share between the task issuing commands
/// and the task servicing indications; correlation of responses to commands
/// is the implementation's concern.
pub trait AtChannel: Send + Sync + 'static {
    /// Brings the modem to a known state (echo off, verbose results, ...)
    fn init(&self, options: &InitOptions) -> impl Future<Output = ChannelResult<()>> + Send;

    /// Issues a single command and returns its information lines
    fn command(
        &self,
        cmd: &str,
        options: &CommandOptions,
    ) -> impl Future<Output = ChannelResult<Vec<String>>> + Send;

    /// Issues a command that prompts for a body, such as `+CMGS`, then sends
    /// `body` terminated with Ctrl-Z
    fn sms_command(
        &self,
        cmd: &str,
        body: &str,
        options: &CommandOptions,
    ) -> impl Future<Output = ChannelResult<Vec<String>>> + Send;

    /// Routes unsolicited lines starting with `prefix` to the returned queue
    ///
    /// Each item holds the prefixed line followed by its trailing lines.
    /// The queue closes when the registration is cancelled.
    fn add_indication(
        &self,
        prefix: &str,
        options: IndicationOptions,
    ) -> ChannelResult<mpsc::UnboundedReceiver<Vec<String>>>;

    /// Removes the registration for `prefix`, if any
    fn cancel_indication(&self, prefix: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_builders() {
        let options = CommandOptions::new().with_timeout(Duration::from_secs(5));
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));

        let init = InitOptions::new().with_commands(["E0", "+CMEE=2"]);
        assert_eq!(init.commands, Some(vec!["E0".to_string(), "+CMEE=2".to_string()]));
        assert_eq!(init.timeout, None);

        assert_eq!(IndicationOptions::new().with_trailing_lines(1).trailing_lines, 1);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ChannelError::Cms("500".into()).to_string(), "CMS error: 500");
        assert_eq!(ChannelError::Timeout.to_string(), "command timed out");
    }
}
