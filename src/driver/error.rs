// ABOUTME: Error types for GSM driver operations, wrapping channel and codec failures unchanged
// ABOUTME: PartialSend carries the references already obtained when a multi-part send fails

use crate::channel::ChannelError;
use crate::pdu::PduError;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GsmError {
    /// `+GCAP` did not list `+CGSM`
    #[error("modem is not GSM capable")]
    NotCapable,

    /// The operation needs the other message mode
    #[error("modem is in the wrong mode")]
    WrongMode,

    /// The message needs more than one PDU
    #[error("message too long for one SMS")]
    Overlength,

    /// An indication had too few lines to hold a PDU
    #[error("insufficient info")]
    Underlength,

    /// No `+CMGS` line in the response
    #[error("modem returned malformed response")]
    MalformedResponse,

    #[error("length mismatch - expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid length field: {0}")]
    InvalidLength(#[from] ParseIntError),

    #[error(transparent)]
    Pdu(#[from] PduError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub type GsmResult<T> = Result<T, GsmError>;

/// A long message send that failed part way
///
/// `references` holds the message references of the parts the modem
/// accepted before `error`, in send order.
#[derive(Debug, Error)]
#[error("sent {} part(s) before failing: {error}", .references.len())]
pub struct PartialSend {
    pub references: Vec<String>,
    #[source]
    pub error: GsmError,
}

impl From<GsmError> for PartialSend {
    fn from(error: GsmError) -> Self {
        Self {
            references: Vec::new(),
            error,
        }
    }
}

impl From<PduError> for PartialSend {
    fn from(error: PduError) -> Self {
        GsmError::from(error).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_display() {
        let err = GsmError::LengthMismatch {
            expected: 22,
            actual: 23,
        };
        assert_eq!(err.to_string(), "length mismatch - expected 22, got 23");
    }

    #[test]
    fn test_wrapped_errors_are_transparent() {
        let err = GsmError::from(ChannelError::Cms("500".into()));
        assert_eq!(err.to_string(), "CMS error: 500");
        assert!(matches!(err, GsmError::Channel(ChannelError::Cms(_))));
    }

    #[test]
    fn test_partial_send_display() {
        let err = PartialSend {
            references: vec!["1".into(), "2".into()],
            error: GsmError::MalformedResponse,
        };
        assert_eq!(
            err.to_string(),
            "sent 2 part(s) before failing: modem returned malformed response"
        );
    }
}
