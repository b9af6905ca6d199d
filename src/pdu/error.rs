// ABOUTME: Error types for the SMS PDU codec covering marshalling, alphabets and reassembly
// ABOUTME: Gives each codec failure a distinct variant so callers can tell wire errors from user errors

use thiserror::Error;

/// Errors raised while encoding, decoding or reassembling SMS PDUs
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PduError {
    /// Source ran out of octets while decoding the named field
    #[error("Underflow decoding {0}")]
    Underflow(&'static str),

    /// Hex string contains a non-hex character
    #[error("Invalid hex character {0:?}")]
    InvalidHex(char),

    /// Hex string has an odd number of digits
    #[error("Invalid hex string length: {0}")]
    OddHexLength(usize),

    /// Address contains a character that cannot be semi-octet encoded
    #[error("Invalid address digit: {0:?}")]
    InvalidAddressDigit(char),

    /// Address has more digits than an address field can carry
    #[error("Address too long: {0} digits, maximum is 20")]
    AddressTooLong(usize),

    /// Type of number bits that do not map to a known value
    #[error("Invalid type of number: {0:#x}")]
    InvalidTypeOfNumber(u8),

    /// Only SMS-SUBMIT and SMS-DELIVER are supported
    #[error("Unsupported message type indicator: {0:#04b}")]
    UnsupportedMessageType(u8),

    /// Character is outside the GSM 7-bit default alphabet and its extension
    #[error("Character {0:?} cannot be encoded in the GSM 7-bit alphabet")]
    UnencodableCharacter(char),

    #[error("Invalid UCS-2 user data")]
    InvalidUcs2,

    /// User data header is truncated or inconsistent with the user data length
    #[error("Invalid user data header: {0}")]
    InvalidUserDataHeader(&'static str),

    /// User data exceeds what fits in a single TPDU
    #[error("User data too long: {length} exceeds {max}")]
    UserDataTooLong { length: usize, max: usize },

    /// Message would need more than 255 concatenated segments
    #[error("Message requires {0} segments, maximum is 255")]
    TooManySegments(usize),

    /// Concatenation header carries a sequence number outside 1..=total
    #[error("Invalid segment {sequence} of {total}")]
    InvalidSegment { sequence: u8, total: u8 },

    /// Segment already received for this concatenated message
    #[error("Duplicate segment {sequence} for reference {reference}")]
    DuplicateSegment { reference: u16, sequence: u8 },

    /// Pending concatenated message evicted before all segments arrived
    #[error("Reassembly timed out for reference {reference}: {received} of {total} segments")]
    ReassemblyTimeout {
        reference: u16,
        received: usize,
        total: u8,
    },
}

/// Result type alias for PDU codec operations
pub type PduResult<T> = Result<T, PduError>;
