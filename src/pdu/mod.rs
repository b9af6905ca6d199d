// ABOUTME: GSM 03.40 SMS codec: TPDUs, addresses, alphabets, user data headers and PDU mode framing
// ABOUTME: Also splits text into concatenated segments and reassembles inbound segments

//! SMS PDU codec
//!
//! * [`Tpdu`] - SMS-SUBMIT and SMS-DELIVER transfer protocol data units
//! * [`PduMode`] - a TPDU with its SMSC address, as exchanged with the modem in hex
//! * [`Encoder`] / [`decode`] - text to TPDUs and back, with concatenation
//! * [`Collector`] - reassembly of concatenated messages arriving out of order
//!
//! ```rust
//! use gsm_modem::pdu::{Collector, EncoderOption, Tpdu, decode, encode};
//!
//! let tpdus = encode("Hello!", &[EncoderOption::From("+1555123".into())]).unwrap();
//! let wire = tpdus[0].marshal_binary().unwrap();
//!
//! let mut collector = Collector::new();
//! let parts = collector.collect(Tpdu::unmarshal_binary(&wire).unwrap()).unwrap().unwrap();
//! assert_eq!(decode(&parts).unwrap(), "Hello!");
//! ```

mod address;
mod alphabet;
mod collector;
mod decoder;
mod encoder;
mod error;
pub mod gsm7;
mod pdumode;
mod tpdu;
mod udh;

pub use address::{Address, MAX_ADDRESS_DIGITS, NumberingPlan, TypeOfNumber};
pub use alphabet::{Alphabet, encode_ucs2, ucs2_units};
pub use collector::{Collector, ReassemblyKey};
pub use decoder::decode;
pub use encoder::{Encoder, EncoderOption, MAX_SEGMENTS, encode};
pub use error::{PduError, PduResult};
pub use pdumode::{PduMode, decode_hex, encode_hex};
pub use tpdu::{MAX_UD_OCTETS, MAX_UD_SEPTETS, MessageType, Timestamp, Tpdu, ValidityPeriod};
pub use udh::{ConcatInfo, IEI_CONCAT_8BIT, IEI_CONCAT_16BIT, InformationElement, UserDataHeader};

pub(crate) fn take_u8(buf: &mut &[u8], field: &'static str) -> PduResult<u8> {
    let (&first, rest) = buf.split_first().ok_or(PduError::Underflow(field))?;
    *buf = rest;
    Ok(first)
}

pub(crate) fn take_slice<'a>(
    buf: &mut &'a [u8],
    len: usize,
    field: &'static str,
) -> PduResult<&'a [u8]> {
    if buf.len() < len {
        return Err(PduError::Underflow(field));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_helpers() {
        let data = [1u8, 2, 3];
        let mut buf = &data[..];
        assert_eq!(take_u8(&mut buf, "a").unwrap(), 1);
        assert_eq!(take_slice(&mut buf, 2, "b").unwrap(), &[2, 3]);
        assert_eq!(take_u8(&mut buf, "c"), Err(PduError::Underflow("c")));
        assert_eq!(take_slice(&mut buf, 1, "d"), Err(PduError::Underflow("d")));
    }
}
