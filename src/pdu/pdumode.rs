// ABOUTME: PDU mode wire wrapper pairing a TPDU with an optional SMSC address
// ABOUTME: Marshals to and from the hex strings exchanged with the modem in AT+CMGS and +CMT

use crate::pdu::address::Address;
use crate::pdu::error::{PduError, PduResult};
use bytes::{BufMut, Bytes, BytesMut};

/// A TPDU as carried over the AT interface in PDU mode
///
/// `smsc` of `None` encodes as a zero length octet, telling the modem to use
/// the SMSC stored on the SIM.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PduMode {
    pub smsc: Option<Address>,
    pub tpdu: Bytes,
}

impl PduMode {
    pub fn new(smsc: Option<Address>, tpdu: impl Into<Bytes>) -> Self {
        Self {
            smsc,
            tpdu: tpdu.into(),
        }
    }

    pub fn marshal_binary(&self) -> PduResult<Bytes> {
        let mut buf = BytesMut::with_capacity(12 + self.tpdu.len());
        match &self.smsc {
            Some(smsc) => smsc.encode_smsc(&mut buf)?,
            None => buf.put_u8(0),
        }
        buf.put_slice(&self.tpdu);
        Ok(buf.freeze())
    }

    pub fn unmarshal_binary(src: &[u8]) -> PduResult<Self> {
        let mut buf = src;
        let smsc = Address::decode_smsc(&mut buf)?;
        Ok(Self {
            smsc,
            tpdu: Bytes::copy_from_slice(buf),
        })
    }

    pub fn marshal_hex_string(&self) -> PduResult<String> {
        Ok(encode_hex(&self.marshal_binary()?))
    }

    pub fn unmarshal_hex_string(s: &str) -> PduResult<Self> {
        Self::unmarshal_binary(&decode_hex(s)?)
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Upper-case hex, as modems emit it
pub fn encode_hex(octets: &[u8]) -> String {
    let mut s = String::with_capacity(octets.len() * 2);
    for octet in octets {
        s.push(HEX_DIGITS[(octet >> 4) as usize] as char);
        s.push(HEX_DIGITS[(octet & 0x0f) as usize] as char);
    }
    s
}

/// Decodes hex in either case; surrounding whitespace is ignored
pub fn decode_hex(s: &str) -> PduResult<Vec<u8>> {
    let s = s.trim();
    if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(PduError::InvalidHex(c));
    }
    if s.len() % 2 != 0 {
        return Err(PduError::OddHexLength(s.len()));
    }
    let nibble = |b: u8| (b as char).to_digit(16).unwrap_or(0) as u8;
    Ok(s.as_bytes()
        .chunks_exact(2)
        .map(|pair| nibble(pair[0]) << 4 | nibble(pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(encode_hex(&[0x00, 0x9f, 0xab]), "009FAB");
        assert_eq!(decode_hex("009fAB").unwrap(), vec![0x00, 0x9f, 0xab]);
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(decode_hex("0G"), Err(PduError::InvalidHex('G')));
        assert_eq!(decode_hex("ABC"), Err(PduError::OddHexLength(3)));
    }

    #[test]
    fn test_marshal_with_default_smsc() {
        let pdu = PduMode::new(None, vec![0x01, 0x02]);
        assert_eq!(pdu.marshal_hex_string().unwrap(), "000102");
        assert_eq!(PduMode::unmarshal_hex_string("000102").unwrap(), pdu);
    }

    #[test]
    fn test_marshal_with_smsc() {
        let pdu = PduMode::new(Some(Address::international("61409894000")), vec![0x04]);
        let s = pdu.marshal_hex_string().unwrap();
        assert_eq!(s, "07911604894900F004");
        assert_eq!(PduMode::unmarshal_hex_string(&s).unwrap(), pdu);
    }

    #[test]
    fn test_truncated_smsc() {
        assert_eq!(
            PduMode::unmarshal_hex_string("079116"),
            Err(PduError::Underflow("SMSC address"))
        );
    }
}
