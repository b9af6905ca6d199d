// ABOUTME: GSM 03.40 address fields with type of number and numbering plan identification
// ABOUTME: Handles semi-octet digit encoding for TP addresses and SMSC addresses plus alphanumeric senders

use crate::pdu::error::{PduError, PduResult};
use crate::pdu::{gsm7, take_slice, take_u8};
use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::fmt;
use std::str::FromStr;

/// Most digits a TP address or SMSC address field carries
pub const MAX_ADDRESS_DIGITS: usize = 20;

/// Type of number, bits 6..4 of the type-of-address octet
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0b000,
    International = 0b001,
    National = 0b010,
    NetworkSpecific = 0b011,
    SubscriberNumber = 0b100,
    Alphanumeric = 0b101,
    Abbreviated = 0b110,
    Reserved = 0b111,
}

/// Numbering plan identification, bits 3..0 of the type-of-address octet
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum NumberingPlan {
    #[default]
    Unknown = 0b0000,
    Isdn = 0b0001,
    Data = 0b0011,
    Telex = 0b0100,
    ServiceCentreSpecific = 0b0101,
    ServiceCentreSpecific2 = 0b0110,
    National = 0b1000,
    Private = 0b1001,
    Ermes = 0b1010,
    Reserved = 0b1111,
}

/// A phone number or alphanumeric sender as carried in a PDU
///
/// `number` never carries the `+` prefix; international numbers are marked
/// by `ton` instead and regain the prefix when displayed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumberingPlan,
    pub number: String,
}

impl Address {
    pub fn new(number: impl Into<String>, ton: TypeOfNumber, npi: NumberingPlan) -> Self {
        Self {
            ton,
            npi,
            number: number.into(),
        }
    }

    /// Creates an international ISDN address from digits without the `+`
    pub fn international(digits: impl Into<String>) -> Self {
        Self::new(digits, TypeOfNumber::International, NumberingPlan::Isdn)
    }

    pub fn is_empty(&self) -> bool {
        self.number.is_empty()
    }

    /// The type-of-address octet
    pub fn toa(&self) -> u8 {
        0x80 | (self.ton as u8) << 4 | self.npi as u8
    }

    fn from_toa(toa: u8, number: String) -> PduResult<Self> {
        let ton_bits = (toa >> 4) & 0x07;
        let ton = TypeOfNumber::try_from(ton_bits)
            .map_err(|_| PduError::InvalidTypeOfNumber(ton_bits))?;
        // Unassigned plans are kept as Unknown rather than rejecting the PDU
        let npi = NumberingPlan::try_from(toa & 0x0f).unwrap_or_default();
        Ok(Self { ton, npi, number })
    }

    /// Encodes as TP-OA/TP-DA: length in semi-octets, TOA, then digits
    pub(crate) fn encode(&self, buf: &mut BytesMut) -> PduResult<()> {
        if self.ton == TypeOfNumber::Alphanumeric {
            let septets = gsm7::encode(&self.number)?;
            let semi_octets = (septets.len() * 7).div_ceil(4);
            if semi_octets > MAX_ADDRESS_DIGITS {
                return Err(PduError::AddressTooLong(semi_octets));
            }
            let packed = gsm7::pack(&septets, 0);
            buf.put_u8(semi_octets as u8);
            buf.put_u8(self.toa());
            buf.put_slice(&packed);
            return Ok(());
        }
        let digits = encode_semi_octets(&self.number)?;
        buf.put_u8(self.number.len() as u8);
        buf.put_u8(self.toa());
        buf.put_slice(&digits);
        Ok(())
    }

    /// Decodes a TP-OA/TP-DA field
    pub(crate) fn decode(buf: &mut &[u8]) -> PduResult<Self> {
        let len = take_u8(buf, "address length")? as usize;
        let toa = take_u8(buf, "type of address")?;
        let octets = take_slice(buf, len.div_ceil(2), "address")?;
        let number = if (toa >> 4) & 0x07 == TypeOfNumber::Alphanumeric as u8 {
            gsm7::decode(&gsm7::unpack(octets, 0, len * 4 / 7))
        } else {
            decode_semi_octets(octets, Some(len))
        };
        Self::from_toa(toa, number)
    }

    /// Encodes as an SMSC address: length in octets (including the TOA)
    pub(crate) fn encode_smsc(&self, buf: &mut BytesMut) -> PduResult<()> {
        if self.is_empty() {
            buf.put_u8(0);
            return Ok(());
        }
        let digits = encode_semi_octets(&self.number)?;
        buf.put_u8(digits.len() as u8 + 1);
        buf.put_u8(self.toa());
        buf.put_slice(&digits);
        Ok(())
    }

    /// Decodes an SMSC address, `None` when the length octet is zero
    pub(crate) fn decode_smsc(buf: &mut &[u8]) -> PduResult<Option<Self>> {
        let len = take_u8(buf, "SMSC length")? as usize;
        if len == 0 {
            return Ok(None);
        }
        let field = take_slice(buf, len, "SMSC address")?;
        let number = decode_semi_octets(&field[1..], None);
        Self::from_toa(field[0], number).map(Some)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ton == TypeOfNumber::International {
            write!(f, "+")?;
        }
        write!(f, "{}", self.number)
    }
}

impl FromStr for Address {
    type Err = PduError;

    /// Parses a dialable number; a leading `+` selects international format
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ton, digits) = match s.strip_prefix('+') {
            Some(rest) => (TypeOfNumber::International, rest),
            None => (TypeOfNumber::Unknown, s),
        };
        if let Some(c) = digits.chars().find(|c| digit_to_nibble(*c).is_none()) {
            return Err(PduError::InvalidAddressDigit(c));
        }
        check_length(digits)?;
        Ok(Self::new(digits, ton, NumberingPlan::Isdn))
    }
}

fn check_length(digits: &str) -> PduResult<()> {
    let count = digits.chars().count();
    if count > MAX_ADDRESS_DIGITS {
        return Err(PduError::AddressTooLong(count));
    }
    Ok(())
}

fn digit_to_nibble(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        '*' => Some(0x0a),
        '#' => Some(0x0b),
        'a' | 'A' => Some(0x0c),
        'b' | 'B' => Some(0x0d),
        'c' | 'C' => Some(0x0e),
        _ => None,
    }
}

fn nibble_to_digit(n: u8) -> char {
    match n {
        0..=9 => (b'0' + n) as char,
        0x0a => '*',
        0x0b => '#',
        0x0c => 'a',
        0x0d => 'b',
        _ => 'c',
    }
}

fn encode_semi_octets(digits: &str) -> PduResult<Vec<u8>> {
    check_length(digits)?;
    let nibbles = digits
        .chars()
        .map(|c| digit_to_nibble(c).ok_or(PduError::InvalidAddressDigit(c)))
        .collect::<PduResult<Vec<u8>>>()?;
    Ok(nibbles
        .chunks(2)
        .map(|pair| pair[0] | pair.get(1).copied().unwrap_or(0x0f) << 4)
        .collect())
}

/// Decodes swapped BCD digits, stopping at `limit` digits or the 0xF filler
fn decode_semi_octets(octets: &[u8], limit: Option<usize>) -> String {
    let mut number = String::with_capacity(octets.len() * 2);
    for nibble in octets.iter().flat_map(|o| [o & 0x0f, o >> 4]) {
        if nibble == 0x0f || limit.is_some_and(|l| number.len() >= l) {
            break;
        }
        number.push(nibble_to_digit(nibble));
    }
    number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_international_number() {
        let addr: Address = "+1555123".parse().unwrap();
        assert_eq!(addr.ton, TypeOfNumber::International);
        assert_eq!(addr.npi, NumberingPlan::Isdn);
        assert_eq!(addr.number, "1555123");
        assert_eq!(addr.to_string(), "+1555123");
        assert_eq!(addr.toa(), 0x91);
    }

    #[test]
    fn test_parse_rejects_invalid_digit() {
        let result = "555-1234".parse::<Address>();
        assert_eq!(result, Err(PduError::InvalidAddressDigit('-')));
    }

    #[test]
    fn test_parse_rejects_overlong_number() {
        let digits = "1".repeat(MAX_ADDRESS_DIGITS);
        assert!(format!("+{digits}").parse::<Address>().is_ok());

        let result = format!("+{digits}1").parse::<Address>();
        assert_eq!(result, Err(PduError::AddressTooLong(21)));
    }

    #[test]
    fn test_encode_rejects_overlong_number() {
        let addr = Address::international("9".repeat(300));
        let mut buf = BytesMut::new();
        assert_eq!(addr.encode(&mut buf), Err(PduError::AddressTooLong(300)));

        let sender = Address::new(
            "TwelveLetter",
            TypeOfNumber::Alphanumeric,
            NumberingPlan::Unknown,
        );
        assert_eq!(sender.encode(&mut buf), Err(PduError::AddressTooLong(21)));
    }

    #[test]
    fn test_encode_odd_length_number() {
        let addr: Address = "+1555123".parse().unwrap();
        let mut buf = BytesMut::new();
        addr.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x07, 0x91, 0x51, 0x55, 0x21, 0xf3]);

        let mut src = buf.as_ref();
        let decoded = Address::decode(&mut src).unwrap();
        assert_eq!(decoded, addr);
        assert!(src.is_empty());
    }

    #[test]
    fn test_smsc_address() {
        let addr = Address::international("61409894000");
        let mut buf = BytesMut::new();
        addr.encode_smsc(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x07, 0x91, 0x16, 0x04, 0x89, 0x49, 0x00, 0xf0]);

        let mut src = buf.as_ref();
        assert_eq!(Address::decode_smsc(&mut src).unwrap(), Some(addr));
    }

    #[test]
    fn test_empty_smsc_address() {
        let mut buf = BytesMut::new();
        Address::default().encode_smsc(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x00]);

        let mut src = buf.as_ref();
        assert_eq!(Address::decode_smsc(&mut src).unwrap(), None);
    }

    #[test]
    fn test_alphanumeric_sender() {
        let addr = Address::new("Telstra", TypeOfNumber::Alphanumeric, NumberingPlan::Unknown);
        let mut buf = BytesMut::new();
        addr.encode(&mut buf).unwrap();
        // 7 septets pack into 7 octets, 13 useful semi-octets
        assert_eq!(buf[0], 13);
        assert_eq!(buf[1], 0xd0);

        let mut src = buf.as_ref();
        assert_eq!(Address::decode(&mut src).unwrap(), addr);
    }

    #[test]
    fn test_truncated_address() {
        let mut src: &[u8] = &[0x0b, 0x91, 0x51];
        assert_eq!(
            Address::decode(&mut src),
            Err(PduError::Underflow("address"))
        );
    }
}
