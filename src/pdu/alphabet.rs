// ABOUTME: Character set selection from the TP-DCS octet and UCS-2 conversion helpers
// ABOUTME: Maps data coding groups onto the three alphabets a TPDU's user data can use

use crate::pdu::error::{PduError, PduResult};

/// Alphabet of a TPDU's user data
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Alphabet {
    /// GSM 7-bit default alphabet, user data length counted in septets
    #[default]
    Gsm7,
    /// 8-bit data, user data length counted in octets
    EightBit,
    /// UCS-2 (UTF-16BE), user data length counted in octets
    Ucs2,
}

impl Alphabet {
    /// Determines the alphabet encoded in a data coding scheme octet
    pub fn from_dcs(dcs: u8) -> Self {
        match dcs >> 4 {
            // general data coding, with or without automatic deletion
            0x0..=0x7 => match (dcs >> 2) & 0x03 {
                0b01 => Alphabet::EightBit,
                0b10 => Alphabet::Ucs2,
                _ => Alphabet::Gsm7,
            },
            0xe => Alphabet::Ucs2,
            0xf if dcs & 0x04 != 0 => Alphabet::EightBit,
            _ => Alphabet::Gsm7,
        }
    }

    /// The data coding scheme octet for this alphabet with no message class
    pub fn dcs(self) -> u8 {
        match self {
            Alphabet::Gsm7 => 0x00,
            Alphabet::EightBit => 0x04,
            Alphabet::Ucs2 => 0x08,
        }
    }
}

/// Encodes text as UCS-2 (UTF-16BE) octets
pub fn encode_ucs2(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// Splits UCS-2 octets into UTF-16 code units
pub fn ucs2_units(octets: &[u8]) -> PduResult<Vec<u16>> {
    if octets.len() % 2 != 0 {
        return Err(PduError::InvalidUcs2);
    }
    Ok(octets
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_from_dcs() {
        assert_eq!(Alphabet::from_dcs(0x00), Alphabet::Gsm7);
        assert_eq!(Alphabet::from_dcs(0x04), Alphabet::EightBit);
        assert_eq!(Alphabet::from_dcs(0x08), Alphabet::Ucs2);
        assert_eq!(Alphabet::from_dcs(0x18), Alphabet::Ucs2);
        assert_eq!(Alphabet::from_dcs(0x48), Alphabet::Ucs2);
        assert_eq!(Alphabet::from_dcs(0xe0), Alphabet::Ucs2);
        assert_eq!(Alphabet::from_dcs(0xf0), Alphabet::Gsm7);
        assert_eq!(Alphabet::from_dcs(0xf4), Alphabet::EightBit);
        assert_eq!(Alphabet::from_dcs(0xc0), Alphabet::Gsm7);
    }

    #[test]
    fn test_ucs2_round_trip() {
        let octets = encode_ucs2("Привет 😀");
        let units = ucs2_units(&octets).unwrap();
        assert_eq!(String::from_utf16(&units).unwrap(), "Привет 😀");
    }

    #[test]
    fn test_ucs2_odd_length() {
        assert_eq!(ucs2_units(&[0x00, 0x41, 0x00]), Err(PduError::InvalidUcs2));
    }
}
