// ABOUTME: Converts the user data of one or more ordered TPDUs back into message text
// ABOUTME: Joins consecutive segments of the same alphabet before conversion so split characters survive

use crate::pdu::alphabet::{Alphabet, ucs2_units};
use crate::pdu::error::{PduError, PduResult};
use crate::pdu::gsm7;
use crate::pdu::tpdu::Tpdu;

/// Decodes the concatenated user data of `tpdus`, which must be in
/// sequence order
///
/// User data of consecutive segments sharing an alphabet is joined before
/// conversion, so an escape sequence or surrogate pair split between
/// segments by the sender survives. 8-bit data that is not valid UTF-8 is
/// decoded lossily with replacement characters.
pub fn decode(tpdus: &[Tpdu]) -> PduResult<String> {
    let mut text = String::new();
    let mut pending = Pending::default();
    for tpdu in tpdus {
        let alphabet = tpdu.alphabet();
        if pending.alphabet != Some(alphabet) {
            pending.flush(&mut text)?;
            pending.alphabet = Some(alphabet);
        }
        match alphabet {
            Alphabet::Gsm7 | Alphabet::EightBit => pending.octets.extend_from_slice(&tpdu.ud),
            Alphabet::Ucs2 => pending.units.extend(ucs2_units(&tpdu.ud)?),
        }
    }
    pending.flush(&mut text)?;
    Ok(text)
}

/// User data of a run of segments in one alphabet
#[derive(Default)]
struct Pending {
    alphabet: Option<Alphabet>,
    octets: Vec<u8>,
    units: Vec<u16>,
}

impl Pending {
    fn flush(&mut self, text: &mut String) -> PduResult<()> {
        match self.alphabet.take() {
            // septets for 7-bit, raw octets for 8-bit
            Some(Alphabet::Gsm7) => text.push_str(&gsm7::decode(&self.octets)),
            Some(Alphabet::EightBit) => text.push_str(&String::from_utf8_lossy(&self.octets)),
            Some(Alphabet::Ucs2) => {
                text.push_str(&String::from_utf16(&self.units).map_err(|_| PduError::InvalidUcs2)?)
            }
            None => {}
        }
        self.octets.clear();
        self.units.clear();
        Ok(())
    }
}
