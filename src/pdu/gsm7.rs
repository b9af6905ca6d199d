// ABOUTME: GSM 03.38 default alphabet and extension table with septet packing
// ABOUTME: Converts between text and 7-bit septets and packs septets into octets with fill bits

use crate::pdu::error::{PduError, PduResult};

/// Escape to the extension table
pub const ESCAPE: u8 = 0x1b;

const DEFAULT_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

const EXTENSION_TABLE: [(u8, char); 10] = [
    (0x0a, '\u{0c}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2f, '\\'),
    (0x3c, '['),
    (0x3d, '~'),
    (0x3e, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Encodes a single character, returning its septets and how many are used
pub fn encode_char(c: char) -> Option<([u8; 2], usize)> {
    if c != '\u{1b}' {
        if let Some(index) = DEFAULT_ALPHABET.iter().position(|&d| d == c) {
            return Some(([index as u8, 0], 1));
        }
    }
    EXTENSION_TABLE
        .iter()
        .find(|(_, e)| *e == c)
        .map(|(code, _)| ([ESCAPE, *code], 2))
}

/// True if every character of `text` has a GSM 7-bit representation
pub fn is_encodable(text: &str) -> bool {
    text.chars().all(|c| encode_char(c).is_some())
}

/// Converts text into unpacked septets
pub fn encode(text: &str) -> PduResult<Vec<u8>> {
    let mut septets = Vec::with_capacity(text.len());
    for c in text.chars() {
        let (code, len) = encode_char(c).ok_or(PduError::UnencodableCharacter(c))?;
        septets.extend_from_slice(&code[..len]);
    }
    Ok(septets)
}

/// Converts unpacked septets into text
///
/// An escape followed by a code missing from the extension table yields the
/// default alphabet character for that code.
pub fn decode(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut iter = septets.iter().map(|s| s & 0x7f);
    while let Some(septet) = iter.next() {
        if septet != ESCAPE {
            text.push(DEFAULT_ALPHABET[septet as usize]);
            continue;
        }
        let Some(code) = iter.next() else { break };
        let c = EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == code)
            .map(|(_, c)| *c)
            .unwrap_or(DEFAULT_ALPHABET[code as usize]);
        text.push(c);
    }
    text
}

/// Packs septets into octets, leaving `fill_bits` zero bits at the start
pub fn pack(septets: &[u8], fill_bits: usize) -> Vec<u8> {
    let mut octets = vec![0u8; (fill_bits + septets.len() * 7).div_ceil(8)];
    for (i, septet) in septets.iter().enumerate() {
        let pos = fill_bits + i * 7;
        let (index, shift) = (pos / 8, pos % 8);
        let value = u16::from(septet & 0x7f) << shift;
        octets[index] |= value as u8;
        if let Some(next) = octets.get_mut(index + 1) {
            *next |= (value >> 8) as u8;
        }
    }
    octets
}

/// Unpacks `count` septets starting `fill_bits` into `octets`
pub fn unpack(octets: &[u8], fill_bits: usize, count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| {
            let pos = fill_bits + i * 7;
            let (index, shift) = (pos / 8, pos % 8);
            let low = u16::from(octets.get(index).copied().unwrap_or(0));
            let high = u16::from(octets.get(index + 1).copied().unwrap_or(0));
            (((high << 8 | low) >> shift) & 0x7f) as u8
        })
        .collect()
}
