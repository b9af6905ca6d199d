// ABOUTME: Converts message text into one or more TPDUs, splitting into concatenated segments as needed
// ABOUTME: Applies ordered encoder options for addressing, alphabet, validity and reference width

use crate::pdu::address::Address;
use crate::pdu::alphabet::{Alphabet, encode_ucs2};
use crate::pdu::error::{PduError, PduResult};
use crate::pdu::gsm7;
use crate::pdu::tpdu::{MAX_UD_OCTETS, MAX_UD_SEPTETS, MessageType, Tpdu, ValidityPeriod};
use crate::pdu::udh::{ConcatInfo, UserDataHeader};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Most segments a concatenated message can carry
pub const MAX_SEGMENTS: usize = 255;

/// An option applied when encoding text into TPDUs
///
/// Options are applied in order, so a later option overrides an earlier one
/// touching the same setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderOption {
    /// Build SMS-SUBMITs to this number
    To(String),
    /// Build SMS-DELIVERs from this number
    From(String),
    /// Force an alphabet instead of picking GSM 7-bit when possible
    Alphabet(Alphabet),
    StatusReportRequest,
    ValidityPeriod(Duration),
    /// Use 16-bit concatenation references
    ConcatRef16,
}

#[derive(Debug)]
struct Settings {
    template: Tpdu,
    alphabet: Option<Alphabet>,
    wide_reference: bool,
}

impl Settings {
    fn from_options(options: &[EncoderOption]) -> PduResult<Self> {
        let mut settings = Settings {
            template: Tpdu::submit(Address::default()),
            alphabet: None,
            wide_reference: false,
        };
        for option in options {
            let template = &mut settings.template;
            match option {
                EncoderOption::To(number) => {
                    template.message_type = MessageType::Submit;
                    template.address = number.parse()?;
                }
                EncoderOption::From(number) => {
                    template.message_type = MessageType::Deliver;
                    template.address = number.parse()?;
                }
                EncoderOption::Alphabet(alphabet) => settings.alphabet = Some(*alphabet),
                EncoderOption::StatusReportRequest => template.status_report = true,
                EncoderOption::ValidityPeriod(duration) => {
                    template.validity = ValidityPeriod::relative(*duration)
                }
                EncoderOption::ConcatRef16 => settings.wide_reference = true,
            }
        }
        Ok(settings)
    }
}

/// Splits text into TPDUs
///
/// Holds the rolling concatenation reference so that consecutive long
/// messages from the same encoder carry distinct references.
#[derive(Debug, Default)]
pub struct Encoder {
    next_reference: AtomicU16,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the concatenation reference counter at `reference`
    pub fn with_reference(reference: u16) -> Self {
        Self {
            next_reference: AtomicU16::new(reference),
        }
    }

    /// Encodes `text` into as many TPDUs as it needs
    pub fn encode(&self, text: &str, options: &[EncoderOption]) -> PduResult<Vec<Tpdu>> {
        let settings = Settings::from_options(options)?;
        let alphabet = settings.alphabet.unwrap_or_else(|| {
            if gsm7::is_encodable(text) {
                Alphabet::Gsm7
            } else {
                Alphabet::Ucs2
            }
        });
        let chunks = chunk_text(text, alphabet)?;
        let (single, multi) = capacity(alphabet, settings.wide_reference);

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut template = settings.template;
        template.dcs = alphabet.dcs();
        if total <= single {
            template.ud = chunks.concat();
            return Ok(vec![template]);
        }

        let segments = split(&chunks, multi);
        if segments.len() > MAX_SEGMENTS {
            return Err(PduError::TooManySegments(segments.len()));
        }
        let mut reference = self.next_reference.fetch_add(1, Ordering::Relaxed);
        if !settings.wide_reference {
            reference &= 0xff;
        }
        let count = segments.len() as u8;
        Ok(segments
            .into_iter()
            .enumerate()
            .map(|(i, ud)| {
                let mut tpdu = template.clone();
                let info = ConcatInfo {
                    reference,
                    total: count,
                    sequence: i as u8 + 1,
                };
                tpdu.udh = Some(UserDataHeader::concatenation(info, settings.wide_reference));
                tpdu.ud = ud;
                tpdu
            })
            .collect())
    }
}

/// Encodes with a fresh encoder, for callers that send one long message at most
pub fn encode(text: &str, options: &[EncoderOption]) -> PduResult<Vec<Tpdu>> {
    Encoder::new().encode(text, options)
}

/// Splits text into indivisible user data chunks, one per character
fn chunk_text(text: &str, alphabet: Alphabet) -> PduResult<Vec<Vec<u8>>> {
    text.chars()
        .map(|c| match alphabet {
            Alphabet::Gsm7 => gsm7::encode_char(c)
                .map(|(code, len)| code[..len].to_vec())
                .ok_or(PduError::UnencodableCharacter(c)),
            Alphabet::Ucs2 => Ok(encode_ucs2(c.encode_utf8(&mut [0; 4]))),
            Alphabet::EightBit => Ok(c.encode_utf8(&mut [0; 4]).as_bytes().to_vec()),
        })
        .collect()
}

/// User data capacity of a lone TPDU and of a concatenated segment, in
/// septets for GSM 7-bit and octets otherwise
fn capacity(alphabet: Alphabet, wide_reference: bool) -> (usize, usize) {
    let header_octets = if wide_reference { 7 } else { 6 };
    match alphabet {
        Alphabet::Gsm7 => (MAX_UD_SEPTETS, MAX_UD_SEPTETS - (header_octets * 8usize).div_ceil(7)),
        _ => (MAX_UD_OCTETS, MAX_UD_OCTETS - header_octets),
    }
}

fn split(chunks: &[Vec<u8>], capacity: usize) -> Vec<Vec<u8>> {
    let mut segments = vec![Vec::new()];
    for chunk in chunks {
        let current = segments.last().map_or(0, Vec::len);
        if current + chunk.len() > capacity {
            segments.push(Vec::new());
        }
        if let Some(segment) = segments.last_mut() {
            segment.extend_from_slice(chunk);
        }
    }
    segments
}
