// ABOUTME: SMS-SUBMIT and SMS-DELIVER transfer protocol data units with binary marshalling
// ABOUTME: Encodes first octet flags, addresses, validity, timestamps and user data per GSM 03.40

use crate::pdu::address::Address;
use crate::pdu::alphabet::Alphabet;
use crate::pdu::error::{PduError, PduResult};
use crate::pdu::udh::{ConcatInfo, UserDataHeader};
use crate::pdu::{gsm7, take_slice, take_u8};
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::TryFromPrimitive;
use std::time::Duration;

/// Maximum user data length in octets
pub const MAX_UD_OCTETS: usize = 140;
/// Maximum user data length in septets
pub const MAX_UD_SEPTETS: usize = 160;

const RD_MMS: u8 = 0x04;
const SRR_SRI: u8 = 0x20;
const UDHI: u8 = 0x40;
const RP: u8 = 0x80;

/// TP-MTI, bits 1..0 of the first octet
///
/// The same values are reused for the opposite direction (SUBMIT-REPORT,
/// DELIVER-REPORT); only SMS-DELIVER and SMS-SUBMIT are marshalled here.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Deliver = 0b00,
    Submit = 0b01,
    Command = 0b10,
    Reserved = 0b11,
}

/// TP-VP of an SMS-SUBMIT
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ValidityPeriod {
    #[default]
    NotPresent,
    Relative(u8),
    Enhanced([u8; 7]),
    Absolute([u8; 7]),
}

impl ValidityPeriod {
    /// Nearest relative validity period not shorter than `duration`,
    /// saturating at 63 weeks
    pub fn relative(duration: Duration) -> Self {
        let minutes = duration.as_secs().div_ceil(60);
        let value = match minutes {
            0..=720 => minutes.div_ceil(5).max(1) - 1,
            721..=1440 => 143 + (minutes - 720).div_ceil(30),
            _ => {
                let days = minutes.div_ceil(1440);
                if days <= 30 {
                    166 + days
                } else {
                    (192 + days.div_ceil(7)).min(255)
                }
            }
        };
        ValidityPeriod::Relative(value as u8)
    }

    /// TP-VPF bits for the first octet
    fn format(&self) -> u8 {
        match self {
            ValidityPeriod::NotPresent => 0b00,
            ValidityPeriod::Enhanced(_) => 0b01,
            ValidityPeriod::Relative(_) => 0b10,
            ValidityPeriod::Absolute(_) => 0b11,
        }
    }
}

/// TP-SCTS, the service centre timestamp of an SMS-DELIVER
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Offset from GMT in quarter hours
    pub tz_quarters: i8,
}

impl Timestamp {
    fn encode(&self, buf: &mut BytesMut) {
        for field in [self.year, self.month, self.day, self.hour, self.minute, self.second] {
            buf.put_u8(swap_bcd(field));
        }
        let mut tz = swap_bcd(self.tz_quarters.unsigned_abs());
        if self.tz_quarters < 0 {
            tz |= 0x08;
        }
        buf.put_u8(tz);
    }

    fn decode(octets: &[u8]) -> Self {
        let tz = unswap_bcd(octets[6] & 0xf7) as i8;
        Self {
            year: unswap_bcd(octets[0]),
            month: unswap_bcd(octets[1]),
            day: unswap_bcd(octets[2]),
            hour: unswap_bcd(octets[3]),
            minute: unswap_bcd(octets[4]),
            second: unswap_bcd(octets[5]),
            tz_quarters: if octets[6] & 0x08 != 0 { -tz } else { tz },
        }
    }
}

fn swap_bcd(value: u8) -> u8 {
    (value % 10) << 4 | (value / 10) % 10
}

fn unswap_bcd(octet: u8) -> u8 {
    (octet & 0x0f) * 10 + (octet >> 4)
}

/// A transfer protocol data unit, the atomic unit of an SMS
///
/// `address` is the destination of an SMS-SUBMIT or the originator of an
/// SMS-DELIVER. For GSM 7-bit messages `ud` holds unpacked septets,
/// otherwise raw octets; in both cases without the user data header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tpdu {
    pub message_type: MessageType,
    /// TP-RD, SMS-SUBMIT only
    pub reject_duplicates: bool,
    /// Inverse of TP-MMS, SMS-DELIVER only
    pub more_messages: bool,
    /// TP-SRR for SMS-SUBMIT, TP-SRI for SMS-DELIVER
    pub status_report: bool,
    pub reply_path: bool,
    /// TP-MR, SMS-SUBMIT only
    pub message_reference: u8,
    pub address: Address,
    pub protocol_id: u8,
    pub dcs: u8,
    /// SMS-SUBMIT only
    pub validity: ValidityPeriod,
    /// SMS-DELIVER only
    pub timestamp: Timestamp,
    pub udh: Option<UserDataHeader>,
    pub ud: Vec<u8>,
}

impl Tpdu {
    fn new(message_type: MessageType, address: Address) -> Self {
        Self {
            message_type,
            reject_duplicates: false,
            more_messages: false,
            status_report: false,
            reply_path: false,
            message_reference: 0,
            address,
            protocol_id: 0,
            dcs: 0,
            validity: ValidityPeriod::NotPresent,
            timestamp: Timestamp::default(),
            udh: None,
            ud: Vec::new(),
        }
    }

    /// An empty SMS-SUBMIT addressed to `destination`
    pub fn submit(destination: Address) -> Self {
        Self::new(MessageType::Submit, destination)
    }

    /// An empty SMS-DELIVER from `originator`
    pub fn deliver(originator: Address) -> Self {
        Self::new(MessageType::Deliver, originator)
    }

    pub fn alphabet(&self) -> Alphabet {
        Alphabet::from_dcs(self.dcs)
    }

    pub fn concat_info(&self) -> Option<ConcatInfo> {
        self.udh.as_ref().and_then(UserDataHeader::concat_info)
    }

    fn first_octet(&self) -> u8 {
        let mut octet = self.message_type as u8;
        match self.message_type {
            MessageType::Submit => {
                octet |= self.validity.format() << 3;
                if self.reject_duplicates {
                    octet |= RD_MMS;
                }
            }
            _ => {
                if !self.more_messages {
                    octet |= RD_MMS;
                }
            }
        }
        if self.status_report {
            octet |= SRR_SRI;
        }
        if self.udh.is_some() {
            octet |= UDHI;
        }
        if self.reply_path {
            octet |= RP;
        }
        octet
    }

    /// Marshals into the binary TPDU form
    pub fn marshal_binary(&self) -> PduResult<Bytes> {
        let mut buf = BytesMut::with_capacity(32 + self.ud.len());
        buf.put_u8(self.first_octet());
        match self.message_type {
            MessageType::Submit => {
                buf.put_u8(self.message_reference);
                self.address.encode(&mut buf)?;
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.dcs);
                match self.validity {
                    ValidityPeriod::NotPresent => {}
                    ValidityPeriod::Relative(value) => buf.put_u8(value),
                    ValidityPeriod::Enhanced(octets) | ValidityPeriod::Absolute(octets) => {
                        buf.put_slice(&octets)
                    }
                }
            }
            MessageType::Deliver => {
                self.address.encode(&mut buf)?;
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.dcs);
                self.timestamp.encode(&mut buf);
            }
            other => return Err(PduError::UnsupportedMessageType(other as u8)),
        }
        self.encode_user_data(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Unmarshals a binary TPDU
    ///
    /// The direction is taken from the message type indicator, so an
    /// SMS-SUBMIT-REPORT is rejected rather than mistaken for a SUBMIT.
    pub fn unmarshal_binary(src: &[u8]) -> PduResult<Self> {
        let mut buf = src;
        let first_octet = take_u8(&mut buf, "first octet")?;
        let mti = first_octet & 0x03;
        let message_type = match MessageType::try_from(mti) {
            Ok(t @ (MessageType::Submit | MessageType::Deliver)) => t,
            _ => return Err(PduError::UnsupportedMessageType(mti)),
        };
        let mut tpdu = match message_type {
            MessageType::Submit => {
                let message_reference = take_u8(&mut buf, "message reference")?;
                let mut tpdu = Self::submit(Address::decode(&mut buf)?);
                tpdu.message_reference = message_reference;
                tpdu.reject_duplicates = first_octet & RD_MMS != 0;
                tpdu.protocol_id = take_u8(&mut buf, "protocol identifier")?;
                tpdu.dcs = take_u8(&mut buf, "data coding scheme")?;
                tpdu.validity = match (first_octet >> 3) & 0x03 {
                    0b00 => ValidityPeriod::NotPresent,
                    0b10 => ValidityPeriod::Relative(take_u8(&mut buf, "validity period")?),
                    vpf => {
                        let mut octets = [0u8; 7];
                        octets.copy_from_slice(take_slice(&mut buf, 7, "validity period")?);
                        if vpf == 0b01 {
                            ValidityPeriod::Enhanced(octets)
                        } else {
                            ValidityPeriod::Absolute(octets)
                        }
                    }
                };
                tpdu
            }
            _ => {
                let mut tpdu = Self::deliver(Address::decode(&mut buf)?);
                tpdu.more_messages = first_octet & RD_MMS == 0;
                tpdu.protocol_id = take_u8(&mut buf, "protocol identifier")?;
                tpdu.dcs = take_u8(&mut buf, "data coding scheme")?;
                tpdu.timestamp = Timestamp::decode(take_slice(&mut buf, 7, "timestamp")?);
                tpdu
            }
        };
        tpdu.status_report = first_octet & SRR_SRI != 0;
        tpdu.reply_path = first_octet & RP != 0;
        tpdu.decode_user_data(&mut buf, first_octet & UDHI != 0)?;
        Ok(tpdu)
    }

    fn encode_user_data(&self, buf: &mut BytesMut) -> PduResult<()> {
        let header_octets = self.udh.as_ref().map_or(0, UserDataHeader::encoded_len);
        match self.alphabet() {
            Alphabet::Gsm7 => {
                let header_septets = (header_octets * 8).div_ceil(7);
                let udl = header_septets + self.ud.len();
                if udl > MAX_UD_SEPTETS {
                    return Err(PduError::UserDataTooLong {
                        length: udl,
                        max: MAX_UD_SEPTETS,
                    });
                }
                buf.put_u8(udl as u8);
                if let Some(udh) = &self.udh {
                    udh.encode(buf);
                }
                let fill_bits = header_septets * 7 - header_octets * 8;
                buf.put_slice(&gsm7::pack(&self.ud, fill_bits));
            }
            Alphabet::EightBit | Alphabet::Ucs2 => {
                let udl = header_octets + self.ud.len();
                if udl > MAX_UD_OCTETS {
                    return Err(PduError::UserDataTooLong {
                        length: udl,
                        max: MAX_UD_OCTETS,
                    });
                }
                buf.put_u8(udl as u8);
                if let Some(udh) = &self.udh {
                    udh.encode(buf);
                }
                buf.put_slice(&self.ud);
            }
        }
        Ok(())
    }

    fn decode_user_data(&mut self, buf: &mut &[u8], udhi: bool) -> PduResult<()> {
        let udl = take_u8(buf, "user data length")? as usize;
        let septets = self.alphabet() == Alphabet::Gsm7;
        let octet_len = if septets { (udl * 7).div_ceil(8) } else { udl };
        let octets = take_slice(buf, octet_len, "user data")?;
        let header_octets = if udhi {
            let (udh, used) = UserDataHeader::decode(octets)?;
            self.udh = Some(udh);
            used
        } else {
            0
        };
        if septets {
            let header_septets = (header_octets * 8).div_ceil(7);
            if header_septets > udl {
                return Err(PduError::InvalidUserDataHeader("length exceeds user data"));
            }
            let fill_bits = header_septets * 7 - header_octets * 8;
            self.ud = gsm7::unpack(&octets[header_octets..], fill_bits, udl - header_septets);
        } else {
            self.ud = octets[header_octets..].to_vec();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        crate::pdu::decode_hex(s).unwrap()
    }

    #[test]
    fn test_unmarshal_deliver() {
        // SMS-DELIVER from +61409894000 "hellohello", GMT+10
        let src = hex("040B911604894900F00000811011210542040AE8329BFD4697D9EC37");
        let tpdu = Tpdu::unmarshal_binary(&src).unwrap();
        assert_eq!(tpdu.message_type, MessageType::Deliver);
        assert_eq!(tpdu.address.to_string(), "+61409894000");
        assert_eq!(tpdu.alphabet(), Alphabet::Gsm7);
        assert_eq!(gsm7::decode(&tpdu.ud), "hellohello");
        assert_eq!(tpdu.timestamp.year, 18);
        assert_eq!(tpdu.timestamp.month, 1);
        assert_eq!(tpdu.timestamp.day, 11);
        assert_eq!(tpdu.timestamp.tz_quarters, 40);
        assert!(!tpdu.more_messages);
        assert_eq!(tpdu.marshal_binary().unwrap().as_ref(), src.as_slice());
    }

    #[test]
    fn test_marshal_submit() {
        let mut tpdu = Tpdu::submit("+1555123".parse().unwrap());
        tpdu.ud = gsm7::encode("hi").unwrap();
        let bytes = tpdu.marshal_binary().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x01, 0x00, 0x07, 0x91, 0x51, 0x55, 0x21, 0xf3, 0x00, 0x00, 0x02, 0xe8, 0x34]
        );
        assert_eq!(Tpdu::unmarshal_binary(&bytes).unwrap(), tpdu);
    }

    #[test]
    fn test_submit_with_relative_validity() {
        let mut tpdu = Tpdu::submit("+1555123".parse().unwrap());
        tpdu.validity = ValidityPeriod::relative(Duration::from_secs(24 * 3600));
        tpdu.status_report = true;
        tpdu.ud = gsm7::encode("x").unwrap();
        let bytes = tpdu.marshal_binary().unwrap();
        assert_eq!(bytes[0], 0x31);
        assert_eq!(Tpdu::unmarshal_binary(&bytes).unwrap(), tpdu);
    }

    #[test]
    fn test_relative_validity_ranges() {
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(5 * 60)), ValidityPeriod::Relative(0));
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(12 * 3600)), ValidityPeriod::Relative(143));
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(24 * 3600)), ValidityPeriod::Relative(167));
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(2 * 86400)), ValidityPeriod::Relative(168));
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(35 * 86400)), ValidityPeriod::Relative(197));
        assert_eq!(ValidityPeriod::relative(Duration::from_secs(1000 * 86400)), ValidityPeriod::Relative(255));
    }

    #[test]
    fn test_gsm7_with_concatenation_header() {
        let mut tpdu = Tpdu::deliver("+1555123".parse().unwrap());
        tpdu.udh = Some(UserDataHeader::concatenation(
            ConcatInfo {
                reference: 7,
                total: 2,
                sequence: 1,
            },
            false,
        ));
        tpdu.ud = gsm7::encode("abcdefg").unwrap();
        let bytes = tpdu.marshal_binary().unwrap();
        assert_eq!(bytes[0], 0x44);
        let decoded = Tpdu::unmarshal_binary(&bytes).unwrap();
        assert_eq!(gsm7::decode(&decoded.ud), "abcdefg");
        assert_eq!(decoded.concat_info().map(|c| c.sequence), Some(1));
        assert_eq!(decoded, tpdu);
    }

    #[test]
    fn test_ucs2_user_data() {
        let mut tpdu = Tpdu::deliver("+1555123".parse().unwrap());
        tpdu.dcs = Alphabet::Ucs2.dcs();
        tpdu.ud = crate::pdu::alphabet::encode_ucs2("Привет");
        let bytes = tpdu.marshal_binary().unwrap();
        assert_eq!(Tpdu::unmarshal_binary(&bytes).unwrap(), tpdu);
    }

    #[test]
    fn test_user_data_too_long() {
        let mut tpdu = Tpdu::submit("+1555123".parse().unwrap());
        tpdu.ud = vec![0x41; 161];
        assert_eq!(
            tpdu.marshal_binary(),
            Err(PduError::UserDataTooLong {
                length: 161,
                max: MAX_UD_SEPTETS
            })
        );
    }

    #[test]
    fn test_unsupported_message_type() {
        assert_eq!(
            Tpdu::unmarshal_binary(&[0x02, 0x00]),
            Err(PduError::UnsupportedMessageType(0x02))
        );
    }

    #[test]
    fn test_truncated_user_data() {
        let src = hex("040B911604894900F00000811011210542040AE8329B");
        assert_eq!(
            Tpdu::unmarshal_binary(&src),
            Err(PduError::Underflow("user data"))
        );
    }
}
