// ABOUTME: TP-UDH user data header made of information elements
// ABOUTME: Provides the concatenated short message elements used to split and reassemble long messages

use crate::pdu::error::{PduError, PduResult};
use bytes::{BufMut, BytesMut};

/// Concatenated short messages, 8-bit reference
pub const IEI_CONCAT_8BIT: u8 = 0x00;
/// Concatenated short messages, 16-bit reference
pub const IEI_CONCAT_16BIT: u8 = 0x08;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InformationElement {
    pub id: u8,
    pub data: Vec<u8>,
}

/// Position of a TPDU within a concatenated message
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total: u8,
    /// 1-based
    pub sequence: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct UserDataHeader {
    pub elements: Vec<InformationElement>,
}

impl UserDataHeader {
    /// Builds a header holding a single concatenation element
    pub fn concatenation(info: ConcatInfo, wide_reference: bool) -> Self {
        let element = if wide_reference {
            let [hi, lo] = info.reference.to_be_bytes();
            InformationElement {
                id: IEI_CONCAT_16BIT,
                data: vec![hi, lo, info.total, info.sequence],
            }
        } else {
            InformationElement {
                id: IEI_CONCAT_8BIT,
                data: vec![info.reference as u8, info.total, info.sequence],
            }
        };
        Self {
            elements: vec![element],
        }
    }

    /// The concatenation element, if present and well formed
    pub fn concat_info(&self) -> Option<ConcatInfo> {
        self.elements.iter().find_map(|ie| match (ie.id, ie.data.as_slice()) {
            (IEI_CONCAT_8BIT, &[reference, total, sequence]) => Some(ConcatInfo {
                reference: u16::from(reference),
                total,
                sequence,
            }),
            (IEI_CONCAT_16BIT, &[hi, lo, total, sequence]) => Some(ConcatInfo {
                reference: u16::from_be_bytes([hi, lo]),
                total,
                sequence,
            }),
            _ => None,
        })
    }

    /// Encoded size in octets, including the UDHL octet
    pub fn encoded_len(&self) -> usize {
        1 + self
            .elements
            .iter()
            .map(|ie| 2 + ie.data.len())
            .sum::<usize>()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((self.encoded_len() - 1) as u8);
        for ie in &self.elements {
            buf.put_u8(ie.id);
            buf.put_u8(ie.data.len() as u8);
            buf.put_slice(&ie.data);
        }
    }

    /// Decodes a header from the start of the user data, returning it with
    /// the number of octets consumed (UDHL included)
    pub(crate) fn decode(octets: &[u8]) -> PduResult<(Self, usize)> {
        let (&udhl, rest) = octets
            .split_first()
            .ok_or(PduError::InvalidUserDataHeader("missing length"))?;
        let mut body = rest
            .get(..udhl as usize)
            .ok_or(PduError::InvalidUserDataHeader("length exceeds user data"))?;
        let mut elements = Vec::new();
        while let [id, len, tail @ ..] = body {
            let data = tail
                .get(..*len as usize)
                .ok_or(PduError::InvalidUserDataHeader("truncated element"))?;
            elements.push(InformationElement {
                id: *id,
                data: data.to_vec(),
            });
            body = &tail[*len as usize..];
        }
        if !body.is_empty() {
            return Err(PduError::InvalidUserDataHeader("trailing octet"));
        }
        Ok((Self { elements }, 1 + udhl as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenation_header_8bit() {
        let info = ConcatInfo {
            reference: 0x42,
            total: 3,
            sequence: 2,
        };
        let udh = UserDataHeader::concatenation(info, false);
        let mut buf = BytesMut::new();
        udh.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x05, 0x00, 0x03, 0x42, 0x03, 0x02]);
        assert_eq!(udh.encoded_len(), 6);

        let (decoded, used) = UserDataHeader::decode(&buf).unwrap();
        assert_eq!(used, 6);
        assert_eq!(decoded.concat_info(), Some(info));
    }

    #[test]
    fn test_concatenation_header_16bit() {
        let info = ConcatInfo {
            reference: 0x1234,
            total: 2,
            sequence: 1,
        };
        let udh = UserDataHeader::concatenation(info, true);
        let mut buf = BytesMut::new();
        udh.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x06, 0x08, 0x04, 0x12, 0x34, 0x02, 0x01]);
        assert_eq!(UserDataHeader::decode(&buf).unwrap().0.concat_info(), Some(info));
    }

    #[test]
    fn test_header_without_concatenation() {
        // application port addressing only
        let (udh, used) = UserDataHeader::decode(&[0x04, 0x04, 0x02, 0x0b, 0x84]).unwrap();
        assert_eq!(used, 5);
        assert_eq!(udh.concat_info(), None);
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            UserDataHeader::decode(&[0x05, 0x00, 0x03, 0x42]),
            Err(PduError::InvalidUserDataHeader(_))
        ));
        assert!(matches!(
            UserDataHeader::decode(&[0x03, 0x00, 0x03, 0x42]),
            Err(PduError::InvalidUserDataHeader(_))
        ));
    }
}
