// ABOUTME: Parsers for AT information lines: +GCAP capabilities, +CMGS references and +CMT indications
// ABOUTME: Lines carry an info prefix such as "+CMGS:" followed by the value

use crate::driver::error::{GsmError, GsmResult};
use crate::pdu::{PduMode, Tpdu};

/// Returns true if `line` starts with `prefix` followed by a colon
pub fn has_prefix(line: &str, prefix: &str) -> bool {
    line.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Strips `prefix`, its colon and surrounding whitespace from `line`
///
/// Lines without the prefix are returned trimmed.
pub fn trim_prefix<'a>(line: &'a str, prefix: &str) -> &'a str {
    line.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(line)
        .trim()
}

/// Collects the capabilities listed in every `+GCAP` line
pub fn parse_capabilities<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| has_prefix(line, "+GCAP"))
        .flat_map(|line| trim_prefix(line, "+GCAP").split(','))
        .map(|cap| cap.trim().to_string())
        .filter(|cap| !cap.is_empty())
        .collect()
}

/// Takes the message reference from the first `+CMGS` line, ignoring others
pub fn parse_message_reference<S: AsRef<str>>(lines: &[S]) -> GsmResult<String> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .find(|line| has_prefix(line, "+CMGS"))
        .map(|line| trim_prefix(line, "+CMGS").to_string())
        .ok_or(GsmError::MalformedResponse)
}

/// Converts the lines of a `+CMT` indication into the TPDU it carries
///
/// The first line is the header, whose last comma separated field is the
/// TPDU length in octets; the second is the PDU mode hex.
///
/// ```rust
/// use gsm_modem::driver::unmarshal_tpdu;
///
/// let tpdu = unmarshal_tpdu(&[
///     "+CMT: ,28",
///     "00040B911604894900F00000811011210542040AE8329BFD4697D9EC37",
/// ])
/// .unwrap();
/// assert_eq!(tpdu.address.to_string(), "+61409894000");
/// ```
pub fn unmarshal_tpdu<S: AsRef<str>>(lines: &[S]) -> GsmResult<Tpdu> {
    let [header, hex, ..] = lines else {
        return Err(GsmError::Underlength);
    };
    let expected: usize = header
        .as_ref()
        .rsplit(',')
        .next()
        .unwrap_or_default()
        .trim()
        .parse()?;
    let pdu = PduMode::unmarshal_hex_string(hex.as_ref())?;
    if expected != pdu.tpdu.len() {
        return Err(GsmError::LengthMismatch {
            expected,
            actual: pdu.tpdu.len(),
        });
    }
    Ok(Tpdu::unmarshal_binary(&pdu.tpdu)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::PduError;

    const DELIVER: &str = "00040B911604894900F00000811011210542040AE8329BFD4697D9EC37";

    #[test]
    fn test_prefix_helpers() {
        assert!(has_prefix("+CMGS: 42", "+CMGS"));
        assert!(!has_prefix("+CMGSX: 42", "+CMGS"));
        assert!(!has_prefix("+CMGS 42", "+CMGS"));
        assert_eq!(trim_prefix("+CMGS: 42 ", "+CMGS"), "42");
        assert_eq!(trim_prefix("+CMGS:42", "+CMGS"), "42");
    }

    #[test]
    fn test_parse_capabilities() {
        let lines = ["+GCAP: +CGSM,+FCLASS, +DS", "OK"];
        assert_eq!(parse_capabilities(&lines), vec!["+CGSM", "+FCLASS", "+DS"]);
        assert!(parse_capabilities(&["+FOO: +CGSM"]).is_empty());
    }

    #[test]
    fn test_parse_message_reference() {
        assert_eq!(parse_message_reference(&["", "+CMGS: 42"]).unwrap(), "42");
        assert_eq!(
            parse_message_reference(&["+CMGS: 1", "+CMGS: 2"]).unwrap(),
            "1"
        );
        assert!(matches!(
            parse_message_reference(&["+CMSS: 3"]),
            Err(GsmError::MalformedResponse)
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            parse_message_reference(&empty),
            Err(GsmError::MalformedResponse)
        ));
    }

    #[test]
    fn test_unmarshal_tpdu() {
        let tpdu = unmarshal_tpdu(&["+CMT: ,28", DELIVER]).unwrap();
        assert_eq!(tpdu.address.to_string(), "+61409894000");
        assert_eq!(tpdu.ud.len(), 10);

        // trailing spaces in the header are tolerated
        assert!(unmarshal_tpdu(&["+CMT: \"\",28 ", DELIVER]).is_ok());
    }

    #[test]
    fn test_unmarshal_tpdu_length_mismatch() {
        assert!(matches!(
            unmarshal_tpdu(&["+CMT: ,27", DELIVER]),
            Err(GsmError::LengthMismatch {
                expected: 27,
                actual: 28
            })
        ));
    }

    #[test]
    fn test_unmarshal_tpdu_underlength() {
        assert!(matches!(
            unmarshal_tpdu(&["+CMT: ,28"]),
            Err(GsmError::Underlength)
        ));
        let empty: [String; 0] = [];
        assert!(matches!(unmarshal_tpdu(&empty), Err(GsmError::Underlength)));
    }

    #[test]
    fn test_unmarshal_tpdu_bad_fields() {
        assert!(matches!(
            unmarshal_tpdu(&["+CMT: ,abc", DELIVER]),
            Err(GsmError::InvalidLength(_))
        ));
        assert!(matches!(
            unmarshal_tpdu(&["+CMT: ,1", "0Z"]),
            Err(GsmError::Pdu(PduError::InvalidHex('Z')))
        ));
        assert!(matches!(
            unmarshal_tpdu(&["+CMT: ,2", "00040B"]),
            Err(GsmError::Pdu(PduError::Underflow(_)))
        ));
    }
}
