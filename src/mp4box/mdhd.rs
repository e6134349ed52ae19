use crate::mp4box::{read_byte, read_u16};
use crate::Result;

/// Media header, carrying the packed ISO-639-2 language code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdhdBox {
    pub version: u8,
    pub language: String,
}

pub fn parse_mdhd_box(buffer: &[u8]) -> Result<MdhdBox> {
    let version = read_byte(buffer, 0)?;

    // version 1 widens the preceding timestamp fields to 64 bits
    let language_offset = if version == 1 { 32 } else { 20 };
    let code = read_u16(buffer, language_offset)?;

    Ok(MdhdBox {
        version,
        language: language_string(code),
    })
}

/// Unpack three 5-bit fields into lowercase ASCII letters.
fn language_string(code: u16) -> String {
    let lang = [
        ((code >> 10) & 0x1F) as u8 + 0x60,
        ((code >> 5) & 0x1F) as u8 + 0x60,
        (code & 0x1F) as u8 + 0x60,
    ];
    String::from_utf8_lossy(&lang).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(language_string(0x55C4), "und");
        assert_eq!(language_string(0x15C7), "eng");
        assert_eq!(language_string(0x2A0E), "jpn");
    }

    #[test]
    fn test_mdhd_version0() {
        let mut payload = vec![0u8; 24];
        payload[20..22].copy_from_slice(&0x15C7u16.to_be_bytes());

        let mdhd = parse_mdhd_box(&payload).unwrap();
        assert_eq!(mdhd.version, 0);
        assert_eq!(mdhd.language, "eng");
    }

    #[test]
    fn test_mdhd_version1() {
        let mut payload = vec![0u8; 36];
        payload[0] = 1;
        payload[32..34].copy_from_slice(&0x55C4u16.to_be_bytes());

        let mdhd = parse_mdhd_box(&payload).unwrap();
        assert_eq!(mdhd.version, 1);
        assert_eq!(mdhd.language, "und");
    }
}
