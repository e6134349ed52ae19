use std::convert::TryInto;

use crate::mp4box::{read_byte, FourCC};
use crate::{Error, Result};

/// Handler reference: the track's media handler tag plus its
/// human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdlrBox {
    pub version: u8,
    pub handler_type: FourCC,
    pub name: String,
}

pub fn parse_hdlr_box(buffer: &[u8]) -> Result<HdlrBox> {
    let version = read_byte(buffer, 0)?;

    let handler: [u8; 4] = buffer
        .get(8..12)
        .ok_or(Error::InvalidData("unexpected end of box payload"))?
        .try_into()
        .unwrap();

    // name spans the reserved words through to the trailing length/null byte
    let end = buffer.len().saturating_sub(1);
    let name_bytes = if end > 24 { &buffer[24..end] } else { &[][..] };

    Ok(HdlrBox {
        version,
        handler_type: FourCC::from(handler),
        name: String::from_utf8_lossy(name_bytes).into_owned(),
    })
}
