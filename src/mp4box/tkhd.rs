use crate::mp4box::{read_byte, read_u32};
use crate::Result;

/// Track header. Only the version-0 32-bit timestamp layout is decoded;
/// a version-1 box is read with the same offsets, so callers can inspect
/// `version` to detect misparsed 64-bit files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TkhdBox {
    pub version: u8,
    pub creation_time: u32,
    pub modification_time: u32,
    pub track_id: u32,
}

pub fn parse_tkhd_box(buffer: &[u8]) -> Result<TkhdBox> {
    let version = read_byte(buffer, 0)?;

    let creation_time = read_u32(buffer, 4)?;
    let modification_time = read_u32(buffer, 8)?;
    let track_id = read_u32(buffer, 12)?;

    Ok(TkhdBox {
        version,
        creation_time,
        modification_time,
        track_id,
    })
}
