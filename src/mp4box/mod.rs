use byteorder::{BigEndian, ReadBytesExt};
use std::convert::TryInto;
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;

use crate::{Error, Result};

pub(crate) mod hdlr;
pub(crate) mod mdhd;
pub(crate) mod stsd;
pub(crate) mod tkhd;

pub use hdlr::{parse_hdlr_box, HdlrBox};
pub use mdhd::{parse_mdhd_box, MdhdBox};
pub use stsd::{parse_stsd_box, SampleEntry, StsdBox};
pub use tkhd::{parse_tkhd_box, TkhdBox};

pub const HEADER_SIZE: u64 = 8;
pub const HEADER_LARGE_SIZE: u64 = 16;

#[derive(Default, PartialEq, Eq, Clone, Copy)]
pub struct FourCC {
    pub value: [u8; 4],
}

impl From<[u8; 4]> for FourCC {
    fn from(value: [u8; 4]) -> FourCC {
        FourCC { value }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.value[..]))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.value[..]))
    }
}

/// One box plus its payload view.
///
/// `size` is the total box length including the 8- or 16-byte header;
/// `data_size` follows the declared-size convention and is always
/// `size - 8`, even for the 16-byte extended header form. For an
/// extended-size box the `data` view runs to the end of the loaded
/// buffer, since the true end may lie beyond it.
#[derive(Debug, Clone)]
pub struct BoxContainer {
    pub name: FourCC,
    pub size: u64,
    pub data: Bytes,
    pub data_size: u64,
    pub offset: u64,
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    let mut rdr = Cursor::new(buf);
    rdr.set_position(offset as u64);
    rdr.read_u16::<BigEndian>()
        .map_err(|_| Error::InvalidData("unexpected end of box payload"))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    let mut rdr = Cursor::new(buf);
    rdr.set_position(offset as u64);
    rdr.read_u32::<BigEndian>()
        .map_err(|_| Error::InvalidData("unexpected end of box payload"))
}

pub(crate) fn read_u64(buf: &[u8], offset: usize) -> Result<u64> {
    let mut rdr = Cursor::new(buf);
    rdr.set_position(offset as u64);
    rdr.read_u64::<BigEndian>()
        .map_err(|_| Error::InvalidData("unexpected end of box payload"))
}

pub(crate) fn read_byte(buf: &[u8], offset: usize) -> Result<u8> {
    buf.get(offset)
        .copied()
        .ok_or(Error::InvalidData("unexpected end of box payload"))
}

/// Parse one box header at `offset` and return it with its payload view.
///
/// A declared size of 1 switches to the 64-bit extended size at
/// `offset + 8` and a 16-byte header. A declared size of 0 ("extends to
/// end of file") is not supported and is rejected, as is any size below
/// the 8-byte header.
pub fn parse_box(buffer: &Bytes, offset: u64) -> Result<BoxContainer> {
    let off = offset as usize;

    let size32 = read_u32(buffer, off)?;
    let name: [u8; 4] = buffer
        .get(off + 4..off + 8)
        .ok_or(Error::InvalidData("unexpected end of box payload"))?
        .try_into()
        .unwrap();

    let (size, header_len) = if size32 == 1 {
        (read_u64(buffer, off + 8)?, HEADER_LARGE_SIZE as usize)
    } else {
        (size32 as u64, HEADER_SIZE as usize)
    };
    if size < HEADER_SIZE {
        return Err(Error::InvalidData("box size below header length"));
    }

    let data_start = off + header_len;
    let data_end = if size32 == 1 {
        buffer.len()
    } else {
        (off + size as usize).min(buffer.len())
    };
    let data = buffer.slice(data_start.min(data_end)..data_end);

    Ok(BoxContainer {
        name: FourCC::from(name),
        size,
        data,
        data_size: size - HEADER_SIZE,
        offset,
    })
}

/// Lazy sequence of the sibling boxes of `buffer`, in order.
///
/// Does not recurse; call again on a container box's `data` view to
/// descend. Traversal stops at the first malformed box.
pub fn parse_boxes(buffer: &Bytes) -> BoxIter {
    BoxIter {
        buffer: buffer.clone(),
        offset: 0,
    }
}

pub struct BoxIter {
    buffer: Bytes,
    offset: u64,
}

impl Iterator for BoxIter {
    type Item = Result<BoxContainer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.buffer.len() as u64 {
            return None;
        }
        match parse_box(&self.buffer, self.offset) {
            Ok(b) => {
                self.offset += b.size;
                Some(Ok(b))
            }
            Err(e) => {
                self.offset = self.buffer.len() as u64;
                Some(Err(e))
            }
        }
    }
}
