use crate::parser::{ChunkRequest, Poll, Track, TrackKind};
use crate::stream::Chunk;
use crate::{Error, Result};

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

const ID_SEGMENT: u32 = 0x1853_8067;
const ID_TRACKS: u32 = 0x1654_AE6B;
const ID_TRACK_ENTRY: u32 = 0xAE;
const ID_TRACK_NUMBER: u32 = 0xD7;
const ID_TRACK_TYPE: u32 = 0x83;
const ID_CODEC_ID: u32 = 0x86;
const ID_LANGUAGE: u32 = 0x0022_B59C;
const ID_NAME: u32 = 0x536E;

const TRACK_TYPE_VIDEO: u64 = 0x01;
const TRACK_TYPE_AUDIO: u64 = 0x02;
const TRACK_TYPE_SUBTITLE: u64 = 0x11;

/// Matroska/WebM parser: the sibling container family. Walks EBML
/// elements (variable-width ids and sizes), descends into the Segment,
/// and decodes the Tracks element; everything else is skipped over.
pub(crate) struct MkvParser {
    entries: Vec<TrackEntry>,
    tracks_done: bool,
    last_request: Option<ChunkRequest>,
}

struct TrackEntry {
    number: u64,
    kind: u64,
    codec_id: String,
    language: String,
    name: String,
}

impl Default for TrackEntry {
    fn default() -> Self {
        TrackEntry {
            number: 0,
            kind: 0,
            codec_id: String::new(),
            // Matroska's default when the element is absent
            language: String::from("eng"),
            name: String::new(),
        }
    }
}

struct Element {
    id: u32,
    size: Option<u64>,
    header_len: usize,
}

impl MkvParser {
    pub fn new() -> Self {
        MkvParser {
            entries: Vec::new(),
            tracks_done: false,
            last_request: None,
        }
    }

    pub fn sniff(chunk: &[u8]) -> bool {
        chunk.len() >= 4 && chunk[..4] == EBML_MAGIC
    }

    pub fn decode(&mut self, chunk: &Chunk) -> Result<Poll> {
        let buf = &chunk.data[..];
        let len = buf.len();
        let mut offset = 0usize;

        while offset < len {
            let el = match read_element(buf, offset)? {
                Some(el) => el,
                // partial element header at the chunk tail
                None => return self.request(chunk.offset + offset as u64, None),
            };
            let payload = offset + el.header_len;

            match el.id {
                // the Segment wraps everything else; descend instead of skipping
                ID_SEGMENT => offset = payload,
                ID_TRACKS => {
                    let size = el
                        .size
                        .ok_or(Error::InvalidData("tracks element without a size"))?;
                    if payload as u64 + size > len as u64 {
                        return self.request(
                            chunk.offset + offset as u64,
                            Some(el.header_len as u64 + size),
                        );
                    }
                    self.parse_tracks(&buf[payload..payload + size as usize])?;
                    self.tracks_done = true;
                    return Ok(Poll::Done);
                }
                _ => match el.size {
                    Some(size) => {
                        let end = payload as u64 + size;
                        if end > len as u64 {
                            return self.request(chunk.offset + end, None);
                        }
                        offset = end as usize;
                    }
                    None => {
                        return Err(Error::InvalidData("cannot skip unknown-sized element"))
                    }
                },
            }
        }

        self.request(chunk.offset + len as u64, None)
    }

    pub fn format(self) -> Result<Vec<Track>> {
        if !self.tracks_done {
            return Err(Error::InvalidData("no tracks element before end of stream"));
        }

        let tracks = self
            .entries
            .into_iter()
            .map(|entry| {
                let kind = match entry.kind {
                    TRACK_TYPE_VIDEO => TrackKind::Video,
                    TRACK_TYPE_AUDIO => TrackKind::Audio,
                    TRACK_TYPE_SUBTITLE => TrackKind::Subtitle,
                    _ => TrackKind::Other,
                };
                Track {
                    id: entry.number,
                    kind,
                    codec: entry.codec_id,
                    language: entry.language,
                    name: entry.name,
                    creation_time: 0,
                    modification_time: 0,
                }
            })
            .collect();

        Ok(tracks)
    }

    fn request(&mut self, offset: u64, length: Option<u64>) -> Result<Poll> {
        let req = ChunkRequest { offset, length };
        if self.last_request == Some(req) {
            return Err(Error::InvalidData("element extends beyond end of stream"));
        }
        self.last_request = Some(req);
        Ok(Poll::NeedChunk(req))
    }

    fn parse_tracks(&mut self, buf: &[u8]) -> Result<()> {
        each_element(buf, |id, payload| {
            if id == ID_TRACK_ENTRY {
                let mut entry = TrackEntry::default();
                each_element(payload, |id, payload| {
                    match id {
                        ID_TRACK_NUMBER => entry.number = read_uint(payload)?,
                        ID_TRACK_TYPE => entry.kind = read_uint(payload)?,
                        ID_CODEC_ID => entry.codec_id = read_string(payload),
                        ID_LANGUAGE => entry.language = read_string(payload),
                        ID_NAME => entry.name = read_string(payload),
                        _ => {}
                    }
                    Ok(())
                })?;
                self.entries.push(entry);
            }
            Ok(())
        })
    }
}

fn vint_width(first: u8) -> Result<usize> {
    if first == 0 {
        return Err(Error::InvalidData("invalid ebml varint"));
    }
    Ok(first.leading_zeros() as usize + 1)
}

/// Read one element header at `offset`. `Ok(None)` means the buffer ends
/// mid-header and more data is needed; an element whose size field holds
/// the all-ones pattern has unknown extent (`size: None`).
fn read_element(buf: &[u8], offset: usize) -> Result<Option<Element>> {
    let first = match buf.get(offset) {
        Some(b) => *b,
        None => return Ok(None),
    };
    let id_width = vint_width(first)?;
    if id_width > 4 {
        return Err(Error::InvalidData("ebml element id wider than 4 bytes"));
    }
    if offset + id_width > buf.len() {
        return Ok(None);
    }
    // ids keep their length-marker bit
    let mut id: u32 = 0;
    for i in 0..id_width {
        id = (id << 8) | buf[offset + i] as u32;
    }

    let size_pos = offset + id_width;
    let size_first = match buf.get(size_pos) {
        Some(b) => *b,
        None => return Ok(None),
    };
    let size_width = vint_width(size_first)?;
    if size_width > 8 {
        return Err(Error::InvalidData("ebml element size wider than 8 bytes"));
    }
    if size_pos + size_width > buf.len() {
        return Ok(None);
    }
    // sizes strip the marker bit
    let mut size: u64 = size_first as u64 & (0xFFu64 >> size_width);
    for i in 1..size_width {
        size = (size << 8) | buf[size_pos + i] as u64;
    }
    let unknown = size == (1u64 << (7 * size_width)) - 1;

    Ok(Some(Element {
        id,
        size: if unknown { None } else { Some(size) },
        header_len: id_width + size_width,
    }))
}

/// Walk the sibling elements of a fully loaded payload.
fn each_element(buf: &[u8], mut f: impl FnMut(u32, &[u8]) -> Result<()>) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        let el = read_element(buf, offset)?
            .ok_or(Error::InvalidData("truncated ebml element"))?;
        let size = el
            .size
            .ok_or(Error::InvalidData("unknown-sized ebml element"))? as usize;
        let start = offset + el.header_len;
        let end = start + size;
        if end > buf.len() {
            return Err(Error::InvalidData("truncated ebml element"));
        }
        f(el.id, &buf[start..end])?;
        offset = end;
    }
    Ok(())
}

fn read_uint(buf: &[u8]) -> Result<u64> {
    if buf.len() > 8 {
        return Err(Error::InvalidData("ebml integer wider than 8 bytes"));
    }
    let mut value = 0u64;
    for b in buf {
        value = (value << 8) | *b as u64;
    }
    Ok(value)
}

fn read_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .to_string()
}
