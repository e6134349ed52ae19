use crate::mp4box::{
    parse_box, parse_boxes, parse_hdlr_box, parse_mdhd_box, parse_stsd_box, parse_tkhd_box,
    read_u32, BoxContainer, HdlrBox, MdhdBox, StsdBox, TkhdBox, HEADER_LARGE_SIZE, HEADER_SIZE,
};
use crate::parser::{ChunkRequest, Poll, Track, TrackKind};
use crate::stream::Chunk;
use crate::{Error, Result};

/// ISO-BMFF parser: walks top-level boxes chunk by chunk, re-seeking for
/// any track-relevant box that spills past the loaded buffer and skipping
/// past everything else, until the `moov` tree has been consumed.
pub(crate) struct Mp4Parser {
    traks: Vec<TrakState>,
    moov_done: bool,
    last_request: Option<ChunkRequest>,
}

/// Track-defining boxes gathered per `trak` container.
#[derive(Default)]
struct TrakState {
    tkhd: Option<TkhdBox>,
    mdhd: Option<MdhdBox>,
    hdlr: Option<HdlrBox>,
    stsd: Option<StsdBox>,
}

impl Mp4Parser {
    pub fn new() -> Self {
        Mp4Parser {
            traks: Vec::new(),
            moov_done: false,
            last_request: None,
        }
    }

    /// Signature test: the tag of the first top-level box, bytes 4..8.
    pub fn sniff(chunk: &[u8]) -> bool {
        chunk.len() >= 8 && &chunk[4..8] == b"ftyp"
    }

    pub fn decode(&mut self, chunk: &Chunk) -> Result<Poll> {
        let buf = &chunk.data;
        let len = buf.len() as u64;
        let mut offset = 0u64;

        while offset < len {
            if len - offset < HEADER_SIZE {
                // partial header at the chunk tail
                return self.request(chunk.offset + offset, None);
            }
            if read_u32(buf, offset as usize)? == 1 && len - offset < HEADER_LARGE_SIZE {
                // the 16-byte extended-size header straddles the tail
                return self.request(chunk.offset + offset, None);
            }

            let bx = parse_box(buf, offset)?;
            let spilled = offset + bx.size > len;

            if &bx.name.value == b"moov" {
                if spilled {
                    // fetch the whole container at its own offset
                    return self.request(chunk.offset + offset, Some(bx.size));
                }
                self.walk_moov(&bx)?;
                self.moov_done = true;
                return Ok(Poll::Done);
            }

            if spilled {
                // mdat and friends: jump straight past them
                return self.request(chunk.offset + offset + bx.size, None);
            }
            offset += bx.size;
        }

        // end of buffer with nothing pending: keep scanning forward
        self.request(chunk.offset + len, None)
    }

    pub fn format(self) -> Result<Vec<Track>> {
        if !self.moov_done {
            return Err(Error::InvalidData("no movie box before end of stream"));
        }

        let tracks = self
            .traks
            .into_iter()
            .map(|trak| {
                let tkhd = trak.tkhd.unwrap_or_default();
                let language = trak
                    .mdhd
                    .map(|m| m.language)
                    .unwrap_or_else(|| String::from("und"));
                let (kind, name) = match trak.hdlr {
                    Some(h) => (TrackKind::from_handler(&h.handler_type), h.name),
                    None => (TrackKind::Other, String::new()),
                };
                let codec = trak
                    .stsd
                    .and_then(|s| s.entries.into_iter().next().map(|e| e.name))
                    .unwrap_or_default();

                Track {
                    id: tkhd.track_id as u64,
                    kind,
                    codec,
                    language,
                    name,
                    creation_time: tkhd.creation_time as u64,
                    modification_time: tkhd.modification_time as u64,
                }
            })
            .collect();

        Ok(tracks)
    }

    /// Issue a re-seek request, refusing to repeat the identical request:
    /// a repeat means the source could not grow the window, i.e. the box
    /// runs past end of file.
    fn request(&mut self, offset: u64, length: Option<u64>) -> Result<Poll> {
        let req = ChunkRequest { offset, length };
        if self.last_request == Some(req) {
            return Err(Error::InvalidData("box extends beyond end of stream"));
        }
        self.last_request = Some(req);
        Ok(Poll::NeedChunk(req))
    }

    fn walk_moov(&mut self, moov: &BoxContainer) -> Result<()> {
        for child in parse_boxes(&moov.data) {
            let child = child?;
            if &child.name.value == b"trak" {
                let trak = Self::walk_trak(&child)?;
                self.traks.push(trak);
            }
        }
        Ok(())
    }

    fn walk_trak(trak: &BoxContainer) -> Result<TrakState> {
        let mut state = TrakState::default();
        for child in parse_boxes(&trak.data) {
            let child = child?;
            match &child.name.value {
                b"tkhd" => state.tkhd = Some(parse_tkhd_box(&child.data)?),
                b"mdia" => Self::walk_mdia(&child, &mut state)?,
                _ => {}
            }
        }
        Ok(state)
    }

    fn walk_mdia(mdia: &BoxContainer, state: &mut TrakState) -> Result<()> {
        for child in parse_boxes(&mdia.data) {
            let child = child?;
            match &child.name.value {
                b"mdhd" => state.mdhd = Some(parse_mdhd_box(&child.data)?),
                b"hdlr" => state.hdlr = Some(parse_hdlr_box(&child.data)?),
                b"minf" => Self::walk_minf(&child, state)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn walk_minf(minf: &BoxContainer, state: &mut TrakState) -> Result<()> {
        for child in parse_boxes(&minf.data) {
            let child = child?;
            if &child.name.value == b"stbl" {
                for grandchild in parse_boxes(&child.data) {
                    let grandchild = grandchild?;
                    if &grandchild.name.value == b"stsd" {
                        state.stsd = Some(parse_stsd_box(&grandchild.data)?);
                    }
                }
            }
        }
        Ok(())
    }
}
