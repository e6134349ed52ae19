use std::fmt;

use crate::mkv::MkvParser;
use crate::mp4::Mp4Parser;
use crate::mp4box::FourCC;
use crate::stream::Chunk;
use crate::Result;

/// Absolute byte window a parser wants delivered next. `None` length
/// means the default chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkRequest {
    pub offset: u64,
    pub length: Option<u64>,
}

/// Outcome of feeding one chunk to a parser: either it needs another
/// window (pause, reconfigure, resume), or its decoded state is complete
/// and streaming can stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Poll {
    NeedChunk(ChunkRequest),
    Done,
}

const DISPLAY_KIND_VIDEO: &str = "Video";
const DISPLAY_KIND_AUDIO: &str = "Audio";
const DISPLAY_KIND_SUBTITLE: &str = "Subtitle";
const DISPLAY_KIND_OTHER: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl TrackKind {
    pub(crate) fn from_handler(handler: &FourCC) -> TrackKind {
        match &handler.value {
            b"vide" => TrackKind::Video,
            b"soun" => TrackKind::Audio,
            b"sbtl" | b"subt" => TrackKind::Subtitle,
            _ => TrackKind::Other,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TrackKind::Video => DISPLAY_KIND_VIDEO,
            TrackKind::Audio => DISPLAY_KIND_AUDIO,
            TrackKind::Subtitle => DISPLAY_KIND_SUBTITLE,
            TrackKind::Other => DISPLAY_KIND_OTHER,
        };
        write!(f, "{}", s)
    }
}

/// Final, read-only track descriptor. Assembled once, at the terminal
/// format step; timestamps are surfaced raw in the container's epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: u64,
    pub kind: TrackKind,
    pub codec: String,
    pub language: String,
    pub name: String,
    pub creation_time: u64,
    pub modification_time: u64,
}

/// The fixed, ordered candidate list: the first parser whose signature
/// check matches the opening chunk is bound for the whole operation.
pub(crate) enum AnyParser {
    Mkv(MkvParser),
    Mp4(Mp4Parser),
}

impl AnyParser {
    pub fn select(chunk: &[u8]) -> Option<AnyParser> {
        if MkvParser::sniff(chunk) {
            Some(AnyParser::Mkv(MkvParser::new()))
        } else if Mp4Parser::sniff(chunk) {
            Some(AnyParser::Mp4(Mp4Parser::new()))
        } else {
            None
        }
    }

    pub fn decode(&mut self, chunk: &Chunk) -> Result<Poll> {
        match self {
            AnyParser::Mkv(p) => p.decode(chunk),
            AnyParser::Mp4(p) => p.decode(chunk),
        }
    }

    pub fn format(self) -> Result<Vec<Track>> {
        match self {
            AnyParser::Mkv(p) => p.format(),
            AnyParser::Mp4(p) => p.format(),
        }
    }
}
