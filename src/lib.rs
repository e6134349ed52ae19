//! Streaming track-metadata extraction for media containers.
//!
//! `extract_tracks` reads an MP4/ISO-BMFF or Matroska file in bounded
//! chunks, lets the bound parser re-seek into the file as it discovers
//! box/element boundaries, and resolves a list of [`Track`] descriptors
//! without loading the whole file into memory.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

mod error;
mod mkv;
mod mp4;
mod mp4box;
mod parser;
mod stream;

pub use error::Error;
pub use mp4box::{
    parse_box, parse_boxes, parse_hdlr_box, parse_mdhd_box, parse_stsd_box, parse_tkhd_box,
    BoxContainer, BoxIter, FourCC, HdlrBox, MdhdBox, SampleEntry, StsdBox, TkhdBox,
};
pub use parser::{Track, TrackKind};
pub use stream::{ByteStream, Chunk, DEFAULT_CHUNK_SIZE};

use parser::{AnyParser, Poll};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Total bytes that may be read across the whole operation before it
    /// fails with [`Error::QuotaExceeded`].
    pub max_bytes_limit: Option<u64>,
}

/// Extract the track list from the file at `path`.
pub fn extract_tracks<P: AsRef<Path>>(path: P, options: Options) -> Result<Vec<Track>> {
    let f = File::open(path)?;
    extract_tracks_from(BufReader::new(f), options)
}

/// Extract the track list from any seekable byte source.
///
/// Drives the decode loop: one chunk in flight at a time, signature
/// sniff on the first chunk, pause/reconfigure/resume for every re-seek
/// a parser requests, and stream destruction on completion and on every
/// failure path before the error surfaces.
pub fn extract_tracks_from<R: Read + Seek>(reader: R, options: Options) -> Result<Vec<Track>> {
    let mut stream = ByteStream::new(reader);
    let mut parser: Option<AnyParser> = None;

    loop {
        let chunk = match stream.poll() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                stream.destroy();
                return Err(e);
            }
        };

        if let Some(limit) = options.max_bytes_limit {
            if stream.bytes_read() >= limit {
                stream.destroy();
                return Err(Error::QuotaExceeded(limit));
            }
        }

        if parser.is_none() {
            parser = AnyParser::select(&chunk.data);
        }
        let active = match parser.as_mut() {
            Some(p) => p,
            None => {
                stream.destroy();
                return Err(Error::UnsupportedFormat);
            }
        };

        match active.decode(&chunk) {
            Ok(Poll::NeedChunk(req)) => {
                stream.pause();
                stream.set_offset(req.offset);
                stream.set_chunk_size(req.length.unwrap_or(DEFAULT_CHUNK_SIZE));
                stream.resume();
            }
            Ok(Poll::Done) => {
                stream.destroy();
                break;
            }
            Err(e) => {
                stream.destroy();
                return Err(e);
            }
        }
    }

    match parser {
        Some(p) => p.format(),
        None => Err(Error::UnsupportedFormat),
    }
}
