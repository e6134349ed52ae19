use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::Result;

/// Chunk length used whenever a re-seek does not ask for a specific window.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// One delivered byte window, tagged with its absolute start offset so
/// parsers can issue absolute re-seek requests against it.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub offset: u64,
    pub data: Bytes,
}

/// Pausable, resumable, re-seekable chunk delivery over a seekable source.
///
/// The evented interface of a push stream is rendered as a synchronous
/// poll: `Ok(Some(chunk))` is a data delivery, `Ok(None)` is close (end of
/// source, or the stream is paused/destroyed), `Err` is a stream error.
/// Reconfiguring the window with `set_offset`/`set_chunk_size` while
/// paused and then resuming is the sole random-access mechanism.
#[derive(Debug)]
pub struct ByteStream<R> {
    reader: R,
    bytes_offset: u64,
    chunk_size: u64,
    bytes_read: u64,
    running: bool,
    destroyed: bool,
}

impl<R: Read + Seek> ByteStream<R> {
    pub fn new(reader: R) -> Self {
        ByteStream {
            reader,
            bytes_offset: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            bytes_read: 0,
            running: true,
            destroyed: false,
        }
    }

    /// Suspend delivery. Safe to call at any time; idempotent.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Re-arm delivery from the currently configured window.
    pub fn resume(&mut self) {
        if !self.destroyed {
            self.running = true;
        }
    }

    /// Start offset of the next delivered window. Only legal while paused.
    pub fn set_offset(&mut self, offset: u64) {
        self.bytes_offset = offset;
    }

    /// Length of the next delivered window. Only legal while paused.
    pub fn set_chunk_size(&mut self, size: u64) {
        self.chunk_size = size;
    }

    /// Stop all further deliveries. Idempotent; the only early exit.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.running = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Total bytes delivered since the stream was created.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Deliver the next window `[offset, offset + chunk_size)`, advancing
    /// the offset past the delivered bytes. Short reads at end of source
    /// deliver whatever is available; a zero-length read is close.
    pub fn poll(&mut self) -> Result<Option<Chunk>> {
        if self.destroyed || !self.running {
            return Ok(None);
        }

        // the configured length is an upper bound only; allocation is
        // capped by the bytes actually remaining in the source
        let end = self.reader.seek(SeekFrom::End(0))?;
        let want = self.chunk_size.min(end.saturating_sub(self.bytes_offset));
        if want == 0 {
            return Ok(None);
        }

        self.reader.seek(SeekFrom::Start(self.bytes_offset))?;

        let mut buf = vec![0u8; want as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let offset = self.bytes_offset;
        self.bytes_offset += filled as u64;
        self.bytes_read += filled as u64;

        Ok(Some(Chunk {
            offset,
            data: Bytes::from(buf),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sequential_delivery() {
        let data: Vec<u8> = (0..32u8).collect();
        let mut stream = ByteStream::new(Cursor::new(data));
        stream.pause();
        stream.set_chunk_size(16);
        stream.resume();

        let first = stream.poll().unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(&first.data[..], &(0..16u8).collect::<Vec<u8>>()[..]);

        let second = stream.poll().unwrap().unwrap();
        assert_eq!(second.offset, 16);
        assert_eq!(stream.bytes_read(), 32);

        assert!(stream.poll().unwrap().is_none());
    }

    #[test]
    fn test_reseek_window() {
        let data: Vec<u8> = (0..64u8).collect();
        let mut stream = ByteStream::new(Cursor::new(data));

        stream.pause();
        stream.set_offset(40);
        stream.set_chunk_size(8);
        stream.resume();

        let chunk = stream.poll().unwrap().unwrap();
        assert_eq!(chunk.offset, 40);
        assert_eq!(&chunk.data[..], &[40, 41, 42, 43, 44, 45, 46, 47]);
    }

    #[test]
    fn test_window_capped_at_source_end() {
        // a configured length far beyond the source must not be
        // allocated up front
        let mut stream = ByteStream::new(Cursor::new(vec![7u8; 16]));
        stream.pause();
        stream.set_offset(4);
        stream.set_chunk_size(1 << 62);
        stream.resume();

        let chunk = stream.poll().unwrap().unwrap();
        assert_eq!(chunk.offset, 4);
        assert_eq!(chunk.data.len(), 12);
        assert!(stream.poll().unwrap().is_none());
    }

    #[test]
    fn test_paused_delivers_nothing() {
        let mut stream = ByteStream::new(Cursor::new(vec![0u8; 8]));
        stream.pause();
        assert!(stream.poll().unwrap().is_none());
        stream.resume();
        assert!(stream.poll().unwrap().is_some());
    }

    #[test]
    fn test_destroy_idempotent() {
        let mut stream = ByteStream::new(Cursor::new(vec![0u8; 8]));
        assert!(stream.poll().unwrap().is_some());

        stream.destroy();
        stream.destroy();
        assert!(stream.is_destroyed());
        assert!(stream.poll().unwrap().is_none());
        assert!(stream.poll().unwrap().is_none());
        assert_eq!(stream.bytes_read(), 8);

        // resume after destroy must not re-arm delivery
        stream.resume();
        assert!(stream.poll().unwrap().is_none());
    }
}
