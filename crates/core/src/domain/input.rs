// Standard input payload for a command

use std::fmt;
use std::io::{self, Read};

/// Data piped into the child's stdin
///
/// In-memory payloads can be replayed with [`rewind`](Self::rewind); a reader
/// is consumed by the first run.
pub struct InputSource {
    source: Source,
}

enum Source {
    /// Payload written from `offset` onwards; `offset <= data.len()`
    Bytes { data: Vec<u8>, offset: usize },
    Reader(Box<dyn Read + Send>),
}

impl InputSource {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            source: Source::Bytes {
                data: data.into(),
                offset: 0,
            },
        }
    }

    /// Streaming source such as an open file
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            source: Source::Reader(Box::new(reader)),
        }
    }

    /// Start an in-memory payload over from its first byte
    pub fn rewind(&mut self) {
        if let Source::Bytes { offset, .. } = &mut self.source {
            *offset = 0;
        }
    }

    pub fn is_replayable(&self) -> bool {
        matches!(self.source, Source::Bytes { .. })
    }

    /// Fill `buf` with the next chunk; `Ok(0)` means the source is exhausted
    pub fn next_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Bytes { data, offset } => {
                let remaining = &data[*offset..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *offset += n;
                Ok(n)
            }
            Source::Reader(reader) => loop {
                match reader.read(buf) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => return other,
                }
            },
        }
    }

    /// Copy everything that is left into `writer`
    pub fn copy_all(&mut self, writer: &mut impl io::Write) -> io::Result<u64> {
        match &mut self.source {
            Source::Bytes { data, offset } => {
                let remaining = &data[*offset..];
                writer.write_all(remaining)?;
                *offset = data.len();
                Ok(remaining.len() as u64)
            }
            Source::Reader(reader) => io::copy(reader, writer),
        }
    }
}

impl From<&str> for InputSource {
    fn from(s: &str) -> Self {
        InputSource::bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for InputSource {
    fn from(s: String) -> Self {
        InputSource::bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for InputSource {
    fn from(data: Vec<u8>) -> Self {
        InputSource::bytes(data)
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Bytes { data, offset } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("offset", offset)
                .finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bytes_chunks_until_exhausted() {
        let mut input = InputSource::from("abcdef");
        let mut buf = [0u8; 4];

        assert_eq!(input.next_chunk(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(input.next_chunk(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(input.next_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_reader_copy_all() {
        let mut input = InputSource::reader(Cursor::new(b"streamed".to_vec()));
        let mut sink = Vec::new();

        assert_eq!(input.copy_all(&mut sink).unwrap(), 8);
        assert_eq!(sink, b"streamed");
        assert!(!input.is_replayable());
    }

    #[test]
    fn test_rewind_replays_bytes() {
        let mut input = InputSource::from("payload");
        let mut first = Vec::new();
        input.copy_all(&mut first).unwrap();

        let mut drained = Vec::new();
        assert_eq!(input.copy_all(&mut drained).unwrap(), 0);

        input.rewind();
        let mut second = Vec::new();
        input.copy_all(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rewind_after_partial_chunk() {
        let mut input = InputSource::from("abcdef");
        let mut buf = [0u8; 4];
        input.next_chunk(&mut buf).unwrap();

        input.rewind();
        let mut all = Vec::new();
        input.copy_all(&mut all).unwrap();
        assert_eq!(all, b"abcdef");
    }

    #[test]
    fn test_rewind_leaves_reader_consumed() {
        let mut input = InputSource::reader(Cursor::new(b"once".to_vec()));
        let mut sink = Vec::new();
        input.copy_all(&mut sink).unwrap();

        input.rewind();
        let mut again = Vec::new();
        assert_eq!(input.copy_all(&mut again).unwrap(), 0);
    }
}
