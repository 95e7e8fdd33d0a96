use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::http::parser::ParseError;

/// Default number of bytes requested from the connection per read.
pub const DEFAULT_CHUNK_SIZE: usize = 16_384;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    /// The blank line was seen; the buffer holds the remainder.
    Terminated,
    /// The peer closed the stream before a blank line arrived.
    Closed,
}

/// Lazy sequence of CRLF-delimited lines read off a connection.
///
/// Yields each non-empty line with its terminator stripped and ends at
/// the first empty line or at end-of-stream. Bytes read past the blank
/// line are not lost: once the sequence is exhausted they are available
/// through [`Lines::remainder`] or [`Lines::into_parts`].
///
/// ```text
///   "GET / HTTP/1.1\r\nHost: x\r\n\r\nbody..."
///    └──── line ────┘ └ line ┘ └┘ └ remainder ┘
/// ```
pub struct Lines<R> {
    reader: R,
    buf: BytesMut,
    /// Offset up to which `buf` is known not to contain a CRLF.
    scanned: usize,
    chunk_size: usize,
    state: State,
}

impl<R: Read> Lines<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(chunk_size),
            scanned: 0,
            chunk_size: chunk_size.max(1),
            state: State::Reading,
        }
    }

    /// Reads until the next complete line is available.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted; every later
    /// call keeps returning `Ok(None)`.
    pub fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        if self.state != State::Reading {
            return Ok(None);
        }

        loop {
            if let Some(end) = self.find_crlf() {
                let line = self.buf.split_to(end);
                self.buf.advance(CRLF.len());
                self.scanned = 0;

                if line.is_empty() {
                    self.state = State::Terminated;
                    return Ok(None);
                }

                let line = String::from_utf8(line.to_vec()).map_err(|_| ParseError::InvalidEncoding)?;
                return Ok(Some(line));
            }

            if self.fill()? == 0 {
                self.state = State::Closed;
                self.buf.clear();
                return Ok(None);
            }
        }
    }

    /// Whether the sequence ended on a blank line rather than end-of-stream.
    pub fn terminated(&self) -> bool {
        self.state == State::Terminated
    }

    /// Bytes read past the blank line; `None` until the sequence is exhausted.
    /// Empty when the stream closed early.
    pub fn remainder(&self) -> Option<&[u8]> {
        match self.state {
            State::Reading => None,
            State::Terminated | State::Closed => Some(&self.buf[..]),
        }
    }

    /// Gives back the underlying reader and whatever was left unconsumed.
    ///
    /// Only meaningful once the sequence is exhausted.
    pub fn into_parts(self) -> (R, Bytes) {
        (self.reader, self.buf.freeze())
    }

    fn find_crlf(&mut self) -> Option<usize> {
        // A CR at the very end of the last scan may pair with a fresh LF.
        let start = self.scanned.saturating_sub(1);
        match find_crlf(&self.buf[start..]) {
            Some(i) => Some(start + i),
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    fn fill(&mut self) -> Result<usize, ParseError> {
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e)),
            }
        }
    }
}

impl<R: Read> Iterator for Lines<R> {
    type Item = Result<String, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// Position of the first CRLF in `buf`, or `None` if more data is needed.
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_crlf_reports_missing_terminator() {
        assert_eq!(find_crlf(b"abc\r\n"), Some(3));
        assert_eq!(find_crlf(b"abc\r"), None);
        assert_eq!(find_crlf(b""), None);
    }

    #[test]
    fn yields_lines_then_remainder() {
        let mut lines = Lines::new(&b"a\r\nb\r\n\r\nrest"[..]);

        assert_eq!(lines.next_line().unwrap().as_deref(), Some("a"));
        assert!(lines.remainder().is_none());
        assert_eq!(lines.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(lines.next_line().unwrap(), None);
        assert!(lines.terminated());
        assert_eq!(lines.remainder(), Some(&b"rest"[..]));
    }

    #[test]
    fn early_close_leaves_empty_remainder() {
        let mut lines = Lines::new(&b"a\r\npartial"[..]);

        assert_eq!(lines.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(lines.next_line().unwrap(), None);
        assert!(!lines.terminated());
        assert_eq!(lines.remainder(), Some(&b""[..]));
    }
}
