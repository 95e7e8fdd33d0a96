use std::io::{self, ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::http::lines::DEFAULT_CHUNK_SIZE;

/// Reads a request body off the connection, starting with whatever the
/// header reader had already pulled past the blank line.
///
/// Reads are stateful and never replayed: surplus bytes from one call
/// are served first by the next. A peer that closes early produces a
/// short read, not an error.
pub struct BodyReader<R> {
    reader: R,
    buf: BytesMut,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> BodyReader<R> {
    pub fn new(reader: R, buffered: impl AsRef<[u8]>) -> Self {
        Self::with_chunk_size(reader, buffered, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, buffered: impl AsRef<[u8]>, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: BytesMut::from(buffered.as_ref()),
            chunk_size: chunk_size.max(1),
            eof: false,
        }
    }

    /// Returns up to `n` bytes, reading from the connection only when the
    /// buffer holds fewer than `n`.
    ///
    /// The result is shorter than `n` only if the peer closed the stream.
    pub fn read(&mut self, n: usize) -> io::Result<Bytes> {
        let mut chunk = Vec::new();
        while self.buf.len() < n && !self.eof {
            if chunk.is_empty() {
                chunk.resize(self.chunk_size, 0);
            }
            match self.reader.read(&mut chunk) {
                Ok(0) => self.eof = true,
                Ok(read) => self.buf.extend_from_slice(&chunk[..read]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let take = n.min(self.buf.len());
        Ok(self.buf.split_to(take).freeze())
    }

    /// Number of bytes already buffered and not yet returned.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }
}

impl<R: Read> Read for BodyReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.buf.is_empty() && !self.eof {
            return self.reader.read(out);
        }
        let n = out.len().min(self.buf.len());
        out[..n].copy_from_slice(&self.buf.split_to(n));
        Ok(n)
    }
}

impl<R> std::fmt::Debug for BodyReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader")
            .field("buffered", &self.buf.len())
            .field("eof", &self.eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_buffer_before_connection() {
        let mut body = BodyReader::new(&b"cdef"[..], b"ab");

        assert_eq!(&body.read(5).unwrap()[..], b"abcde");
        assert_eq!(&body.read(1).unwrap()[..], b"f");
    }

    #[test]
    fn short_read_on_early_close() {
        let mut body = BodyReader::new(&b"xy"[..], b"");

        assert_eq!(&body.read(10).unwrap()[..], b"xy");
        assert!(body.read(1).unwrap().is_empty());
    }
}
