use std::io::{self, Read};

use wicket::http::body::BodyReader;
use wicket::http::lines::Lines;

/// Returns one byte per read, like a peer dribbling a request in.
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match self.0.split_first() {
            Some((&b, rest)) if !out.is_empty() => {
                out[0] = b;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[test]
fn test_lines_iterator_collects_until_blank_line() {
    let mut lines = Lines::new(&b"one\r\ntwo\r\n\r\nleft over"[..]);
    let collected: Vec<String> = lines.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(collected, vec!["one", "two"]);
    assert!(lines.terminated());
    assert_eq!(lines.remainder(), Some(&b"left over"[..]));
    assert!(lines.next().is_none());
}

#[test]
fn test_lines_trickled_input_matches_bulk_input() {
    let raw = b"a\r\nbb\r\nccc\r\n\r\n";
    let bulk: Vec<String> = Lines::new(&raw[..]).collect::<Result<_, _>>().unwrap();
    let trickled: Vec<String> = Lines::new(Trickle(raw)).collect::<Result<_, _>>().unwrap();

    assert_eq!(bulk, trickled);
    assert_eq!(bulk, vec!["a", "bb", "ccc"]);
}

#[test]
fn test_lines_lone_cr_and_lf_are_not_terminators() {
    let mut lines = Lines::new(&b"a\rb\nc\r\n\r\n"[..]);

    assert_eq!(lines.next_line().unwrap().as_deref(), Some("a\rb\nc"));
    assert_eq!(lines.next_line().unwrap(), None);
}

#[test]
fn test_lines_remainder_only_after_exhaustion() {
    let mut lines = Lines::new(&b"x\r\n\r\nbody"[..]);

    assert!(lines.remainder().is_none());
    lines.next_line().unwrap();
    assert!(lines.remainder().is_none());
    lines.next_line().unwrap();
    assert_eq!(lines.remainder(), Some(&b"body"[..]));

    let (_, rest) = lines.into_parts();
    assert_eq!(&rest[..], b"body");
}

#[test]
fn test_lines_closed_stream_discards_partial_line() {
    let mut lines = Lines::new(&b"complete\r\nincompl"[..]);

    assert_eq!(lines.next_line().unwrap().as_deref(), Some("complete"));
    assert_eq!(lines.next_line().unwrap(), None);
    assert!(!lines.terminated());

    let (_, rest) = lines.into_parts();
    assert!(rest.is_empty());
}

#[test]
fn test_body_reader_buffer_then_connection() {
    let mut body = BodyReader::new(&b"cdef"[..], b"ab");

    assert_eq!(&body.read(5).unwrap()[..], b"abcde");
    assert_eq!(&body.read(1).unwrap()[..], b"f");
    assert!(body.read(1).unwrap().is_empty());
}

#[test]
fn test_body_reader_does_not_read_when_buffer_suffices() {
    // A reader that fails would surface an error if touched.
    struct Untouchable;
    impl Read for Untouchable {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("should not be read"))
        }
    }

    let mut body = BodyReader::new(Untouchable, b"abcdef");
    assert_eq!(&body.read(4).unwrap()[..], b"abcd");
    assert_eq!(body.buffered(), 2);
}

#[test]
fn test_body_reader_short_read_on_close() {
    let mut body = BodyReader::new(Trickle(b"123"), b"");
    assert_eq!(&body.read(10).unwrap()[..], b"123");
}

#[test]
fn test_body_reader_as_io_read() {
    let mut body = BodyReader::new(&b"world"[..], b"hello ");
    let mut out = String::new();
    body.read_to_string(&mut out).unwrap();

    assert_eq!(out, "hello world");
}
