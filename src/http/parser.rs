use std::io::{self, Read};

use crate::http::body::BodyReader;
use crate::http::headers::Headers;
use crate::http::lines::{DEFAULT_CHUNK_SIZE, Lines};
use crate::http::request::{Method, Request};

/// Why a request head could not be parsed. Every variant is answered
/// with 400 Bad Request.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("request line missing")]
    RequestLineMissing,
    #[error("malformed request line {0:?}")]
    MalformedRequestLine(String),
    #[error("malformed header line {0:?}")]
    MalformedHeaderLine(String),
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// Reads and parses a request head from `reader`.
///
/// The returned request keeps `reader` inside its body reader, seeded
/// with any bytes that arrived together with the head.
pub fn parse_request<R: Read>(reader: R) -> Result<Request<R>, ParseError> {
    parse_request_with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
}

pub fn parse_request_with_chunk_size<R: Read>(
    reader: R,
    chunk_size: usize,
) -> Result<Request<R>, ParseError> {
    let mut lines = Lines::with_chunk_size(reader, chunk_size);

    // Request line
    let request_line = lines.next_line()?.ok_or(ParseError::RequestLineMissing)?;
    let (method, path, version) = split_request_line(&request_line)?;

    // Headers
    let mut headers = Headers::new();
    while let Some(line) = lines.next_line()? {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::MalformedHeaderLine(line.clone()))?;
        headers.add(name, value.trim_start());
    }

    let (reader, rest) = lines.into_parts();
    let body = BodyReader::with_chunk_size(reader, rest, chunk_size);

    Ok(Request {
        method: Method::parse(method),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    })
}

/// Splits `METHOD SP PATH SP VERSION` on single spaces; any other token
/// count is malformed.
fn split_request_line(line: &str) -> Result<(&str, &str, &str), ParseError> {
    let mut parts = line.split(' ');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(version), None) => Ok((method, path, version)),
        _ => Err(ParseError::MalformedRequestLine(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = &b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n"[..];

        let parsed = parse_request(req).unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.path, "/index.html");
        assert_eq!(parsed.headers.get("host"), Some("x"));
        assert_eq!(parsed.body.buffered(), 0);
    }

    #[test]
    fn request_line_token_count() {
        assert!(split_request_line("GET / HTTP/1.1").is_ok());
        assert!(split_request_line("GET /").is_err());
        assert!(split_request_line("GET / HTTP/1.1 extra").is_err());
        assert!(split_request_line("GET  / HTTP/1.1").is_err());
    }
}
