use std::fmt;
use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::http::headers::Headers;
use crate::http::writer;

/// HTTP status codes the server emits.
///
/// - `Continue` (100): Interim answer to `Expect: 100-continue`
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 100 Continue
    Continue,
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use wicket::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Continue => 100,
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Continue => "Continue",
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }

    /// 1xx responses carry neither a body nor a Content-Length.
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// What follows the response head.
pub enum Body {
    Empty,
    Content(Bytes),
    /// A streamed source, with its length when known up front.
    Reader {
        source: Box<dyn Read + Send>,
        len: Option<u64>,
    },
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Content(bytes) => f.debug_tuple("Content").field(&bytes.len()).finish(),
            Body::Reader { len, .. } => f.debug_struct("Reader").field("len", len).finish(),
        }
    }
}

/// A complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("content-type", "text/html")
///     .body_reader(file, Some(len))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Appends a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(key, value);
        self
    }

    /// Replaces the header set.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets an inline body.
    pub fn content(mut self, content: impl Into<Bytes>) -> Self {
        self.body = Body::Content(content.into());
        self
    }

    /// Streams the body from `source` when the response is sent.
    pub fn body_reader(mut self, source: impl Read + Send + 'static, len: Option<u64>) -> Self {
        self.body = Body::Reader {
            source: Box::new(source),
            len,
        };
        self
    }

    /// Builds the final Response.
    ///
    /// Adds Content-Length when the body size is known and the header is
    /// not already present.
    pub fn build(mut self) -> Response {
        if !self.status.is_informational() && !self.headers.contains("Content-Length") {
            let len = match &self.body {
                Body::Empty => Some(0),
                Body::Content(bytes) => Some(bytes.len() as u64),
                Body::Reader { len, .. } => *len,
            };
            if let Some(len) = len {
                self.headers.add("Content-Length", len.to_string());
            }
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a simple 200 OK response with the given body.
    pub fn ok(content: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Ok).content(content).build()
    }

    /// The interim answer to `Expect: 100-continue`.
    pub fn continue_() -> Self {
        ResponseBuilder::new(StatusCode::Continue).build()
    }

    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .content("Bad Request")
            .build()
    }

    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .content("Not Found")
            .build()
    }

    pub fn method_not_allowed() -> Self {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .content("Method Not Allowed")
            .build()
    }

    /// Serializes the response onto `conn` and flushes it.
    pub fn send<W: Write>(self, conn: &mut W) -> io::Result<()> {
        writer::write_response(conn, self)
    }
}
