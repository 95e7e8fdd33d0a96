use std::io::{self, Write};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Status line, headers and the blank separator line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes the head followed by the body, streaming reader bodies.
pub fn write_response<W: Write>(conn: &mut W, resp: Response) -> io::Result<()> {
    conn.write_all(&serialize_head(&resp))?;

    match resp.body {
        Body::Empty => {}
        Body::Content(bytes) => conn.write_all(&bytes)?,
        Body::Reader { mut source, .. } => {
            io::copy(&mut source, conn)?;
        }
    }

    conn.flush()
}
