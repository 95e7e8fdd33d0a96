//! HTTP/1.x protocol implementation.
//!
//! One request per connection: the head is read incrementally off the
//! socket, the declared body is drained, a response is written and the
//! socket is closed. No keep-alive, no chunked bodies.
//!
//! # Architecture
//!
//! - **`lines`**: Turns a byte stream into CRLF-delimited lines, keeping the bytes read past the blank line
//! - **`body`**: Reads a fixed number of body bytes, starting with the bytes `lines` kept
//! - **`parser`**: Builds a [`request::Request`] from the line sequence
//! - **`headers`**: Ordered, case-insensitive header multimap
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`files`**: Static file lookup with MIME type inference
//! - **`connection`**: Per-connection handling, run by a worker thread
//!
//! # Connection Handling
//!
//! ```text
//!        ┌─────────────┐
//!        │   Parsing   │ ── malformed ──▶ 400 Bad Request
//!        └──────┬──────┘
//!               │ Expect: 100-continue ──▶ 100 Continue
//!               ▼
//!        ┌──────────────────┐
//!        │  Draining body   │ ← Content-Length bytes
//!        └──────┬───────────┘
//!               │ not GET ──▶ 405 Method Not Allowed
//!               ▼
//!        ┌──────────────────┐
//!        │  Serving file    │ ──▶ 200 OK / 404 Not Found
//!        └──────┬───────────┘
//!               ▼
//!             Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use wicket::http::connection::Connection;
//! use wicket::http::files::FileServer;
//!
//! fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:9000")?;
//!     let files = FileServer::new("www");
//!
//!     for stream in listener.incoming() {
//!         let stream = stream?;
//!         let peer = stream.peer_addr()?;
//!         if let Err(e) = Connection::new(stream, peer).handle(&files) {
//!             eprintln!("Connection error: {}", e);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod body;
pub mod connection;
pub mod files;
pub mod headers;
pub mod lines;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
