use std::net::{SocketAddr, TcpStream};

use tracing::{debug, info, warn};

use crate::http::files::FileServer;
use crate::http::lines::DEFAULT_CHUNK_SIZE;
use crate::http::parser::parse_request_with_chunk_size;
use crate::http::request::Method;
use crate::http::response::Response;

/// An accepted client socket waiting in the queue.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    /// Answers a single request and closes the socket.
    ///
    /// Parse failures are answered with 400 and are not errors. An `Err`
    /// means the response could not be produced or written.
    pub fn handle(self, files: &FileServer) -> anyhow::Result<()> {
        self.handle_with_chunk_size(files, DEFAULT_CHUNK_SIZE)
    }

    pub fn handle_with_chunk_size(self, files: &FileServer, chunk_size: usize) -> anyhow::Result<()> {
        let Connection { stream, peer } = self;
        // `&TcpStream` reads and writes, so the body reader and the
        // responses share the one socket. It closes when `stream` drops.
        let mut conn = &stream;

        let mut request = match parse_request_with_chunk_size(&stream, chunk_size) {
            Ok(request) => request,
            Err(e) => {
                warn!(%peer, error = %e, "failed to parse request");
                Response::bad_request().send(&mut conn)?;
                return Ok(());
            }
        };

        if request.expects_continue() {
            Response::continue_().send(&mut conn)?;
        }

        let content_length = request.content_length();
        if content_length > 0 {
            let mut received = 0;
            while received < content_length {
                let chunk = request.body.read((content_length - received).min(chunk_size))?;
                if chunk.is_empty() {
                    break;
                }
                received += chunk.len();
            }
            debug!(%peer, expected = content_length, received, "drained request body");
        }

        if request.method != Method::GET {
            info!(%peer, method = %request.method, path = %request.path, status = 405, "method not allowed");
            Response::method_not_allowed().send(&mut conn)?;
            return Ok(());
        }

        info!(%peer, method = %request.method, path = %request.path, "serving");
        files.serve(&mut conn, &request.path)
    }
}
