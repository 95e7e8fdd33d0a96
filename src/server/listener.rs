use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::files::FileServer;
use crate::server::queue::ConnectionQueue;
use crate::server::worker::{Handler, WorkerPool};

/// A bound socket with its worker pool already running.
pub struct Listener {
    inner: TcpListener,
    queue: Arc<ConnectionQueue<Connection>>,
    pool: WorkerPool<Connection>,
    cfg: Config,
}

/// Binds the listening socket and starts the workers.
pub async fn bind(cfg: &Config) -> anyhow::Result<Listener> {
    let addr = cfg.server.socket_addr()?;
    let capacity = cfg.server.queue_capacity();

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let inner = socket.listen(u32::try_from(capacity).unwrap_or(u32::MAX))?;

    let queue = Arc::new(ConnectionQueue::new(capacity));
    let files = FileServer::new(cfg.static_files.root.clone());
    let chunk_size = cfg.server.read_chunk_size;
    let handler: Handler<Connection> = Arc::new(move |conn: Connection| conn.handle_with_chunk_size(&files, chunk_size));

    let pool = WorkerPool::start(
        cfg.server.worker_count,
        Arc::clone(&queue),
        handler,
        cfg.server.poll_interval(),
    )?;

    info!(
        addr = %inner.local_addr()?,
        workers = pool.len(),
        backlog = capacity,
        "Listening"
    );

    Ok(Listener {
        inner,
        queue,
        pool,
        cfg: cfg.clone(),
    })
}

/// Serves on the configured address until `shutdown` resolves.
pub async fn run(cfg: &Config, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    bind(cfg).await?.serve(shutdown).await
}

impl Listener {
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Accepts connections onto the queue until `shutdown` resolves, then
    /// stops and joins the workers.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let Listener {
            inner,
            queue,
            mut pool,
            cfg,
        } = self;
        tokio::pin!(shutdown);

        loop {
            let (socket, peer) = tokio::select! {
                res = inner.accept() => match res {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };

            let conn = match into_blocking(socket, peer) {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(%peer, error = %e, "failed to prepare connection");
                    continue;
                }
            };

            // A full queue parks this loop until a worker frees a slot.
            let queue = Arc::clone(&queue);
            let admit = tokio::task::spawn_blocking(move || queue.put(conn));
            tokio::select! {
                res = admit => {
                    if let Ok(Err(closed)) = res {
                        warn!(peer = %closed.0.peer, "queue closed, dropping connection");
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        info!("Shutdown signal received, stopping workers");
        drop(inner);
        queue.close();

        let timeout = cfg.server.shutdown_timeout();
        let abandoned = tokio::task::spawn_blocking(move || pool.shutdown(timeout)).await?;
        info!(abandoned, "Server stopped");

        Ok(())
    }
}

fn into_blocking(socket: tokio::net::TcpStream, peer: SocketAddr) -> std::io::Result<Connection> {
    let stream = socket.into_std()?;
    stream.set_nonblocking(false)?;
    Ok(Connection::new(stream, peer))
}
