//! TCP accept loop and per-connection writer tasks

use crate::handler::handle_connection;
use crate::registry::{sink_channel, LineReceiver};
use crate::state::ServerState;
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Chat server bound to a listening socket
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl ChatServer {
    /// Binds to `addr` with fresh shared state
    pub async fn bind(addr: &str) -> io::Result<Self> {
        Self::bind_with_state(addr, Arc::new(ServerState::new())).await
    }

    pub async fn bind_with_state(addr: &str, state: Arc<ServerState>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Chat server listening on {}", listener.local_addr()?);
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Accepts connections until `accept` fails
    ///
    /// Each connection gets its sink registered right away, then a writer
    /// task and a handler task of its own.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    return Err(e);
                }
            };
            info!("New client connected: {}", peer);

            let (read_half, write_half) = stream.into_split();
            let (tx, rx) = sink_channel();
            let sink = self.state.registry.register(tx).await;

            tokio::spawn(write_lines(write_half, rx, peer));

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                handle_connection(BufReader::new(read_half), sink, state, peer).await;
            });
        }
    }
}

/// Drains a connection's outbound queue onto its socket
///
/// Runs until every sender is dropped or a write fails, then shuts the
/// writer down so the client sees the stream end.
pub async fn write_lines<W>(mut writer: W, mut lines: LineReceiver, peer: SocketAddr)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        let mut framed = line.into_bytes();
        framed.push(b'\n');

        if let Err(e) = writer.write_all(&framed).await {
            warn!("Failed to write to {}: {}", peer, e);
            break;
        }
    }

    // Later sends to this sink now fail and are skipped by broadcasts
    lines.close();

    if let Err(e) = writer.shutdown().await {
        debug!("Failed to shut down writer for {}: {}", peer, e);
    }
    debug!("Writer for {} finished", peer);
}
