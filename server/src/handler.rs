//! Per-connection protocol state machine
//!
//! Each accepted connection runs [`handle_connection`] in its own task:
//! - Joining: prompt for a username, pick a color, announce the join
//! - Active: relay every inbound line to the room until the client leaves
//! - Leaving: deregister, drop the color entry, announce the departure
//!
//! The handler's sink is registered by the listener before this runs, so the
//! joining client sees its own join announcement.

use crate::broadcast::broadcast;
use crate::color::Color;
use crate::registry::Sink;
use crate::state::ServerState;
use log::{debug, info, warn};
use shared::{
    chat_line, colored_leave_line, join_line, leave_sentinel, plain_leave_line, USERNAME_PROMPT,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The client sent its leave sentinel
    Sentinel,
    /// The stream ended without a sentinel
    Disconnected,
    /// Reading from the client failed
    ReadFailed,
}

/// Identity of a client that finished joining
struct Session {
    username: String,
    color: Color,
    sentinel: String,
}

/// Runs one client's session to completion
///
/// Always deregisters `sink` before returning, whichever way the session ended.
pub async fn handle_connection<R>(
    mut reader: R,
    sink: Sink,
    state: Arc<ServerState>,
    peer: SocketAddr,
) -> LeaveReason
where
    R: AsyncBufRead + Unpin,
{
    let (session, reason) = match join(&mut reader, &sink, &state).await {
        Ok(session) => {
            let reason = relay(&mut reader, &session, &state).await;
            (Some(session), reason)
        }
        Err(e) => {
            warn!("Client {} failed before choosing a username: {}", peer, e);
            (None, LeaveReason::ReadFailed)
        }
    };

    state.registry.deregister(sink.id()).await;
    let username = match session {
        Some(session) => {
            state.registry.remove_color(&session.username).await;
            session.username
        }
        None => String::new(),
    };
    broadcast(&state.registry, &plain_leave_line(&username)).await;

    debug!("Session for {} ({}) ended: {:?}", username, peer, reason);
    reason
}

/// Reads one line without its terminator
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. Returns
/// `None` at end of stream.
async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

async fn join<R>(reader: &mut R, sink: &Sink, state: &ServerState) -> io::Result<Session>
where
    R: AsyncBufRead + Unpin,
{
    if sink.send_line(USERNAME_PROMPT).is_err() {
        debug!("Sink {} closed before the username prompt", sink.id());
    }

    // End of stream here still joins, with an empty name
    let username = read_line(reader).await?.unwrap_or_default();
    let color = state.colors.assign();
    state.registry.set_color(&username, color).await;

    let announcement = join_line(color, &username);
    info!("{}", announcement);
    broadcast(&state.registry, &announcement).await;

    Ok(Session {
        sentinel: leave_sentinel(&username),
        username,
        color,
    })
}

async fn relay<R>(reader: &mut R, session: &Session, state: &ServerState) -> LeaveReason
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_line(reader).await {
            Ok(Some(line)) if line == session.sentinel => {
                broadcast(
                    &state.registry,
                    &colored_leave_line(session.color, &session.username),
                )
                .await;
                info!("{}", plain_leave_line(&session.username));
                return LeaveReason::Sentinel;
            }
            Ok(Some(line)) => {
                debug!("{}: {}", session.username, line);
                broadcast(
                    &state.registry,
                    &chat_line(session.color, &session.username, &line),
                )
                .await;
            }
            Ok(None) => {
                info!("Client {} disconnected abruptly", session.username);
                return LeaveReason::Disconnected;
            }
            Err(e) => {
                warn!("Client {} disconnected abruptly: {}", session.username, e);
                return LeaveReason::ReadFailed;
            }
        }
    }
}
