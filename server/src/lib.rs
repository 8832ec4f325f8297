//! # Chat Server Library
//!
//! This library provides the server side of a line-based, multi-user chat.
//! Clients connect over TCP, pick a display name and exchange newline
//! terminated messages that the server fans out to everyone connected, each
//! one tagged with the sender's name and a per-user ANSI color.
//!
//! ## Core Responsibilities
//!
//! ### Connection Management
//! Every accepted connection gets an output sink registered immediately,
//! before its username is known, and a handler task that owns its input
//! stream for the whole session.
//!
//! ### Broadcasting
//! Any handler can push a line to every registered sink. A dead recipient is
//! skipped without affecting delivery to the rest of the room.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! Each client runs in its own tokio task and only ever waits on its own
//! socket. Messages from one sender are relayed in the order they were sent;
//! there is no ordering between different senders.
//!
//! ### Shared State
//! The registry of sinks and the username to color table are the only state
//! shared between tasks. Both live behind async read-write locks inside
//! [`registry::ClientRegistry`].
//!
//! ## Module Organization
//!
//! - `color`: random palette color for each new user
//! - `registry`: concurrency-safe set of sinks and color table
//! - `broadcast`: fan-out of one line to every sink
//! - `handler`: join, relay and leave state machine for one connection
//! - `listener`: accept loop and socket writer tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::listener::ChatServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::bind("0.0.0.0:12345").await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod color;
pub mod handler;
pub mod listener;
pub mod registry;
pub mod state;
