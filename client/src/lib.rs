//! # Chat Client Library
//!
//! Terminal client for the line-based chat server. It asks for the server
//! address, port and a display name, sends the name as its first line and
//! then runs two things side by side:
//!
//! - A background reader that prints every line the server sends, verbatim
//!   (ANSI colors included)
//! - The console loop that forwards what the user types
//!
//! ## Leaving
//!
//! Typing the exit keyword (`chao`, any case) asks for confirmation. Only a
//! confirmed exit sends the leave sentinel, `<username> ha salido del chat.`,
//! and closes the connection; the server then announces the departure to
//! everyone still connected.
//!
//! ## Module Organization
//!
//! - `input`: connection prompts with defaults, input classification and
//!   the confirmation answer
//! - `network`: TCP connection, server reader and input forwarding

pub mod input;
pub mod network;
