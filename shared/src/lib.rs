//! Line protocol shared by the chat server and client
//!
//! Every message on the wire is a single line of UTF-8 text terminated by `\n`.
//! Lines broadcast by the server carry ANSI color codes so terminals can tell
//! users apart at a glance.

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_HOST: &str = "localhost";

/// First line the server sends on every accepted connection
pub const USERNAME_PROMPT: &str = "Ingresa tu nombre de usuario:";

/// Typed by a user to start the leave confirmation
pub const EXIT_KEYWORD: &str = "chao";

pub const RESET: &str = "\u{1b}[0m";

/// ANSI foreground colors handed out to users
pub const PALETTE: [&str; 6] = [
    "\u{1b}[31m", // red
    "\u{1b}[32m", // green
    "\u{1b}[33m", // yellow
    "\u{1b}[34m", // blue
    "\u{1b}[35m", // magenta
    "\u{1b}[36m", // cyan
];

/// Announces a new user to the room
pub fn join_line(color: &str, username: &str) -> String {
    format!("{color}{username} se ha unido al chat.{RESET}")
}

/// Relays a line typed by `username`
pub fn chat_line(color: &str, username: &str, text: &str) -> String {
    format!("{color}{username}: {text}{RESET}")
}

/// Colored departure, sent when a user leaves on purpose
pub fn colored_leave_line(color: &str, username: &str) -> String {
    format!("{color}{username} ha abandonado el chat.{RESET}")
}

/// Plain departure, sent whenever a connection is torn down
pub fn plain_leave_line(username: &str) -> String {
    format!("{username} ha abandonado el chat.")
}

/// Line a client sends to leave the chat intentionally
pub fn leave_sentinel(username: &str) -> String {
    format!("{username} ha salido del chat.")
}
