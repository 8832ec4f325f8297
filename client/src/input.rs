//! Console input handling: connection prompts, chat lines and the exit flow

use shared::{DEFAULT_HOST, DEFAULT_PORT, EXIT_KEYWORD};
use std::io;
use std::num::ParseIntError;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};

/// Where to connect and which name to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl ConnectSettings {
    /// Builds settings from raw answers, applying defaults to empty ones
    ///
    /// Only the port can fail, when it is not empty and not a number.
    pub fn resolve(host: &str, port: &str, username: &str) -> Result<Self, ParseIntError> {
        let host = host.trim();
        let port = port.trim();

        Ok(Self {
            host: if host.is_empty() {
                DEFAULT_HOST.to_string()
            } else {
                host.to_string()
            },
            port: if port.is_empty() {
                DEFAULT_PORT
            } else {
                port.parse()?
            },
            username: username.trim().to_string(),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What to do with a line the user typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Forward this line to the server
    Send(String),
    /// The user typed the exit keyword and must confirm
    ConfirmExit,
}

pub fn classify_input(line: &str) -> InputAction {
    if line.eq_ignore_ascii_case(EXIT_KEYWORD) {
        InputAction::ConfirmExit
    } else {
        InputAction::Send(format!(" {line}"))
    }
}

/// Answer to the leave confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAnswer {
    Leave,
    Stay,
    Invalid,
}

impl ExitAnswer {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "s" => ExitAnswer::Leave,
            "n" => ExitAnswer::Stay,
            _ => ExitAnswer::Invalid,
        }
    }
}

/// Shows `question` and reads one answer
///
/// A closed input counts as an empty answer.
pub async fn prompt<R, W>(input: &mut Lines<R>, console: &mut W, question: &str) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    console.write_all(question.as_bytes()).await?;
    console.flush().await?;
    Ok(input.next_line().await?.unwrap_or_default().trim().to_string())
}
