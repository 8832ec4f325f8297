use crate::input::{classify_input, prompt, ConnectSettings, ExitAnswer, InputAction};
use log::{debug, info, warn};
use shared::leave_sentinel;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONFIRM_EXIT: &str = "¿Deseas salir del chat? (s/n): ";
const SERVER_CLOSED: &str = "Conexión con el servidor cerrada.";

/// How long to keep printing server lines after leaving
const READER_GRACE: Duration = Duration::from_secs(2);

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user confirmed the exit and the sentinel was sent
    Left,
    /// Console input closed before the user left
    InputClosed,
}

/// Connected chat client
pub struct ChatClient {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    username: String,
}

impl ChatClient {
    /// Connects and sends the username as the first line
    pub async fn connect(settings: &ConnectSettings) -> io::Result<Self> {
        let stream = TcpStream::connect((settings.host.as_str(), settings.port)).await?;
        let (reader, mut writer) = stream.into_split();

        send_line(&mut writer, &settings.username).await?;
        info!("Connected to {} as {:?}", settings.address(), settings.username);

        Ok(Self {
            reader,
            writer,
            username: settings.username.clone(),
        })
    }

    /// Relays console input to the server while printing everything it sends
    pub async fn run<R>(mut self, input: &mut Lines<R>) -> io::Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut reader = tokio::spawn(print_incoming(
            BufReader::new(self.reader),
            tokio::io::stdout(),
        ));

        let mut console = tokio::io::stdout();
        let end = forward_input(input, &mut self.writer, &mut console, &self.username).await;

        if let Err(e) = self.writer.shutdown().await {
            debug!("Failed to shut down connection: {}", e);
        }

        match timeout(READER_GRACE, &mut reader).await {
            Ok(Err(e)) => warn!("Reader task failed: {}", e),
            Ok(Ok(())) => {}
            Err(_) => {
                debug!("Server kept the connection open, stopping reader");
                reader.abort();
            }
        }

        end
    }
}

/// Copies every line from the server to `out`, verbatim
pub async fn print_incoming<R, W>(reader: R, mut out: W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if out.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                    break;
                }
                let _ = out.flush().await;
            }
            Ok(None) | Err(_) => {
                let _ = out.write_all(format!("{SERVER_CLOSED}\n").as_bytes()).await;
                let _ = out.flush().await;
                break;
            }
        }
    }
}

/// Reads console lines and forwards them until the user leaves
///
/// Typing the exit keyword asks for confirmation; only a confirmed exit sends
/// the leave sentinel.
pub async fn forward_input<R, W, C>(
    input: &mut Lines<R>,
    server: &mut W,
    console: &mut C,
    username: &str,
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: AsyncWrite + Unpin,
{
    while let Some(line) = input.next_line().await? {
        match classify_input(&line) {
            InputAction::Send(message) => send_line(server, &message).await?,
            InputAction::ConfirmExit => {
                let answer = prompt(input, console, CONFIRM_EXIT).await?;
                match ExitAnswer::parse(&answer) {
                    ExitAnswer::Leave => {
                        send_line(server, &leave_sentinel(username)).await?;
                        write_console(console, "Has salido del chat.").await?;
                        return Ok(SessionEnd::Left);
                    }
                    ExitAnswer::Stay => write_console(console, "Continuando en el chat...").await?,
                    ExitAnswer::Invalid => {
                        write_console(
                            console,
                            "Opción no válida. Escribe 's' para salir o 'n' para continuar.",
                        )
                        .await?
                    }
                }
            }
        }
    }

    Ok(SessionEnd::InputClosed)
}

async fn send_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(format!("{line}\n").as_bytes()).await?;
    writer.flush().await
}

async fn write_console<W: AsyncWrite + Unpin>(console: &mut W, text: &str) -> io::Result<()> {
    console.write_all(format!("{text}\n").as_bytes()).await?;
    console.flush().await
}

/// Prompts for anything not already given, connects and runs the session
pub async fn run_interactive(
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
) -> Result<SessionEnd, Box<dyn std::error::Error>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut console = tokio::io::stdout();

    let host = match host {
        Some(host) => host,
        None => {
            prompt(
                &mut input,
                &mut console,
                "Ingresa la IP del servidor (localhost por defecto): ",
            )
            .await?
        }
    };
    let port = match port {
        Some(port) => port.to_string(),
        None => {
            prompt(
                &mut input,
                &mut console,
                "Ingresa el puerto del servidor (12345 por defecto): ",
            )
            .await?
        }
    };
    let username = match username {
        Some(username) => username,
        None => prompt(&mut input, &mut console, "Ingresa tu nombre de usuario: ").await?,
    };

    let settings = ConnectSettings::resolve(&host, &port, &username)?;
    let client = ChatClient::connect(&settings).await?;
    write_console(
        &mut console,
        &format!("Conectado al servidor de chat en {}", settings.address()),
    )
    .await?;

    Ok(client.run(&mut input).await?)
}
