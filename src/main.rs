//! Runs a chat server and an interactive client in one process.

use clap::Parser;
use log::{error, info};
use server::listener::ChatServer;
use std::time::Duration;

/// Time the server gets to come up before the client starts prompting
const STARTUP_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port the embedded server listens on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("0.0.0.0:{}", args.port);

    let server = match ChatServer::bind(&address).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            return Err(e.into());
        }
    };

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Chat server stopped: {}", e);
        }
    });

    tokio::time::sleep(STARTUP_DELAY).await;

    let end = client::network::run_interactive(None, None, None).await?;
    info!("Session ended: {:?}", end);

    server_handle.abort();
    Ok(())
}
