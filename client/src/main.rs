use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to, prompted for when missing
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Server port, prompted for when missing
    #[arg(short, long)]
    port: Option<u16>,

    /// Display name, prompted for when missing
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let end = client::network::run_interactive(args.server, args.port, args.name).await?;
    info!("Session ended: {:?}", end);

    Ok(())
}
