use clap::Parser;
use log::info;
use server::network::Server;
use std::time::Duration;

/// Pong relay server: pairs connecting clients into two-player rooms and
/// forwards paddle and ball events between room members.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "3000")]
    port: u16,
    /// Seconds of silence before a channel is considered gone
    #[clap(short, long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting relay server on {}", address);

    let mut server = Server::new(&address, Duration::from_secs(args.timeout_secs)).await?;
    server.run().await?;

    Ok(())
}
