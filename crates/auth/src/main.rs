use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tokio::sync::watch;

use stacx_shared::logging;

/// Mock authentication server for local development (in-memory, plaintext).
#[derive(Parser, Debug)]
#[command(name = "stacx-mock-auth", version, about)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MOCK_AUTH_PORT", default_value_t = 3002)]
    port: u16,

    /// Interface to bind
    #[arg(long, env = "MOCK_AUTH_HOST", default_value = "0.0.0.0")]
    host: IpAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("stacx_auth=info,stacx_shared=info");
    let args = Args::parse();

    tracing::warn!("Mock auth keeps plaintext passwords in memory; development use only");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let addr = SocketAddr::new(args.host, args.port);
    let mut server = tokio::spawn(stacx_auth::start_server(addr, shutdown_rx));

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            let _ = shutdown_tx.send(true);
            if let Ok(Err(e)) = (&mut server).await {
                tracing::error!("Mock auth server crashed: {}", e);
            }
        }
        res = &mut server => {
            res??;
        }
    }

    Ok(())
}
