use clap::Parser;
use log::info;
use server::network::Server;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(short, long, default_value = "0")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = Server::bind(&format!("{}:{}", args.host, args.port), shutdown_rx).await?;
    info!("clients can join at {}", server.local_addr()?);

    let mut run = tokio::spawn(server.run());
    tokio::select! {
        result = &mut run => result??,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            let _ = shutdown_tx.send(true);
            run.await??;
        }
    }

    Ok(())
}
