use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mongoscope::app::routes;
use mongoscope::app::state::AppState;

#[derive(Parser)]
#[command(name = "mongoscope", about = "Browser-facing MongoDB administration backend")]
struct Args {
    /// Address to bind the HTTP server on.
    #[arg(long, default_value = "127.0.0.1:8710")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mongoscope=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let app = routes::router(AppState::new());

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(addr = %args.bind, "mongoscope listening");
    axum::serve(listener, app).await?;
    Ok(())
}
