use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, DEFAULT_IMAGE_BASE};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Artifact directory written by the indexer
    #[arg(long, default_value = "./artifact")]
    artifact: String,
    /// Prefix joined to each item's image path
    #[arg(long, default_value = DEFAULT_IMAGE_BASE)]
    image_base: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 7860)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app: Router = build_app(&args.artifact, &args.image_base)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
