//! Entry point for the Allowance Engine binary.
//!
//! Running this binary starts an HTTP server exposing the comparison
//! engine.  Configuration comes from `ALLOWANCE_*` environment
//! variables (see [`allowance_engine::config`]); log verbosity is
//! controlled with `RUST_LOG`.

use allowance_engine::{api, config::Config};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = Config::from_env().context("reading configuration")?;
    api::serve(&config).await
}
