use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use super::connect;
use crate::server::{AppState, serve};

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(
        long,
        short = 'b',
        default_value = "127.0.0.1:3000",
        env = "PFIND_BIND",
        help = "Address to listen on"
    )]
    pub bind: SocketAddr,
}

pub async fn handle_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let (config, embedder, store) = connect(config_path).await?;

    let state = AppState::new(
        Arc::new(embedder),
        Arc::from(store),
        config.search.default_top_k,
    );

    serve(state, args.bind)
        .await
        .with_context(|| format!("server on {} failed", args.bind))
}
