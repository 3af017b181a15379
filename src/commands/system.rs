use colored::Colorize;
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{create_api, AppState};
use crate::config::AdminConfig;

pub async fn serve(config: &AdminConfig, port: Option<u16>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));

    let state = AppState::from_config(config).await?;
    let app = create_api(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("Admin API listening on {}", addr);
    println!("🚀 Admin API ready on {}", format!("http://{}", addr).cyan());

    axum::serve(listener, app).await?;
    Ok(())
}
