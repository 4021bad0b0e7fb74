//! Launcher server command — `app-launcher serve`.

use std::path::Path;

use anyhow::Result;
use app_launcher::config::{self, AccessPolicy, LauncherConfig, ServeOverrides};
use app_launcher::server::start_server;

pub async fn cmd_serve(config_path: Option<&Path>, overrides: ServeOverrides) -> Result<()> {
    let file = LauncherConfig::load_or_default(config_path)?;
    let config = config::resolve(&file, &overrides, config::process_env)?;

    match &config.access {
        AccessPolicy::Open => tracing::info!("Creating apps is open to every client"),
        AccessPolicy::Gated { access_code: None } => {
            tracing::warn!("ACCESS_CODE is not set; creating apps will fail until it is")
        }
        AccessPolicy::Gated { .. } => tracing::info!("Creating apps requires the access code"),
    }

    start_server(config).await
}
