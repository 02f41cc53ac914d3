// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use harvest::{
    HarvestConfig,
    harvesters::{BuildInfo, standard_harvesters},
};
use harvest_exporter::{Exporter, router, shutdown_signal};
use harvest_vultr::{DEFAULT_BASE_URL, VultrClient};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prometheus exporter for Vultr account, billing and resource telemetry.
#[derive(Debug, Parser)]
#[command(name = "vultr-exporter", version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    endpoint: SocketAddr,

    /// Path on which metrics are served
    #[arg(long, default_value = "/metrics", value_parser = parse_metrics_path)]
    path: String,

    /// TOML file with harvester settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vultr API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the Vultr API
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    api_url: String,
}

fn parse_metrics_path(path: &str) -> Result<String, String> {
    if !path.starts_with('/') {
        return Err(format!("`{path}` must start with `/`"));
    }
    if path == "/" || path == "/healthz" {
        return Err(format!("`{path}` is reserved"));
    }
    Ok(path.to_owned())
}

fn build_info() -> BuildInfo {
    let mut build = BuildInfo::new(VERSION);
    build.os_version = option_env!("OS_VERSION").map_or_else(
        || format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        str::to_owned,
    );
    build.rust_version = option_env!("RUSTC_VERSION").unwrap_or_default().to_owned();
    build.git_commit = option_env!("GIT_COMMIT").unwrap_or_default().to_owned();
    build
}

fn load_config(cli: &Cli) -> anyhow::Result<HarvestConfig> {
    let config = match &cli.config {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => HarvestConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = load_config(&cli)?;
    let client = VultrClient::builder(&cli.api_key)
        .base_url(&cli.api_url)
        .user_agent(format!("vultr-exporter/{VERSION}"))
        .build()
        .context("failed to build API client")?;
    let build = build_info();
    if build.git_commit.is_empty() {
        tracing::info!("GIT_COMMIT was not set at build time");
    }
    let harvesters = standard_harvesters(&config, Arc::new(client), build)
        .context("failed to register harvesters")?;
    tracing::info!(
        version = VERSION,
        endpoint = %cli.endpoint,
        path = %cli.path,
        harvesters = ?harvesters,
        "starting exporter"
    );

    let exporter = Arc::new(Exporter::new(harvesters, cli.path));
    let listener = tokio::net::TcpListener::bind(cli.endpoint)
        .await
        .with_context(|| format!("failed to bind {}", cli.endpoint))?;
    axum::serve(listener, router(exporter))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("exporter stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["vultr-exporter", "--api-key", "k"]).unwrap();
        assert_eq!(cli.endpoint, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cli.path, "/metrics");
        assert_eq!(cli.api_url, DEFAULT_BASE_URL);
        assert!(cli.config.is_none());
        assert!(load_config(&cli).is_ok());
    }

    #[test]
    fn metrics_path_is_checked() {
        for path in ["metrics", "/", "/healthz"] {
            let result = Cli::try_parse_from(["vultr-exporter", "--api-key", "k", "--path", path]);
            assert!(result.is_err(), "{path}");
        }
        let cli =
            Cli::try_parse_from(["vultr-exporter", "--api-key", "k", "--path", "/scrape"]).unwrap();
        assert_eq!(cli.path, "/scrape");
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let cli = Cli::try_parse_from([
            "vultr-exporter",
            "--api-key",
            "k",
            "--config",
            "/nonexistent/harvest.toml",
        ])
        .unwrap();
        let err = load_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/harvest.toml"));
    }

    #[test]
    fn build_info_has_version() {
        let build = build_info();
        assert_eq!(build.version, VERSION);
        assert!(!build.os_version.is_empty());
    }
}
