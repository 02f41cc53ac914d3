// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTTP serving of harvested metrics.
//!
//! - `/` is an index page linking to the other endpoints
//! - `/healthz` answers `ok`
//! - the metrics path runs one collection cycle per request and renders it in the
//!   Prometheus text format

use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use harvest_core::HarvesterSet;
use harvest_format_prometheus::{CONTENT_TYPE, TextEncoder};
use tokio::{signal, sync::Mutex};

/// Shared state of the HTTP handlers.
pub struct Exporter {
    harvesters: HarvesterSet,
    metrics_path: String,
    // held for the duration of a scrape
    scrape: Mutex<()>,
}

impl Exporter {
    pub fn new(harvesters: HarvesterSet, metrics_path: impl Into<String>) -> Self {
        Self {
            harvesters,
            metrics_path: metrics_path.into(),
            scrape: Mutex::new(()),
        }
    }

    pub fn metrics_path(&self) -> &str {
        &self.metrics_path
    }

    /// Run one collection cycle and render it.
    ///
    /// Concurrent calls are serialized, so at most one cycle is in flight.
    pub async fn scrape(&self) -> String {
        let _guard = self.scrape.lock().await;
        let start = Instant::now();
        let metrics = self.harvesters.gather().await;
        let body = TextEncoder::new().encode_to_string(&metrics);
        tracing::debug!(
            instances = metrics.len(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scrape complete"
        );
        body
    }
}

/// The router serving `exporter`.
///
/// # Panics
///
/// If the metrics path does not start with `/` or collides with `/` or `/healthz`.
pub fn router(exporter: Arc<Exporter>) -> Router {
    let metrics_path = exporter.metrics_path.clone();
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route(&metrics_path, get(metrics))
        .with_state(exporter)
}

async fn index(State(exporter): State<Arc<Exporter>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Vultr Exporter</title></head>\n\
         <body>\n\
         <h1>Vultr Exporter</h1>\n\
         <ul>\n\
         <li><a href=\"{path}\">metrics</a></li>\n\
         <li><a href=\"/healthz\">healthz</a></li>\n\
         </ul>\n\
         </body>\n\
         </html>\n",
        path = exporter.metrics_path,
    ))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    let body = exporter.scrape().await;
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

/// Completes on Ctrl-C or, on unix, SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Ctrl-C handler installation failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "SIGTERM handler installation failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
