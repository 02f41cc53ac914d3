// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! [`CloudApi`] over the Vultr v2 REST API.
//!
//! Requests carry the API key as a bearer token. Listings pass the page-size hint as
//! `per_page` and the cursor as `cursor`, and the `meta.links.next` of the response becomes
//! the [`Page::next_cursor`]. Nothing is retried: a failed call is reported to the
//! harvester, which skips the resource type for the cycle.

mod listing;

use std::fmt;

use futures::{FutureExt, future::BoxFuture};
use harvest::{
    ApiError, CloudApi, ListOptions, Page,
    model::{Account, Bandwidth, BlockStorage, KubernetesCluster, LoadBalancer, ReservedIp},
};
use harvest_aggregation::InvoiceItem;
use serde::de::DeserializeOwned;

use listing::{
    AccountEnvelope, BandwidthEnvelope, Blocks, KubernetesClusters, Listing, LoadBalancers,
    PendingCharges, ReservedIps,
};

/// Base URL of the public API.
pub const DEFAULT_BASE_URL: &str = "https://api.vultr.com";

const DEFAULT_USER_AGENT: &str = concat!("harvest-vultr/", env!("CARGO_PKG_VERSION"));

// error bodies are kept for logging only
const MAX_ERROR_BODY: usize = 512;

/// Builder for [`VultrClient`].
#[derive(Clone)]
pub struct VultrClientBuilder {
    api_key: String,
    base_url: String,
    user_agent: String,
}

impl VultrClientBuilder {
    /// Talk to `base_url` instead of [`DEFAULT_BASE_URL`].
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<VultrClient, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .build()
            .map_err(ApiError::transport)?;
        Ok(VultrClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            api_key: self.api_key,
        })
    }
}

/// A Vultr API client.
///
/// ```no_run
/// use std::sync::Arc;
/// use harvest::CloudApi;
/// use harvest_vultr::VultrClient;
///
/// let client = VultrClient::builder("my-api-key")
///     .user_agent("vultr-exporter/0.1.0")
///     .build()
///     .unwrap();
/// let api: Arc<dyn CloudApi> = Arc::new(client);
/// ```
#[derive(Clone)]
pub struct VultrClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for VultrClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VultrClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl VultrClient {
    pub fn builder(api_key: impl Into<String>) -> VultrClientBuilder {
        VultrClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(ApiError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::transport)?;
        if !status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect(),
            });
        }
        serde_json::from_slice(&body).map_err(ApiError::decode)
    }

    async fn list<L: Listing>(
        &self,
        path: &str,
        options: ListOptions,
    ) -> Result<Page<L::Item>, ApiError> {
        let per_page = options.per_page.to_string();
        let mut query = vec![("per_page", per_page.as_str())];
        if !options.cursor.is_empty() {
            query.push(("cursor", options.cursor.as_str()));
        }
        let listing: L = self.get(path, &query).await?;
        Ok(listing.into_page())
    }
}

impl CloudApi for VultrClient {
    fn get_account(&self) -> BoxFuture<'_, Result<Account, ApiError>> {
        async move {
            let envelope: AccountEnvelope = self.get("/v2/account", &[]).await?;
            Ok(envelope.account)
        }
        .boxed()
    }

    fn get_bandwidth(&self) -> BoxFuture<'_, Result<Bandwidth, ApiError>> {
        async move {
            let envelope: BandwidthEnvelope = self.get("/v2/account/bandwidth", &[]).await?;
            Ok(envelope.bandwidth)
        }
        .boxed()
    }

    fn list_pending_charges(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<InvoiceItem>, ApiError>> {
        self.list::<PendingCharges>("/v2/billing/pending-charges", options)
            .boxed()
    }

    fn list_block_storage(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<BlockStorage>, ApiError>> {
        self.list::<Blocks>("/v2/blocks", options).boxed()
    }

    fn list_kubernetes_clusters(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<KubernetesCluster>, ApiError>> {
        self.list::<KubernetesClusters>("/v2/kubernetes/clusters", options)
            .boxed()
    }

    fn list_load_balancers(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<LoadBalancer>, ApiError>> {
        self.list::<LoadBalancers>("/v2/load-balancers", options)
            .boxed()
    }

    fn list_reserved_ips(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<ReservedIp>, ApiError>> {
        self.list::<ReservedIps>("/v2/reserved-ips", options).boxed()
    }
}
