// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The remote calls harvesters depend on.
//!
//! [`CloudApi`] is the boundary to the cloud provider. Implementations own transport and
//! authentication; they do not retry and they do not paginate. Pagination is driven by
//! [`paginate`](crate::paginate) and every call is bounded by the caller.

use std::{future::Future, time::Duration};

use futures::future::BoxFuture;
use harvest_aggregation::InvoiceItem;

use crate::{
    ApiError,
    model::{Account, Bandwidth, BlockStorage, KubernetesCluster, LoadBalancer, ReservedIp},
};

/// Request parameters of one page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListOptions {
    /// Page-size hint
    pub per_page: usize,
    /// Opaque cursor returned by the previous page, empty for the first page
    pub cursor: String,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor of the next page, empty once the listing is exhausted
    pub next_cursor: String,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.into(),
        }
    }

    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, "")
    }
}

/// The remote calls of the cloud provider.
pub trait CloudApi: Send + Sync {
    fn get_account(&self) -> BoxFuture<'_, Result<Account, ApiError>>;

    fn get_bandwidth(&self) -> BoxFuture<'_, Result<Bandwidth, ApiError>>;

    fn list_pending_charges(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<InvoiceItem>, ApiError>>;

    fn list_block_storage(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<BlockStorage>, ApiError>>;

    fn list_kubernetes_clusters(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<KubernetesCluster>, ApiError>>;

    fn list_load_balancers(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<LoadBalancer>, ApiError>>;

    fn list_reserved_ips(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<ReservedIp>, ApiError>>;
}

/// Run `call`, failing with [`ApiError::Timeout`] if it takes longer than `timeout`.
pub async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(res) => res,
        Err(_elapsed) => Err(ApiError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let never = futures::future::pending::<Result<(), ApiError>>();
        let err = bounded(Duration::from_secs(10), never).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(d) if d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn bounded_passes_through() {
        let res = bounded(Duration::from_secs(1), async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }
}
