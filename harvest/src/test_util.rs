// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! [`FakeCloudApi`] serves canned resources through the [`CloudApi`] boundary.
//!
//! This requires that the `test-util` feature be enabled.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use futures::{FutureExt, future::BoxFuture};
use harvest_aggregation::InvoiceItem;

use crate::{
    ApiError, CloudApi, ListOptions, Page,
    model::{Account, Bandwidth, BlockStorage, KubernetesCluster, LoadBalancer, ReservedIp},
};

/// The calls of [`CloudApi`], for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Account,
    Bandwidth,
    PendingCharges,
    BlockStorage,
    KubernetesClusters,
    LoadBalancers,
    ReservedIps,
}

#[derive(Default)]
struct State {
    account: Account,
    bandwidth: Bandwidth,
    pending_charges: Vec<InvoiceItem>,
    block_storage: Vec<BlockStorage>,
    kubernetes_clusters: Vec<KubernetesCluster>,
    load_balancers: Vec<LoadBalancer>,
    reserved_ips: Vec<ReservedIp>,
    failing: HashSet<Endpoint>,
    hanging: HashSet<Endpoint>,
    calls: HashMap<Endpoint, usize>,
}

/// An in-memory [`CloudApi`].
///
/// Listings are paginated honestly: the cursor is the offset of the next page, and the last
/// page carries an empty cursor. Endpoints can be made to fail with a 500 or to never answer.
///
/// # Examples
/// ```
/// use harvest::test_util::{Endpoint, FakeCloudApi};
/// use harvest::model::ReservedIp;
///
/// let api = FakeCloudApi::default()
///     .with_reserved_ips(vec![ReservedIp::default(); 3])
///     .failing(Endpoint::Account);
/// assert_eq!(api.calls(Endpoint::ReservedIps), 0);
/// ```
#[derive(Default)]
pub struct FakeCloudApi {
    state: Mutex<State>,
}

impl FakeCloudApi {
    pub fn with_account(self, account: Account) -> Self {
        self.state.lock().unwrap().account = account;
        self
    }

    pub fn with_bandwidth(self, bandwidth: Bandwidth) -> Self {
        self.state.lock().unwrap().bandwidth = bandwidth;
        self
    }

    pub fn with_pending_charges(self, items: Vec<InvoiceItem>) -> Self {
        self.set_pending_charges(items);
        self
    }

    pub fn with_block_storage(self, items: Vec<BlockStorage>) -> Self {
        self.state.lock().unwrap().block_storage = items;
        self
    }

    pub fn with_kubernetes_clusters(self, items: Vec<KubernetesCluster>) -> Self {
        self.state.lock().unwrap().kubernetes_clusters = items;
        self
    }

    pub fn with_load_balancers(self, items: Vec<LoadBalancer>) -> Self {
        self.state.lock().unwrap().load_balancers = items;
        self
    }

    pub fn with_reserved_ips(self, items: Vec<ReservedIp>) -> Self {
        self.state.lock().unwrap().reserved_ips = items;
        self
    }

    /// Make `endpoint` answer with a 500.
    pub fn failing(self, endpoint: Endpoint) -> Self {
        self.set_failing(endpoint, true);
        self
    }

    /// Make `endpoint` never answer.
    pub fn hanging(self, endpoint: Endpoint) -> Self {
        self.state.lock().unwrap().hanging.insert(endpoint);
        self
    }

    /// Replace the pending charges served from now on.
    pub fn set_pending_charges(&self, items: Vec<InvoiceItem>) {
        self.state.lock().unwrap().pending_charges = items;
    }

    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(endpoint);
        } else {
            state.failing.remove(&endpoint);
        }
    }

    /// Number of calls made to `endpoint` so far. A paginated listing counts one call per page.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    fn respond<T: Send + 'static>(
        &self,
        endpoint: Endpoint,
        answer: impl FnOnce(&State) -> T,
    ) -> BoxFuture<'_, Result<T, ApiError>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(endpoint).or_default() += 1;
        if state.hanging.contains(&endpoint) {
            return futures::future::pending().boxed();
        }
        if state.failing.contains(&endpoint) {
            return futures::future::ready(Err(ApiError::Status {
                status: 500,
                body: format!("{endpoint:?} unavailable"),
            }))
            .boxed();
        }
        futures::future::ready(Ok(answer(&state))).boxed()
    }
}

fn page<T: Clone>(items: &[T], options: &ListOptions) -> Page<T> {
    let start = options.cursor.parse::<usize>().unwrap_or(0).min(items.len());
    let end = (start + options.per_page.max(1)).min(items.len());
    let next = if end < items.len() {
        end.to_string()
    } else {
        String::new()
    };
    Page::new(items[start..end].to_vec(), next)
}

impl CloudApi for FakeCloudApi {
    fn get_account(&self) -> BoxFuture<'_, Result<Account, ApiError>> {
        self.respond(Endpoint::Account, |s| s.account.clone())
    }

    fn get_bandwidth(&self) -> BoxFuture<'_, Result<Bandwidth, ApiError>> {
        self.respond(Endpoint::Bandwidth, |s| s.bandwidth.clone())
    }

    fn list_pending_charges(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<InvoiceItem>, ApiError>> {
        self.respond(Endpoint::PendingCharges, move |s| {
            page(&s.pending_charges, &options)
        })
    }

    fn list_block_storage(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<BlockStorage>, ApiError>> {
        self.respond(Endpoint::BlockStorage, move |s| {
            page(&s.block_storage, &options)
        })
    }

    fn list_kubernetes_clusters(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<KubernetesCluster>, ApiError>> {
        self.respond(Endpoint::KubernetesClusters, move |s| {
            page(&s.kubernetes_clusters, &options)
        })
    }

    fn list_load_balancers(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<LoadBalancer>, ApiError>> {
        self.respond(Endpoint::LoadBalancers, move |s| {
            page(&s.load_balancers, &options)
        })
    }

    fn list_reserved_ips(
        &self,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<ReservedIp>, ApiError>> {
        self.respond(Endpoint::ReservedIps, move |s| {
            page(&s.reserved_ips, &options)
        })
    }
}
