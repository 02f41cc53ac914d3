// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Concrete harvesters, one per resource type.
//!
//! Listing resources (block storage, kubernetes, load balancers, reserved IPs) share one
//! shape: paginate the listing under a timeout, then map every entity to its metric instances
//! in its own task. That shape is [`ResourceHarvester`]; each resource type only supplies a
//! [`ResourceMapper`].

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use harvest_core::{BoxMetricSink, Desc, Harvester, HarvesterSet, Metric, MetricError, MetricSink};

use crate::{
    ApiError, CloudApi, CollectOptions, HarvestConfig, ListOptions, Page, bounded, paginate,
    scatter_gather,
};

mod account;
mod bandwidth;
mod billing;
mod block_storage;
mod exporter;
mod kubernetes;
mod load_balancer;
mod reserved_ips;

pub use account::AccountHarvester;
pub use bandwidth::{BandwidthHarvester, Period};
pub use billing::BillingHarvester;
pub use block_storage::BlockStorageMapper;
pub use exporter::{BuildInfo, ExporterHarvester};
pub use kubernetes::KubernetesMapper;
pub use load_balancer::LoadBalancerMapper;
pub use reserved_ips::ReservedIpsMapper;

/// Maps one listed entity to its metric instances.
pub trait ResourceMapper: Send + Sync + 'static {
    /// The listed entity.
    type Resource: Send + 'static;

    /// Name of the harvester built from this mapper.
    const NAME: &'static str;

    /// Descriptors of every family [`map`](ResourceMapper::map) can produce.
    fn describe(&self) -> Vec<Desc>;

    /// Fetch one page of the listing.
    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<Self::Resource>, ApiError>>;

    /// Every metric instance of `resource`. Failing means none of them are written.
    fn map(&self, resource: &Self::Resource) -> Result<Vec<Metric>, MetricError>;
}

/// A [`Harvester`] that lists one resource type and maps each entity concurrently.
pub struct ResourceHarvester<M> {
    api: Arc<dyn CloudApi>,
    mapper: Arc<M>,
    options: CollectOptions,
}

impl<M: ResourceMapper> ResourceHarvester<M> {
    pub fn new(api: Arc<dyn CloudApi>, mapper: M, options: CollectOptions) -> Self {
        Self {
            api,
            mapper: Arc::new(mapper),
            options,
        }
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }
}

impl<M: ResourceMapper> Harvester for ResourceHarvester<M> {
    fn name(&self) -> &str {
        M::NAME
    }

    fn describe(&self) -> Vec<Desc> {
        self.mapper.describe()
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        async move {
            let api = &*self.api;
            let timeout = self.options.fetch_timeout;
            let resources = match paginate(self.options.page_size, |options| {
                bounded(timeout, M::list(api, options))
            })
            .await
            {
                Ok(resources) => resources,
                Err(error) => {
                    tracing::warn!(%error, "listing failed, no data this cycle");
                    return;
                }
            };
            tracing::debug!(entities = resources.len(), "listed");

            let mapper = self.mapper.clone();
            let report = scatter_gather(resources, self.options.max_concurrency, move |resource| {
                let mapper = mapper.clone();
                let sink = sink.clone();
                async move {
                    let metrics = mapper.map(&resource)?;
                    sink.append_all(metrics);
                    Ok::<_, MetricError>(())
                }
            })
            .await;
            tracing::debug!(?report, "collected");
        }
        .boxed()
    }
}

/// Every harvester of the exporter, registered into one set.
pub fn standard_harvesters(
    config: &HarvestConfig,
    api: Arc<dyn CloudApi>,
    build: BuildInfo,
) -> Result<HarvesterSet, MetricError> {
    let system = config.system(&build.version);
    let options = config.collect_options();
    let resource_system = |subsystem: &str| system.with_subsystem(subsystem);

    HarvesterSet::new()
        .with(ExporterHarvester::new(&system, build)?)?
        .with(AccountHarvester::new(
            api.clone(),
            &resource_system("account"),
            config.fetch_timeout(),
        )?)?
        .with(BillingHarvester::new(
            api.clone(),
            &system.nested("billing"),
            config.billing_descriptors,
            config.page_size,
            config.billing_timeout(),
        )?)?
        .with(ResourceHarvester::new(
            api.clone(),
            BlockStorageMapper::new(&resource_system("block_storage"))?,
            options,
        ))?
        .with(ResourceHarvester::new(
            api.clone(),
            KubernetesMapper::new(&resource_system("kubernetes"))?,
            options,
        ))?
        .with(ResourceHarvester::new(
            api.clone(),
            LoadBalancerMapper::new(&resource_system("load_balancer"))?,
            options,
        ))?
        .with(ResourceHarvester::new(
            api,
            ReservedIpsMapper::new(&resource_system("reserved_ips"))?,
            options,
        ))
}

/// 1 for `active`, 0 for anything else.
pub(crate) fn active(status: &str) -> f64 {
    if status == "active" { 1.0 } else { 0.0 }
}
