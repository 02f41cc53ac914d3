// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use harvest_aggregation::{
    AggregationKey, Aggregator, BillingDescs, InvoiceItem, KeyedRegistry, RecordAggregator,
};
use harvest_core::{
    BoxMetricSink, Desc, Harvester, MetricError, MetricSink, System, rate_limited,
};

use crate::{BillingDescriptors, CloudApi, bounded, paginate};

type Registry = KeyedRegistry<AggregationKey, RecordAggregator>;

/// Pending charges, aggregated per `(product, description)`.
///
/// Each cycle lists every pending charge under one timeout, evicts the aggregators of keys
/// that no longer appear, folds the records into their aggregators in listing order, and
/// emits every aggregator. Aggregation is sequential, so for records sharing a unit type the
/// last one listed sets the unit price label.
pub struct BillingHarvester {
    api: Arc<dyn CloudApi>,
    system: System,
    shared: BillingDescs,
    design: BillingDescriptors,
    page_size: usize,
    timeout: Duration,
    registry: Mutex<Registry>,
}

impl BillingHarvester {
    pub fn new(
        api: Arc<dyn CloudApi>,
        system: &System,
        design: BillingDescriptors,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            api,
            shared: BillingDescs::new(system)?,
            system: system.clone(),
            design,
            page_size,
            timeout,
            registry: Mutex::new(Registry::new()),
        })
    }

    /// Keys currently registered, sorted.
    pub fn keys(&self) -> Vec<AggregationKey> {
        let mut keys: Vec<_> = self.registry().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // the registry is rebuilt from scratch by reconcile, a poisoned one is still usable
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Descriptors for a new aggregator. In the per-product design, a product whose name
    /// cannot form a metric name falls back to the shared descriptors.
    fn descs_for(&self, key: &AggregationKey) -> BillingDescs {
        match self.design {
            BillingDescriptors::Shared => self.shared.clone(),
            BillingDescriptors::PerProduct => {
                let product = key.canonical_product();
                BillingDescs::new(&self.system.nested(&product)).unwrap_or_else(|error| {
                    rate_limited!(
                        Duration::from_secs(60),
                        tracing::warn!(%error, %product, "using shared billing descriptors")
                    );
                    self.shared.clone()
                })
            }
        }
    }

    /// Reconcile, aggregate and emit one cycle's records. Returns the number of instances
    /// written.
    pub fn process(&self, records: &[InvoiceItem], sink: &dyn MetricSink) -> usize {
        let keys: HashSet<AggregationKey> = records.iter().map(AggregationKey::of).collect();
        let mut registry = self.registry();
        let evicted = registry.reconcile(&keys);

        for record in records {
            registry
                .get_or_create(AggregationKey::of(record), |key| {
                    RecordAggregator::new(self.descs_for(key))
                })
                .aggregate(record);
        }

        let written = registry.emit_all(sink);
        tracing::debug!(
            records = records.len(),
            keys = registry.len(),
            evicted,
            written,
            "billing cycle complete"
        );
        written
    }
}

impl Harvester for BillingHarvester {
    fn name(&self) -> &str {
        "billing"
    }

    fn describe(&self) -> Vec<Desc> {
        match self.design {
            BillingDescriptors::Shared => self.shared.to_vec(),
            BillingDescriptors::PerProduct => {
                let mut descs: Vec<Desc> = self
                    .registry()
                    .iter()
                    .flat_map(|(_, aggregator)| aggregator.describe())
                    .collect();
                descs.sort_by(|a, b| a.fq_name().cmp(b.fq_name()));
                descs.dedup_by(|a, b| a.fq_name() == b.fq_name());
                descs
            }
        }
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        async move {
            let api = &*self.api;
            let listing = paginate(self.page_size, |options| api.list_pending_charges(options));
            let records = match bounded(self.timeout, listing).await {
                Ok(records) => records,
                Err(error) => {
                    tracing::warn!(%error, "pending charges listing failed, no data this cycle");
                    return;
                }
            };
            self.process(&records, &sink);
        }
        .boxed()
    }
}
