// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The two-phase Describe/Collect protocol and the set of harvesters a serving endpoint
//! invokes once per scrape.

use std::{collections::HashSet, sync::Arc};

use futures::future::BoxFuture;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::{BoxMetricSink, Desc, Metric, MetricError, MetricSink, channel};

/// A component that knows how to produce the metrics for one resource type.
///
/// [`describe`](Harvester::describe) declares the shape of every family the harvester can
/// ever produce. [`collect`](Harvester::collect) runs one fetch, aggregate and emit cycle,
/// writing instances into the sink.
///
/// A `collect` that fails writes nothing for the failing entity (or for the whole harvester
/// when the listing itself fails) and logs the condition. It never writes a partial entity.
pub trait Harvester: Send + Sync {
    /// Short name used in logs and tracing spans.
    fn name(&self) -> &str;

    /// Descriptors of every metric family this harvester can produce. Must be callable before
    /// any data is fetched and must not have side effects.
    fn describe(&self) -> Vec<Desc>;

    /// Run one collection cycle, writing metric instances into `sink`.
    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()>;
}

impl<H: Harvester + ?Sized> Harvester for Arc<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn describe(&self) -> Vec<Desc> {
        (**self).describe()
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        (**self).collect(sink)
    }
}

/// The harvesters registered at process start.
///
/// Built once and queried repeatedly; each harvester owns whatever state it keeps between
/// cycles, so the set itself is never mutated after startup.
#[derive(Default, Clone)]
pub struct HarvesterSet {
    harvesters: Vec<Arc<dyn Harvester>>,
    described: HashSet<String>,
}

impl std::fmt::Debug for HarvesterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.harvesters.iter().map(|h| h.name().to_owned()))
            .finish()
    }
}

impl HarvesterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a harvester to the set.
    ///
    /// Fails if one of its descriptors has the same fully-qualified name as a descriptor of an
    /// already registered harvester.
    pub fn register(&mut self, harvester: impl Harvester + 'static) -> Result<(), MetricError> {
        let descs = harvester.describe();
        let mut names = HashSet::with_capacity(descs.len());
        for desc in &descs {
            let name = desc.fq_name();
            if self.described.contains(name) || !names.insert(name.to_owned()) {
                return Err(MetricError::DuplicateDescriptor(name.to_owned()));
            }
        }
        self.described.extend(names);
        self.harvesters.push(Arc::new(harvester));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, harvester: impl Harvester + 'static) -> Result<Self, MetricError> {
        self.register(harvester)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.harvesters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harvesters.is_empty()
    }

    /// Names of the registered harvesters, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.harvesters.iter().map(|h| h.name())
    }

    /// Descriptors of every registered harvester.
    pub fn describe(&self) -> Vec<Desc> {
        self.harvesters.iter().flat_map(|h| h.describe()).collect()
    }

    /// Run one collection cycle of every harvester concurrently, returning once all of them
    /// have finished.
    ///
    /// Each harvester runs as its own task, so a panicking harvester is logged and does not
    /// affect its siblings.
    pub async fn collect(&self, sink: BoxMetricSink) {
        let mut tasks = JoinSet::new();
        for harvester in &self.harvesters {
            let harvester = harvester.clone();
            let sink = sink.clone();
            let span = tracing::info_span!("collect", harvester = harvester.name());
            tasks.spawn(
                async move {
                    harvester.collect(sink).await;
                }
                .instrument(span),
            );
        }
        drop(sink);
        while let Some(res) = tasks.join_next().await {
            if let Err(err) = res {
                tracing::error!(?err, "harvester task failed");
            }
        }
    }

    /// Run one collection cycle and return every instance produced, in arrival order.
    ///
    /// Collection and draining run concurrently over a [`channel`].
    pub async fn gather(&self) -> Vec<Metric> {
        let (sink, rx) = channel();
        let (_, metrics) = tokio::join!(self.collect(sink.boxed()), rx.collect_all());
        metrics
    }
}
