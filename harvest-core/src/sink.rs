// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains the [`MetricSink`] trait, the write side of a collection cycle, along with the
//! channel, in-memory and null sinks.
//!
//! Harvesters and their per-entity tasks all write into one sink concurrently. The sink used
//! for serving is [`channel()`], a multi-producer single-consumer queue whose reader drains
//! instances in arrival order.

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc;

use crate::Metric;

/// Accepts metric instances produced during a collection cycle.
///
/// `append` must never block and must never panic, so it can be called from any number of
/// concurrent tasks without external locking.
pub trait MetricSink {
    /// Append one metric instance.
    fn append(&self, metric: Metric);

    /// Append a batch of instances that belong together (for example every metric of one
    /// entity). The default implementation appends them one by one.
    fn append_all(&self, metrics: Vec<Metric>) {
        for metric in metrics {
            self.append(metric);
        }
    }

    /// Returns a [`BoxMetricSink`] that is a type-erased version of this sink
    fn boxed(self) -> BoxMetricSink
    where
        Self: Sized + Send + Sync + 'static,
    {
        BoxMetricSink::new(self)
    }
}

impl<T: MetricSink + ?Sized> MetricSink for &T {
    fn append(&self, metric: Metric) {
        (**self).append(metric)
    }

    fn append_all(&self, metrics: Vec<Metric>) {
        (**self).append_all(metrics)
    }
}

impl<T: MetricSink + ?Sized> MetricSink for Arc<T> {
    fn append(&self, metric: Metric) {
        (**self).append(metric)
    }

    fn append_all(&self, metrics: Vec<Metric>) {
        (**self).append_all(metrics)
    }
}

/// A type-erased, cheaply cloneable [`MetricSink`].
#[derive(Clone)]
pub struct BoxMetricSink(Arc<dyn MetricSink + Send + Sync + 'static>);

impl Debug for BoxMetricSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxMetricSink").finish()
    }
}

impl BoxMetricSink {
    /// Erase the type of `sink`.
    pub fn new(sink: impl MetricSink + Send + Sync + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl MetricSink for BoxMetricSink {
    fn append(&self, metric: Metric) {
        self.0.append(metric)
    }

    fn append_all(&self, metrics: Vec<Metric>) {
        self.0.append_all(metrics)
    }

    fn boxed(self) -> BoxMetricSink {
        self
    }
}

/// Create a connected ([`ChannelSink`], [`MetricReceiver`]) pair.
///
/// The channel is unbounded, so writers never wait on the reader. The reader sees the end of
/// the stream once every clone of the sink has been dropped.
pub fn channel() -> (ChannelSink, MetricReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, MetricReceiver { rx })
}

/// Write side of [`channel()`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Metric>,
}

impl MetricSink for ChannelSink {
    fn append(&self, metric: Metric) {
        if self.tx.send(metric).is_err() {
            crate::rate_limited!(
                Duration::from_secs(60),
                tracing::warn!("metric receiver dropped before collection finished, discarding")
            );
        }
    }
}

/// Read side of [`channel()`].
#[derive(Debug)]
pub struct MetricReceiver {
    rx: mpsc::UnboundedReceiver<Metric>,
}

impl MetricReceiver {
    /// Receive the next instance, or `None` once every sink clone has been dropped and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<Metric> {
        self.rx.recv().await
    }

    /// Drain the channel until every writer is gone, returning instances in arrival order.
    pub async fn collect_all(mut self) -> Vec<Metric> {
        let mut out = Vec::new();
        while let Some(metric) = self.rx.recv().await {
            out.push(metric);
        }
        out
    }
}

/// Keeps every appended instance in memory.
///
/// Mostly useful in tests and for rendering a finished cycle in one pass.
#[derive(Debug, Clone, Default)]
pub struct VecMetricSink(Arc<Mutex<Vec<Metric>>>);

impl VecMetricSink {
    /// Take all the instances collected so far, leaving the sink empty.
    pub fn drain(&self) -> Vec<Metric> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of instances currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Metric>> {
        // a panic while holding the lock cannot leave the Vec half-written
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MetricSink for VecMetricSink {
    fn append(&self, metric: Metric) {
        self.lock().push(metric);
    }

    fn append_all(&self, metrics: Vec<Metric>) {
        self.lock().extend(metrics);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevNullSink;

impl MetricSink for DevNullSink {
    fn append(&self, _metric: Metric) {}
}
