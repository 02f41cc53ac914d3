// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! [`TestMetric`] provides a way to directly introspect the metric instances a harvester wrote.
//!
//! This requires that the `test-util` feature be enabled.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::{BoxMetricSink, Metric, MetricSink, ValueKind};

/// A test representation of a metric instance, with labels keyed by name.
///
/// This requires that the `test-util` feature be enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct TestMetric {
    /// The fully-qualified metric name.
    pub name: String,
    /// Counter or gauge.
    pub kind: ValueKind,
    /// The sample value.
    pub value: f64,
    /// Label values, mapped by label name.
    pub labels: BTreeMap<String, String>,
}

impl From<&Metric> for TestMetric {
    fn from(metric: &Metric) -> Self {
        Self {
            name: metric.fq_name().to_owned(),
            kind: metric.kind(),
            value: metric.value(),
            labels: metric
                .labels()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }
}

impl TestMetric {
    /// Returns true if every `(name, value)` pair in `labels` is present on this instance.
    pub fn has_labels(&self, labels: &[(&str, &str)]) -> bool {
        labels
            .iter()
            .all(|(k, v)| self.labels.get(*k).map(String::as_str) == Some(*v))
    }
}

/// A test sink for capturing and inspecting metric instances.
///
/// This requires that the `test-util` feature be enabled.
pub struct TestMetricSink {
    /// The inspector for examining captured instances.
    pub inspector: Inspector,
    /// The sink to hand to the code under test.
    pub sink: BoxMetricSink,
}

/// Create an [`Inspector`] and a connected [`BoxMetricSink`].
///
/// # Examples
/// ```
/// use harvest_core::test_util::{TestMetricSink, test_metric_sink};
/// use harvest_core::{Desc, Metric, MetricSink};
///
/// let TestMetricSink { inspector, sink } = test_metric_sink();
/// let desc = Desc::new("vultr_account_balance", "", &["name", "email"]).unwrap();
/// sink.append(Metric::gauge(&desc, -12.5, ["jane", "jane@example.com"]).unwrap());
///
/// let balance = inspector.get("vultr_account_balance", &[("name", "jane")]).unwrap();
/// assert_eq!(balance.value, -12.5);
/// ```
pub fn test_metric_sink() -> TestMetricSink {
    let inspector = Inspector::default();
    TestMetricSink {
        inspector: inspector.clone(),
        sink: BoxMetricSink::new(inspector),
    }
}

/// `Inspector` can be used as a sink while making it easy to read the instances written to it.
#[derive(Default, Clone, Debug)]
pub struct Inspector {
    metrics: Arc<Mutex<Vec<TestMetric>>>,
}

impl Inspector {
    /// Return every captured instance, in arrival order.
    ///
    /// Note: this does not drain or otherwise modify the captured instances
    pub fn metrics(&self) -> Vec<TestMetric> {
        self.metrics.lock().unwrap().clone()
    }

    /// Number of captured instances.
    pub fn len(&self) -> usize {
        self.metrics.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every captured instance named `name`.
    pub fn find(&self, name: &str) -> Vec<TestMetric> {
        self.metrics
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.name == name)
            .cloned()
            .collect()
    }

    /// The first captured instance named `name` carrying all of `labels`.
    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> Option<TestMetric> {
        self.find(name).into_iter().find(|m| m.has_labels(labels))
    }

    /// Sorted, de-duplicated names of every captured instance.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.metrics().into_iter().map(|m| m.name).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Forget every captured instance.
    pub fn clear(&self) {
        self.metrics.lock().unwrap().clear();
    }
}

impl MetricSink for Inspector {
    fn append(&self, metric: Metric) {
        self.metrics.lock().unwrap().push(TestMetric::from(&metric));
    }
}
