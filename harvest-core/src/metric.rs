// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use smallvec::SmallVec;

use crate::{Desc, MetricError};

/// Whether a sample is a monotonically increasing counter or a point-in-time gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Monotonic counter
    Counter,
    /// Point-in-time value
    Gauge,
}

impl ValueKind {
    /// The exposition type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Counter => "counter",
            ValueKind::Gauge => "gauge",
        }
    }
}

/// Label values of one metric instance, in descriptor order.
pub type LabelValues = SmallVec<[String; 4]>;

/// One sample: a descriptor, a kind, a value and one label value per label name.
///
/// A `Metric` can only be built through [`Metric::new`] (or the [`gauge`](Metric::gauge) and
/// [`counter`](Metric::counter) shorthands), which check the label cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    desc: Desc,
    kind: ValueKind,
    value: f64,
    label_values: LabelValues,
}

impl Metric {
    /// Build a metric instance, failing if the number of label values does not match the
    /// descriptor.
    pub fn new<I, S>(
        desc: &Desc,
        kind: ValueKind,
        value: f64,
        label_values: I,
    ) -> Result<Self, MetricError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label_values: LabelValues = label_values.into_iter().map(Into::into).collect();
        if label_values.len() != desc.label_names().len() {
            return Err(MetricError::LabelCardinality {
                metric: desc.fq_name().to_owned(),
                expected: desc.label_names().len(),
                actual: label_values.len(),
            });
        }
        Ok(Self {
            desc: desc.clone(),
            kind,
            value,
            label_values,
        })
    }

    /// Shorthand for a [`ValueKind::Gauge`] instance.
    pub fn gauge<I, S>(desc: &Desc, value: f64, label_values: I) -> Result<Self, MetricError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(desc, ValueKind::Gauge, value, label_values)
    }

    /// Shorthand for a [`ValueKind::Counter`] instance.
    pub fn counter<I, S>(desc: &Desc, value: f64, label_values: I) -> Result<Self, MetricError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(desc, ValueKind::Counter, value, label_values)
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn fq_name(&self) -> &str {
        self.desc.fq_name()
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// `(name, value)` label pairs, in descriptor order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.desc
            .label_names()
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// The value of the label called `name`, if the descriptor has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}
