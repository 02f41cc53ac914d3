// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while building descriptors, metric instances and harvester sets.

/// The error cases for constructing a [`Desc`](crate::Desc) or a [`Metric`](crate::Metric).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    /// The fully-qualified metric name is not a valid exposition name.
    #[error("invalid metric name `{0}`")]
    InvalidMetricName(String),
    /// A label name is not a valid exposition label name.
    #[error("invalid label name `{label}` on metric `{metric}`")]
    InvalidLabelName {
        /// Metric the label belongs to
        metric: String,
        /// The offending label name
        label: String,
    },
    /// The same label name appears twice on one descriptor.
    #[error("duplicate label name `{label}` on metric `{metric}`")]
    DuplicateLabelName {
        /// Metric the label belongs to
        metric: String,
        /// The repeated label name
        label: String,
    },
    /// The number of label values does not match the descriptor's label names.
    #[error("metric `{metric}` expects {expected} label values, got {actual}")]
    LabelCardinality {
        /// Metric the values were supplied for
        metric: String,
        /// Number of label names on the descriptor
        expected: usize,
        /// Number of label values supplied
        actual: usize,
    },
    /// Two harvesters registered into one set describe the same metric family.
    #[error("metric `{0}` is described by more than one harvester")]
    DuplicateDescriptor(String),
}
