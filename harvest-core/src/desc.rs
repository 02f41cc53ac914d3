// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains [`Desc`], the static shape of a metric family, and [`System`], the naming
//! context harvesters build their descriptors in.

use std::{fmt, sync::Arc};

use crate::MetricError;

/// Describes one metric family: fully-qualified name, help text and ordered label names.
///
/// Descriptors are created once when a harvester is constructed and never change afterwards.
/// Cloning is cheap and still refers to the same descriptor.
#[derive(Clone)]
pub struct Desc(Arc<DescInner>);

struct DescInner {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
}

impl Desc {
    /// Create a new descriptor, validating the metric and label names.
    pub fn new(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Result<Self, MetricError> {
        let fq_name = fq_name.into();
        if !is_valid_metric_name(&fq_name) {
            return Err(MetricError::InvalidMetricName(fq_name));
        }
        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for &label in label_names {
            if !is_valid_label_name(label) {
                return Err(MetricError::InvalidLabelName {
                    metric: fq_name,
                    label: label.to_owned(),
                });
            }
            if names.iter().any(|n| n == label) {
                return Err(MetricError::DuplicateLabelName {
                    metric: fq_name,
                    label: label.to_owned(),
                });
            }
            names.push(label.to_owned());
        }
        Ok(Self(Arc::new(DescInner {
            fq_name,
            help: help.into(),
            label_names: names,
        })))
    }

    /// The fully-qualified metric name.
    pub fn fq_name(&self) -> &str {
        &self.0.fq_name
    }

    /// The help text.
    pub fn help(&self) -> &str {
        &self.0.help
    }

    /// The label names, in the order label values must be supplied.
    pub fn label_names(&self) -> &[String] {
        &self.0.label_names
    }
}

impl PartialEq for Desc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.fq_name == other.0.fq_name && self.0.label_names == other.0.label_names)
    }
}

impl Eq for Desc {}

impl fmt::Debug for Desc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Desc")
            .field("fq_name", &self.0.fq_name)
            .field("label_names", &self.0.label_names)
            .finish()
    }
}

/// Joins the non-empty parts of a metric name with underscores.
///
/// ```
/// # use harvest_core::build_fq_name;
/// assert_eq!(build_fq_name("vultr", "account", "balance"), "vultr_account_balance");
/// assert_eq!(build_fq_name("vultr", "", "up"), "vultr_up");
/// assert_eq!(build_fq_name("", "", ""), "");
/// ```
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Naming context for a harvester's metrics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct System {
    /// First component of every metric name
    pub namespace: String,
    /// Second component of every metric name
    pub subsystem: String,
    /// Version of the exporter, reported by the build info metric
    pub version: String,
}

impl System {
    /// Create a new naming context.
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            version: version.into(),
        }
    }

    /// Returns a copy of this context with a different subsystem.
    pub fn with_subsystem(&self, subsystem: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            subsystem: subsystem.into(),
            version: self.version.clone(),
        }
    }

    /// Returns a copy of this context whose subsystem is extended by `suffix`.
    pub fn nested(&self, suffix: &str) -> Self {
        if self.subsystem.is_empty() {
            self.with_subsystem(suffix)
        } else {
            self.with_subsystem(format!("{}_{}", self.subsystem, suffix))
        }
    }

    /// Fully-qualified name of `name` in this context.
    pub fn fq_name(&self, name: &str) -> String {
        build_fq_name(&self.namespace, &self.subsystem, name)
    }

    /// Build a descriptor named `name` in this context.
    pub fn desc(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Desc, MetricError> {
        Desc::new(self.fq_name(name), help, label_names)
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(
            Desc::new("9lives", "", &[]),
            Err(MetricError::InvalidMetricName("9lives".into()))
        );
        assert!(matches!(
            Desc::new("ok", "", &["__reserved"]),
            Err(MetricError::InvalidLabelName { .. })
        ));
        assert!(matches!(
            Desc::new("ok", "", &["a", "a"]),
            Err(MetricError::DuplicateLabelName { .. })
        ));
        assert!(Desc::new("object_storage_(s3)_units", "", &[]).is_err());
    }

    #[test]
    fn nested_subsystems() {
        let system = System::new("vultr", "account", "v0.1.0");
        let bandwidth = system.nested("bandwidth").nested("previous");
        assert_eq!(bandwidth.fq_name("gb_in"), "vultr_account_bandwidth_previous_gb_in");
        assert_eq!(
            System::new("vultr", "", "").nested("billing").fq_name("units"),
            "vultr_billing_units"
        );
    }

    #[test]
    fn desc_equality_is_structural() {
        let a = Desc::new("x_total", "one", &["a"]).unwrap();
        let b = Desc::new("x_total", "two", &["a"]).unwrap();
        let c = Desc::new("x_total", "one", &["b"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
