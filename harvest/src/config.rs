// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Harvester configuration.

use std::{path::Path, time::Duration};

use harvest_core::System;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How billing metric families are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingDescriptors {
    /// One `units` and one `cost_usd` family for every product, distinguished by labels.
    #[default]
    Shared,
    /// One pair of families per product, with the canonical product name in the metric name.
    PerProduct,
}

/// Configuration of the harvesters and of the calls they make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestConfig {
    /// First component of every metric name.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Subsystem of the exporter's own and billing metrics.
    #[serde(default = "default_subsystem")]
    pub subsystem: String,

    /// Page-size hint for every paginated listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Bound on every remote call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Bound on the whole pending-charges listing, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub billing_timeout_secs: u64,

    /// Maximum number of per-entity tasks running at once within one harvester.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    #[serde(default)]
    pub billing_descriptors: BillingDescriptors,
}

fn default_namespace() -> String {
    "vultr".to_string()
}

fn default_subsystem() -> String {
    "exporter".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            subsystem: default_subsystem(),
            page_size: default_page_size(),
            fetch_timeout_secs: default_timeout_secs(),
            billing_timeout_secs: default_timeout_secs(),
            max_concurrency: None,
            billing_descriptors: BillingDescriptors::default(),
        }
    }
}

impl HarvestConfig {
    /// Parse a TOML document. Missing keys take their default.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Check the conditions that would make every poll fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero("page_size"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Zero("fetch_timeout_secs"));
        }
        if self.billing_timeout_secs == 0 {
            return Err(ConfigError::Zero("billing_timeout_secs"));
        }
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Zero("max_concurrency"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn billing_timeout(&self) -> Duration {
        Duration::from_secs(self.billing_timeout_secs)
    }

    /// The naming context of the exporter's own metrics.
    pub fn system(&self, version: &str) -> System {
        System::new(&self.namespace, &self.subsystem, version)
    }

    /// The per-harvester call settings.
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            page_size: self.page_size,
            fetch_timeout: self.fetch_timeout(),
            max_concurrency: self.max_concurrency,
        }
    }
}

/// Call settings shared by the listing harvesters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub page_size: usize,
    pub fetch_timeout: Duration,
    pub max_concurrency: Option<usize>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        HarvestConfig::default().collect_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.namespace, "vultr");
        assert_eq!(config.subsystem, "exporter");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.billing_descriptors, BillingDescriptors::Shared);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = HarvestConfig::from_toml(
            r#"
            page_size = 500
            billing_timeout_secs = 30
            billing_descriptors = "per_product"
            "#,
        )
        .unwrap();
        assert_eq!(config.page_size, 500);
        assert_eq!(config.billing_timeout(), Duration::from_secs(30));
        assert_eq!(config.billing_descriptors, BillingDescriptors::PerProduct);
        assert_eq!(config.namespace, "vultr");
        assert_eq!(config.max_concurrency, None);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(HarvestConfig::from_toml("").unwrap(), HarvestConfig::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            HarvestConfig::from_toml("page_sise = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validation() {
        let zero_page = HarvestConfig {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(zero_page.validate(), Err(ConfigError::Zero("page_size")));
        let zero_timeout = HarvestConfig {
            billing_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            zero_timeout.validate(),
            Err(ConfigError::Zero("billing_timeout_secs"))
        );
        let no_namespace = HarvestConfig {
            namespace: String::new(),
            ..Default::default()
        };
        assert_eq!(no_namespace.validate(), Err(ConfigError::EmptyNamespace));
    }
}
