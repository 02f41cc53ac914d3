// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(docsrs, feature(doc_cfg))]

//! The telemetry harvesting engine.
//!
//! - [`paginate`] walks a cursor-paginated listing to completion.
//! - [`scatter_gather`] runs per-entity work concurrently and joins it.
//! - [`CloudApi`] is the boundary to the cloud provider.
//! - [`harvesters`] contains one [`Harvester`](harvest_core::Harvester) per resource type, and
//!   [`standard_harvesters`](harvesters::standard_harvesters) registers them all.
//!
//! ```
//! use std::sync::Arc;
//! use harvest::{HarvestConfig, harvesters::{BuildInfo, standard_harvesters}};
//! use harvest::test_util::FakeCloudApi;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let api = Arc::new(FakeCloudApi::default());
//! let set = standard_harvesters(&HarvestConfig::default(), api, BuildInfo::new("v0.1.0")).unwrap();
//! let metrics = set.gather().await;
//! assert!(metrics.iter().any(|m| m.fq_name() == "vultr_exporter_build_info"));
//! # });
//! ```

mod api;
mod config;
mod error;
mod fanout;
pub mod harvesters;
pub mod model;
mod paginate;

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;

pub use api::{CloudApi, ListOptions, Page, bounded};
pub use config::{BillingDescriptors, CollectOptions, HarvestConfig};
pub use error::{ApiError, BoxError, ConfigError};
pub use fanout::{GatherReport, scatter_gather};
pub use paginate::paginate;
