// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core types for harvesting cloud telemetry into labeled metrics.
//!
//! A [`Harvester`] declares the [`Desc`]riptors of the metric families it can produce and,
//! once per scrape, writes [`Metric`] instances into a [`MetricSink`]. A [`HarvesterSet`]
//! composes the harvesters registered at startup and runs them concurrently against one
//! shared sink.

mod desc;
mod error;
mod harvester;
mod metric;
#[doc(hidden)]
pub mod rate_limit;
pub mod sink;

#[cfg(feature = "test-util")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;

pub use desc::{Desc, System, build_fq_name};
pub use error::MetricError;
pub use harvester::{Harvester, HarvesterSet};
pub use metric::{LabelValues, Metric, ValueKind};
pub use sink::{
    BoxMetricSink, ChannelSink, DevNullSink, MetricReceiver, MetricSink, VecMetricSink, channel,
};
