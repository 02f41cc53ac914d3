// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use futures::{FutureExt, future::BoxFuture};
use harvest_core::{BoxMetricSink, Desc, Harvester, Metric, MetricError, MetricSink, System};
use jiff::Timestamp;

/// Build and process information reported by the exporter about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildInfo {
    pub version: String,
    pub os_version: String,
    pub rust_version: String,
    pub git_commit: String,
    pub start_time: Timestamp,
}

impl BuildInfo {
    /// Build info for a process that started now. Missing values are reported as empty
    /// labels.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            os_version: String::new(),
            rust_version: String::new(),
            git_commit: String::new(),
            start_time: Timestamp::now(),
        }
    }
}

/// `build_info` (always 1) and `start_time` (seconds since the epoch). No remote call.
pub struct ExporterHarvester {
    build_info: Desc,
    start_time: Desc,
    metrics: Vec<Metric>,
}

impl ExporterHarvester {
    pub fn new(system: &System, build: BuildInfo) -> Result<Self, MetricError> {
        let build_info = system.desc(
            "build_info",
            "A metric with a constant '1' value labeled by OS version, Rust version and Git commit of the exporter",
            &["os_version", "rust_version", "git_commit"],
        )?;
        let start_time = system.desc(
            "start_time",
            "Exporter start time in Unix epoch seconds",
            &[],
        )?;
        let metrics = vec![
            Metric::counter(
                &build_info,
                1.0,
                [build.os_version, build.rust_version, build.git_commit],
            )?,
            Metric::gauge(&start_time, build.start_time.as_second() as f64, [""; 0])?,
        ];
        Ok(Self {
            build_info,
            start_time,
            metrics,
        })
    }
}

impl Harvester for ExporterHarvester {
    fn name(&self) -> &str {
        "exporter"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![self.build_info.clone(), self.start_time.clone()]
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        async move { sink.append_all(self.metrics.clone()) }.boxed()
    }
}
