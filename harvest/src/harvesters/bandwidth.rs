// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use harvest_core::{BoxMetricSink, Desc, Harvester, Metric, MetricError, MetricSink, System};

use crate::{
    CloudApi, bounded,
    model::{Bandwidth, BandwidthPeriod},
};

/// One of the three periods reported by the bandwidth call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Previous,
    Current,
    Projected,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Previous, Period::Current, Period::Projected];

    /// Suffix of the subsystem this period's metrics are named in.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Previous => "previous",
            Period::Current => "current",
            Period::Projected => "projected",
        }
    }

    pub fn select(self, bandwidth: &Bandwidth) -> &BandwidthPeriod {
        match self {
            Period::Previous => &bandwidth.previous_month,
            Period::Current => &bandwidth.current_month_to_date,
            Period::Projected => &bandwidth.current_month_projected,
        }
    }
}

type Field = fn(&BandwidthPeriod) -> f64;

const FIELDS: [(&str, &str, Field); 10] = [
    ("gb_in", "Inbound bandwidth in GB", |p| p.gb_in),
    ("gb_out", "Outbound bandwidth in GB", |p| p.gb_out),
    ("total_instance_hours", "Total instance hours", |p| {
        p.total_instance_hours
    }),
    ("total_instance_count", "Total instance count", |p| {
        p.total_instance_count
    }),
    (
        "instance_bandwidth_credits",
        "Instance bandwidth credits",
        |p| p.instance_bandwidth_credits,
    ),
    ("free_bandwidth_credits", "Free bandwidth credits", |p| {
        p.free_bandwidth_credits
    }),
    (
        "purchased_bandwidth_credits",
        "Purchased bandwidth credits",
        |p| p.purchased_bandwidth_credits,
    ),
    ("overage", "Bandwidth overage", |p| p.overage),
    ("overage_unit_cost", "Bandwidth overage unit cost", |p| {
        p.overage_unit_cost
    }),
    ("overage_cost", "Bandwidth overage cost", |p| p.overage_cost),
];

/// Account bandwidth, one gauge per field per period.
///
/// Runs nested inside the account harvester. Period metrics are named in subsystem
/// `<subsystem>_<period>`, e.g. `vultr_account_bandwidth_previous_gb_in`.
pub struct BandwidthHarvester {
    api: Arc<dyn CloudApi>,
    periods: Vec<(Period, Vec<(Desc, Field)>)>,
    timeout: Duration,
}

impl BandwidthHarvester {
    pub fn new(
        api: Arc<dyn CloudApi>,
        system: &System,
        timeout: Duration,
    ) -> Result<Self, MetricError> {
        let periods = Period::ALL
            .into_iter()
            .map(|period| -> Result<_, MetricError> {
                let system = system.nested(period.as_str());
                let descs = FIELDS
                    .iter()
                    .map(|&(name, help, field)| system.desc(name, help, &[]).map(|d| (d, field)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((period, descs))
            })
            .collect::<Result<Vec<_>, MetricError>>()?;
        Ok(Self {
            api,
            periods,
            timeout,
        })
    }

    fn metrics(&self, bandwidth: &Bandwidth) -> Result<Vec<Metric>, MetricError> {
        let mut out = Vec::with_capacity(Period::ALL.len() * FIELDS.len());
        for (period, fields) in &self.periods {
            let values = period.select(bandwidth);
            for (desc, field) in fields {
                out.push(Metric::gauge(desc, field(values), [""; 0])?);
            }
        }
        Ok(out)
    }
}

impl Harvester for BandwidthHarvester {
    fn name(&self) -> &str {
        "bandwidth"
    }

    fn describe(&self) -> Vec<Desc> {
        self.periods
            .iter()
            .flat_map(|(_, fields)| fields.iter().map(|(desc, _)| desc.clone()))
            .collect()
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        async move {
            let bandwidth = match bounded(self.timeout, self.api.get_bandwidth()).await {
                Ok(bandwidth) => bandwidth,
                Err(error) => {
                    tracing::warn!(%error, "bandwidth call failed, no data this cycle");
                    return;
                }
            };
            match self.metrics(&bandwidth) {
                Ok(metrics) => sink.append_all(metrics),
                Err(error) => tracing::warn!(%error, "dropping malformed bandwidth metrics"),
            }
        }
        .boxed()
    }
}
