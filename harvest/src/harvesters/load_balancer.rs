// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use futures::future::BoxFuture;
use harvest_core::{Desc, Metric, MetricError, System};

use super::{ResourceMapper, active};
use crate::{ApiError, CloudApi, ListOptions, Page, model::LoadBalancer};

const LABELS: &[&str] = &["label", "region", "status"];

/// Load balancers: `up` and `instances` per load balancer.
#[derive(Debug, Clone)]
pub struct LoadBalancerMapper {
    up: Desc,
    instances: Desc,
}

impl LoadBalancerMapper {
    pub fn new(system: &System) -> Result<Self, MetricError> {
        Ok(Self {
            up: system.desc("up", "1 if the Load Balancer is active", LABELS)?,
            instances: system.desc(
                "instances",
                "Number of instances attached to the Load Balancer",
                LABELS,
            )?,
        })
    }
}

impl ResourceMapper for LoadBalancerMapper {
    type Resource = LoadBalancer;

    const NAME: &'static str = "load_balancer";

    fn describe(&self) -> Vec<Desc> {
        vec![self.up.clone(), self.instances.clone()]
    }

    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<LoadBalancer>, ApiError>> {
        api.list_load_balancers(options)
    }

    fn map(&self, lb: &LoadBalancer) -> Result<Vec<Metric>, MetricError> {
        let labels = [&lb.label, &lb.region, &lb.status];
        Ok(vec![
            Metric::counter(&self.up, active(&lb.status), labels)?,
            Metric::gauge(&self.instances, lb.instances.len() as f64, labels)?,
        ])
    }
}
