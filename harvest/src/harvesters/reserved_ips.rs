// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use futures::future::BoxFuture;
use harvest_core::{Desc, Metric, MetricError, System};

use super::ResourceMapper;
use crate::{ApiError, CloudApi, ListOptions, Page, model::ReservedIp};

/// Reserved IPs: `up` = 1 per reserved IP.
#[derive(Debug, Clone)]
pub struct ReservedIpsMapper {
    up: Desc,
}

impl ReservedIpsMapper {
    pub fn new(system: &System) -> Result<Self, MetricError> {
        Ok(Self {
            up: system.desc(
                "up",
                "Reserved IPs",
                &["region", "type", "subnet_size", "label"],
            )?,
        })
    }
}

impl ResourceMapper for ReservedIpsMapper {
    type Resource = ReservedIp;

    const NAME: &'static str = "reserved_ips";

    fn describe(&self) -> Vec<Desc> {
        vec![self.up.clone()]
    }

    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<ReservedIp>, ApiError>> {
        api.list_reserved_ips(options)
    }

    fn map(&self, ip: &ReservedIp) -> Result<Vec<Metric>, MetricError> {
        Ok(vec![Metric::counter(
            &self.up,
            1.0,
            [
                ip.region.clone(),
                ip.ip_type.clone(),
                ip.subnet_size.to_string(),
                ip.label.clone(),
            ],
        )?])
    }
}
