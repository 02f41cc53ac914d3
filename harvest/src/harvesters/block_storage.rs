// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use futures::future::BoxFuture;
use harvest_core::{Desc, Metric, MetricError, System};

use super::{ResourceMapper, active};
use crate::{ApiError, CloudApi, ListOptions, Page, model::BlockStorage};

const LABELS: &[&str] = &["label", "region", "status", "block_type"];

/// Block storage volumes: `up` and `size` per volume.
#[derive(Debug, Clone)]
pub struct BlockStorageMapper {
    up: Desc,
    size: Desc,
}

impl BlockStorageMapper {
    pub fn new(system: &System) -> Result<Self, MetricError> {
        Ok(Self {
            up: system.desc("up", "1 if the Block Storage volume is active", LABELS)?,
            size: system.desc("size", "Size of Block Storage volume in GB", LABELS)?,
        })
    }
}

impl ResourceMapper for BlockStorageMapper {
    type Resource = BlockStorage;

    const NAME: &'static str = "block_storage";

    fn describe(&self) -> Vec<Desc> {
        vec![self.up.clone(), self.size.clone()]
    }

    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<BlockStorage>, ApiError>> {
        api.list_block_storage(options)
    }

    fn map(&self, block: &BlockStorage) -> Result<Vec<Metric>, MetricError> {
        let labels = [&block.label, &block.region, &block.status, &block.block_type];
        Ok(vec![
            Metric::counter(&self.up, active(&block.status), labels)?,
            Metric::gauge(&self.size, block.size_gb, labels)?,
        ])
    }
}
