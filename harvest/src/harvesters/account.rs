// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use harvest_core::{BoxMetricSink, Desc, Harvester, Metric, MetricError, MetricSink, System};

use super::BandwidthHarvester;
use crate::{CloudApi, bounded, model::Account};

/// Account balance and pending charges, plus the nested bandwidth harvester.
///
/// The account call and the bandwidth call run concurrently; `collect` returns once both
/// are done. Either may fail without affecting the other.
pub struct AccountHarvester {
    api: Arc<dyn CloudApi>,
    balance: Desc,
    pending_charges: Desc,
    bandwidth: BandwidthHarvester,
    timeout: Duration,
}

impl AccountHarvester {
    pub fn new(
        api: Arc<dyn CloudApi>,
        system: &System,
        timeout: Duration,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            balance: system.desc("balance", "Account balance", &["name", "email"])?,
            pending_charges: system.desc(
                "pending_charges",
                "Pending charges",
                &["name", "email"],
            )?,
            bandwidth: BandwidthHarvester::new(api.clone(), &system.nested("bandwidth"), timeout)?,
            api,
            timeout,
        })
    }

    fn metrics(&self, account: &Account) -> Result<Vec<Metric>, MetricError> {
        let labels = [&account.name, &account.email];
        Ok(vec![
            Metric::gauge(&self.balance, account.balance, labels)?,
            Metric::gauge(&self.pending_charges, account.pending_charges, labels)?,
        ])
    }

    async fn collect_account(&self, sink: BoxMetricSink) {
        let account = match bounded(self.timeout, self.api.get_account()).await {
            Ok(account) => account,
            Err(error) => {
                tracing::warn!(%error, "account call failed, no data this cycle");
                return;
            }
        };
        match self.metrics(&account) {
            Ok(metrics) => sink.append_all(metrics),
            Err(error) => tracing::warn!(%error, "dropping malformed account metrics"),
        }
    }
}

impl Harvester for AccountHarvester {
    fn name(&self) -> &str {
        "account"
    }

    fn describe(&self) -> Vec<Desc> {
        let mut descs = vec![self.balance.clone(), self.pending_charges.clone()];
        descs.extend(self.bandwidth.describe());
        descs
    }

    fn collect(&self, sink: BoxMetricSink) -> BoxFuture<'_, ()> {
        async move {
            tokio::join!(
                self.collect_account(sink.clone()),
                self.bandwidth.collect(sink)
            );
        }
        .boxed()
    }
}
