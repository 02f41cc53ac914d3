// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use assert2::check;
use futures::future::BoxFuture;
use harvest::{
    ApiError, BillingDescriptors, CloudApi, CollectOptions, HarvestConfig, ListOptions, Page,
    harvesters::{
        AccountHarvester, BillingHarvester, BlockStorageMapper, BuildInfo, LoadBalancerMapper,
        ResourceHarvester, ResourceMapper, standard_harvesters,
    },
    model::{Account, Bandwidth, BandwidthPeriod, BlockStorage, KubernetesCluster, LoadBalancer},
    test_util::{Endpoint, FakeCloudApi},
};
use harvest_aggregation::InvoiceItem;
use harvest_core::{
    Desc, Harvester, HarvesterSet, Metric, MetricError, System,
    test_util::{TestMetricSink, test_metric_sink},
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn volumes(n: usize) -> Vec<BlockStorage> {
    (0..n)
        .map(|i| BlockStorage {
            id: i.to_string(),
            label: format!("vol-{i}"),
            region: "ewr".into(),
            status: "active".into(),
            size_gb: 10.0,
            block_type: "high_perf".into(),
        })
        .collect()
}

fn load_balancers(n: usize) -> Vec<LoadBalancer> {
    (0..n)
        .map(|i| LoadBalancer {
            id: i.to_string(),
            label: format!("lb-{i}"),
            region: "ams".into(),
            status: "active".into(),
            instances: vec!["a".into(), "b".into()],
        })
        .collect()
}

fn options(page_size: usize) -> CollectOptions {
    CollectOptions {
        page_size,
        ..CollectOptions::default()
    }
}

#[tokio::test]
async fn listing_is_paginated_to_completion() {
    init_tracing();
    let api = Arc::new(FakeCloudApi::default().with_block_storage(volumes(720)));
    let harvester = ResourceHarvester::new(
        api.clone(),
        BlockStorageMapper::new(&System::new("vultr", "block_storage", "")).unwrap(),
        options(500),
    );
    let TestMetricSink { inspector, sink } = test_metric_sink();
    harvester.collect(sink).await;

    check!(api.calls(Endpoint::BlockStorage) == 2);
    check!(inspector.find("vultr_block_storage_up").len() == 720);
    check!(inspector.find("vultr_block_storage_size").len() == 720);
}

#[tokio::test]
async fn exact_final_page_needs_no_extra_call() {
    let api = Arc::new(FakeCloudApi::default().with_block_storage(volumes(1000)));
    let harvester = ResourceHarvester::new(
        api.clone(),
        BlockStorageMapper::new(&System::new("vultr", "block_storage", "")).unwrap(),
        options(500),
    );
    let TestMetricSink { inspector, sink } = test_metric_sink();
    harvester.collect(sink).await;

    check!(api.calls(Endpoint::BlockStorage) == 2);
    check!(inspector.len() == 2000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn fan_out_over_ten_thousand_entities() {
    let api = Arc::new(FakeCloudApi::default().with_load_balancers(load_balancers(10_000)));
    let set = HarvesterSet::new()
        .with(ResourceHarvester::new(
            api.clone(),
            LoadBalancerMapper::new(&System::new("vultr", "load_balancer", "")).unwrap(),
            options(500),
        ))
        .unwrap();

    let metrics = set.gather().await;
    check!(metrics.len() == 20_000);
    check!(api.calls(Endpoint::LoadBalancers) == 20);

    let mut labels: Vec<_> = metrics
        .iter()
        .filter(|m| m.fq_name() == "vultr_load_balancer_instances")
        .map(|m| m.label("label").unwrap_or_default().to_owned())
        .collect();
    labels.sort();
    labels.dedup();
    check!(labels.len() == 10_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_fan_out_emits_everything() {
    let api = Arc::new(FakeCloudApi::default().with_load_balancers(load_balancers(300)));
    let harvester = ResourceHarvester::new(
        api,
        LoadBalancerMapper::new(&System::new("vultr", "load_balancer", "")).unwrap(),
        CollectOptions {
            max_concurrency: Some(4),
            ..options(100)
        },
    );
    let TestMetricSink { inspector, sink } = test_metric_sink();
    harvester.collect(sink).await;
    check!(inspector.len() == 600);
}

/// Fails for load balancers without a label, writing nothing for them.
struct Strict {
    up: Desc,
}

impl ResourceMapper for Strict {
    type Resource = LoadBalancer;

    const NAME: &'static str = "strict";

    fn describe(&self) -> Vec<Desc> {
        vec![self.up.clone()]
    }

    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<LoadBalancer>, ApiError>> {
        api.list_load_balancers(options)
    }

    fn map(&self, lb: &LoadBalancer) -> Result<Vec<Metric>, MetricError> {
        let labels: Vec<&str> = [lb.label.as_str(), lb.region.as_str()]
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect();
        Ok(vec![Metric::counter(&self.up, 1.0, labels)?])
    }
}

#[tokio::test]
async fn failing_entity_does_not_affect_siblings() {
    let mut lbs = load_balancers(5);
    lbs[2].label.clear();
    let api = Arc::new(FakeCloudApi::default().with_load_balancers(lbs));
    let harvester = ResourceHarvester::new(
        api,
        Strict {
            up: Desc::new("strict_up", "", &["label", "region"]).unwrap(),
        },
        options(100),
    );
    let TestMetricSink { inspector, sink } = test_metric_sink();
    harvester.collect(sink).await;

    check!(inspector.len() == 4);
    check!(inspector.get("strict_up", &[("label", "lb-2")]).is_none());
    check!(inspector.get("strict_up", &[("label", "lb-3")]).is_some());
}

#[tokio::test]
async fn account_and_bandwidth_are_independent() {
    let period = BandwidthPeriod {
        gb_in: 12.5,
        gb_out: 3.0,
        ..Default::default()
    };
    let api = Arc::new(
        FakeCloudApi::default()
            .with_account(Account {
                name: "jane".into(),
                email: "jane@example.com".into(),
                balance: -20.0,
                pending_charges: 4.5,
            })
            .with_bandwidth(Bandwidth {
                previous_month: period.clone(),
                current_month_to_date: period.clone(),
                current_month_projected: period,
            }),
    );
    let account = AccountHarvester::new(
        api.clone(),
        &System::new("vultr", "account", ""),
        Duration::from_secs(10),
    )
    .unwrap();
    check!(account.describe().len() == 32);

    let TestMetricSink { inspector, sink } = test_metric_sink();
    account.collect(sink).await;
    check!(inspector.len() == 32);
    let balance = inspector
        .get("vultr_account_balance", &[("email", "jane@example.com")])
        .unwrap();
    check!(balance.value == -20.0);
    check!(
        inspector
            .get("vultr_account_bandwidth_projected_gb_in", &[])
            .unwrap()
            .value
            == 12.5
    );

    api.set_failing(Endpoint::Bandwidth, true);
    let TestMetricSink { inspector, sink } = test_metric_sink();
    account.collect(sink).await;
    check!(inspector.names() == ["vultr_account_balance", "vultr_account_pending_charges"]);
}

#[tokio::test(start_paused = true)]
async fn hung_listing_is_bounded() {
    let api = Arc::new(
        FakeCloudApi::default()
            .with_kubernetes_clusters(vec![KubernetesCluster::default()])
            .with_load_balancers(load_balancers(3))
            .hanging(Endpoint::KubernetesClusters)
            .hanging(Endpoint::PendingCharges),
    );
    let set = standard_harvesters(&HarvestConfig::default(), api.clone(), BuildInfo::new("v0"))
        .unwrap();

    let start = tokio::time::Instant::now();
    let metrics = set.gather().await;
    check!(start.elapsed() >= Duration::from_secs(10));
    check!(start.elapsed() < Duration::from_secs(11));

    check!(!metrics.iter().any(|m| m.fq_name().starts_with("vultr_kubernetes")));
    check!(!metrics.iter().any(|m| m.fq_name().starts_with("vultr_exporter_billing")));
    let lbs = metrics
        .iter()
        .filter(|m| m.fq_name() == "vultr_load_balancer_up")
        .count();
    check!(lbs == 3);
}

#[tokio::test]
async fn failed_listing_writes_nothing_for_that_type_only() {
    let api = Arc::new(
        FakeCloudApi::default()
            .with_block_storage(volumes(3))
            .with_load_balancers(load_balancers(2))
            .failing(Endpoint::BlockStorage),
    );
    let set = standard_harvesters(&HarvestConfig::default(), api, BuildInfo::new("v0")).unwrap();
    let metrics = set.gather().await;

    check!(!metrics.iter().any(|m| m.fq_name().starts_with("vultr_block_storage")));
    check!(
        metrics
            .iter()
            .filter(|m| m.fq_name().starts_with("vultr_load_balancer"))
            .count()
            == 4
    );
    check!(metrics.iter().any(|m| m.fq_name() == "vultr_account_balance"));
}

#[test]
fn describe_makes_no_calls() {
    let api = Arc::new(FakeCloudApi::default());
    let set = standard_harvesters(&HarvestConfig::default(), api.clone(), BuildInfo::new("v0"))
        .unwrap();
    let names: Vec<_> = set.describe().iter().map(|d| d.fq_name().to_owned()).collect();

    check!(set.len() == 7);
    check!(names.contains(&"vultr_exporter_build_info".to_owned()));
    check!(names.contains(&"vultr_exporter_billing_units".to_owned()));
    check!(names.contains(&"vultr_kubernetes_node".to_owned()));
    check!(names.contains(&"vultr_reserved_ips_up".to_owned()));
    check!(names.contains(&"vultr_account_bandwidth_current_overage_cost".to_owned()));
    for endpoint in [Endpoint::Account, Endpoint::PendingCharges, Endpoint::BlockStorage] {
        check!(api.calls(endpoint) == 0);
    }
}

#[tokio::test]
async fn billing_follows_pending_charges_between_polls() {
    let api = Arc::new(FakeCloudApi::default().with_pending_charges(vec![
        InvoiceItem::new("Load Balancer", "my-lb", "hours", 700.0, 0.0149, 9.0),
        InvoiceItem::new("Load Balancer", "my-lb", "hours", 20.0, 0.0149, 1.0),
        InvoiceItem::new("Vultr Cloud Compute", "web", "hours", 100.0, 0.007, 0.7),
    ]));
    let billing = BillingHarvester::new(
        api.clone(),
        &System::new("vultr", "exporter_billing", ""),
        BillingDescriptors::Shared,
        2,
        Duration::from_secs(10),
    )
    .unwrap();

    let TestMetricSink { inspector, sink } = test_metric_sink();
    billing.collect(sink).await;
    check!(api.calls(Endpoint::PendingCharges) == 2);
    let lb = inspector
        .get("vultr_exporter_billing_units", &[("description", "my-lb")])
        .unwrap();
    check!(lb.value == 720.0);
    check!(lb.labels["unit_price"] == "0.014900");
    let lb_cost = inspector
        .get("vultr_exporter_billing_cost_usd", &[("product", "Load Balancer")])
        .unwrap();
    check!(lb_cost.value == 10.0);
    check!(billing.keys().len() == 2);

    api.set_pending_charges(vec![InvoiceItem::new(
        "Vultr Cloud Compute",
        "web",
        "hours",
        50.0,
        0.007,
        0.35,
    )]);
    let TestMetricSink { inspector, sink } = test_metric_sink();
    billing.collect(sink).await;
    check!(billing.keys().len() == 1);
    check!(inspector.len() == 2);
    check!(
        inspector
            .get("vultr_exporter_billing_units", &[("description", "web")])
            .unwrap()
            .value
            == 50.0
    );

    api.set_failing(Endpoint::PendingCharges, true);
    let TestMetricSink { inspector, sink } = test_metric_sink();
    billing.collect(sink).await;
    check!(inspector.is_empty());
    check!(billing.keys().len() == 1);
}
