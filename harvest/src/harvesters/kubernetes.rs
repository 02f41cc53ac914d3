// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use futures::future::BoxFuture;
use harvest_core::{Desc, Metric, MetricError, System};

use super::{ResourceMapper, active};
use crate::{ApiError, CloudApi, ListOptions, Page, model::KubernetesCluster};

const CLUSTER_LABELS: &[&str] = &["label", "region", "version", "status"];
// pool labels are only unique within a cluster
const NODE_LABELS: &[&str] = &["cluster", "label", "plan", "status", "tag"];

/// Kubernetes clusters: `cluster_up` and `node_pool` per cluster, `node` per node pool.
#[derive(Debug, Clone)]
pub struct KubernetesMapper {
    cluster_up: Desc,
    node_pool: Desc,
    node: Desc,
}

impl KubernetesMapper {
    pub fn new(system: &System) -> Result<Self, MetricError> {
        Ok(Self {
            cluster_up: system.desc(
                "cluster_up",
                "1 if the Kubernetes cluster is active",
                CLUSTER_LABELS,
            )?,
            node_pool: system.desc(
                "node_pool",
                "Number of node pools in the cluster",
                CLUSTER_LABELS,
            )?,
            node: system.desc("node", "Number of nodes in the node pool", NODE_LABELS)?,
        })
    }
}

impl ResourceMapper for KubernetesMapper {
    type Resource = KubernetesCluster;

    const NAME: &'static str = "kubernetes";

    fn describe(&self) -> Vec<Desc> {
        vec![
            self.cluster_up.clone(),
            self.node_pool.clone(),
            self.node.clone(),
        ]
    }

    fn list(
        api: &dyn CloudApi,
        options: ListOptions,
    ) -> BoxFuture<'_, Result<Page<KubernetesCluster>, ApiError>> {
        api.list_kubernetes_clusters(options)
    }

    fn map(&self, cluster: &KubernetesCluster) -> Result<Vec<Metric>, MetricError> {
        let labels = [
            &cluster.label,
            &cluster.region,
            &cluster.version,
            &cluster.status,
        ];
        let mut out = Vec::with_capacity(2 + cluster.node_pools.len());
        out.push(Metric::counter(
            &self.cluster_up,
            active(&cluster.status),
            labels,
        )?);
        out.push(Metric::gauge(
            &self.node_pool,
            cluster.node_pools.len() as f64,
            labels,
        )?);
        for pool in &cluster.node_pools {
            out.push(Metric::gauge(
                &self.node,
                f64::from(pool.node_quantity),
                [
                    &cluster.label,
                    &pool.label,
                    &pool.plan,
                    &pool.status,
                    &pool.tag,
                ],
            )?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodePool;

    #[test]
    fn maps_cluster_and_pools() {
        let mapper = KubernetesMapper::new(&System::new("vultr", "kubernetes", "")).unwrap();
        assert_eq!(mapper.describe().len(), 3);

        let pool = |label: &str, nodes| NodePool {
            label: label.into(),
            plan: "vc2-1c-2gb".into(),
            status: "active".into(),
            node_quantity: nodes,
            ..Default::default()
        };
        let metrics = mapper
            .map(&KubernetesCluster {
                label: "prod".into(),
                region: "ams".into(),
                version: "v1.30.0+1".into(),
                status: "active".into(),
                node_pools: vec![pool("a", 3), pool("b", 1)],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].fq_name(), "vultr_kubernetes_cluster_up");
        assert_eq!(metrics[0].value(), 1.0);
        assert_eq!(metrics[1].value(), 2.0);
        assert_eq!(metrics[2].fq_name(), "vultr_kubernetes_node");
        assert_eq!(metrics[2].value(), 3.0);
        assert_eq!(metrics[3].label("label"), Some("b"));
        assert_eq!(metrics[3].label("cluster"), Some("prod"));
    }

    #[test]
    fn same_pool_label_in_two_clusters_stays_distinct() {
        let mapper = KubernetesMapper::new(&System::new("vultr", "kubernetes", "")).unwrap();
        let cluster = |label: &str, nodes| KubernetesCluster {
            label: label.into(),
            status: "active".into(),
            node_pools: vec![NodePool {
                label: "default".into(),
                plan: "vc2".into(),
                status: "active".into(),
                node_quantity: nodes,
                ..Default::default()
            }],
            ..Default::default()
        };
        let a = mapper.map(&cluster("blue", 3)).unwrap();
        let b = mapper.map(&cluster("green", 5)).unwrap();
        assert_eq!(a[2].fq_name(), b[2].fq_name());
        assert_ne!(a[2].label_values(), b[2].label_values());
        assert_eq!(b[2].label("cluster"), Some("green"));
        assert_eq!(b[2].value(), 5.0);
    }
}
