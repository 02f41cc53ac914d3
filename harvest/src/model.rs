// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Read-only snapshots of remote resources, as returned by one poll.
//!
//! Field names follow the provider's JSON. Every field defaults, so a missing field never
//! fails a whole listing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub balance: f64,
    pub pending_charges: f64,
}

/// Account bandwidth usage for the previous month, the current month to date, and the
/// projection for the current month.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bandwidth {
    pub previous_month: BandwidthPeriod,
    pub current_month_to_date: BandwidthPeriod,
    pub current_month_projected: BandwidthPeriod,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthPeriod {
    pub gb_in: f64,
    pub gb_out: f64,
    pub total_instance_hours: f64,
    pub total_instance_count: f64,
    pub instance_bandwidth_credits: f64,
    pub free_bandwidth_credits: f64,
    pub purchased_bandwidth_credits: f64,
    pub overage: f64,
    pub overage_unit_cost: f64,
    pub overage_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStorage {
    pub id: String,
    pub label: String,
    pub region: String,
    pub status: String,
    pub size_gb: f64,
    pub block_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesCluster {
    pub id: String,
    pub label: String,
    pub region: String,
    pub version: String,
    pub status: String,
    pub node_pools: Vec<NodePool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePool {
    pub id: String,
    pub label: String,
    pub plan: String,
    pub status: String,
    pub tag: String,
    pub node_quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    pub id: String,
    pub label: String,
    pub region: String,
    pub status: String,
    /// IDs of the attached instances
    pub instances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedIp {
    pub id: String,
    pub region: String,
    pub ip_type: String,
    pub subnet: String,
    pub subnet_size: u32,
    pub label: String,
}
