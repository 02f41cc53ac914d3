// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Response envelopes of the v2 API.

use harvest::{
    Page,
    model::{Account, Bandwidth, BlockStorage, KubernetesCluster, LoadBalancer, ReservedIp},
};
use harvest_aggregation::InvoiceItem;
use serde::{Deserialize, de::DeserializeOwned};

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BandwidthEnvelope {
    pub bandwidth: Bandwidth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Meta {
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Links {
    next: String,
}

/// A page of a listing, wrapped the way the endpoint wraps it.
pub(crate) trait Listing: DeserializeOwned + Send {
    type Item: Send;

    fn into_page(self) -> Page<Self::Item>;
}

macro_rules! listing {
    ($name:ident, $field:ident $(alias $alias:literal)?, $item:ty) => {
        #[derive(Debug, Deserialize)]
        pub(crate) struct $name {
            #[serde(default $(, alias = $alias)?)]
            $field: Vec<$item>,
            #[serde(default)]
            meta: Meta,
        }

        impl Listing for $name {
            type Item = $item;

            fn into_page(self) -> Page<$item> {
                Page::new(self.$field, self.meta.links.next)
            }
        }
    };
}

listing!(PendingCharges, pending_charges alias "invoice_items", InvoiceItem);
listing!(Blocks, blocks, BlockStorage);
listing!(KubernetesClusters, vke_clusters, KubernetesCluster);
listing!(LoadBalancers, load_balancers, LoadBalancer);
listing!(ReservedIps, reserved_ips, ReservedIp);
