#![cfg_attr(docsrs, feature(doc_cfg))]

//! Aggregation of heterogeneous billing records into a small number of metric instances.
//!
//! Raw [`InvoiceItem`]s are grouped by [`AggregationKey`] and folded into a
//! [`RecordAggregator`] per key. A [`KeyedRegistry`] keeps those aggregators alive across
//! polls and evicts the ones whose key disappears from the listing.
//!
//! ```
//! use std::collections::HashSet;
//! use harvest_aggregation::{
//!     AggregationKey, Aggregator, BillingDescs, InvoiceItem, KeyedRegistry, RecordAggregator,
//! };
//! use harvest_core::{System, VecMetricSink};
//!
//! let descs = BillingDescs::new(&System::new("vultr", "billing", "")).unwrap();
//! let records = vec![InvoiceItem::new("Load Balancer", "my-lb", "hours", 720.0, 0.0149, 10.0)];
//!
//! let mut registry = KeyedRegistry::new();
//! let keys: HashSet<_> = records.iter().map(AggregationKey::of).collect();
//! registry.reconcile(&keys);
//! for record in &records {
//!     registry
//!         .get_or_create(AggregationKey::of(record), |_| RecordAggregator::new(descs.clone()))
//!         .aggregate(record);
//! }
//!
//! let sink = VecMetricSink::default();
//! assert_eq!(registry.emit_all(&sink), 2);
//! ```

mod aggregator;
mod key;
mod record;
mod registry;

pub use aggregator::{Aggregator, BillingDescs, RecordAggregator, format_unit_price};
pub use key::{AggregationKey, canonicalize};
pub use record::InvoiceItem;
pub use registry::KeyedRegistry;
