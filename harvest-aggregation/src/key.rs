//! Aggregation keys

use std::fmt;

use crate::InvoiceItem;

/// Identity of one aggregator: the `(product, description)` pair of a billing record.
///
/// Two records with equal keys are always summed into the same aggregator. The pair is
/// compared structurally, so `("a_b", "c")` and `("a", "b_c")` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey {
    /// Product the record bills for, e.g. `Load Balancer`
    pub product: String,
    /// Free-form description, usually the resource label
    pub description: String,
}

impl AggregationKey {
    pub fn new(product: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            description: description.into(),
        }
    }

    /// The key a record is aggregated under.
    pub fn of(record: &InvoiceItem) -> Self {
        Self::new(record.product.clone(), record.description.clone())
    }

    /// The product name in a form usable inside a metric name.
    pub fn canonical_product(&self) -> String {
        canonicalize(&self.product)
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product, self.description)
    }
}

/// Lowercases `s` and replaces spaces with underscores.
///
/// Any string is accepted; the result is not guaranteed to be a valid metric name component.
///
/// ```
/// assert_eq!(harvest_aggregation::canonicalize("Load Balancer"), "load_balancer");
/// ```
pub fn canonicalize(s: &str) -> String {
    s.to_lowercase().replace(' ', "_")
}
