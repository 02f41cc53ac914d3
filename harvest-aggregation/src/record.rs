use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

/// One pending-charges line item as reported by the billing API.
///
/// Immutable once fetched. Missing numeric fields decode as zero, missing strings as empty, and
/// empty or unparseable dates as `None`, so an odd record is still aggregated rather than failing
/// the whole listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceItem {
    pub product: String,
    pub description: String,
    pub unit_type: String,
    pub units: f64,
    pub unit_price: f64,
    pub total: f64,
    /// Start of the billed period
    #[serde(deserialize_with = "lenient_timestamp")]
    pub start_date: Option<Timestamp>,
    /// End of the billed period
    #[serde(deserialize_with = "lenient_timestamp")]
    pub end_date: Option<Timestamp>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.parse().ok()))
}

impl InvoiceItem {
    /// A record with the fields that take part in aggregation.
    pub fn new(
        product: impl Into<String>,
        description: impl Into<String>,
        unit_type: impl Into<String>,
        units: f64,
        unit_price: f64,
        total: f64,
    ) -> Self {
        Self {
            product: product.into(),
            description: description.into(),
            unit_type: unit_type.into(),
            units,
            unit_price,
            total,
            start_date: None,
            end_date: None,
        }
    }
}
