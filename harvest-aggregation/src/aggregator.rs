//! Per-key aggregation of billing records

use std::collections::BTreeMap;

use harvest_core::{Desc, Metric, MetricError, MetricSink, System};

use crate::InvoiceItem;

/// Accumulates the records of one key over a collection cycle and emits a summary.
///
/// An aggregator lives across cycles, but its accumulated state never does: every call to
/// [`emit`](Aggregator::emit) leaves it empty, whether or not emission succeeded.
pub trait Aggregator {
    /// The raw record type this aggregator accepts.
    type Record;

    /// Fold `record` into the current cycle.
    fn aggregate(&mut self, record: &Self::Record);

    /// Write the summary of the current cycle into `sink` and reset.
    ///
    /// Either every instance of the summary is written or none is. Returns the number of
    /// instances written.
    fn emit(&mut self, sink: &dyn MetricSink) -> Result<usize, MetricError>;

    /// Descriptors of the families [`emit`](Aggregator::emit) can write.
    fn describe(&self) -> Vec<Desc>;
}

/// The two billing families: units consumed and total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingDescs {
    pub units: Desc,
    pub cost: Desc,
}

impl BillingDescs {
    /// Builds `<namespace>_<subsystem>_units` and `<namespace>_<subsystem>_cost_usd`.
    pub fn new(system: &System) -> Result<Self, MetricError> {
        Ok(Self {
            units: system.desc(
                "units",
                "Number of units consumed",
                &["product", "description", "unit_type", "unit_price"],
            )?,
            cost: system.desc("cost_usd", "Total cost in USD", &["product", "description"])?,
        })
    }

    pub fn to_vec(&self) -> Vec<Desc> {
        vec![self.units.clone(), self.cost.clone()]
    }
}

/// Sums the billing records of one `(product, description)` pair.
///
/// Units are summed per unit type, the unit price is taken from the last record seen for
/// each unit type, and totals are summed across all records. The unit price is emitted as a
/// label of the units family, formatted with six decimals.
#[derive(Debug, Clone)]
pub struct RecordAggregator {
    descs: BillingDescs,
    product: String,
    description: String,
    units_by_type: BTreeMap<String, f64>,
    latest_unit_price_by_type: BTreeMap<String, f64>,
    running_total: f64,
    records: usize,
}

impl RecordAggregator {
    pub fn new(descs: BillingDescs) -> Self {
        Self {
            descs,
            product: String::new(),
            description: String::new(),
            units_by_type: BTreeMap::new(),
            latest_unit_price_by_type: BTreeMap::new(),
            running_total: 0.0,
            records: 0,
        }
    }

    /// Number of records folded in since the last emission.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Units summed for `unit_type` in the current cycle.
    pub fn units(&self, unit_type: &str) -> Option<f64> {
        self.units_by_type.get(unit_type).copied()
    }

    /// Unit price of the last record of `unit_type` in the current cycle.
    pub fn unit_price(&self, unit_type: &str) -> Option<f64> {
        self.latest_unit_price_by_type.get(unit_type).copied()
    }

    /// Sum of record totals in the current cycle.
    pub fn total(&self) -> f64 {
        self.running_total
    }

    fn reset(&mut self) {
        self.units_by_type.clear();
        self.latest_unit_price_by_type.clear();
        self.running_total = 0.0;
        self.records = 0;
    }

    fn summary(&self) -> Result<Vec<Metric>, MetricError> {
        let mut out = Vec::with_capacity(self.units_by_type.len() + 1);
        for (unit_type, units) in &self.units_by_type {
            let price = self
                .latest_unit_price_by_type
                .get(unit_type)
                .copied()
                .unwrap_or_default();
            out.push(Metric::gauge(
                &self.descs.units,
                *units,
                [
                    self.product.clone(),
                    self.description.clone(),
                    unit_type.clone(),
                    format_unit_price(price),
                ],
            )?);
        }
        out.push(Metric::gauge(
            &self.descs.cost,
            self.running_total,
            [self.product.as_str(), self.description.as_str()],
        )?);
        Ok(out)
    }
}

impl Aggregator for RecordAggregator {
    type Record = InvoiceItem;

    fn aggregate(&mut self, record: &InvoiceItem) {
        if self.records == 0 {
            self.product.clone_from(&record.product);
            self.description.clone_from(&record.description);
        }
        *self
            .units_by_type
            .entry(record.unit_type.clone())
            .or_default() += record.units;
        self.latest_unit_price_by_type
            .insert(record.unit_type.clone(), record.unit_price);
        self.running_total += record.total;
        self.records += 1;
    }

    fn emit(&mut self, sink: &dyn MetricSink) -> Result<usize, MetricError> {
        if self.records == 0 {
            return Ok(0);
        }
        let summary = self.summary();
        self.reset();
        let metrics = summary?;
        let written = metrics.len();
        sink.append_all(metrics);
        Ok(written)
    }

    fn describe(&self) -> Vec<Desc> {
        self.descs.to_vec()
    }
}

/// Six decimal places, so that e.g. `0.0149` renders as `0.014900`.
pub fn format_unit_price(price: f64) -> String {
    format!("{price:.6}")
}
