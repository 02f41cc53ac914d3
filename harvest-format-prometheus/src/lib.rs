// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! Renders drained [`Metric`] instances in the Prometheus text exposition format.
//!
//! ```
//! use harvest_core::{Desc, Metric};
//! use harvest_format_prometheus::TextEncoder;
//!
//! let up = Desc::new("vultr_load_balancer_up", "1 if active", &["label"]).unwrap();
//! let metrics = vec![Metric::counter(&up, 1.0, ["web"]).unwrap()];
//! assert_eq!(
//!     TextEncoder::new().encode_to_string(&metrics),
//!     concat!(
//!         "# HELP vultr_load_balancer_up 1 if active\n",
//!         "# TYPE vultr_load_balancer_up counter\n",
//!         "vultr_load_balancer_up{label=\"web\"} 1\n",
//!     ),
//! );
//! ```

use std::{
    collections::{BTreeMap, btree_map::Entry},
    time::Duration,
};

use harvest_core::{Desc, Metric, ValueKind, rate_limited};

/// The `Content-Type` of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encoder for the Prometheus text exposition format.
///
/// Instances are grouped into families by fully-qualified name. Families are written in name
/// order, and samples within a family in label-value order, so the output does not depend on
/// the order in which harvesters wrote into the sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextEncoder {
    _private: (),
}

struct Family<'a> {
    desc: &'a Desc,
    kind: ValueKind,
    samples: BTreeMap<&'a [String], f64>,
}

impl TextEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the exposition of `metrics` to `out`.
    ///
    /// An instance with the same name and label values as an earlier one is dropped, as is an
    /// instance whose kind disagrees with the first instance of its family.
    pub fn encode(&self, metrics: &[Metric], out: &mut String) {
        let mut families: BTreeMap<&str, Family<'_>> = BTreeMap::new();
        for metric in metrics {
            let family = families.entry(metric.fq_name()).or_insert_with(|| Family {
                desc: metric.desc(),
                kind: metric.kind(),
                samples: BTreeMap::new(),
            });
            if family.kind != metric.kind() {
                rate_limited!(
                    Duration::from_secs(1),
                    tracing::warn!(
                        metric = metric.fq_name(),
                        expected = family.kind.as_str(),
                        actual = metric.kind().as_str(),
                        "dropping metric instance with conflicting type"
                    )
                );
                continue;
            }
            match family.samples.entry(metric.label_values()) {
                Entry::Vacant(entry) => {
                    entry.insert(metric.value());
                }
                Entry::Occupied(_) => rate_limited!(
                    Duration::from_secs(1),
                    tracing::warn!(
                        metric = metric.fq_name(),
                        labels = ?metric.label_values(),
                        "dropping duplicate metric instance"
                    )
                ),
            }
        }

        for (name, family) in &families {
            write_family(out, name, family);
        }
    }

    /// The exposition of `metrics` as a new string.
    pub fn encode_to_string(&self, metrics: &[Metric]) -> String {
        let mut out = String::new();
        self.encode(metrics, &mut out);
        out
    }
}

fn write_family(out: &mut String, name: &str, family: &Family<'_>) {
    let help = family.desc.help();
    if !help.is_empty() {
        out.push_str("# HELP ");
        out.push_str(name);
        out.push(' ');
        escape_help(out, help);
        out.push('\n');
    }
    out.push_str("# TYPE ");
    out.push_str(name);
    out.push(' ');
    out.push_str(family.kind.as_str());
    out.push('\n');

    let label_names = family.desc.label_names();
    for (label_values, value) in &family.samples {
        out.push_str(name);
        if !label_names.is_empty() {
            out.push('{');
            for (i, (label, label_value)) in
                label_names.iter().zip(label_values.iter()).enumerate()
            {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(label);
                out.push_str("=\"");
                escape_label_value(out, label_value);
                out.push('"');
            }
            out.push('}');
        }
        out.push(' ');
        write_value(out, *value);
        out.push('\n');
    }
}

// integral values with magnitude below this are written without an exponent or fraction
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn write_value(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "+Inf" } else { "-Inf" });
    } else if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(value as i64));
    } else {
        let mut buf = dtoa::Buffer::new();
        out.push_str(buf.format_finite(value));
    }
}

fn escape_help(out: &mut String, help: &str) {
    for c in help.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
}

fn escape_label_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
}
