// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use assert2::check;
use harvest_core::{Desc, Metric, System};
use harvest_format_prometheus::{CONTENT_TYPE, TextEncoder};

fn scrape() -> Vec<Metric> {
    let billing = System::new("vultr", "exporter_billing", "");
    let units = billing
        .desc(
            "units",
            "Units consumed",
            &["product", "description", "unit_type", "unit_price"],
        )
        .unwrap();
    let cost = billing
        .desc("cost_usd", "Cost in USD", &["product", "description"])
        .unwrap();
    let balance =
        Desc::new("vultr_account_balance", "Account balance", &["name", "email"]).unwrap();

    vec![
        Metric::gauge(&units, 720.0, ["Load Balancer", "my-lb", "hours", "0.014900"]).unwrap(),
        Metric::gauge(&cost, 10.73, ["Load Balancer", "my-lb"]).unwrap(),
        Metric::gauge(&units, 100.0, ["Compute", "web", "hours", "0.007000"]).unwrap(),
        Metric::gauge(&cost, 0.7, ["Compute", "web"]).unwrap(),
        Metric::gauge(&balance, -20.0, ["jane", "jane@example.com"]).unwrap(),
    ]
}

const EXPECTED: &str = "\
# HELP vultr_account_balance Account balance
# TYPE vultr_account_balance gauge
vultr_account_balance{name=\"jane\",email=\"jane@example.com\"} -20
# HELP vultr_exporter_billing_cost_usd Cost in USD
# TYPE vultr_exporter_billing_cost_usd gauge
vultr_exporter_billing_cost_usd{product=\"Compute\",description=\"web\"} 0.7
vultr_exporter_billing_cost_usd{product=\"Load Balancer\",description=\"my-lb\"} 10.73
# HELP vultr_exporter_billing_units Units consumed
# TYPE vultr_exporter_billing_units gauge
vultr_exporter_billing_units{product=\"Compute\",description=\"web\",unit_type=\"hours\",unit_price=\"0.007000\"} 100
vultr_exporter_billing_units{product=\"Load Balancer\",description=\"my-lb\",unit_type=\"hours\",unit_price=\"0.014900\"} 720
";

#[test]
fn families_are_grouped_and_sorted() {
    check!(TextEncoder::new().encode_to_string(&scrape()) == EXPECTED);
}

#[test]
fn arrival_order_does_not_matter() {
    let mut metrics = scrape();
    metrics.reverse();
    check!(TextEncoder::new().encode_to_string(&metrics) == EXPECTED);
}

#[test]
fn duplicates_keep_the_first_instance() {
    let up = Desc::new("vultr_reserved_ips_up", "", &["region"]).unwrap();
    let metrics = vec![
        Metric::counter(&up, 1.0, ["ewr"]).unwrap(),
        Metric::counter(&up, 0.0, ["ewr"]).unwrap(),
        Metric::gauge(&up, 5.0, ["ams"]).unwrap(),
    ];
    check!(
        TextEncoder::new().encode_to_string(&metrics)
            == "# TYPE vultr_reserved_ips_up counter\nvultr_reserved_ips_up{region=\"ewr\"} 1\n"
    );
}

#[test]
fn empty_scrape_is_empty() {
    check!(TextEncoder::new().encode_to_string(&[]).is_empty());
}

#[test]
fn encode_appends() {
    let start = Desc::new("vultr_exporter_start_time", "Start time", &[]).unwrap();
    let mut out = String::from("# preamble\n");
    TextEncoder::new().encode(
        &[Metric::gauge(&start, 1_700_000_000.0, [""; 0]).unwrap()],
        &mut out,
    );
    check!(
        out == "# preamble\n# HELP vultr_exporter_start_time Start time\n# TYPE vultr_exporter_start_time gauge\nvultr_exporter_start_time 1700000000\n"
    );
    check!(CONTENT_TYPE.starts_with("text/plain; version=0.0.4"));
}
