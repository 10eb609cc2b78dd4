//! FILENAME: tests/test_pivot.rs
//! Integration tests for the metrics pivot: aggregation, growth, view state,
//! drill-down and export working together.

mod common;

use common::{anchor, assert_close, build_tree, category_product, quarter_buckets, SalesFixture};
use metrics_engine::{
    calculate_pivot, compute_metric, drill_down, node_year_over_year, rolling_months,
    serialize_all_metrics, serialize_pivot, visible_rows, BucketWindow, DrillDownRequest,
    ExportOptions, Growth, MetricId, PivotDefinition, RevenueBasis, RowKind, SortKey, ViewState,
    METRIC_CATALOG,
};
use records::{Dimension, FieldMapping, Record};

// ============================================================================
// AGGREGATION PROPERTIES
// ============================================================================

#[test]
fn test_aggregation_is_idempotent() {
    for metric in METRIC_CATALOG.iter() {
        let (_, first) = build_tree(metric.id);
        let (_, second) = build_tree(metric.id);
        assert_eq!(first, second, "{} differs between runs", metric.id);
    }

    let (_, tree) = build_tree(MetricId::Revenue);
    let state = ViewState::new();
    assert_eq!(
        serialize_pivot(&tree, &state, &ExportOptions::default()),
        serialize_pivot(&tree, &state, &ExportOptions::default())
    );
}

#[test]
fn test_parent_atv_is_pooled_ratio() {
    let (_, tree) = build_tree(MetricId::Atv);
    let memberships = tree.group("Memberships").unwrap();
    let annual = memberships.child("Annual").unwrap();
    let monthly = memberships.child("Monthly").unwrap();

    // Annual 2400 over 2 transactions, Monthly 450 over 3.
    assert_close(annual.total_value, 1200.0);
    assert_close(monthly.total_value, 150.0);
    // Pooled 2850 over 5 transactions, not the sum (1350) or mean (675).
    assert_close(memberships.total_value, 570.0);
}

#[test]
fn test_additive_metrics_sum_across_children() {
    for metric in [MetricId::Revenue, MetricId::Vat, MetricId::DiscountAmount] {
        assert!(metric.is_additive());
        let (_, tree) = build_tree(metric);
        for group in &tree.groups {
            for (i, value) in group.bucket_values.iter().enumerate() {
                let children: f64 = group.children.iter().map(|c| c.bucket_values[i]).sum();
                assert_close(*value, children);
            }
        }
        for i in 0..tree.buckets.len() {
            let groups: f64 = tree.groups.iter().map(|g| g.bucket_values[i]).sum();
            assert_close(tree.totals.bucket_values[i], groups);
        }
    }
}

#[test]
fn test_distinct_counts_sum_for_disjoint_children() {
    let (_, tree) = build_tree(MetricId::Transactions);

    // Memberships children never share a transaction id.
    let memberships = tree.group("Memberships").unwrap();
    for (i, value) in memberships.bucket_values.iter().enumerate() {
        let children: f64 = memberships.children.iter().map(|c| c.bucket_values[i]).sum();
        assert_close(*value, children);
    }

    // Class Packs children share T07 in March, so the parent counts it once.
    let class_packs = tree.group("Class Packs").unwrap();
    let march = tree.bucket_index("2024-03").unwrap();
    assert_close(class_packs.bucket_values[march], 1.0);
    let children: f64 = class_packs.children.iter().map(|c| c.bucket_values[march]).sum();
    assert_close(children, 2.0);
}

#[test]
fn test_empty_input_is_zero_for_every_metric() {
    let empty: Vec<Record> = Vec::new();
    for metric in METRIC_CATALOG.iter() {
        assert_eq!(compute_metric(&empty, metric.id), 0.0, "{}", metric.id);
        let def = category_product().with_metric(metric.id);
        let tree = calculate_pivot(&empty, &def, &quarter_buckets());
        assert_eq!(tree.totals.bucket_values, vec![0.0; 3]);
        assert_eq!(tree.totals.total_value, 0.0);
    }
}

#[test]
fn test_three_record_scenario() {
    let row = |amount: f64, txn: &str, member: &str| Record {
        amount,
        transaction_id: Some(txn.to_string()),
        member_id: Some(member.to_string()),
        ..Record::default()
    };
    let records = vec![row(100.0, "A", "M1"), row(200.0, "B", "M1"), row(50.0, "A", "M2")];

    assert_eq!(compute_metric(&records, MetricId::Transactions), 2.0);
    assert_eq!(compute_metric(&records, MetricId::Revenue), 350.0);
    assert_eq!(compute_metric(&records, MetricId::Members), 2.0);
    assert_eq!(compute_metric(&records, MetricId::Atv), 175.0);
}

#[test]
fn test_date_formats_share_a_bucket_and_bad_dates_stay_in_totals() {
    let row = |date: &str| {
        Record::with_amount(10.0)
            .with_date(date)
            .with_dimension(Dimension::Category, "Retail")
    };
    let records = vec![row("15/03/2024"), row("2024-03-15"), row("not-a-date")];
    let buckets = rolling_months(1, anchor());
    assert_eq!(buckets[0].key, "2024-03");

    let def = PivotDefinition::new(Dimension::Category, None);
    let tree = calculate_pivot(&records, &def, &buckets);
    assert_eq!(tree.undated_count, 1);
    assert_eq!(tree.totals.bucket_values, vec![20.0]);
    assert_eq!(tree.totals.total_value, 30.0);

    // No transaction ids anywhere: the count falls back to rows.
    let tree = calculate_pivot(&records, &def.with_metric(MetricId::Transactions), &buckets);
    assert_eq!(tree.group("Retail").unwrap().bucket_values, vec![2.0]);
    assert_eq!(tree.group("Retail").unwrap().total_value, 3.0);
}

#[test]
fn test_net_of_vat_basis() {
    let records = SalesFixture::records();
    let mut def = category_product();
    def.revenue_basis = RevenueBasis::NetOfVat;
    let tree = calculate_pivot(&records, &def, &quarter_buckets());
    assert_close(tree.group("Memberships").unwrap().total_value, 2565.0);
}

// ============================================================================
// GROWTH
// ============================================================================

#[test]
fn test_month_over_month_series() {
    let (_, tree) = build_tree(MetricId::Revenue);
    let memberships = tree.group("Memberships").unwrap();
    assert_eq!(memberships.bucket_values, vec![1200.0, 1350.0, 300.0]);

    let series = memberships.growth_series();
    assert_eq!(series[0], Growth::None);
    assert_eq!(series[1].to_string(), "12.5");
    assert_eq!(series[2].to_string(), "-77.8");
}

#[test]
fn test_year_over_year_window() {
    let window = BucketWindow::year_over_year(1);
    let buckets = window.buckets(anchor());
    let pairs = window.pairs(anchor());
    let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2024-03", "2023-03"]);

    let records = SalesFixture::records();
    let def = category_product().with_window(window);
    let tree = calculate_pivot(&records, &def, &buckets);

    let class_packs = tree.group("Class Packs").unwrap();
    assert_eq!(node_year_over_year(&tree, class_packs, &pairs)[0].to_string(), "833.3");

    let retail = tree.group("Retail").unwrap();
    assert_eq!(node_year_over_year(&tree, retail, &pairs), vec![Growth::Sentinel]);

    assert_eq!(
        node_year_over_year(&tree, &tree.totals, &pairs),
        vec![Growth::Percent(1840.0)]
    );
}

// ============================================================================
// VIEW STATE & DRILL-DOWN
// ============================================================================

#[test]
fn test_sort_by_bucket_then_collapse() {
    let (_, tree) = build_tree(MetricId::Revenue);
    let mut state = ViewState::new();
    state.toggle_sort(SortKey::Bucket("2024-01".to_string()));
    state.toggle_collapsed("Memberships");

    let rows = visible_rows(&tree, &state);
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "Memberships",
            "Class Packs",
            "10 Pack",
            "Drop In",
            "Retail",
            "Towel",
            "Water",
            "Total",
        ]
    );
    assert_eq!(rows[0].kind, RowKind::Group);
    assert!(!rows[0].expanded);
    assert_eq!(rows[2].parent_key.as_deref(), Some("Class Packs"));

    // Collapsing never moved the sort.
    assert_eq!(state.sort_key, SortKey::Bucket("2024-01".to_string()));
}

#[test]
fn test_drill_down_matches_count_cells() {
    let (records, tree) = build_tree(MetricId::Transactions);
    let memberships = tree.group("Memberships").unwrap();

    for child in &memberships.children {
        for (i, bucket) in tree.buckets.iter().enumerate() {
            let request = DrillDownRequest::node("Memberships", Some(child.key.as_str()))
                .in_bucket(bucket.key.clone());
            let result = drill_down(&tree, &records, &request);
            assert_eq!(result.total_count as f64, child.bucket_values[i]);
            assert_eq!(result.value, child.bucket_values[i]);
        }
    }

    let request = DrillDownRequest::node("Memberships", Some("Monthly")).in_bucket("2024-03");
    let result = drill_down(&tree, &records, &request);
    assert_eq!(result.source_rows, vec![3, 4]);
    assert_eq!(result.description, "Transactions for Memberships > Monthly in Mar 2024: 2 records");
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_two_row_two_bucket_export_shape() {
    let records = vec![
        Record::with_amount(100.0)
            .with_date("2024-02-10")
            .with_dimension(Dimension::Source, "Walk In"),
        Record::with_amount(40.0)
            .with_date("2024-03-10")
            .with_dimension(Dimension::Source, "Referral"),
    ];
    let def = PivotDefinition::new(Dimension::Source, None);
    let tree = calculate_pivot(&records, &def, &rolling_months(2, anchor()));
    let text = serialize_pivot(&tree, &ViewState::new(), &ExportOptions::raw());
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "Revenue by Source");
    assert_eq!(lines.iter().filter(|l| l.starts_with("Source\t")).count(), 1);
    let dash_lines = lines
        .iter()
        .filter(|l| l.split('\t').all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-')))
        .count();
    assert_eq!(dash_lines, 1);
    assert_eq!(lines[3], "Walk In\t100.00\t0.00");
    assert_eq!(lines[4], "Referral\t0.00\t40.00");
    assert_eq!(lines[5], "Total\t100.00\t40.00");
    for line in &lines[1..] {
        assert_eq!(line.split('\t').count(), 3);
    }
}

#[test]
fn test_export_all_metrics_block_count() {
    let records = SalesFixture::records();
    let text = serialize_all_metrics(
        &records,
        &category_product(),
        &quarter_buckets(),
        &ViewState::new(),
        &ExportOptions::default(),
    );

    // Banner, title, header, separator, six leaves and the totals row.
    let block_lines = 1 + 3 + 6 + 1;
    assert_eq!(
        text.lines().count(),
        METRIC_CATALOG.len() * block_lines + METRIC_CATALOG.len() - 1
    );
    assert!(text.starts_with("=== Revenue ===\nRevenue by Category/Product\n"));
    assert!(text.contains("=== Discount % ===\nDiscount % by Category/Product\n"));
}

// ============================================================================
// INGESTION TO PIVOT
// ============================================================================

#[test]
fn test_json_rows_through_field_mapping() {
    let json = r#"[
        {"paymentDate": "2024-03-02", "cleanedCategory": "Memberships", "cleanedProduct": "Annual",
         "paymentValue": "₹1,200", "paymentTransactionId": "P1", "memberId": "M1"},
        {"paymentDate": "05/03/2024", "cleanedCategory": "Memberships", "paymentItem": "Monthly",
         "paymentValue": 150, "paymentTransactionId": "P2", "memberId": "M1"},
        {"paymentDate": "2024-02-10", "category": "Retail", "paymentValue": "20",
         "transactionId": "P3"},
        "garbage"
    ]"#;
    let records = FieldMapping::sales().ingest_json(json).unwrap();
    assert_eq!(records.len(), 3);

    let buckets = rolling_months(2, anchor());
    let def = PivotDefinition::from_json(
        r#"{"primary": "category", "secondary": "product", "metric": "atv"}"#,
    )
    .unwrap();
    let tree = calculate_pivot(&records, &def, &buckets);

    let memberships = tree.group("Memberships").unwrap();
    assert_eq!(tree.bucket_value(memberships, "2024-03"), 675.0);
    assert!(memberships.child("Monthly").is_some());
    assert_eq!(tree.group("Retail").unwrap().children[0].key, "Uncategorized");

    let members = calculate_pivot(&records, &def.clone().with_metric(MetricId::Members), &buckets);
    assert_eq!(members.bucket_value(members.group("Memberships").unwrap(), "2024-03"), 1.0);
    // Members has no row-count fallback.
    assert_eq!(members.group("Retail").unwrap().total_value, 0.0);

    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["groups"][0]["key"], "Memberships");
    assert_eq!(json["groups"][0]["kind"], "group");
}
