//! End-to-end repair rounds against the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use remig_decode::{
    decode_binary_data, BinaryDataDecoder, ColumnCatalogScanner, ParallelRepairDispatcher,
    RepairMetrics,
};
use remig_test_utils::{fixtures, ColumnDescriptor, MemoryStore, RecordingSink, RepairOutcome};

fn schema() -> &'static str {
    fixtures::TEST_SCHEMA
}

#[tokio::test]
async fn zero_qualifying_columns_issue_zero_statements() {
    let store = MemoryStore::new(fixtures::TEST_DATABASE);
    store.create_table(schema(), "plain", &[("id", "integer"), ("name", "text")]);
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let decoder = BinaryDataDecoder::new();
    decoder.run(ctx).await;

    assert!(store.statements().is_empty());
    assert_eq!(store.catalog_queries(), 1);
    assert_eq!(sink.count(), 0);
    let snapshot = decoder.metrics().snapshot();
    assert_eq!(snapshot.rounds, 1);
    assert_eq!(snapshot.columns_discovered, 0);
}

#[tokio::test]
async fn n_columns_issue_n_statements_over_scanned_set() {
    let store = fixtures::tables_store(&["orders", "users", "events", "blobs"]);
    store.create_table(schema(), "images", &[("thumb", "bytea"), ("large", "bytea")]);
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let scanned = ColumnCatalogScanner::new(&ctx).scan().await;
    let reports = ParallelRepairDispatcher::new(&ctx)
        .run_with_reports(scanned.clone())
        .await;

    assert_eq!(scanned.len(), 6);
    assert_eq!(store.statements().len(), 6);

    let scanned_set: BTreeSet<_> = scanned.into_iter().collect();
    let attempted: BTreeSet<_> = reports.into_iter().map(|r| r.descriptor).collect();
    assert_eq!(attempted, scanned_set);

    let issued: BTreeSet<_> = store.statements().into_iter().collect();
    assert_eq!(issued.len(), 6);
    assert!(issued.contains("UPDATE migr.images SET large = DECODE(ENCODE(large, 'escape'), 'hex');"));
}

#[tokio::test]
async fn deadbeef_scenario_decodes_to_raw_bytes() {
    let store = fixtures::deadbeef_store();
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    decode_binary_data(ctx).await;

    assert_eq!(
        store.column(schema(), "t1", "col"),
        Some(vec![Some(vec![0xDE, 0xAD, 0xBE, 0xEF])])
    );
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn repeating_the_round_leaves_decoded_bytes_unchanged() {
    let store = fixtures::deadbeef_store();
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let ctx = decode_binary_data(ctx).await;
    let once = store.column(schema(), "t1", "col");

    decode_binary_data(ctx).await;
    let twice = store.column(schema(), "t1", "col");

    assert_eq!(once, Some(vec![Some(vec![0xDE, 0xAD, 0xBE, 0xEF])]));
    assert_eq!(twice, once);
    // The second pass is rejected by the store rather than re-decoding.
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("invalid hexadecimal digit"));
}

#[tokio::test]
async fn one_acquisition_failure_is_isolated() {
    let store = fixtures::tables_store(&["a", "b", "c", "d"]);
    // Acquisition 1 is the catalog scan; 3 is the second column's task.
    store.fail_acquire_at(3);
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());
    let metrics = RepairMetrics::new();

    let scanned = ColumnCatalogScanner::new(&ctx).scan().await;
    let reports = ParallelRepairDispatcher::new(&ctx)
        .with_metrics(&metrics)
        .run_with_reports(scanned)
        .await;

    assert_eq!(reports.len(), 4);
    let failed: Vec<_> = reports
        .iter()
        .filter(|r| matches!(r.outcome, RepairOutcome::ConnectionFailed(_)))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].descriptor, ColumnDescriptor::new("b", "payload"));

    assert_eq!(sink.count(), 1);
    assert_eq!(store.completed().len(), 3);
    assert_eq!(
        store.column(schema(), "b", "payload"),
        Some(vec![Some(hex::encode("b").into_bytes())])
    );
    assert_eq!(metrics.snapshot().connection_failures, 1);
    assert_eq!(store.outstanding(), 0);
}

#[tokio::test]
async fn catalog_failure_launches_no_tasks() {
    let store = fixtures::tables_store(&["a", "b"]);
    store.fail_catalog_query("canceling statement due to statement timeout");
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let decoder = BinaryDataDecoder::new();
    decoder.run(ctx).await;

    assert!(store.statements().is_empty());
    assert_eq!(store.acquire_attempts(), 1);
    assert_eq!(sink.count(), 1);
    let snapshot = decoder.metrics().snapshot();
    assert_eq!(snapshot.catalog_failures, 1);
    assert_eq!(snapshot.rounds, 1);
}

#[tokio::test]
async fn catalog_unavailable_still_resolves() {
    let store = fixtures::tables_store(&["a"]);
    store.fail_acquire_at(1);
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let returned = decode_binary_data(ctx).await;

    assert_eq!(returned.schema(), schema());
    assert_eq!(returned.database(), fixtures::TEST_DATABASE);
    assert_eq!(sink.count(), 1);
    assert!(store.statements().is_empty());
}

#[tokio::test]
async fn two_tables_run_concurrently_and_resolve_after_both() {
    let store = fixtures::tables_store(&["first", "second"]);
    // Both statements must be in flight together to get past this.
    store.rendezvous(2);
    // The scan-order-first table finishes last.
    store.delay_statement("first", Duration::from_millis(40));
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    let decoder = BinaryDataDecoder::new();
    tokio::time::timeout(Duration::from_secs(5), decoder.run(ctx))
        .await
        .expect("round should not deadlock");

    assert_eq!(
        store.completed(),
        vec![
            ColumnDescriptor::new("second", "payload"),
            ColumnDescriptor::new("first", "payload"),
        ]
    );
    assert_eq!(decoder.metrics().snapshot().columns_repaired, 2);
    assert_eq!(store.peak_outstanding(), 2);
    assert_eq!(store.outstanding(), 0);
}

#[tokio::test]
async fn each_task_holds_at_most_one_handle() {
    let tables = ["t0", "t1", "t2", "t3", "t4", "t5"];
    let store = fixtures::tables_store(&tables);
    store.rendezvous(tables.len());
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    tokio::time::timeout(Duration::from_secs(5), decode_binary_data(ctx))
        .await
        .expect("round should not deadlock");

    assert_eq!(store.acquired(), tables.len() + 1);
    assert_eq!(store.peak_outstanding(), tables.len());
    assert_eq!(store.released(), store.acquired());
}

#[tokio::test]
async fn invalid_payload_fails_only_its_column() {
    let store = fixtures::tables_store(&["good", "bad"]);
    store.set_column(schema(), "bad", "payload", vec![Some(b"xyz!".to_vec())]);
    let sink = Arc::new(RecordingSink::new());
    let ctx = fixtures::context(&store, &sink, schema());

    decode_binary_data(ctx).await;

    assert_eq!(
        store.column(schema(), "good", "payload"),
        Some(vec![Some(b"good".to_vec())])
    );
    assert_eq!(
        store.column(schema(), "bad", "payload"),
        Some(vec![Some(b"xyz!".to_vec())])
    );
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("bad.payload"));
    assert!(reports[0]
        .statement
        .as_deref()
        .is_some_and(|sql| sql.starts_with("UPDATE migr.bad")));
}
