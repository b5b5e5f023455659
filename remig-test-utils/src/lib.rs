//! remig Test Utilities
//!
//! Centralized test infrastructure for the remig workspace:
//! - In-memory target store implementing the gate/handle traits
//! - Failure injection and concurrency probes for that store
//! - A recording failure sink
//! - Proptest generators and fixtures for common scenarios

// Re-export core types for convenience
pub use remig_core::{
    catalog_query, repair_statement, repair_value, CatalogQuery, ColumnDescriptor,
    ConnectionGate, ConversionContext, FailureSink, QueryHandle, RepairConfig, RepairError,
    RepairOutcome, RepairStatement, StoreError, TaskReport,
};

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Barrier;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// One row of the in-memory `information_schema.columns`.
#[derive(Debug, Clone)]
struct CatalogEntry {
    database: String,
    schema: String,
    table: String,
    column: String,
    data_type: String,
    ordinal: usize,
}

/// Column-major table contents. Only the column under repair is ever
/// rewritten, so rows never need to be materialized together.
#[derive(Debug, Clone, Default)]
struct Table {
    columns: BTreeMap<String, Vec<Option<Vec<u8>>>>,
}

#[derive(Debug, Default)]
struct StoreState {
    catalog: Vec<CatalogEntry>,
    tables: HashMap<(String, String), Table>,
    catalog_queries: usize,
    statements: Vec<String>,
    completed: Vec<ColumnDescriptor>,
}

impl StoreState {
    fn apply_repair(&mut self, statement: &RepairStatement) -> Result<u64, StoreError> {
        let descriptor = &statement.descriptor;
        let key = (statement.schema.clone(), descriptor.table_name.clone());
        let table = self.tables.get_mut(&key).ok_or_else(|| {
            StoreError::query(format!(
                "relation \"{}.{}\" does not exist",
                statement.schema, descriptor.table_name
            ))
        })?;
        let values = table
            .columns
            .get_mut(&descriptor.column_name)
            .ok_or_else(|| {
                StoreError::query(format!(
                    "column \"{}\" does not exist",
                    descriptor.column_name
                ))
            })?;

        // All rows or none, like a single UPDATE.
        let repaired = values
            .iter()
            .map(|value| repair_value(value.as_deref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query(e.to_string()))?;

        let rows = repaired.len() as u64;
        *values = repaired;
        Ok(rows)
    }
}

#[derive(Debug, Default)]
struct Faults {
    closed: bool,
    failing_acquires: HashSet<usize>,
    catalog_query_failure: Option<String>,
    statement_failures: HashMap<String, String>,
    statement_delays: HashMap<String, Duration>,
    rendezvous: Option<Arc<Barrier>>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<StoreState>,
    faults: Mutex<Faults>,
    acquire_attempts: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
}

/// In-memory target store.
///
/// Each [`ConnectionGate::acquire`] call is numbered from 1 in call order,
/// which lets tests fail a specific acquisition (the catalog scan always
/// takes acquisition 1).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    database: String,
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    // === Schema setup ===

    /// Create a table with `(column, data_type)` pairs, in ordinal order.
    pub fn create_table(&self, schema: &str, table: &str, columns: &[(&str, &str)]) {
        let mut state = lock(&self.inner.state);
        let mut contents = Table::default();
        for (ordinal, (column, data_type)) in columns.iter().enumerate() {
            state.catalog.push(CatalogEntry {
                database: self.database.clone(),
                schema: schema.to_string(),
                table: table.to_string(),
                column: column.to_string(),
                data_type: data_type.to_string(),
                ordinal: ordinal + 1,
            });
            contents.columns.insert(column.to_string(), Vec::new());
        }
        state
            .tables
            .insert((schema.to_string(), table.to_string()), contents);
    }

    /// Replace the values of one column.
    pub fn set_column(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        values: Vec<Option<Vec<u8>>>,
    ) {
        let mut state = lock(&self.inner.state);
        let contents = state
            .tables
            .entry((schema.to_string(), table.to_string()))
            .or_default();
        contents.columns.insert(column.to_string(), values);
    }

    /// Current values of one column, if the table and column exist.
    pub fn column(&self, schema: &str, table: &str, column: &str) -> Option<Vec<Option<Vec<u8>>>> {
        let state = lock(&self.inner.state);
        state
            .tables
            .get(&(schema.to_string(), table.to_string()))
            .and_then(|t| t.columns.get(column))
            .cloned()
    }

    // === Failure injection ===

    /// Fail every acquisition from now on.
    pub fn close(&self) {
        lock(&self.inner.faults).closed = true;
    }

    /// Fail the `ordinal`-th acquisition (1-based).
    pub fn fail_acquire_at(&self, ordinal: usize) {
        lock(&self.inner.faults).failing_acquires.insert(ordinal);
    }

    pub fn fail_catalog_query(&self, reason: impl Into<String>) {
        lock(&self.inner.faults).catalog_query_failure = Some(reason.into());
    }

    /// Reject the repair statement for `table` with `reason`.
    pub fn fail_statement_on(&self, table: &str, reason: impl Into<String>) {
        lock(&self.inner.faults)
            .statement_failures
            .insert(table.to_string(), reason.into());
    }

    /// Hold the repair statement for `table` for `delay` before applying it.
    pub fn delay_statement(&self, table: &str, delay: Duration) {
        lock(&self.inner.faults)
            .statement_delays
            .insert(table.to_string(), delay);
    }

    /// Make every repair statement wait until `parties` statements are in
    /// flight at once. A sequential caller deadlocks on this.
    pub fn rendezvous(&self, parties: usize) {
        lock(&self.inner.faults).rendezvous = Some(Arc::new(Barrier::new(parties)));
    }

    // === Observations ===

    pub fn catalog_queries(&self) -> usize {
        lock(&self.inner.state).catalog_queries
    }

    /// SQL text of every repair statement issued, in issue order.
    pub fn statements(&self) -> Vec<String> {
        lock(&self.inner.state).statements.clone()
    }

    /// Columns whose repair statement committed, in completion order.
    pub fn completed(&self) -> Vec<ColumnDescriptor> {
        lock(&self.inner.state).completed.clone()
    }

    pub fn acquire_attempts(&self) -> usize {
        self.inner.acquire_attempts.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.inner.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    pub fn peak_outstanding(&self) -> usize {
        self.inner.peak_outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionGate for MemoryStore {
    async fn acquire(&self) -> Result<Box<dyn QueryHandle>, StoreError> {
        let ordinal = self.inner.acquire_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let faults = lock(&self.inner.faults);
            if faults.closed {
                return Err(StoreError::acquire("connection pool is closed"));
            }
            if faults.failing_acquires.contains(&ordinal) {
                return Err(StoreError::acquire(format!(
                    "connection refused (attempt {})",
                    ordinal
                )));
            }
        }

        self.inner.acquired.fetch_add(1, Ordering::SeqCst);
        let now = self.inner.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_outstanding.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(MemoryHandle {
            inner: Arc::clone(&self.inner),
        }))
    }
}

/// Handle returned by [`MemoryStore`]; released on drop.
struct MemoryHandle {
    inner: Arc<Inner>,
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.inner.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueryHandle for MemoryHandle {
    async fn query_catalog(
        &mut self,
        query: &CatalogQuery,
    ) -> Result<Vec<ColumnDescriptor>, StoreError> {
        if let Some(reason) = lock(&self.inner.faults).catalog_query_failure.clone() {
            return Err(StoreError::query(reason));
        }

        let mut state = lock(&self.inner.state);
        state.catalog_queries += 1;

        let mut matches: Vec<&CatalogEntry> = state
            .catalog
            .iter()
            .filter(|e| {
                e.database == query.database
                    && e.schema == query.schema
                    && e.data_type == query.data_type
            })
            .collect();
        matches.sort_by(|a, b| a.table.cmp(&b.table).then(a.ordinal.cmp(&b.ordinal)));

        Ok(matches
            .into_iter()
            .map(|e| ColumnDescriptor::new(e.table.clone(), e.column.clone()))
            .collect())
    }

    async fn execute(&mut self, statement: &RepairStatement) -> Result<u64, StoreError> {
        let table = statement.descriptor.table_name.clone();
        lock(&self.inner.state)
            .statements
            .push(statement.sql().to_string());

        let (barrier, delay, failure) = {
            let faults = lock(&self.inner.faults);
            (
                faults.rendezvous.clone(),
                faults.statement_delays.get(&table).copied(),
                faults.statement_failures.get(&table).cloned(),
            )
        };

        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = failure {
            return Err(StoreError::query(reason));
        }

        let mut state = lock(&self.inner.state);
        let rows = state.apply_repair(statement)?;
        state.completed.push(statement.descriptor.clone());
        Ok(rows)
    }
}

// ============================================================================
// RECORDING SINK
// ============================================================================

/// One captured failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    pub statement: Option<String>,
}

/// Failure sink that keeps every report for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<FailureReport> {
        lock(&self.reports).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.reports).len()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, message: &str, statement: Option<&str>) {
        lock(&self.reports).push(FailureReport {
            message: message.to_string(),
            statement: statement.map(str::to_string),
        });
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made stores and contexts.

    use super::*;

    /// Database name used by every fixture.
    pub const TEST_DATABASE: &str = "target";

    /// Schema used by the scenario fixtures.
    pub const TEST_SCHEMA: &str = "migr";

    /// Build a context over `store` reporting into `sink`.
    pub fn context(store: &MemoryStore, sink: &Arc<RecordingSink>, schema: &str) -> ConversionContext {
        let sink: Arc<dyn FailureSink> = sink.clone();
        ConversionContext::new(
            RepairConfig::new(store.database(), schema),
            Arc::new(store.clone()),
            sink,
        )
    }

    /// `migr.t1(col bytea)` holding one row of ASCII `deadbeef`.
    pub fn deadbeef_store() -> MemoryStore {
        let store = MemoryStore::new(TEST_DATABASE);
        store.create_table(TEST_SCHEMA, "t1", &[("col", "bytea")]);
        store.set_column(TEST_SCHEMA, "t1", "col", vec![Some(b"deadbeef".to_vec())]);
        store
    }

    /// One single-column bytea table per name, each holding one hex-transported row.
    pub fn tables_store(tables: &[&str]) -> MemoryStore {
        let store = MemoryStore::new(TEST_DATABASE);
        for table in tables {
            store.create_table(TEST_SCHEMA, table, &[("payload", "bytea")]);
            store.set_column(
                TEST_SCHEMA,
                table,
                "payload",
                vec![Some(hex::encode(table.as_bytes()).into_bytes())],
            );
        }
        store
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for remig types.

    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Generate a lowercase, unquoted SQL identifier.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    /// Generate a set of distinct (table, column) pairs.
    pub fn arb_descriptor_set(max: usize) -> impl Strategy<Value = BTreeSet<ColumnDescriptor>> {
        proptest::collection::btree_set(
            (arb_identifier(), arb_identifier())
                .prop_map(|(table, column)| ColumnDescriptor::new(table, column)),
            0..max,
        )
    }

    /// Generate raw bytes together with their hex-transported form.
    pub fn arb_hex_transported() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
        proptest::collection::vec(any::<u8>(), 0..48)
            .prop_map(|raw| (raw.clone(), hex::encode(&raw).into_bytes()))
    }

    /// Generate an optional column value in hex-transported form.
    pub fn arb_transported_cell() -> impl Strategy<Value = Option<Vec<u8>>> {
        prop_oneof![
            1 => Just(None),
            4 => arb_hex_transported().prop_map(|(_, transported)| Some(transported)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_filters_by_type_and_orders_by_table() -> Result<(), StoreError> {
        let store = MemoryStore::new("target");
        store.create_table("migr", "zeta", &[("id", "integer"), ("blob", "bytea")]);
        store.create_table("migr", "alpha", &[("b2", "bytea"), ("b1", "bytea")]);
        store.create_table("other", "beta", &[("blob", "bytea")]);

        let mut handle = store.acquire().await?;
        let found = handle
            .query_catalog(&catalog_query("target", "migr", "bytea"))
            .await?;

        assert_eq!(
            found,
            vec![
                ColumnDescriptor::new("alpha", "b2"),
                ColumnDescriptor::new("alpha", "b1"),
                ColumnDescriptor::new("zeta", "blob"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_release_on_drop() -> Result<(), StoreError> {
        let store = MemoryStore::new("target");
        let handle = store.acquire().await?;
        assert_eq!(store.outstanding(), 1);
        drop(handle);
        assert_eq!(store.outstanding(), 0);
        assert_eq!(store.released(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_statement_leaves_column_untouched() -> Result<(), StoreError> {
        let store = MemoryStore::new("target");
        store.create_table("migr", "t1", &[("col", "bytea")]);
        store.set_column(
            "migr",
            "t1",
            "col",
            vec![Some(b"00ff".to_vec()), Some(b"not hex".to_vec())],
        );

        let mut handle = store.acquire().await?;
        let stmt = repair_statement("migr", &ColumnDescriptor::new("t1", "col"));
        assert!(handle.execute(&stmt).await.is_err());
        assert_eq!(
            store.column("migr", "t1", "col"),
            Some(vec![Some(b"00ff".to_vec()), Some(b"not hex".to_vec())])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fail_acquire_at_ordinal() {
        let store = MemoryStore::new("target");
        store.fail_acquire_at(2);
        assert!(store.acquire().await.is_ok());
        assert!(store.acquire().await.is_err());
        assert!(store.acquire().await.is_ok());
        assert_eq!(store.acquire_attempts(), 3);
        assert_eq!(store.acquired(), 2);
    }

    #[test]
    fn test_recording_sink_captures_statement() {
        let sink = RecordingSink::new();
        sink.report("boom", Some("UPDATE x"));
        sink.report("no statement", None);
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.reports()[0].statement.as_deref(), Some("UPDATE x"));
        assert_eq!(sink.reports()[1].statement, None);
    }
}
