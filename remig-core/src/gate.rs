//! Connection acquisition seam.
//!
//! A [`ConnectionGate`] hands out one [`QueryHandle`] per unit of work.
//! Dropping the handle releases it back to whatever pool produced it, so
//! release happens on every exit path of the code holding it.

use crate::descriptor::ColumnDescriptor;
use crate::error::StoreError;
use crate::statements::{CatalogQuery, RepairStatement};
use ::async_trait::async_trait;

/// Supplies query-capable handles to the target store.
#[async_trait]
pub trait ConnectionGate: Send + Sync {
    /// Acquire a dedicated handle. Failure is recoverable for the caller.
    async fn acquire(&self) -> Result<Box<dyn QueryHandle>, StoreError>;
}

/// A single acquired connection to the target store.
#[async_trait]
pub trait QueryHandle: Send {
    /// Run the read-only catalog query and return the matching columns in
    /// the order the store produced them.
    async fn query_catalog(
        &mut self,
        query: &CatalogQuery,
    ) -> Result<Vec<ColumnDescriptor>, StoreError>;

    /// Execute one data-modifying statement, returning the affected row count.
    async fn execute(&mut self, statement: &RepairStatement) -> Result<u64, StoreError>;
}
