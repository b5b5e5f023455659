//! remig Core - Data Types and Collaborator Traits
//!
//! Pure data structures and the seams the repair stage talks through.
//! The scan/dispatch logic lives in remig-decode; the PostgreSQL adapter
//! lives in remig-pg.

pub mod codec;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod gate;
pub mod sink;
pub mod statements;

pub use codec::{escape_encode, hex_decode, repair_value};
pub use config::RepairConfig;
pub use context::ConversionContext;
pub use descriptor::{ColumnDescriptor, RepairOutcome, TaskReport};
pub use error::{
    ConfigError, HexDecodeError, RemigError, RemigResult, RepairError, StoreError,
};
pub use gate::{ConnectionGate, QueryHandle};
pub use sink::{FailureSink, NullSink};
pub use statements::{catalog_query, repair_statement, CatalogQuery, RepairStatement};
