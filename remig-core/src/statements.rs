//! SQL statement construction.
//!
//! Every statement the repair stage sends to the target store is built here.
//! Identifiers from the catalog are interpolated as-is: they are neither
//! quoted nor validated. Quoting them means changing [`identifier`] only.

use crate::descriptor::ColumnDescriptor;
use std::borrow::Cow;

/// Columns of one data type within one database/schema, in a stable order.
///
/// `information_schema` columns are domain-typed; they are compared and
/// returned as `text`.
const CATALOG_SQL: &str = "SELECT table_name::text, column_name::text \
     FROM information_schema.columns \
     WHERE table_catalog::text = $1 \
       AND table_schema::text = $2 \
       AND data_type::text = $3 \
     ORDER BY table_name, ordinal_position";

/// The parameterized catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub database: String,
    pub schema: String,
    pub data_type: String,
}

impl CatalogQuery {
    pub fn sql(&self) -> &'static str {
        CATALOG_SQL
    }
}

/// One repair statement bound to the column it rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairStatement {
    pub schema: String,
    pub descriptor: ColumnDescriptor,
    sql: String,
}

impl RepairStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Build the catalog lookup for `data_type` columns in `database.schema`.
pub fn catalog_query(database: &str, schema: &str, data_type: &str) -> CatalogQuery {
    CatalogQuery {
        database: database.to_string(),
        schema: schema.to_string(),
        data_type: data_type.to_string(),
    }
}

/// Build the in-place decode statement for one column.
///
/// Re-reads the column's bytes as escaped text, then decodes that text as
/// hexadecimal. NULL values stay NULL.
pub fn repair_statement(schema: &str, descriptor: &ColumnDescriptor) -> RepairStatement {
    let schema_ident = identifier(schema);
    let table = identifier(&descriptor.table_name);
    let column = identifier(&descriptor.column_name);
    let sql = format!(
        "UPDATE {schema_ident}.{table} SET {column} = DECODE(ENCODE({column}, 'escape'), 'hex');"
    );

    RepairStatement {
        schema: schema.to_string(),
        descriptor: descriptor.clone(),
        sql,
    }
}

// TODO: quote with double quotes (doubling embedded ones) once the loader
// stops relying on case-folded unquoted names.
fn identifier(name: &str) -> Cow<'_, str> {
    Cow::Borrowed(name)
}
