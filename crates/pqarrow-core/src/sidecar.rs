//! Per-file JSON metadata sidecars.
//!
//! A sidecar is derived from a loaded [`Table`] once, right after the table
//! has been renamed, and written next to the Arrow file it describes:
//!
//! ```json
//! {
//!   "columns": [
//!     {"distinct_values": 3, "name": "id",
//!      "type": {"base": "int", "nullable": false, "props": [32]}}
//!   ],
//!   "num_rows": 3,
//!   "pkey": ["id"]
//! }
//! ```
//!
//! Column entries follow the table's schema order, and `pkey` always names
//! the first column. The key is a naming convention; uniqueness is not
//! checked.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    column_type::{ColumnDescriptor, TypeDescriptor, UnsupportedTypeError},
    table::{Table, TableError},
};

/// Errors from deriving or encoding a sidecar.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SidecarError {
    /// A column's type has no base kind.
    #[snafu(display("Column {column}: {source}"))]
    UnsupportedType {
        /// Offending column.
        column: String,
        /// Underlying mapping error.
        source: UnsupportedTypeError,
    },

    /// Counting distinct values failed.
    #[snafu(display("Failed to count distinct values of column {column}: {source}"))]
    DistinctCount {
        /// Column being counted.
        column: String,
        /// Underlying table error.
        source: TableError,
    },

    /// A table without columns has no primary-key hint.
    #[snafu(display("Cannot describe a table with no columns"))]
    EmptySchema,

    /// JSON encoding failed.
    #[snafu(display("Failed to encode metadata sidecar: {source}"))]
    Encode {
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}

/// One entry of the sidecar `columns` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    /// Number of distinct values (null counts once).
    pub distinct_values: usize,
    /// Column name.
    pub name: String,
    /// Type descriptor.
    #[serde(rename = "type")]
    pub column_type: TypeDescriptor,
}

/// The metadata sidecar for one converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSidecar {
    /// Column entries in schema order.
    pub columns: Vec<ColumnEntry>,
    /// Total row count.
    pub num_rows: usize,
    /// Single-element primary-key hint naming the first column.
    pub pkey: Vec<String>,
}

impl MetadataSidecar {
    /// Describe `table`.
    ///
    /// Every column type is mapped before any distinct values are counted, so
    /// an unmapped column fails without scanning the data.
    pub fn from_table(table: &Table) -> Result<Self, SidecarError> {
        let schema = table.schema();
        let first = schema.fields().first().context(EmptySchemaSnafu)?;
        let pkey = vec![first.name().clone()];

        let types = schema
            .fields()
            .iter()
            .map(|field| {
                let descriptor = ColumnDescriptor::from_field(field);
                TypeDescriptor::for_column(&descriptor)
                    .context(UnsupportedTypeSnafu {
                        column: descriptor.name.clone(),
                    })
                    .map(|column_type| (descriptor.name, column_type))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut columns = Vec::with_capacity(types.len());
        for (index, (name, column_type)) in types.into_iter().enumerate() {
            let distinct_values = table
                .distinct_count(index)
                .context(DistinctCountSnafu {
                    column: name.clone(),
                })?;

            columns.push(ColumnEntry {
                distinct_values,
                name,
                column_type,
            });
        }

        Ok(Self {
            columns,
            num_rows: table.num_rows(),
            pkey,
        })
    }

    /// Encode as compact JSON.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, SidecarError> {
        serde_json::to_vec(self).context(EncodeSnafu)
    }
}
