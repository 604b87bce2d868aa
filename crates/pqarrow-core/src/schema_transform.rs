//! Schema rewrites and table materialisation.
//!
//! A [`SchemaTransform`] is a list of per-column [`ColumnRule`]s. Applying it
//! to a schema yields a new, independent schema value; [`materialize`] then
//! rebuilds a table so its arrays conform to that target schema. The source
//! schema and table are never mutated.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, AsArray, StringBuilder},
    datatypes::{DataType, Field, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};
use snafu::prelude::*;

use crate::table::Table;

/// Errors from rebuilding a table against a rewritten schema.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransformError {
    /// Target schema has a different column count than the table.
    #[snafu(display("Target schema has {target} columns but the table has {actual}"))]
    ColumnCountMismatch {
        /// Columns in the target schema.
        target: usize,
        /// Columns in the table being materialised.
        actual: usize,
    },

    /// A fixed-size binary value is not valid UTF-8.
    #[snafu(display("Column {column} row {row}: fixed-size binary value is not valid UTF-8"))]
    InvalidUtf8 {
        /// Column being rewritten.
        column: String,
        /// Row index within the table.
        row: usize,
        /// Underlying decode error.
        source: std::str::Utf8Error,
    },

    /// The requested type change has no materialisation.
    #[snafu(display("Cannot rewrite column {column} from {from} to {to}"))]
    UnsupportedRewrite {
        /// Column being rewritten.
        column: String,
        /// Source data type.
        from: DataType,
        /// Target data type.
        to: DataType,
    },

    /// Arrow rejected the rebuilt batch.
    #[snafu(display("Failed to assemble rewritten batch: {source}"))]
    Assemble {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// One per-column rewrite rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRule {
    /// Fixed-size binary columns become nullable UTF-8 string columns.
    FixedBinaryAsUtf8,
    /// Column names are lower-cased.
    LowercaseName,
}

impl ColumnRule {
    fn apply(self, field: Field) -> Field {
        match self {
            ColumnRule::FixedBinaryAsUtf8 => match field.data_type() {
                DataType::FixedSizeBinary(_) => Field::new(field.name(), DataType::Utf8, true)
                    .with_metadata(field.metadata().clone()),
                _ => field,
            },
            ColumnRule::LowercaseName => {
                let lowered = field.name().to_lowercase();
                field.with_name(lowered)
            }
        }
    }
}

/// An ordered list of rules applied to every field of a schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaTransform {
    rules: Vec<ColumnRule>,
}

impl SchemaTransform {
    /// Create a transform from its rules; rules run in the given order.
    pub fn new(rules: impl IntoIterator<Item = ColumnRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Produce the rewritten schema. Schema-level metadata is carried over.
    pub fn apply(&self, schema: &Schema) -> SchemaRef {
        let fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|f| {
                self.rules
                    .iter()
                    .fold(f.as_ref().clone(), |field, rule| rule.apply(field))
            })
            .collect();

        Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
    }

    /// Rewrite the schema of `table` and materialise a table conforming to it.
    pub fn run(&self, table: &Table) -> Result<Table, TransformError> {
        let target = self.apply(table.schema());
        materialize(table, target)
    }
}

fn fixed_binary_to_utf8(
    array: &ArrayRef,
    column: &str,
    row_offset: usize,
) -> Result<ArrayRef, TransformError> {
    let binary = array.as_fixed_size_binary();
    let mut builder = StringBuilder::with_capacity(binary.len(), binary.value_data().len());

    for i in 0..binary.len() {
        if binary.is_null(i) {
            builder.append_null();
            continue;
        }
        let value = std::str::from_utf8(binary.value(i)).context(InvalidUtf8Snafu {
            column,
            row: row_offset + i,
        })?;
        builder.append_value(value);
    }

    Ok(Arc::new(builder.finish()))
}

fn convert_column(
    array: &ArrayRef,
    target: &Field,
    row_offset: usize,
) -> Result<ArrayRef, TransformError> {
    match (array.data_type(), target.data_type()) {
        (from, to) if from == to => Ok(array.clone()),
        (DataType::FixedSizeBinary(_), DataType::Utf8) => {
            fixed_binary_to_utf8(array, target.name(), row_offset)
        }
        (from, to) => UnsupportedRewriteSnafu {
            column: target.name().clone(),
            from: from.clone(),
            to: to.clone(),
        }
        .fail(),
    }
}

/// Rebuild every batch of `table` so it conforms to `target`.
///
/// Columns whose type is unchanged keep their arrays; only columns whose
/// physical layout changes are re-encoded.
pub fn materialize(table: &Table, target: SchemaRef) -> Result<Table, TransformError> {
    ensure!(
        target.fields().len() == table.num_columns(),
        ColumnCountMismatchSnafu {
            target: target.fields().len(),
            actual: table.num_columns(),
        }
    );

    let mut batches = Vec::with_capacity(table.batches().len());
    let mut row_offset = 0;

    for batch in table.batches() {
        let columns = batch
            .columns()
            .iter()
            .zip(target.fields().iter())
            .map(|(array, field)| convert_column(array, field, row_offset))
            .collect::<Result<Vec<_>, _>>()?;

        batches.push(RecordBatch::try_new(target.clone(), columns).context(AssembleSnafu)?);
        row_offset += batch.num_rows();
    }

    Ok(Table::new(target, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{FixedSizeBinaryArray, Int32Array, StringArray};
    use std::collections::HashMap;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn fixed_binary_table(values: Vec<Option<&[u8]>>) -> Result<Table, ArrowError> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ID", DataType::Int32, false),
            Field::new("Code", DataType::FixedSizeBinary(2), true),
        ]));
        let ids: Vec<i32> = (0..values.len() as i32).collect();
        let codes = FixedSizeBinaryArray::try_from_sparse_iter_with_size(values.into_iter(), 2)?;
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int32Array::from(ids)) as ArrayRef, Arc::new(codes)],
        )?;
        Ok(Table::new(schema, vec![batch]))
    }

    #[test]
    fn lowercase_rule_is_idempotent() {
        let schema = Schema::new(vec![
            Field::new("CUSTOMER_ID", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
        ]);
        let transform = SchemaTransform::new([ColumnRule::LowercaseName]);

        let once = transform.apply(&schema);
        let twice = transform.apply(&once);

        assert_eq!(once.field(0).name(), "customer_id");
        assert_eq!(once.field(1).name(), "name");
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_keeps_metadata_and_leaves_source_untouched() {
        let metadata = HashMap::from([("origin".to_string(), "test".to_string())]);
        let field_metadata = HashMap::from([("unit".to_string(), "iso3".to_string())]);
        let schema = Schema::new_with_metadata(
            vec![
                Field::new("Blob", DataType::FixedSizeBinary(4), false)
                    .with_metadata(field_metadata.clone()),
            ],
            metadata.clone(),
        );

        let out = SchemaTransform::new([ColumnRule::FixedBinaryAsUtf8]).apply(&schema);

        assert_eq!(out.field(0).data_type(), &DataType::Utf8);
        assert_eq!(out.field(0).name(), "Blob");
        assert_eq!(out.field(0).metadata(), &field_metadata);
        assert_eq!(out.metadata(), &metadata);
        assert_eq!(schema.field(0).data_type(), &DataType::FixedSizeBinary(4));
    }

    #[test]
    fn fixed_binary_rewrite_is_always_nullable() {
        let schema = Schema::new(vec![
            Field::new("Required", DataType::FixedSizeBinary(2), false),
            Field::new("Optional", DataType::FixedSizeBinary(2), true),
            Field::new("Id", DataType::Int32, false),
        ]);

        let out = SchemaTransform::new([ColumnRule::FixedBinaryAsUtf8]).apply(&schema);

        assert!(out.field(0).is_nullable());
        assert!(out.field(1).is_nullable());
        assert!(!out.field(2).is_nullable());
        assert!(!schema.field(0).is_nullable());
    }

    #[test]
    fn fixed_binary_materializes_as_strings() -> TestResult {
        let table = fixed_binary_table(vec![Some(&b"ab"[..]), None, Some(&b"zz"[..])])?;
        let out = SchemaTransform::new([ColumnRule::FixedBinaryAsUtf8]).run(&table)?;

        assert_eq!(out.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(out.num_rows(), 3);

        let column = out.column(1)?;
        let strings = column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or("expected a StringArray")?;
        assert_eq!(strings.value(0), "ab");
        assert!(strings.is_null(1));
        assert_eq!(strings.value(2), "zz");

        // Untouched columns keep their type and name.
        assert_eq!(out.schema().field(0).name(), "ID");
        assert_eq!(out.schema().field(0).data_type(), &DataType::Int32);
        Ok(())
    }

    #[test]
    fn invalid_utf8_reports_row() -> TestResult {
        let table = fixed_binary_table(vec![Some(&b"ok"[..]), Some(&[0xff_u8, 0xfe][..])])?;
        let err = SchemaTransform::new([ColumnRule::FixedBinaryAsUtf8])
            .run(&table)
            .unwrap_err();

        assert!(matches!(
            err,
            TransformError::InvalidUtf8 { ref column, row: 1, .. } if column == "Code"
        ));
        Ok(())
    }

    #[test]
    fn unsupported_rewrite_is_rejected() -> TestResult {
        let table = fixed_binary_table(vec![Some(&b"ab"[..])])?;
        let target = Arc::new(Schema::new(vec![
            Field::new("ID", DataType::Utf8, false),
            Field::new("Code", DataType::FixedSizeBinary(2), true),
        ]));

        let err = materialize(&table, target).unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedRewrite { .. }));
        Ok(())
    }
}
