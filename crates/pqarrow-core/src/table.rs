//! In-memory tables and their Parquet / Arrow IPC encodings.
//!
//! A [`Table`] is a schema plus every record batch of a source file, loaded
//! eagerly. Decoding and encoding happen over in-memory buffers; callers are
//! responsible for moving bytes to and from disk (see [`crate::storage`]).

use std::{collections::HashSet, io::Cursor, path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, AsArray, new_empty_array},
    compute::concat,
    datatypes::{
        ArrowPrimitiveType, DataType, Float16Type, Float32Type, Float64Type, SchemaRef,
    },
    error::ArrowError,
    ipc::{reader::FileReader, writer::FileWriter},
    record_batch::{RecordBatch, RecordBatchReader},
    row::{RowConverter, SortField},
};
use bytes::Bytes;
use parquet::{
    arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder},
    errors::ParquetError,
};
use snafu::{Backtrace, prelude::*};

/// Errors from loading, encoding or inspecting a [`Table`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// The bytes are not a readable Parquet file.
    #[snafu(display("Malformed Parquet file {path}: {source}"))]
    MalformedParquet {
        /// File the bytes came from.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A Parquet file whose footer parsed but whose pages could not be decoded.
    #[snafu(display("Malformed Parquet file {path}: {source}"))]
    ParquetDecode {
        /// File the bytes came from.
        path: String,
        /// Underlying Arrow error raised by the decoder.
        source: ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The bytes are not a readable Arrow IPC file.
    #[snafu(display("Malformed Arrow IPC file {path}: {source}"))]
    MalformedIpc {
        /// File the bytes came from.
        path: String,
        /// Underlying Arrow error.
        source: ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Encoding the table as Parquet failed.
    #[snafu(display("Failed to encode table as Parquet: {source}"))]
    EncodeParquet {
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Encoding the table as Arrow IPC failed.
    #[snafu(display("Failed to encode table as Arrow IPC: {source}"))]
    EncodeIpc {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// A column index past the end of the schema.
    #[snafu(display("Column index {index} out of range for a table with {num_columns} columns"))]
    ColumnOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of columns in the table.
        num_columns: usize,
    },

    /// Any other Arrow compute failure (concatenation, row encoding, ...).
    #[snafu(display("Arrow error on column {column}: {source}"))]
    Compute {
        /// Column being processed.
        column: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// A fully loaded table: schema plus all record batches.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    num_rows: usize,
}

impl Table {
    /// Build a table from a schema and batches that all conform to it.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
        Self {
            schema,
            batches,
            num_rows,
        }
    }

    /// Decode a whole Parquet file held in memory.
    ///
    /// `path` is only used for error context.
    pub fn from_parquet_bytes(path: &Path, data: Bytes) -> Result<Self, TableError> {
        let path_str = path.display().to_string();

        let builder = ParquetRecordBatchReaderBuilder::try_new(data).context(
            MalformedParquetSnafu {
                path: path_str.clone(),
            },
        )?;
        let reader = builder.build().context(MalformedParquetSnafu {
            path: path_str.clone(),
        })?;

        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(ParquetDecodeSnafu { path: path_str })?;

        Ok(Self::new(schema, batches))
    }

    /// Decode a whole Arrow IPC file (file format, not stream) held in memory.
    ///
    /// `path` is only used for error context.
    pub fn from_ipc_bytes(path: &Path, data: Bytes) -> Result<Self, TableError> {
        let path_str = path.display().to_string();

        let reader = FileReader::try_new(Cursor::new(data), None).context(MalformedIpcSnafu {
            path: path_str.clone(),
        })?;

        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(MalformedIpcSnafu { path: path_str })?;

        Ok(Self::new(schema, batches))
    }

    /// Encode the table as a Parquet file with default writer properties.
    pub fn to_parquet_bytes(&self) -> Result<Vec<u8>, TableError> {
        let mut buf = Vec::new();
        {
            let mut writer =
                ArrowWriter::try_new(&mut buf, self.schema.clone(), None).context(EncodeParquetSnafu)?;
            for batch in &self.batches {
                writer.write(batch).context(EncodeParquetSnafu)?;
            }
            writer.close().context(EncodeParquetSnafu)?;
        }
        Ok(buf)
    }

    /// Encode the table as an Arrow IPC file.
    pub fn to_ipc_bytes(&self) -> Result<Vec<u8>, TableError> {
        let mut buf = Vec::new();
        {
            let mut writer = FileWriter::try_new(&mut buf, &self.schema).context(EncodeIpcSnafu)?;
            for batch in &self.batches {
                writer.write(batch).context(EncodeIpcSnafu)?;
            }
            writer.finish().context(EncodeIpcSnafu)?;
        }
        Ok(buf)
    }

    /// The table schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The loaded record batches, in file order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns in the schema.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Column `index` as a single array spanning all batches.
    pub fn column(&self, index: usize) -> Result<ArrayRef, TableError> {
        let num_columns = self.num_columns();
        ensure!(
            index < num_columns,
            ColumnOutOfRangeSnafu { index, num_columns }
        );

        let field = self.schema.field(index);
        let chunks: Vec<&dyn arrow::array::Array> = self
            .batches
            .iter()
            .map(|b| b.column(index).as_ref())
            .collect();

        match chunks.len() {
            0 => Ok(new_empty_array(field.data_type())),
            1 => Ok(self.batches[0].column(index).clone()),
            _ => concat(&chunks).context(ComputeSnafu {
                column: field.name().clone(),
            }),
        }
    }

    /// Number of distinct values in column `index` over the whole table.
    ///
    /// Null counts as one value when present, and so does NaN whatever its
    /// payload. Computed on every call.
    pub fn distinct_count(&self, index: usize) -> Result<usize, TableError> {
        let array = canonical_nans(self.column(index)?);
        let column = self.schema.field(index).name().clone();

        let converter = RowConverter::new(vec![SortField::new(array.data_type().clone())])
            .context(ComputeSnafu {
                column: column.clone(),
            })?;
        let rows = converter
            .convert_columns(&[array])
            .context(ComputeSnafu { column })?;

        let distinct: HashSet<_> = rows.iter().collect();
        Ok(distinct.len())
    }
}

type F16 = <Float16Type as ArrowPrimitiveType>::Native;

/// Rewrite every NaN of a float column to one bit pattern; row encoding
/// compares floats bitwise.
fn canonical_nans(array: ArrayRef) -> ArrayRef {
    match array.data_type() {
        DataType::Float16 => Arc::new(
            array
                .as_primitive::<Float16Type>()
                .unary::<_, Float16Type>(|v| if v.is_nan() { F16::NAN } else { v }),
        ),
        DataType::Float32 => Arc::new(
            array
                .as_primitive::<Float32Type>()
                .unary::<_, Float32Type>(|v| if v.is_nan() { f32::NAN } else { v }),
        ),
        DataType::Float64 => Arc::new(
            array
                .as_primitive::<Float64Type>()
                .unary::<_, Float64Type>(|v| if v.is_nan() { f64::NAN } else { v }),
        ),
        _ => array,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{Array, Float32Array, Float64Array, Int32Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn sample_table() -> Result<Table, ArrowError> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ID", DataType::Int32, false),
            Field::new("Name", DataType::Utf8, true),
        ]));
        let b1 = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("a"), None, Some("a")])),
            ],
        )?;
        let b2 = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![4, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("b"), None])),
            ],
        )?;
        Ok(Table::new(schema, vec![b1, b2]))
    }

    #[test]
    fn column_spans_batches() -> TestResult {
        let table = sample_table()?;
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column(0)?.len(), 5);
        assert!(matches!(
            table.column(2),
            Err(TableError::ColumnOutOfRange { index: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn distinct_count_spans_batches_and_counts_null_once() -> TestResult {
        let table = sample_table()?;
        // 1, 2, 3, 4
        assert_eq!(table.distinct_count(0)?, 4);
        // "a", null, "b"
        assert_eq!(table.distinct_count(1)?, 3);
        Ok(())
    }

    #[test]
    fn distinct_count_all_equal_and_all_distinct() -> TestResult {
        let schema = Arc::new(Schema::new(vec![
            Field::new("same", DataType::Float64, false),
            Field::new("unique", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![2.5; 6])) as ArrayRef,
                Arc::new(Int32Array::from((0..6).collect::<Vec<i32>>())),
            ],
        )?;
        let table = Table::new(schema, vec![batch]);

        assert_eq!(table.distinct_count(0)?, 1);
        assert_eq!(table.distinct_count(1)?, 6);
        Ok(())
    }

    #[test]
    fn distinct_count_treats_every_nan_as_one_value() -> TestResult {
        let schema = Arc::new(Schema::new(vec![
            Field::new("wide", DataType::Float64, true),
            Field::new("narrow", DataType::Float32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![
                    Some(f64::NAN),
                    Some(f64::from_bits(0x7ff8_0000_0000_0001)),
                    Some(-f64::NAN),
                    Some(1.0),
                    None,
                ])) as ArrayRef,
                Arc::new(Float32Array::from(vec![
                    f32::NAN,
                    f32::from_bits(0x7fc0_0001),
                    0.5,
                    0.5,
                    f32::NAN,
                ])),
            ],
        )?;
        let table = Table::new(schema, vec![batch]);

        // NaN, 1.0, null
        assert_eq!(table.distinct_count(0)?, 3);
        assert_eq!(table.distinct_count(1)?, 2);
        Ok(())
    }

    #[test]
    fn empty_table_has_empty_columns() -> TestResult {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int32, true)]));
        let table = Table::new(schema, vec![]);

        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.column(0)?.len(), 0);
        assert_eq!(table.distinct_count(0)?, 0);
        Ok(())
    }

    #[test]
    fn parquet_and_ipc_encodings_load_back() -> TestResult {
        let table = sample_table()?;

        let pq = Table::from_parquet_bytes(
            Path::new("mem.parquet"),
            Bytes::from(table.to_parquet_bytes()?),
        )?;
        assert_eq!(pq.num_rows(), 5);
        assert_eq!(pq.column_names(), vec!["ID", "Name"]);
        assert!(!pq.schema().field(0).is_nullable());

        let ipc = Table::from_ipc_bytes(Path::new("mem.arrow"), Bytes::from(table.to_ipc_bytes()?))?;
        assert_eq!(ipc.num_rows(), 5);
        assert_eq!(ipc.schema(), table.schema());
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let junk = Bytes::from_static(b"definitely not a table");

        let err = Table::from_parquet_bytes(Path::new("bad.parquet"), junk.clone()).unwrap_err();
        assert!(matches!(err, TableError::MalformedParquet { .. }));

        let err = Table::from_ipc_bytes(Path::new("bad.arrow"), junk).unwrap_err();
        assert!(matches!(err, TableError::MalformedIpc { .. }));
    }
}
