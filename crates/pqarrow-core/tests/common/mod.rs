#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use arrow::{
    array::ArrayRef,
    datatypes::{Schema, SchemaRef},
    ipc::writer::FileWriter,
    record_batch::RecordBatch,
};
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn batch(schema: &SchemaRef, columns: Vec<ArrayRef>) -> TestResult<RecordBatch> {
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

pub fn write_parquet(path: &Path, schema: Schema, columns: Vec<ArrayRef>) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let schema = Arc::new(schema);
    let batch = batch(&schema, columns)?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub fn write_ipc(path: &Path, schema: Schema, columns: Vec<ArrayRef>) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let schema = Arc::new(schema);
    let batch = batch(&schema, columns)?;

    let file = std::fs::File::create(path)?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

pub fn read_ipc(path: &Path) -> TestResult<(SchemaRef, Vec<RecordBatch>)> {
    let file = std::fs::File::open(path)?;
    let reader = arrow::ipc::reader::FileReader::try_new(file, None)?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

pub fn read_parquet(path: &Path) -> TestResult<(SchemaRef, Vec<RecordBatch>)> {
    let file = std::fs::File::open(path)?;
    let reader =
        parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let schema = arrow::record_batch::RecordBatchReader::schema(&reader);
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

pub fn sorted_file_names(dir: &Path) -> TestResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}
