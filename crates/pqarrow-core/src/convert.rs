//! Directory-level conversions between Parquet and Arrow IPC.
//!
//! Two operations are exposed:
//!
//! - [`convert_to_interchange`]: every `*.parquet` file in the source
//!   directory becomes a `*.arrow` file with lower-cased column names, plus a
//!   `*.metadata.json` sidecar describing its columns.
//! - [`convert_to_columnar`]: every `*.arrow` file becomes a `*.parquet`
//!   file, with fixed-size binary columns rewritten as UTF-8 strings. Names
//!   are kept as-is and no sidecar is written.
//!
//! Files are processed one at a time in directory-listing order. The first
//! failure aborts the run; outputs written for earlier files stay on disk.
//! The destination directory is created up front, even when nothing in the
//! source directory matches.

use std::{collections::HashSet, fmt, path::Path};

use bytes::Bytes;
use log::{debug, info, warn};
use snafu::{IntoError, prelude::*};

use crate::{
    layout::{self, FileKind},
    schema_transform::{ColumnRule, SchemaTransform, TransformError},
    sidecar::{MetadataSidecar, SidecarError},
    storage::{self, DataDir, StorageError},
    table::{Table, TableError},
};

/// Errors that abort a conversion run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConvertError {
    /// The destination directory could not be created.
    #[snafu(display("Failed to create destination directory {path}: {source}"))]
    CreateDestination {
        /// Destination directory.
        path: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// The source directory could not be listed.
    #[snafu(display("Failed to list source directory {path}: {source}"))]
    ListSource {
        /// Source directory.
        path: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// A candidate source file could not be read.
    #[snafu(display("Failed to read {file}: {source}"))]
    ReadSource {
        /// Source file name.
        file: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// A candidate source file could not be parsed.
    #[snafu(display("Failed to load {file}: {source}"))]
    MalformedFile {
        /// Source file name.
        file: String,
        /// Underlying decode error.
        source: TableError,
    },

    /// A column has a type outside the metadata vocabulary.
    #[snafu(display("Failed to describe {file}: {source}"))]
    UnsupportedType {
        /// Source file name.
        file: String,
        /// Underlying sidecar error naming the column.
        source: SidecarError,
    },

    /// Rewriting the table to its target schema failed.
    #[snafu(display("Failed to rewrite {file}: {source}"))]
    Materialize {
        /// Source file name.
        file: String,
        /// Underlying transform error.
        source: TransformError,
    },

    /// Encoding the target file failed.
    #[snafu(display("Failed to encode {file}: {source}"))]
    EncodeTarget {
        /// Target file name.
        file: String,
        /// Underlying encode error.
        source: TableError,
    },

    /// Deriving or encoding the sidecar failed for a reason other than an
    /// unsupported column type.
    #[snafu(display("Failed to build metadata for {file}: {source}"))]
    Sidecar {
        /// Source file name.
        file: String,
        /// Underlying sidecar error.
        source: SidecarError,
    },

    /// Writing an output file failed.
    #[snafu(display("Failed to write {file}: {source}"))]
    WriteTarget {
        /// Output file name.
        file: String,
        /// Underlying storage error.
        source: StorageError,
    },
}

/// One converted source file and the outputs written for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    /// Source file name.
    pub source: String,
    /// Target file name in the destination directory.
    pub target: String,
    /// Sidecar file name, when one was written.
    pub sidecar: Option<String>,
}

impl fmt::Display for ConvertedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converted {} to {}", self.source, self.target)?;
        if self.sidecar.is_some() {
            write!(f, " with metadata")?;
        }
        Ok(())
    }
}

/// Everything a completed run converted, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Converted files.
    pub files: Vec<ConvertedFile>,
}

impl ConversionReport {
    /// Number of converted files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was converted.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

async fn prepare(
    source: &DataDir,
    dest: &DataDir,
    kind: FileKind,
) -> Result<Vec<String>, ConvertError> {
    storage::ensure_root(dest)
        .await
        .context(CreateDestinationSnafu {
            path: dest.root().display().to_string(),
        })?;

    let names = storage::list_files_matching(source, |name| kind.matches(name))
        .await
        .context(ListSourceSnafu {
            path: source.root().display().to_string(),
        })?;

    debug!(
        "found {} {kind} file(s) in {}",
        names.len(),
        source.root().display()
    );
    Ok(names)
}

async fn load(source: &DataDir, name: &str, kind: FileKind) -> Result<Table, ConvertError> {
    let rel = Path::new(name);
    let bytes = storage::read_all_bytes(source, rel)
        .await
        .context(ReadSourceSnafu { file: name })?;
    let bytes = Bytes::from(bytes);

    let abs = source.join(rel);
    let table = match kind {
        FileKind::Parquet => Table::from_parquet_bytes(&abs, bytes),
        FileKind::Arrow => Table::from_ipc_bytes(&abs, bytes),
    }
    .context(MalformedFileSnafu { file: name })?;

    debug!(
        "loaded {name}: {} rows, {} columns",
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

async fn write(dest: &DataDir, name: &str, contents: &[u8]) -> Result<(), ConvertError> {
    storage::write_atomic(dest, Path::new(name), contents)
        .await
        .context(WriteTargetSnafu { file: name })?;
    debug!("wrote {} ({} bytes)", dest.join(name).display(), contents.len());
    Ok(())
}

fn warn_on_name_collisions(file: &str, table: &Table) {
    let mut seen = HashSet::new();
    for name in table.column_names() {
        if !seen.insert(name.clone()) {
            warn!("{file}: column name {name:?} appears more than once after lower-casing");
        }
    }
}

fn sidecar_error(file: &str, source: SidecarError) -> ConvertError {
    match source {
        SidecarError::UnsupportedType { .. } => {
            UnsupportedTypeSnafu { file }.into_error(source)
        }
        _ => SidecarSnafu { file }.into_error(source),
    }
}

/// Convert every Arrow IPC file in `source` to a Parquet file in `dest`.
///
/// Fixed-size binary columns are rewritten to UTF-8 strings; every other
/// column passes through unchanged, names included. `on_converted` is called
/// once per file, right after its output has been written.
pub async fn convert_to_columnar<F>(
    source: &DataDir,
    dest: &DataDir,
    mut on_converted: F,
) -> Result<ConversionReport, ConvertError>
where
    F: FnMut(&ConvertedFile),
{
    let names = prepare(source, dest, FileKind::Arrow).await?;
    let transform = SchemaTransform::new([ColumnRule::FixedBinaryAsUtf8]);
    let mut report = ConversionReport::default();

    for name in names {
        let table = load(source, &name, FileKind::Arrow).await?;
        let table = transform
            .run(&table)
            .context(MaterializeSnafu { file: name.as_str() })?;

        let target = layout::target_file_name(&name, FileKind::Arrow, FileKind::Parquet);
        let bytes = table
            .to_parquet_bytes()
            .context(EncodeTargetSnafu { file: target.as_str() })?;
        write(dest, &target, &bytes).await?;

        let converted = ConvertedFile {
            source: name,
            target,
            sidecar: None,
        };
        info!("{converted}");
        on_converted(&converted);
        report.files.push(converted);
    }

    Ok(report)
}

/// Convert every Parquet file in `source` to an Arrow IPC file in `dest`,
/// writing a metadata sidecar next to each.
///
/// Column names are lower-cased before anything is written, so both the
/// Arrow schema and the sidecar carry the renamed columns. `on_converted` is
/// called once per file, after both outputs have been written.
pub async fn convert_to_interchange<F>(
    source: &DataDir,
    dest: &DataDir,
    mut on_converted: F,
) -> Result<ConversionReport, ConvertError>
where
    F: FnMut(&ConvertedFile),
{
    let names = prepare(source, dest, FileKind::Parquet).await?;
    let transform = SchemaTransform::new([ColumnRule::LowercaseName]);
    let mut report = ConversionReport::default();

    for name in names {
        let table = load(source, &name, FileKind::Parquet).await?;
        let table = transform
            .run(&table)
            .context(MaterializeSnafu { file: name.as_str() })?;
        warn_on_name_collisions(&name, &table);

        let target = layout::target_file_name(&name, FileKind::Parquet, FileKind::Arrow);
        let bytes = table
            .to_ipc_bytes()
            .context(EncodeTargetSnafu { file: target.as_str() })?;
        write(dest, &target, &bytes).await?;

        let sidecar_name = layout::sidecar_file_name(&target);
        let sidecar = MetadataSidecar::from_table(&table).map_err(|e| sidecar_error(&name, e))?;
        let json = sidecar
            .to_json_bytes()
            .map_err(|e| sidecar_error(&name, e))?;
        write(dest, &sidecar_name, &json).await?;

        let converted = ConvertedFile {
            source: name,
            target,
            sidecar: Some(sidecar_name),
        };
        info!("{converted}");
        on_converted(&converted);
        report.files.push(converted);
    }

    Ok(report)
}
