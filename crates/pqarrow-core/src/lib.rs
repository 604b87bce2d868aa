//! Core library for converting directories of Parquet files to Arrow IPC
//! files (and back).
//!
//! The crate is organised around a small pipeline:
//!
//! - Directory scan and whole-file I/O over the local filesystem
//!   (`storage` module), with filename conventions kept in one place
//!   (`layout` module).
//! - Loading a file into an in-memory [`table::Table`] and serialising it
//!   back out as Parquet or Arrow IPC (`table` module).
//! - A closed mapping from Arrow physical types to the small metadata
//!   vocabulary used by sidecars (`column_type` module).
//! - Explicit schema rewrites followed by a single materialisation step
//!   (`schema_transform` module).
//! - The per-file JSON metadata sidecar (`sidecar` module).
//! - The two directory-level operations tying it all together
//!   (`convert` module).
#![deny(missing_docs)]
pub mod column_type;
pub mod convert;
pub mod layout;
pub mod schema_transform;
pub mod sidecar;
pub mod storage;
pub mod table;

pub use column_type::{BaseKind, ColumnDescriptor, PhysicalType, TypeDescriptor};
pub use convert::{
    ConversionReport, ConvertError, ConvertedFile, convert_to_columnar, convert_to_interchange,
};
pub use layout::FileKind;
pub use sidecar::MetadataSidecar;
pub use storage::DataDir;
pub use table::Table;
