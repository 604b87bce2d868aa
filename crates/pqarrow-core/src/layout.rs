//! Filename conventions for source, target and sidecar files.
//!
//! Output names are derived from the input file name alone, never from the
//! full path, so a directory whose name happens to contain an extension is
//! left untouched.

use std::fmt;

/// Extension of Arrow IPC files.
pub const ARROW_EXTENSION: &str = ".arrow";
/// Extension of Parquet files.
pub const PARQUET_EXTENSION: &str = ".parquet";
/// Suffix of the metadata sidecar written next to each Arrow file.
pub const SIDECAR_EXTENSION: &str = ".metadata.json";

/// The two on-disk table formats the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Arrow IPC file format.
    Arrow,
    /// Apache Parquet.
    Parquet,
}

impl FileKind {
    /// Extension (including the leading dot) used for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Arrow => ARROW_EXTENSION,
            FileKind::Parquet => PARQUET_EXTENSION,
        }
    }

    /// Whether `file_name` is a candidate input of this kind.
    ///
    /// Plain case-sensitive suffix test.
    pub fn matches(self, file_name: &str) -> bool {
        file_name.ends_with(self.extension())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Arrow => write!(f, "arrow"),
            FileKind::Parquet => write!(f, "parquet"),
        }
    }
}

fn stem_of(file_name: &str, kind: FileKind) -> &str {
    file_name
        .strip_suffix(kind.extension())
        .unwrap_or(file_name)
}

/// Name of the file produced from `file_name` when converting `from` → `to`.
///
/// Only the trailing extension is replaced: `orders.parquet` becomes
/// `orders.arrow`. A name without the `from` extension gets the `to`
/// extension appended.
pub fn target_file_name(file_name: &str, from: FileKind, to: FileKind) -> String {
    format!("{}{}", stem_of(file_name, from), to.extension())
}

/// Name of the metadata sidecar for the Arrow file `arrow_file_name`.
///
/// `orders.arrow` becomes `orders.metadata.json`.
pub fn sidecar_file_name(arrow_file_name: &str) -> String {
    format!(
        "{}{}",
        stem_of(arrow_file_name, FileKind::Arrow),
        SIDECAR_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parquet_to_arrow_names() {
        let arrow = target_file_name("orders.parquet", FileKind::Parquet, FileKind::Arrow);
        assert_eq!(arrow, "orders.arrow");
        assert_eq!(sidecar_file_name(&arrow), "orders.metadata.json");
    }

    #[test]
    fn arrow_to_parquet_names() {
        assert_eq!(
            target_file_name("orders.arrow", FileKind::Arrow, FileKind::Parquet),
            "orders.parquet"
        );
    }

    #[test]
    fn only_trailing_extension_is_replaced() {
        assert_eq!(
            target_file_name("a.arrow.backup.arrow", FileKind::Arrow, FileKind::Parquet),
            "a.arrow.backup.parquet"
        );
        assert_eq!(
            sidecar_file_name("lineorder.arrow"),
            "lineorder.metadata.json"
        );
    }

    #[test]
    fn matching_is_case_sensitive_suffix() {
        assert!(FileKind::Parquet.matches("t.parquet"));
        assert!(!FileKind::Parquet.matches("t.PARQUET"));
        assert!(!FileKind::Parquet.matches("t.parquet.bak"));
        assert!(FileKind::Arrow.matches("x.arrow"));
        assert!(!FileKind::Arrow.matches("x.metadata.json"));
    }
}
