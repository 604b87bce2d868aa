//! Local filesystem helpers.
//!
//! Every read and write performed by the converter goes through this module.
//! Paths are always resolved against a [`DataDir`] root so callers deal in
//! file names rather than joined path strings.
//!
//! Files are loaded whole into memory and written with write-then-rename
//! semantics, so a failed write never leaves a half-written target behind.

use snafu::{Backtrace, IntoError, prelude::*};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A directory that conversions read from or write into.
#[derive(Clone, Debug)]
pub enum DataDir {
    /// A directory on the local filesystem.
    Local(PathBuf),
}

impl DataDir {
    /// Creates a new `DataDir` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        DataDir::Local(root.into())
    }

    /// The root path of this directory.
    pub fn root(&self) -> &Path {
        match self {
            DataDir::Local(root) => root,
        }
    }

    /// Resolve `rel` against the root.
    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        match self {
            DataDir::Local(root) => root.join(rel),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// An I/O error occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

fn map_io(e: io::Error, path: &Path) -> StorageError {
    let path = path.display().to_string();
    if e.kind() == io::ErrorKind::NotFound {
        NotFoundSnafu { path }.into_error(e)
    } else {
        OtherIoSnafu { path }.into_error(e)
    }
}

/// Create the root directory (and any missing parents).
///
/// Safe to call when the directory already exists.
pub async fn ensure_root(dir: &DataDir) -> StorageResult<()> {
    match dir {
        DataDir::Local(root) => fs::create_dir_all(root)
            .await
            .context(OtherIoSnafu {
                path: root.display().to_string(),
            }),
    }
}

/// List the names of regular files directly under `dir` accepted by `accept`.
///
/// Names are returned in directory-listing order. Anything rejected,
/// including subdirectories whose name would be accepted, is skipped without
/// error.
pub async fn list_files_matching<F>(dir: &DataDir, accept: F) -> StorageResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    match dir {
        DataDir::Local(root) => {
            let mut entries = fs::read_dir(root).await.map_err(|e| map_io(e, root))?;
            let mut out = Vec::new();

            while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(e, root))? {
                let name = entry.file_name();
                // Names that are not valid UTF-8 are never accepted.
                let Some(name) = name.to_str() else {
                    continue;
                };
                if !accept(name) {
                    continue;
                }

                // Follows symlinks, so a link to a regular file still counts.
                let path = entry.path();
                let meta = fs::metadata(&path).await.map_err(|e| map_io(e, &path))?;
                if meta.is_file() {
                    out.push(name.to_string());
                }
            }

            Ok(out)
        }
    }
}

/// Read the file at `rel_path` within `dir` and return its contents.
///
/// A missing file yields `StorageError::NotFound`; any other filesystem
/// problem yields `StorageError::OtherIo`.
pub async fn read_all_bytes(dir: &DataDir, rel_path: &Path) -> StorageResult<Vec<u8>> {
    let abs = dir.join(rel_path);
    fs::read(&abs).await.map_err(|e| map_io(e, &abs))
}

/// Guard that removes a temporary file on drop unless disarmed.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Call after a successful rename.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are already on an error path.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn temp_path_for(abs: &Path) -> PathBuf {
    let mut name = abs
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    abs.with_file_name(name)
}

async fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

/// Write `contents` to `rel_path` inside `dir` using write-then-rename.
///
/// The payload goes to a temporary sibling file, is synced, and then renamed
/// over the target. An existing target is replaced.
pub async fn write_atomic(dir: &DataDir, rel_path: &Path, contents: &[u8]) -> StorageResult<()> {
    let abs = dir.join(rel_path);
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)
            .await
            .context(OtherIoSnafu {
                path: parent.display().to_string(),
            })?;
    }

    let tmp_path = temp_path_for(&abs);
    let mut guard = TempFileGuard::new(tmp_path.clone());

    write_synced(&tmp_path, contents)
        .await
        .context(OtherIoSnafu {
            path: tmp_path.display().to_string(),
        })?;
    fs::rename(&tmp_path, &abs).await.context(OtherIoSnafu {
        path: abs.display().to_string(),
    })?;

    guard.disarm();
    Ok(())
}
