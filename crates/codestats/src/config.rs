//! Which languages become report columns and which directories make up each
//! component.

use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{CodeStatsResult, ParseConfigSnafu, ReadConfigSnafu};

/// A report column: the language name as the counter reports it, and the
/// heading printed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language name in the counter's output, e.g. `C/C++ Header`.
    pub counter_name: String,
    /// Column heading.
    pub label: String,
}

impl Language {
    /// Map `counter_name` to the column headed `label`.
    pub fn new(counter_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            counter_name: counter_name.into(),
            label: label.into(),
        }
    }
}

/// A report row: directories (relative to the source root) counted together,
/// minus any directory whose name appears in `exclude`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Row label; may contain LaTeX.
    pub name: String,
    /// Directories to count, relative to the source root.
    #[serde(default)]
    pub include: Vec<String>,
    /// Directory names skipped anywhere below `include`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Component {
    /// Build a component from its name and directory lists.
    pub fn new<I, E>(name: impl Into<String>, include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            name: name.into(),
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }
}

/// Columns and rows of the report. The default is the built-in layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report columns, in order.
    pub languages: Vec<Language>,
    /// Report rows, in order.
    pub components: Vec<Component>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let none: [&str; 0] = [];
        Self {
            languages: vec![
                Language::new("C/C++ Header", "Headers"),
                Language::new("C++", "C++"),
                Language::new("TableGen", "TableGen"),
            ],
            components: vec![
                Component::new("Runtime", ["include/runtime", "lib/runtime"], none),
                Component::new("JIT", ["include/runner", "lib/runner"], none),
                Component::new(
                    "util Dialect",
                    ["include/mlir/Dialect/util", "lib/util"],
                    none,
                ),
                Component::new("db Dialect", ["include/mlir/Dialect/DB", "lib/DB"], none),
                Component::new(
                    "relalg Dialect",
                    ["include/mlir/Dialect/RelAlg", "lib/RelAlg"],
                    ["Transforms"],
                ),
                Component::new(
                    "Query Opt.",
                    [
                        "include/mlir/Dialect/RelAlg/Transforms",
                        "lib/RelAlg/Transforms",
                    ],
                    none,
                ),
                Component::new(
                    r"relalg $\Rightarrow$ DB",
                    [
                        "include/mlir/Conversion/RelAlgToDB",
                        "lib/Conversion/RelAlgToDB",
                    ],
                    none,
                ),
                Component::new(
                    r"relalg $\Rightarrow$ std",
                    [
                        "include/mlir/Conversion/DBToArrowStd",
                        "lib/Conversion/DBToArrowStd",
                    ],
                    none,
                ),
            ],
        }
    }
}

impl ReportConfig {
    /// Load a configuration from a JSON file, replacing the built-in default
    /// entirely.
    pub fn load(path: &Path) -> CodeStatsResult<Self> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).context(ReadConfigSnafu {
            path: display.clone(),
        })?;
        serde_json::from_slice(&bytes).context(ParseConfigSnafu { path: display })
    }
}
