//! Per-component source line counts, printed as LaTeX table rows.
//!
//! Each component is a set of directories counted together by a
//! [`LineCounter`] (normally `cloc`). The report prints one row per component
//! and a final row of per-language sums.
#![deny(missing_docs)]

pub mod cloc;
pub mod config;
pub mod error;
pub mod report;

pub use cloc::{ClocCounter, LanguageCounts, LineCounter, parse_cloc_output};
pub use config::{Component, Language, ReportConfig};
pub use error::{CodeStatsError, CodeStatsResult};
pub use report::{ComponentRow, Totals, write_report};
