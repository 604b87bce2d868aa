//! Errors raised by the report.

use snafu::{Backtrace, Snafu};

/// Result type used throughout the crate.
pub type CodeStatsResult<T> = std::result::Result<T, CodeStatsError>;

/// Errors raised while loading a report configuration, counting lines, or
/// emitting the report.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodeStatsError {
    /// The config file could not be read.
    #[snafu(display("Failed to read report config {path}: {source}"))]
    ReadConfig {
        /// Config file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The config file is not a valid report config.
    #[snafu(display("Invalid report config {path}: {source}"))]
    ParseConfig {
        /// Config file path.
        path: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The counter program could not be started.
    #[snafu(display("Failed to run {program} for component '{component}': {source}"))]
    SpawnCounter {
        /// Program name.
        program: String,
        /// Component being counted.
        component: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The counter program exited unsuccessfully.
    #[snafu(display("{program} exited with {status} for component '{component}': {stderr}"))]
    CounterFailed {
        /// Program name.
        program: String,
        /// Component being counted.
        component: String,
        /// Exit status as printed by the OS.
        status: String,
        /// Trimmed standard error of the program.
        stderr: String,
    },

    /// The counter printed something other than line counts.
    #[snafu(display("Unreadable line counts for component '{component}': {source}"))]
    ParseCounts {
        /// Component being counted.
        component: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The report could not be written out.
    #[snafu(display("Failed to write report: {source}"))]
    WriteReport {
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
