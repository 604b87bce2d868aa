//! LaTeX table rows for the per-component line counts.

use std::{fmt, io::Write};

use snafu::ResultExt;

use crate::{
    cloc::{LanguageCounts, LineCounter},
    config::{Language, ReportConfig},
    error::{CodeStatsResult, WriteReportSnafu},
};

/// Running sums over the rows emitted so far, one per report language plus
/// the overall total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    per_language: Vec<u64>,
    overall: u64,
}

impl Totals {
    /// Zero sums for `languages` report columns.
    pub fn new(languages: usize) -> Self {
        Self {
            per_language: vec![0; languages],
            overall: 0,
        }
    }

    /// Fold one row into the sums. Missing cells add nothing.
    pub fn add(mut self, row: &ComponentRow) -> Self {
        for (sum, cell) in self.per_language.iter_mut().zip(&row.cells) {
            if let Some(code) = cell {
                *sum += code;
                self.overall += code;
            }
        }
        self
    }

    /// Sum per report column.
    pub fn per_language(&self) -> &[u64] {
        &self.per_language
    }

    /// Sum over every report column.
    pub fn overall(&self) -> u64 {
        self.overall
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r"$\Sigma$")?;
        for sum in &self.per_language {
            write!(f, " & {sum}")?;
        }
        write!(f, r" \\\bottomrule")
    }
}

/// One component's counts, in report-language order. `None` means the
/// counter found no code in that language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRow {
    /// Component name.
    pub name: String,
    /// One cell per report language.
    pub cells: Vec<Option<u64>>,
}

impl ComponentRow {
    /// Pick the report languages out of the counter's per-language counts.
    pub fn from_counts(name: &str, languages: &[Language], counts: &LanguageCounts) -> Self {
        Self {
            name: name.to_string(),
            cells: languages
                .iter()
                .map(|lang| counts.get(&lang.counter_name).copied())
                .collect(),
        }
    }
}

impl fmt::Display for ComponentRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name)?;
        for cell in &self.cells {
            match cell {
                Some(code) => write!(f, " & {code}")?,
                None => write!(f, " & -")?,
            }
        }
        write!(f, r" \\")
    }
}

/// The `Components & ... \\\toprule` heading line.
pub fn header_line(languages: &[Language]) -> String {
    let mut line = String::from("Components");
    for lang in languages {
        line.push_str(" & ");
        line.push_str(&lang.label);
    }
    line.push_str(r" \\\toprule");
    line
}

/// Separator between the component rows and the sum row.
pub const MIDRULE: &str = r" \midrule";

/// Count every component in `config` and write the table to `out`, one line
/// per row as soon as it is known. Returns the final sums.
pub fn write_report<C, W>(
    config: &ReportConfig,
    counter: &C,
    out: &mut W,
) -> CodeStatsResult<Totals>
where
    C: LineCounter + ?Sized,
    W: Write,
{
    writeln!(out, "{}", header_line(&config.languages)).context(WriteReportSnafu)?;

    let mut totals = Totals::new(config.languages.len());
    for component in &config.components {
        let counts = counter.count(component)?;
        let row = ComponentRow::from_counts(&component.name, &config.languages, &counts);
        log::debug!("{}: {:?}", component.name, row.cells);
        writeln!(out, "{row}").context(WriteReportSnafu)?;
        totals = totals.add(&row);
    }

    writeln!(out, "{MIDRULE}").context(WriteReportSnafu)?;
    writeln!(out, "{totals}").context(WriteReportSnafu)?;
    Ok(totals)
}
