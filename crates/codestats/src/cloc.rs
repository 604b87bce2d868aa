//! Line counting through the external `cloc` program.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::PathBuf,
    process::Command,
};

use serde::Deserialize;
use snafu::{ResultExt, ensure};

use crate::{
    config::Component,
    error::{CodeStatsResult, CounterFailedSnafu, ParseCountsSnafu, SpawnCounterSnafu},
};

/// Lines of code per language name, as reported by the counter.
pub type LanguageCounts = BTreeMap<String, u64>;

/// Something that can count lines of code for one component.
pub trait LineCounter {
    /// Lines of code per language for everything `component` covers.
    fn count(&self, component: &Component) -> CodeStatsResult<LanguageCounts>;
}

/// [`LineCounter`] backed by `cloc --json`.
#[derive(Debug, Clone)]
pub struct ClocCounter {
    program: OsString,
    root: PathBuf,
    lang_defs: Option<PathBuf>,
}

impl ClocCounter {
    /// Count directories below `root` with the `cloc` found on `PATH`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            program: OsString::from("cloc"),
            root: root.into(),
            lang_defs: None,
        }
    }

    /// Use a language definition file (`--force-lang-def`), e.g. to teach
    /// cloc about TableGen.
    pub fn with_lang_defs(mut self, path: impl Into<PathBuf>) -> Self {
        self.lang_defs = Some(path.into());
        self
    }

    /// Run a different executable in place of `cloc`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the counter for `component`.
    pub fn command_args(&self, component: &Component) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("--json"),
            OsString::from("--exclude-lang=CMake"),
        ];
        if let Some(defs) = &self.lang_defs {
            let mut arg = OsString::from("--force-lang-def=");
            arg.push(defs.as_os_str());
            args.push(arg);
        }
        if !component.exclude.is_empty() {
            args.push(OsString::from(format!(
                "--exclude-dir={}",
                component.exclude.join(",")
            )));
        }
        for dir in &component.include {
            let path = self.root.join(dir);
            if !path.exists() {
                log::warn!(
                    "component '{}': {} does not exist",
                    component.name,
                    path.display()
                );
            }
            args.push(path.into_os_string());
        }
        args
    }
}

impl LineCounter for ClocCounter {
    fn count(&self, component: &Component) -> CodeStatsResult<LanguageCounts> {
        let program = self.program.to_string_lossy().to_string();
        let args = self.command_args(component);
        log::debug!("running {program} {args:?}");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .context(SpawnCounterSnafu {
                program: program.clone(),
                component: component.name.clone(),
            })?;

        ensure!(
            output.status.success(),
            CounterFailedSnafu {
                program,
                component: component.name.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
        );

        parse_cloc_output(&output.stdout).context(ParseCountsSnafu {
            component: component.name.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    code: u64,
}

/// Parse `cloc --json` output into code-line counts per language.
///
/// The `header` and `SUM` entries are dropped. cloc prints nothing when no
/// files were counted, so blank output yields an empty map.
pub fn parse_cloc_output(stdout: &[u8]) -> serde_json::Result<LanguageCounts> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(LanguageCounts::new());
    }

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(stdout)?;
    let mut counts = LanguageCounts::new();
    for (language, value) in raw {
        if language == "header" || language == "SUM" {
            continue;
        }
        let entry: LanguageEntry = serde_json::from_value(value)?;
        counts.insert(language, entry.code);
    }
    Ok(counts)
}
