// SPDX-License-Identifier: PMPL-1.0-or-later

//! Serialization helpers for exported summaries

use crate::types::{Summary, Verdict};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportOutputFormat {
    Json,
    Yaml,
}

/// Document written to disk: the summary plus its verdict
#[derive(Debug, Serialize)]
struct ExportedReport<'a> {
    #[serde(flatten)]
    summary: &'a Summary,
    verdict: &'a Verdict,
}

impl ReportOutputFormat {
    /// Guess from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ReportOutputFormat::Yaml
            }
            _ => ReportOutputFormat::Json,
        }
    }

    pub fn serialize(&self, summary: &Summary, verdict: &Verdict) -> Result<String> {
        let report = ExportedReport { summary, verdict };
        match self {
            ReportOutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
            ReportOutputFormat::Yaml => Ok(serde_yaml::to_string(&report)?),
        }
    }
}

pub fn write_report(
    summary: &Summary,
    verdict: &Verdict,
    format: ReportOutputFormat,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = format.serialize(summary, verdict)?;
    fs::write(path, content).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}
