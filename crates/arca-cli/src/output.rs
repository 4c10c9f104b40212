//! # Output
//!
//! Stdout carries only the requested output; diagnostics go through
//! `tracing` on stderr. In action mode outputs become `::set-output`
//! commands and errors become `::error::` annotations, with batches of
//! skipped entries folded into a `::group::`.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use arca_core::{ContentId, Resolution, SkipReport};
use arca_engine::SyncSummary;
use arca_metadata::{ArtifactDocument, ArtifactEntry, ArtifactProblem};

use crate::config::OutputFormat;

/// One resolved artifact as printed.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactOutput {
    pub slug: String,
    pub files: BTreeMap<String, ContentId>,
    /// The full descriptor, when read from the working tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<ArtifactEntry>,
}

/// Everything a run can print.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutput {
    pub artifacts: Vec<ArtifactOutput>,
    #[serde(skip)]
    pub cids: Vec<ContentId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<SyncSummary>,
}

impl RunOutput {
    pub fn new(
        resolution: &Resolution,
        documents: Vec<ArtifactDocument>,
        cids: Vec<ContentId>,
        destinations: Vec<SyncSummary>,
    ) -> Self {
        let mut entries: BTreeMap<String, ArtifactEntry> = documents
            .into_iter()
            .map(|doc| (doc.slug, doc.entry))
            .collect();
        let artifacts = resolution
            .artifacts
            .iter()
            .map(|state| ArtifactOutput {
                slug: state.slug().to_string(),
                files: state.files().clone(),
                entry: entries.remove(state.slug()),
            })
            .collect();
        Self {
            artifacts,
            cids,
            destinations,
        }
    }
}

/// Writes outputs and operator-facing errors in the selected style.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
    action: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, action: bool) -> Self {
        Self { format, action }
    }

    pub fn is_action(&self) -> bool {
        self.action
    }

    /// Stdout lines for `output`.
    pub fn render(&self, output: &RunOutput) -> Result<Vec<String>> {
        if self.action {
            let mut lines = vec![
                set_output("artifacts", &serde_json::to_string(output)?),
                set_output("cids", &serde_json::to_string(&output.cids)?),
            ];
            if !output.destinations.is_empty() {
                lines.push(set_output(
                    "summary",
                    &serde_json::to_string(&output.destinations)?,
                ));
            }
            return Ok(lines);
        }

        Ok(match self.format {
            OutputFormat::Artifacts => vec![serde_json::to_string_pretty(output)?],
            OutputFormat::Cids => vec![serde_json::to_string_pretty(&output.cids)?],
            OutputFormat::Summary => Vec::new(),
        })
    }

    pub fn emit(&self, output: &RunOutput) -> Result<()> {
        for line in self.render(output)? {
            println!("{line}");
        }
        Ok(())
    }

    /// Report a fatal error.
    pub fn error(&self, message: &str) {
        if self.action {
            println!("::error::{}", escape_data(message));
        } else {
            tracing::error!("{message}");
        }
    }

    /// Print a titled batch of lines.
    pub fn group(&self, title: &str, lines: &[String]) {
        if self.action {
            println!("::group::{title}");
            for line in lines {
                println!("{line}");
            }
            println!("::endgroup::");
        } else {
            eprintln!("{title}");
            for line in lines {
                eprintln!("  {line}");
            }
        }
    }

    pub fn report_skipped(&self, report: &SkipReport) {
        if report.is_empty() {
            return;
        }
        tracing::warn!(skipped = report.len(), "some entries were skipped");
        let lines: Vec<String> = report.entries().iter().map(ToString::to_string).collect();
        self.group(&format!("Skipped {} entries", report.len()), &lines);
    }

    pub fn report_problems(&self, problems: &[ArtifactProblem]) {
        let lines: Vec<String> = problems
            .iter()
            .map(|problem| problem.to_string().trim_end().to_string())
            .collect();
        self.group(&format!("{} invalid artifact files", problems.len()), &lines);
    }
}

fn set_output(name: &str, value: &str) -> String {
    format!("::set-output name={name}::{}", escape_data(value))
}

/// Escape a workflow command value so it stays on one line.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arca_core::ArtifactLatestState;

    const FILE: &str = "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy";

    fn sample() -> RunOutput {
        let id = ContentId::parse(FILE).unwrap();
        let resolution = Resolution {
            artifacts: vec![ArtifactLatestState::new("zine").with_file("zine.pdf", id)],
            skipped: SkipReport::new(),
        };
        RunOutput::new(&resolution, Vec::new(), vec![id], Vec::new())
    }

    #[test]
    fn summary_prints_nothing() {
        let reporter = Reporter::new(OutputFormat::Summary, false);
        assert!(reporter.render(&sample()).unwrap().is_empty());
    }

    #[test]
    fn cids_prints_pretty_array() {
        let reporter = Reporter::new(OutputFormat::Cids, false);
        let lines = reporter.render(&sample()).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed, vec![FILE.to_string()]);
        assert!(lines[0].contains('\n'));
    }

    #[test]
    fn artifacts_prints_resolved_files() {
        let reporter = Reporter::new(OutputFormat::Artifacts, false);
        let lines = reporter.render(&sample()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(json["artifacts"][0]["slug"], "zine");
        assert_eq!(json["artifacts"][0]["files"]["zine.pdf"], FILE);
        assert!(json["artifacts"][0].get("entry").is_none());
        assert!(json.get("destinations").is_none());
    }

    #[test]
    fn action_mode_sets_both_outputs_on_single_lines() {
        let reporter = Reporter::new(OutputFormat::Summary, true);
        let lines = reporter.render(&sample()).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("::set-output name=artifacts::{"));
        assert_eq!(lines[1], format!("::set-output name=cids::[\"{FILE}\"]"));
        assert!(lines.iter().all(|line| !line.contains('\n')));
    }

    #[test]
    fn escape_data_encodes_newlines_and_percent() {
        assert_eq!(escape_data("50%\nmore\r"), "50%25%0Amore%0D");
    }
}
