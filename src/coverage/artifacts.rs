//! Report artifact locations and per-file coverage facts.
//!
//! Challenges must survive process restarts and workspace moves, so every
//! artifact path recorded here is workspace-relative and resolved against
//! the workspace of the build being evaluated, never against the workspace
//! that existed at creation time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::ReportConfig;
use crate::core::errors::Result;
use crate::coverage::report;
use crate::vcs::history::ChangedFileRecord;

/// Workspace-relative locations of the report artifacts for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifacts {
    /// Per-line source markup.
    pub source_markup: PathBuf,
    /// Per-method coverage table.
    pub method_table: PathBuf,
    /// Tabular per-class summary shared by the whole report.
    pub summary_csv: PathBuf,
}

impl ReportArtifacts {
    /// Derive artifact paths for a source file under the configured report
    /// root. The markup lives at
    /// `<root>/<package-as-path>/<FileName>.<ext>.html`, the method table
    /// next to it without the source extension.
    pub fn derive(
        reports: &ReportConfig,
        package: &str,
        file_name: &str,
        extension: &str,
    ) -> Self {
        let mut dir = reports.report_root.clone();
        if !package.is_empty() {
            dir = dir.join(package.replace('.', "/"));
        }
        Self {
            source_markup: dir.join(format!("{file_name}.{extension}.html")),
            method_table: dir.join(format!("{file_name}.html")),
            summary_csv: reports.summary_csv.clone(),
        }
    }

    /// Whether every required artifact exists under `workspace`.
    pub fn all_exist(&self, workspace: &Path) -> bool {
        workspace.join(&self.source_markup).is_file()
            && workspace.join(&self.method_table).is_file()
            && workspace.join(&self.summary_csv).is_file()
    }

    /// Absolute path of the source markup.
    pub fn source_markup_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.source_markup)
    }

    /// Absolute path of the method table.
    pub fn method_table_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.method_table)
    }

    /// Absolute path of the summary CSV.
    pub fn summary_csv_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.summary_csv)
    }
}

/// Serializable coverage facts about one source file, captured when a
/// challenge is generated and embedded in the challenge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    /// Dotted package of the file.
    pub package: String,
    /// File name without extension.
    pub file_name: String,
    /// Source file extension.
    pub extension: String,
    /// Workspace-relative path of the source file.
    pub path: PathBuf,
    /// Instruction-coverage ratio in [0, 1] at capture time.
    pub coverage: f64,
    /// Report artifact locations for the file.
    pub artifacts: ReportArtifacts,
    /// Ids of the identities that changed the file in the mined window.
    pub changed_by: Vec<String>,
}

impl FileFacts {
    /// Build facts for a mined source file, reading its coverage ratio
    /// from the summary under `workspace`.
    pub fn from_record(
        record: &ChangedFileRecord,
        workspace: &Path,
        reports: &ReportConfig,
    ) -> Result<Self> {
        let extension = record
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let artifacts =
            ReportArtifacts::derive(reports, &record.package, &record.file_name, &extension);

        let class_name = if record.package.is_empty() {
            record.file_name.clone()
        } else {
            format!("{}.{}", record.package, record.file_name)
        };
        let summary = artifacts.summary_csv_in(workspace);
        let coverage = if summary.is_file() {
            report::class_ratio_from_summary(&summary, &class_name)?
        } else {
            0.0
        };

        Ok(Self {
            package: record.package.clone(),
            file_name: record.file_name.clone(),
            extension,
            path: record.path.clone(),
            coverage,
            artifacts,
            changed_by: record.changed_by.iter().cloned().collect(),
        })
    }

    /// Fully qualified dotted class name.
    pub fn class_name(&self) -> String {
        if self.package.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}.{}", self.package, self.file_name)
        }
    }

    /// Re-read the current coverage ratio from the summary, falling back
    /// to the captured ratio when the summary is missing.
    pub fn current_coverage(&self, workspace: &Path) -> f64 {
        let summary = self.artifacts.summary_csv_in(workspace);
        if !summary.is_file() {
            return self.coverage;
        }
        report::class_ratio_from_summary(&summary, &self.class_name()).unwrap_or(self.coverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::history::FileKind;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn record() -> ChangedFileRecord {
        let mut changed_by = BTreeSet::new();
        changed_by.insert("u1".to_string());
        ChangedFileRecord {
            path: PathBuf::from("src/main/java/com/x/Foo.java"),
            file_name: "Foo".to_string(),
            package: "com.x".to_string(),
            kind: FileKind::Source,
            changed_by,
        }
    }

    #[test]
    fn artifact_paths_follow_package_layout() {
        let reports = ReportConfig::default();
        let artifacts = ReportArtifacts::derive(&reports, "com.x", "Foo", "java");
        assert_eq!(
            artifacts.source_markup,
            PathBuf::from("target/site/coverage/com/x/Foo.java.html")
        );
        assert_eq!(
            artifacts.method_table,
            PathBuf::from("target/site/coverage/com/x/Foo.html")
        );
    }

    #[test]
    fn default_package_stays_at_report_root() {
        let reports = ReportConfig::default();
        let artifacts = ReportArtifacts::derive(&reports, "", "Foo", "java");
        assert_eq!(
            artifacts.source_markup,
            PathBuf::from("target/site/coverage/Foo.java.html")
        );
    }

    #[test]
    fn facts_read_coverage_from_summary() {
        let dir = TempDir::new().unwrap();
        let reports = ReportConfig::default();
        let summary = dir.path().join(&reports.summary_csv);
        fs::create_dir_all(summary.parent().unwrap()).unwrap();
        fs::write(
            &summary,
            "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED\nproj,com.x,Foo,25,75\n",
        )
        .unwrap();

        let facts = FileFacts::from_record(&record(), dir.path(), &reports).unwrap();
        assert_eq!(facts.class_name(), "com.x.Foo");
        assert!((facts.coverage - 0.75).abs() < 1e-9);
        assert!(!facts.artifacts.all_exist(dir.path()));
    }

    #[test]
    fn missing_summary_degrades_to_zero_coverage() {
        let dir = TempDir::new().unwrap();
        let facts = FileFacts::from_record(&record(), dir.path(), &ReportConfig::default()).unwrap();
        assert_eq!(facts.coverage, 0.0);
        assert_eq!(facts.current_coverage(dir.path()), 0.0);
    }
}
