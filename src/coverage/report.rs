//! Coverage report parsing.
//!
//! Two read-only inputs produced by the coverage toolchain: per-file source
//! markup where every source line is a `span` element whose class encodes
//! the coverage status, and a per-class CSV summary with instruction
//! counters. The markup schema is owned by the report generator; this
//! module only reads it.
//!
//! A missing or unreadable report file is a normal condition (the report
//! may simply not have been generated yet) and surfaces as an error the
//! lifecycle layer maps to "not yet decidable".

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{CovquestError, Result};

/// Coverage status of one source line in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStatus {
    /// All instructions and branches on the line were executed.
    Full,
    /// Executed, but some branches were missed.
    Partial,
    /// Never executed.
    Missed,
}

impl LineStatus {
    /// Map the markup class attribute ("fc", "pc", "nc", possibly with
    /// extra classes appended) to a status.
    fn from_class(class: &str) -> Option<Self> {
        let first = class.split_whitespace().next()?;
        match first {
            "fc" => Some(Self::Full),
            "pc" => Some(Self::Partial),
            "nc" => Some(Self::Missed),
            _ => None,
        }
    }
}

/// One source line as rendered in the coverage markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLine {
    /// 1-based source line number.
    pub number: usize,
    /// Coverage status from the element class.
    pub status: LineStatus,
    /// Source text content of the line, trimmed.
    pub text: String,
    /// Optional "N of M branches missed." annotation.
    pub title: Option<String>,
}

/// Parsed per-file source markup.
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    /// Lines in document order. Only lines carrying a coverage class are
    /// present; plain markup lines are skipped.
    pub lines: Vec<SourceLine>,
}

impl SourceReport {
    /// Parse the markup file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|e| {
            CovquestError::io(format!("Failed to read coverage markup {}", path.display()), e)
        })?;
        let report = Self::from_bytes(&content, path)?;
        debug!(file = %path.display(), lines = report.lines.len(), "parsed coverage markup");
        Ok(report)
    }

    /// Parse markup from memory. `origin` is used for error context only.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);

        let mut lines = Vec::new();
        let mut current: Option<SourceLine> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(tag)) if tag.name().as_ref() == b"span" => {
                    current = span_line(&tag);
                }
                Ok(Event::Empty(tag)) if tag.name().as_ref() == b"span" => {
                    if let Some(line) = span_line(&tag) {
                        lines.push(line);
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(line) = current.as_mut() {
                        if let Ok(chunk) = text.unescape() {
                            line.text.push_str(&chunk);
                        }
                    }
                }
                Ok(Event::End(tag)) if tag.name().as_ref() == b"span" => {
                    if let Some(mut line) = current.take() {
                        line.text = line.text.trim().to_string();
                        lines.push(line);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(CovquestError::parse_in(
                        format!("Malformed coverage markup: {e}"),
                        origin.display().to_string(),
                    ));
                }
            }
            buf.clear();
        }

        Ok(Self { lines })
    }

    /// Lines with the given status.
    pub fn lines_with(&self, status: LineStatus) -> Vec<&SourceLine> {
        self.lines.iter().filter(|l| l.status == status).collect()
    }

    /// Lines not fully covered, in document order.
    pub fn uncovered_lines(&self) -> Vec<&SourceLine> {
        self.lines
            .iter()
            .filter(|l| l.status != LineStatus::Full)
            .collect()
    }

    /// The line with the given number, if rendered with a coverage class.
    pub fn line_at(&self, number: usize) -> Option<&SourceLine> {
        self.lines.iter().find(|l| l.number == number)
    }

    /// Count of lines with the given status.
    pub fn count(&self, status: LineStatus) -> usize {
        self.lines.iter().filter(|l| l.status == status).count()
    }
}

/// Build a [`SourceLine`] from a span start tag, if it carries a coverage
/// class and an id of the form `L<number>`.
fn span_line(tag: &BytesStart<'_>) -> Option<SourceLine> {
    let status = attribute_value(tag, b"class").and_then(|c| LineStatus::from_class(&c))?;
    let number = attribute_value(tag, b"id")
        .and_then(|id| id.strip_prefix('L').map(str::to_string))
        .and_then(|n| n.parse::<usize>().ok())?;
    let title = attribute_value(tag, b"title").filter(|t| !t.is_empty());
    Some(SourceLine {
        number,
        status,
        text: String::new(),
        title,
    })
}

/// One row of the per-file method table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEntry {
    /// Method name as rendered in the table.
    pub name: String,
    /// Total line count of the method.
    pub lines: usize,
    /// Lines of the method not yet covered.
    pub missed_lines: usize,
    /// First source line of the method, from the anchor href.
    pub first_line: Option<usize>,
}

impl MethodEntry {
    /// Whether every line of the method is covered.
    pub fn is_fully_covered(&self) -> bool {
        self.missed_lines == 0
    }
}

/// Parse the per-file method table markup at `path`.
///
/// Rows are `tr` elements; the cell with id prefix `a` holds an anchor
/// with the method name and a `#L<n>` href, `h` holds the missed line
/// count and `i` the total line count.
pub fn parse_method_table(path: &Path) -> Result<Vec<MethodEntry>> {
    let content = fs::read(path).map_err(|e| {
        CovquestError::io(format!("Failed to read method table {}", path.display()), e)
    })?;
    parse_method_table_bytes(&content, path)
}

fn parse_method_table_bytes(bytes: &[u8], origin: &Path) -> Result<Vec<MethodEntry>> {
    #[derive(Default)]
    struct Row {
        name: Option<String>,
        first_line: Option<usize>,
        missed_lines: Option<usize>,
        lines: Option<usize>,
    }

    enum Cell {
        Anchor,
        Missed,
        Lines,
        Other,
    }

    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut row: Option<Row> = None;
    let mut cell = Cell::Other;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => match tag.name().as_ref() {
                b"tr" => {
                    row = Some(Row::default());
                    cell = Cell::Other;
                }
                b"td" => {
                    cell = match attribute_value(&tag, b"id").as_deref() {
                        Some(id) if id.starts_with('a') => Cell::Anchor,
                        Some(id) if id.starts_with('h') => Cell::Missed,
                        Some(id) if id.starts_with('i') => Cell::Lines,
                        _ => Cell::Other,
                    };
                }
                b"a" => {
                    if let (Cell::Anchor, Some(row)) = (&cell, row.as_mut()) {
                        row.first_line = attribute_value(&tag, b"href")
                            .and_then(|href| href.strip_prefix("#L").map(str::to_string))
                            .and_then(|n| n.parse::<usize>().ok());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if let (Some(row), Ok(value)) = (row.as_mut(), text.unescape()) {
                    let value = value.trim().to_string();
                    match cell {
                        Cell::Anchor => row.name = Some(value),
                        Cell::Missed => row.missed_lines = value.parse().ok(),
                        Cell::Lines => row.lines = value.parse().ok(),
                        Cell::Other => {}
                    }
                }
            }
            Ok(Event::End(tag)) if tag.name().as_ref() == b"tr" => {
                if let Some(done) = row.take() {
                    if let (Some(name), Some(lines), Some(missed_lines)) =
                        (done.name, done.lines, done.missed_lines)
                    {
                        entries.push(MethodEntry {
                            name,
                            lines,
                            missed_lines,
                            first_line: done.first_line,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(CovquestError::parse_in(
                    format!("Malformed method table: {e}"),
                    origin.display().to_string(),
                ));
            }
        }
        buf.clear();
    }

    Ok(entries)
}

/// Instruction-coverage ratio of one class from the CSV summary.
///
/// The class column holds the bare class name; the dotted `class_name` is
/// matched by containment, as the summary never carries the package. Rows
/// whose counters fail to parse (the header row included) are skipped.
pub fn class_ratio_from_summary(path: &Path, class_name: &str) -> Result<f64> {
    let content = fs::read_to_string(path).map_err(|e| {
        CovquestError::io(format!("Failed to read coverage summary {}", path.display()), e)
    })?;

    for line in content.lines() {
        let entries: Vec<&str> = line.split(',').collect();
        if entries.len() < 5 {
            continue;
        }
        let (Ok(missed), Ok(covered)) =
            (entries[3].parse::<f64>(), entries[4].parse::<f64>())
        else {
            continue;
        };
        if !entries[2].is_empty() && class_name.contains(entries[2]) {
            if missed + covered == 0.0 {
                return Ok(0.0);
            }
            return Ok(covered / (missed + covered));
        }
    }

    Ok(0.0)
}

/// Instruction-coverage ratio over every class in the CSV summary.
pub fn project_ratio_from_summary(path: &Path) -> Result<f64> {
    let content = fs::read_to_string(path).map_err(|e| {
        CovquestError::io(format!("Failed to read coverage summary {}", path.display()), e)
    })?;

    let mut missed_total = 0.0;
    let mut covered_total = 0.0;
    for line in content.lines() {
        let entries: Vec<&str> = line.split(',').collect();
        if entries.len() < 5 {
            continue;
        }
        if let (Ok(missed), Ok(covered)) =
            (entries[3].parse::<f64>(), entries[4].parse::<f64>())
        {
            missed_total += missed;
            covered_total += covered;
        }
    }

    if missed_total + covered_total == 0.0 {
        return Ok(0.0);
    }
    Ok(covered_total / (missed_total + covered_total))
}

/// Branch counters of one line, decoded from its title annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchBaseline {
    /// Branches covered at the time of the snapshot.
    pub covered: usize,
    /// Total branches on the line.
    pub max: usize,
}

impl BranchBaseline {
    /// Decode the baseline from a line's status and title annotation.
    ///
    /// No annotation means the line carries a single implicit branch.
    /// A partially covered line's "N of M branches missed." yields
    /// covered = M - N; an all-missed annotation yields covered = 0.
    pub fn from_line(status: LineStatus, title: Option<&str>) -> Self {
        let Some(title) = title.filter(|t| !t.is_empty()) else {
            return Self { covered: 0, max: 1 };
        };
        let split: Vec<&str> = title.split(' ').collect();
        if status == LineStatus::Partial && split.len() >= 3 {
            let missed = split[0].parse::<usize>().unwrap_or(0);
            let max = split[2].parse::<usize>().unwrap_or(1);
            Self {
                covered: max.saturating_sub(missed),
                max,
            }
        } else {
            let max = split.get(1).and_then(|v| v.parse::<usize>().ok()).unwrap_or(1);
            Self { covered: 0, max }
        }
    }

    /// Branches covered on the relocated line now, if progress was made
    /// past this baseline.
    ///
    /// "All M branches missed." means regression, never progress. An
    /// absent annotation means the line is now fully covered.
    pub fn newly_covered(&self, title: Option<&str>) -> Option<usize> {
        let split: Vec<&str> = title.unwrap_or_default().split(' ').collect();
        if split.len() >= 4 && split[3] == "missed." {
            return None;
        }
        let covered_now = if split[0] == "All" || split[0].is_empty() {
            self.max
        } else {
            let missed = split[0].parse::<usize>().ok()?;
            self.max.saturating_sub(missed)
        };
        if covered_now > self.covered && covered_now <= self.max {
            Some(covered_now)
        } else {
            None
        }
    }
}

fn attribute_value(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| String::from_utf8(attr.value.into_owned()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MARKUP: &str = r#"<pre>
<span class="fc" id="L1">fn covered() {}</span>
<span class="nc" id="L2">fn missed() {}</span>
<span class="pc" id="L3" title="1 of 4 branches missed.">if a &amp;&amp; b {</span>
<span class="nc" id="L4" title="All 2 branches missed.">match x {</span>
</pre>"#;

    fn origin() -> PathBuf {
        PathBuf::from("Example.java.html")
    }

    #[test]
    fn markup_lines_are_parsed_with_status_and_title() {
        let report = SourceReport::from_bytes(MARKUP.as_bytes(), &origin()).unwrap();
        assert_eq!(report.lines.len(), 4);

        let covered = report.line_at(1).unwrap();
        assert_eq!(covered.status, LineStatus::Full);
        assert_eq!(covered.text, "fn covered() {}");
        assert!(covered.title.is_none());

        let partial = report.line_at(3).unwrap();
        assert_eq!(partial.status, LineStatus::Partial);
        assert_eq!(partial.text, "if a && b {");
        assert_eq!(partial.title.as_deref(), Some("1 of 4 branches missed."));

        assert_eq!(report.count(LineStatus::Missed), 2);
        assert_eq!(report.uncovered_lines().len(), 3);
    }

    #[test]
    fn spans_without_coverage_class_are_skipped() {
        let markup = r#"<pre><span class="keyword">fn</span><span class="fc" id="L9">x</span></pre>"#;
        let report = SourceReport::from_bytes(markup.as_bytes(), &origin()).unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].number, 9);
    }

    #[test]
    fn method_table_rows_are_parsed() {
        let table = r##"<table>
<tr><td id="a1"><a href="#L10">render</a></td><td id="h1">3</td><td id="i1">12</td></tr>
<tr><td id="a2"><a href="#L40">flush</a></td><td id="h2">0</td><td id="i2">5</td></tr>
</table>"##;
        let entries =
            parse_method_table_bytes(table.as_bytes(), &origin()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "render");
        assert_eq!(entries[0].missed_lines, 3);
        assert_eq!(entries[0].lines, 12);
        assert_eq!(entries[0].first_line, Some(10));
        assert!(!entries[0].is_fully_covered());
        assert!(entries[1].is_fully_covered());
    }

    #[test]
    fn summary_ratio_matches_class_by_containment() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = dir.path().join("summary.csv");
        std::fs::write(
            &csv,
            "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED\n\
             proj,com.x,Foo,20,80\n\
             proj,com.x,Bar,50,50\n",
        )
        .unwrap();

        let ratio = class_ratio_from_summary(&csv, "com.x.Foo").unwrap();
        assert!((ratio - 0.8).abs() < 1e-9);
        let project = project_ratio_from_summary(&csv).unwrap();
        assert!((project - 0.65).abs() < 1e-9);
        // Unknown class degrades to zero coverage.
        assert_eq!(class_ratio_from_summary(&csv, "com.x.Baz").unwrap(), 0.0);
    }

    #[test]
    fn branch_baseline_decoding() {
        assert_eq!(
            BranchBaseline::from_line(LineStatus::Missed, None),
            BranchBaseline { covered: 0, max: 1 }
        );
        assert_eq!(
            BranchBaseline::from_line(LineStatus::Partial, Some("1 of 4 branches missed.")),
            BranchBaseline { covered: 3, max: 4 }
        );
        assert_eq!(
            BranchBaseline::from_line(LineStatus::Missed, Some("All 2 branches missed.")),
            BranchBaseline { covered: 0, max: 2 }
        );
    }

    #[test]
    fn branch_progress_rules() {
        let baseline = BranchBaseline { covered: 1, max: 4 };
        // Fewer missed branches than at creation is progress.
        assert_eq!(baseline.newly_covered(Some("1 of 4 branches missed.")), Some(3));
        // Same count is not progress.
        assert_eq!(baseline.newly_covered(Some("3 of 4 branches missed.")), None);
        // All missed is a regression.
        assert_eq!(baseline.newly_covered(Some("All 4 branches missed.")), None);
        // No annotation means the line is now fully covered.
        assert_eq!(baseline.newly_covered(None), Some(4));
    }
}
