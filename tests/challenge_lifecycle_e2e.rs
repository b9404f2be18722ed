//! Lifecycle of a line-coverage challenge across changing reports.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use covquest::challenge::board::ChallengeBoard;
use covquest::challenge::context::EvalContext;
use covquest::challenge::line_coverage::LineCoverageChallenge;
use covquest::challenge::model::Challenge;
use covquest::core::config::CovquestConfig;
use covquest::coverage::artifacts::{FileFacts, ReportArtifacts};
use covquest::coverage::report::SourceReport;

const MARKUP_UNCOVERED: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="nc" id="L5">return x;</span>
<span class="nc" id="L6">cleanup();</span>
</pre>"#;

const MARKUP_COVERED: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="fc" id="L5">return x;</span>
<span class="nc" id="L6">cleanup();</span>
</pre>"#;

// The recorded line is gone; the only same-text element left is still
// explicitly missed elsewhere.
const MARKUP_TARGET_GONE: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="fc" id="L5">log(x);</span>
<span class="nc" id="L9">return x;</span>
</pre>"#;

const MARKUP_PARTIAL_BRANCHES: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="pc" id="L5" title="2 of 4 branches missed.">if cond {</span>
</pre>"#;

const MARKUP_BRANCHES_IMPROVED: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="pc" id="L5" title="1 of 4 branches missed.">if cond {</span>
</pre>"#;

// The recorded line moved down one; an unrelated copy far below is fully
// covered.
const MARKUP_NEAR_MISSED_FAR_COVERED: &str = r#"<pre>
<span class="fc" id="L4">fn setup() {}</span>
<span class="nc" id="L6">return x;</span>
<span class="fc" id="L50">return x;</span>
</pre>"#;

fn write_report(workspace: &Path, artifacts: &ReportArtifacts, markup: &str) {
    let markup_path = artifacts.source_markup_in(workspace);
    fs::create_dir_all(markup_path.parent().unwrap()).unwrap();
    fs::write(&markup_path, markup).unwrap();
    fs::write(
        artifacts.method_table_in(workspace),
        r##"<table><tr><td id="a1"><a href="#L4">setup</a></td><td id="h1">0</td><td id="i1">1</td></tr></table>"##,
    )
    .unwrap();
    fs::write(
        artifacts.summary_csv_in(workspace),
        "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED\nproj,com.x,Foo,40,60\n",
    )
    .unwrap();
}

fn facts(config: &CovquestConfig) -> FileFacts {
    FileFacts {
        package: "com.x".to_string(),
        file_name: "Foo".to_string(),
        extension: "java".to_string(),
        path: PathBuf::from("src/main/java/com/x/Foo.java"),
        coverage: 0.6,
        artifacts: ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java"),
        changed_by: vec!["u1".to_string()],
    }
}

fn eval_ctx<'a>(config: &'a CovquestConfig, workspace: &Path) -> EvalContext<'a> {
    EvalContext {
        branch: "master".to_string(),
        workspace: workspace.to_path_buf(),
        build_succeeded: true,
        config,
        identities: &[],
    }
}

fn challenge_on_line_five(config: &CovquestConfig, workspace: &Path) -> LineCoverageChallenge {
    let facts = facts(config);
    let markup = facts.artifacts.source_markup_in(workspace);
    let report = SourceReport::from_file(&markup).unwrap();
    let line = report.line_at(5).unwrap().clone();
    LineCoverageChallenge::new(facts, &line, "master")
}

#[test]
fn line_challenge_solves_when_the_exact_line_gets_covered() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();
    let artifacts = ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java");

    write_report(dir.path(), &artifacts, MARKUP_UNCOVERED);
    let mut challenge = challenge_on_line_five(&config, dir.path());
    let ctx = eval_ctx(&config, dir.path());

    assert!(challenge.is_solvable(&ctx));
    assert!(!challenge.is_solved(&ctx));

    write_report(dir.path(), &artifacts, MARKUP_COVERED);
    assert!(challenge.is_solved(&ctx));
    let stamp = challenge.solved;
    assert!(stamp.is_some());
    assert_eq!(challenge.solved_coverage, Some(0.6));

    // Idempotent: a second call must not re-stamp.
    assert!(challenge.is_solved(&ctx));
    assert_eq!(challenge.solved, stamp);
}

#[test]
fn line_challenge_stays_unsolved_when_only_a_missed_twin_remains() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();
    let artifacts = ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java");

    write_report(dir.path(), &artifacts, MARKUP_UNCOVERED);
    let mut challenge = challenge_on_line_five(&config, dir.path());
    let ctx = eval_ctx(&config, dir.path());

    write_report(dir.path(), &artifacts, MARKUP_TARGET_GONE);
    assert!(!challenge.is_solved(&ctx));
    // The same-text element at L9 is still uncovered, so the goal remains
    // reachable.
    assert!(challenge.is_solvable(&ctx));
}

#[test]
fn partially_covered_line_needs_real_branch_progress() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();
    let artifacts = ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java");

    write_report(dir.path(), &artifacts, MARKUP_PARTIAL_BRANCHES);
    let mut challenge = challenge_on_line_five(&config, dir.path());
    let ctx = eval_ctx(&config, dir.path());

    // Re-reading the unchanged report must not count as a solve.
    assert!(!challenge.is_solved(&ctx));
    assert!(challenge.solved.is_none());

    write_report(dir.path(), &artifacts, MARKUP_BRANCHES_IMPROVED);
    assert!(challenge.is_solved(&ctx));
}

#[test]
fn nearest_twin_decides_even_when_a_far_copy_is_covered() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();
    let artifacts = ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java");

    write_report(dir.path(), &artifacts, MARKUP_UNCOVERED);
    let mut challenge = challenge_on_line_five(&config, dir.path());
    let ctx = eval_ctx(&config, dir.path());

    // The nearest same-text element (one line down) is still missed; the
    // covered copy forty-five lines away must not stand in for it.
    write_report(dir.path(), &artifacts, MARKUP_NEAR_MISSED_FAR_COVERED);
    assert!(!challenge.is_solved(&ctx));
}

#[test]
fn missing_artifacts_mean_solvable_but_not_solved() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();

    write_report(
        dir.path(),
        &ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java"),
        MARKUP_UNCOVERED,
    );
    let mut challenge = challenge_on_line_five(&config, dir.path());

    // Evaluate in a bare workspace without any report.
    let empty = TempDir::new().unwrap();
    let ctx = eval_ctx(&config, empty.path());
    assert!(challenge.is_solvable(&ctx));
    assert!(!challenge.is_solved(&ctx));
}

#[test]
fn board_evaluation_awards_the_line_score() {
    let dir = TempDir::new().unwrap();
    let config = CovquestConfig::default();
    let artifacts = ReportArtifacts::derive(&config.reports, "com.x", "Foo", "java");

    write_report(dir.path(), &artifacts, MARKUP_UNCOVERED);
    let challenge = challenge_on_line_five(&config, dir.path());
    let expected_score = challenge.score();

    let mut board = ChallengeBoard::new();
    board.current.push(Challenge::Line(challenge));

    write_report(dir.path(), &artifacts, MARKUP_COVERED);
    let outcome = board.evaluate(&eval_ctx(&config, dir.path()));
    assert_eq!(outcome.solved, 1);
    assert_eq!(board.score, expected_score);
    assert!(board.current.is_empty());

    // The solved record survives persistence losslessly.
    let path = dir.path().join("board.json");
    board.to_json_file(&path).unwrap();
    assert_eq!(ChallengeBoard::from_json_file(&path).unwrap(), board);
}
