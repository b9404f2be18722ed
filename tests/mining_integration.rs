//! End-to-end history mining against a real temporary repository.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use covquest::core::config::MiningConfig;
use covquest::vcs::history::{self, FileKind, HistoryMiner};
use covquest::vcs::identity::Identity;

fn commit_file(
    repo: &Repository,
    workdir: &Path,
    rel_path: &str,
    content: &str,
    author: (&str, &str),
    message: &str,
) -> Oid {
    let full = workdir.join(rel_path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel_path)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now(author.0, author.1).unwrap();
    let parents: Vec<git2::Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

fn identities() -> Vec<Identity> {
    vec![
        Identity::new("u1", "Ada Lovelace", "ada@example.org").with_alias("ada"),
        Identity::new("u2", "Grace Hopper", "grace@example.org"),
    ]
}

/// Eight commits on master, two contributors, one unknown author.
fn seed_repository(dir: &Path) -> (Repository, Vec<Oid>) {
    let repo = Repository::init(dir).unwrap();
    let ada = ("ada", "ada@example.org");
    let grace = ("Grace Hopper", "grace@example.org");
    let nobody = ("drive-by", "x@y.z");

    let mut ids = Vec::new();
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/A.java", "a", ada, "add A"));
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/B.java", "b", ada, "add B"));
    ids.push(commit_file(&repo, dir, "src/test/java/com/x/ATest.java", "t", ada, "test A"));
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/C.java", "c", grace, "add C"));
    ids.push(commit_file(&repo, dir, "docs/notes.md", "n", ada, "notes"));
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/D.java", "d", nobody, "add D"));
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/A.java", "a2", grace, "touch A"));
    ids.push(commit_file(&repo, dir, "src/main/java/com/x/E.java", "e", ada, "add E"));
    (repo, ids)
}

#[test]
fn full_window_attributes_everything_reachable() {
    let dir = TempDir::new().unwrap();
    let (_repo, _ids) = seed_repository(dir.path());

    let miner = HistoryMiner::open(dir.path(), MiningConfig::default()).unwrap();
    let records = miner.mine("", &identities());

    let ada_files: Vec<&str> = history::records_of(&records, "u1")
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert!(ada_files.contains(&"A"));
    assert!(ada_files.contains(&"B"));
    assert!(ada_files.contains(&"ATest"));
    assert!(ada_files.contains(&"notes"));
    assert!(ada_files.contains(&"E"));

    // A was touched by both contributors and deduplicated into one record.
    let a_record = records
        .iter()
        .find(|r| r.file_name == "A" && r.kind == FileKind::Source)
        .unwrap();
    assert!(a_record.changed_by.contains("u1"));
    assert!(a_record.changed_by.contains("u2"));

    // The unknown author's file never appears.
    assert!(!records.iter().any(|r| r.file_name == "D"));

    // Classification per path.
    assert!(records
        .iter()
        .any(|r| r.file_name == "ATest" && r.kind == FileKind::Test));
    assert!(records
        .iter()
        .any(|r| r.file_name == "notes" && r.kind == FileKind::Other));
}

#[test]
fn mining_until_head_is_empty() {
    let dir = TempDir::new().unwrap();
    seed_repository(dir.path());

    let miner = HistoryMiner::open(dir.path(), MiningConfig::default()).unwrap();
    let head = miner.head_id().unwrap();
    assert!(miner.mine(&head, &identities()).is_empty());
}

#[test]
fn mining_until_a_commit_excludes_it_and_older_history() {
    let dir = TempDir::new().unwrap();
    let (_repo, ids) = seed_repository(dir.path());

    let miner = HistoryMiner::open(dir.path(), MiningConfig::default()).unwrap();
    // Stop at the "add C" commit: only the newer commits are mined.
    let records = miner.mine(&ids[3].to_string(), &identities());

    let names: Vec<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
    assert!(names.contains(&"notes"));
    assert!(names.contains(&"A")); // re-touched after the boundary
    assert!(names.contains(&"E"));
    assert!(!names.contains(&"B"));
    assert!(!names.contains(&"C"));
    assert!(!names.contains(&"ATest"));
}

#[test]
fn mining_is_deterministic() {
    let dir = TempDir::new().unwrap();
    seed_repository(dir.path());

    let miner = HistoryMiner::open(dir.path(), MiningConfig::default()).unwrap();
    let mut first = miner.mine("", &identities());
    let mut second = miner.mine("", &identities());
    first.sort_by(|a, b| a.path.cmp(&b.path));
    second.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(first, second);
}

#[test]
fn exhausted_budget_stops_the_walk() {
    let dir = TempDir::new().unwrap();
    seed_repository(dir.path());

    let mut config = MiningConfig::default();
    config.search_budget = 3;
    let miner = HistoryMiner::open(dir.path(), config).unwrap();
    let records = miner.mine("", &identities());

    // Only the newest commits fit in the budget; the repository root is
    // never reached.
    assert!(!records.iter().any(|r| r.file_name == "B"));
}
