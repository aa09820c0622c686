//! Integration test: mine → aggregate → finalize on a scratch repository.

use std::path::Path;

use evolens_core::{EvolensConfig, OutputFormat};
use evolens_history::content::{BranchTip, WorkingCopy};
use evolens_history::mining::{mine_history, MiningOptions};
use evolens_metrics::pipeline::{analyze, AnalysisSettings};
use evolens_metrics::report::{format_report, ReportOptions};
use evolens_metrics::sloc::SlocStatus;
use git2::{Repository, Signature, Time};

fn commit(repo: &Repository, root: &Path, message: &str, time: i64, files: &[(&str, Option<&str>)]) {
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        let full = root.join(path);
        match content {
            Some(text) => {
                std::fs::create_dir_all(full.parent().unwrap()).unwrap();
                std::fs::write(&full, text).unwrap();
                index.add_path(Path::new(path)).unwrap();
            }
            None => {
                std::fs::remove_file(&full).unwrap();
                index.remove_path(Path::new(path)).unwrap();
            }
        }
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("alice", "alice@example.com", &Time::new(time, 0)).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn lines(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}_{i}();\n")).collect()
}

#[test]
fn end_to_end_on_scratch_repo() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    // 50 lines created, then 10 added / 5 deleted: creation 50, refactoring 15.
    let v1 = lines("a", 50);
    let mut v2: Vec<String> = v1.lines().skip(5).map(|l| format!("{l}\n")).collect();
    v2.extend((0..10).map(|i| format!("b_{i}();\n")));
    let v2: String = v2.concat();

    commit(&repo, root, "feat: add controller", 1_000, &[("src/ctrl.c", Some(&v1))]);
    commit(&repo, root, "Fix critical bug in driver", 2_000, &[("src/ctrl.c", Some(&v2))]);
    commit(
        &repo,
        root,
        "docs: notes",
        3_000,
        &[("NOTES.md", Some("hello\n")), ("src/tmp.h", Some("int t;\n"))],
    );
    commit(&repo, root, "cleanup", 4_000, &[("src/tmp.h", None)]);

    let commits = mine_history(root, &MiningOptions::default()).unwrap();
    assert_eq!(commits.len(), 4);

    let settings = AnalysisSettings::from_config(&EvolensConfig::default()).unwrap();
    let report = analyze(&commits, settings, &WorkingCopy::new(root));

    assert_eq!(report.commits_analyzed, 4);
    assert_eq!(report.commit_counts.get("feat"), 1);
    assert_eq!(report.commit_counts.get("fix"), 1);
    assert_eq!(report.commit_counts.get("docs"), 1);
    assert_eq!(report.commit_counts.get("other"), 1);

    let ctrl = report.files.iter().find(|f| f.path == "src/ctrl.c").unwrap();
    assert_eq!(ctrl.creation_churn, 50);
    assert_eq!(ctrl.refactoring_churn, 15);
    assert_eq!(ctrl.sloc, 55);
    assert_eq!(ctrl.ratio, 15.0 / 55.0);

    // Created then deleted: tracked, absent at the end, churn kept.
    let tmp = report.files.iter().find(|f| f.path == "src/tmp.h").unwrap();
    assert_eq!(tmp.creation_churn, 1);
    assert_eq!(tmp.sloc_status, SlocStatus::Absent);
    assert_eq!(tmp.ratio, 0.0);

    assert!(report.files.iter().all(|f| f.path != "NOTES.md"));

    let cumulative: Vec<u64> = report.cumulative_churn.iter().map(|p| p.cumulative).collect();
    assert_eq!(cumulative, vec![0, 15, 15, 15]);

    let text = format_report(&report, OutputFormat::Text, &ReportOptions::default()).unwrap();
    assert!(text.contains("src/ctrl.c"));
}

#[test]
fn branch_tip_matches_working_copy_on_clean_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();
    commit(&repo, root, "init", 1_000, &[("a.c", Some("/* hdr */\nint a;\nint b;\n"))]);
    commit(&repo, root, "refactor a", 2_000, &[("a.c", Some("int a;\nint c;\n"))]);

    let commits = mine_history(root, &MiningOptions::default()).unwrap();
    let config = EvolensConfig::default();

    let from_disk = analyze(
        &commits,
        AnalysisSettings::from_config(&config).unwrap(),
        &WorkingCopy::new(root),
    );
    let from_tree = analyze(
        &commits,
        AnalysisSettings::from_config(&config).unwrap(),
        &BranchTip::open(root, None).unwrap(),
    );

    assert_eq!(from_disk, from_tree);
    assert_eq!(from_disk.files[0].sloc, 2);
    assert_eq!(from_disk.commit_counts.get("refactor"), 1);
}
