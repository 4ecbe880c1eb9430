//! Integration tests against real Git repositories built with the `git` CLI,
//! plus end-to-end runs of the `gitk-graph` binary.

use std::path::PathBuf;
use std::rc::Rc;

use gitk_graph::git::GitRepository;
use gitk_graph::graph::{EdgeKind, LinearGraph};
use gitk_graph::state::GraphView;
use tempfile::TempDir;

/// Test utilities for repository-backed tests
mod test_utils {
    use super::*;
    use std::process::Command;

    /// Create a temporary Git repository for testing
    pub fn create_test_repo() -> anyhow::Result<(TempDir, PathBuf)> {
        let temp_dir = TempDir::new()?;
        let repo_path = temp_dir.path().to_path_buf();

        Command::new("git")
            .args(["init", "-b", "main"])
            .current_dir(&repo_path)
            .output()?;

        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(&repo_path)
            .output()?;

        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(&repo_path)
            .output()?;

        Ok((temp_dir, repo_path))
    }

    /// Create a test commit in the repository
    pub fn create_test_commit(repo_path: &std::path::Path, message: &str) -> anyhow::Result<()> {
        create_test_commit_in_file(repo_path, "test.txt", message)
    }

    /// Create a test commit touching a specific file (distinct files keep
    /// branch merges conflict-free)
    pub fn create_test_commit_in_file(
        repo_path: &std::path::Path,
        file: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        let test_file = repo_path.join(file);
        std::fs::write(&test_file, format!("Test content for {}", message))?;

        Command::new("git")
            .args(["add", file])
            .current_dir(repo_path)
            .output()?;

        Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(repo_path)
            .output()?;

        Ok(())
    }

    /// Create a repository with a merge: main forks into feature/test and
    /// merges it back.
    pub fn create_complex_test_repo() -> anyhow::Result<(TempDir, PathBuf)> {
        let (temp_dir, repo_path) = create_test_repo()?;

        create_test_commit(&repo_path, "Initial commit")?;

        Command::new("git")
            .args(["checkout", "-b", "feature/test"])
            .current_dir(&repo_path)
            .output()?;

        create_test_commit_in_file(&repo_path, "feature.txt", "Add feature functionality")?;
        create_test_commit_in_file(&repo_path, "feature.txt", "Fix feature bug")?;

        Command::new("git")
            .args(["checkout", "main"])
            .current_dir(&repo_path)
            .output()?;

        create_test_commit_in_file(&repo_path, "main.txt", "Main branch update")?;

        Command::new("git")
            .args(["merge", "feature/test", "--no-ff", "-m", "Merge feature branch"])
            .current_dir(&repo_path)
            .output()?;

        Ok((temp_dir, repo_path))
    }

    /// A long linear history on a single branch.
    pub fn create_linear_test_repo(commits: usize) -> anyhow::Result<(TempDir, PathBuf)> {
        let (temp_dir, repo_path) = create_test_repo()?;
        for i in 0..commits {
            create_test_commit(&repo_path, &format!("Commit {}", i))?;
        }
        Ok((temp_dir, repo_path))
    }
}

mod graph_loading {
    use super::test_utils::*;
    use super::*;

    #[test]
    fn loads_every_commit_of_a_linear_history() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_linear_test_repo(5)?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = repo.load_graph(None)?;
        assert_eq!(permanent.node_count(), 5);

        // Children-first: every edge points to a higher index.
        let graph = permanent.linear_graph();
        for index in 0..graph.node_count() {
            for down in graph.down_nodes(index) {
                assert!(down > index);
            }
        }
        Ok(())
    }

    #[test]
    fn merge_history_produces_a_fork_and_a_join() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_complex_test_repo()?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = repo.load_graph(None)?;
        // Initial + 2 feature + 1 main + merge = 5 commits.
        assert_eq!(permanent.node_count(), 5);

        let graph = permanent.linear_graph();
        // The merge commit sits at the top and has two parents.
        assert_eq!(graph.down_nodes(0).len(), 2);
        let merge = permanent.commit_info(0).expect("metadata is attached");
        assert!(merge.is_merge());
        assert_eq!(merge.summary, "Merge feature branch");
        Ok(())
    }

    #[test]
    fn commit_limit_truncates_with_dotted_boundary_edges() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_linear_test_repo(6)?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = repo.load_graph(Some(3))?;
        assert_eq!(permanent.node_count(), 3);

        // The oldest loaded commit still references its unloaded parent.
        let graph = permanent.linear_graph();
        let boundary = graph.adjacent_edges(2, gitk_graph::graph::EdgeFilter::Down);
        assert_eq!(boundary.len(), 1);
        assert_eq!(boundary[0].kind, EdgeKind::NotLoaded);
        assert!(boundary[0].down.is_none());
        Ok(())
    }

    #[test]
    fn branch_heads_resolve_to_graph_ids() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_complex_test_repo()?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = repo.load_graph(None)?;

        let heads = repo.branch_heads()?;
        let names: Vec<&str> = heads.iter().map(|(name, _)| name.as_str()).collect();
        assert!(names.contains(&"main"));
        assert!(names.contains(&"feature/test"));

        let ids = repo.visible_branch_ids(&permanent, None)?;
        assert_eq!(ids.len(), 2);

        let feature_only = repo.visible_branch_ids(
            &permanent,
            Some(&regex::Regex::new("^feature/").unwrap()),
        )?;
        assert_eq!(feature_only.len(), 1);

        let main_head = repo.head_id_for_branch(&permanent, "main")?;
        assert!(main_head.is_some());
        assert!(repo.head_id_for_branch(&permanent, "bad..name").is_err());
        Ok(())
    }
}

mod view_over_repository {
    use super::test_utils::*;
    use super::*;

    #[test]
    fn collapsing_a_linear_history_leaves_two_rows() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_linear_test_repo(6)?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = Rc::new(repo.load_graph(None)?);
        let mut view = GraphView::new(permanent, None);
        assert_eq!(view.row_count(), 6);

        assert!(view.collapse_linear_branches());
        assert_eq!(view.row_count(), 2);
        let rows = view.visible_rows();
        assert_eq!(rows[0].down_edges[0].kind, EdgeKind::Dotted);
        // Newest and oldest commits remain, metadata intact.
        assert_eq!(rows[0].summary.as_deref(), Some("Commit 5"));
        assert_eq!(rows[1].summary.as_deref(), Some("Commit 0"));

        assert!(view.click_edge(0, 1));
        assert_eq!(view.row_count(), 6);
        Ok(())
    }

    #[test]
    fn branch_filter_hides_the_unmerged_side() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_test_repo()?;
        create_test_commit(&repo_path, "Initial commit")?;

        // A side branch main never merged.
        std::process::Command::new("git")
            .args(["checkout", "-b", "feature/orphan"])
            .current_dir(&repo_path)
            .output()?;
        create_test_commit(&repo_path, "Orphan work")?;
        std::process::Command::new("git")
            .args(["checkout", "main"])
            .current_dir(&repo_path)
            .output()?;
        create_test_commit(&repo_path, "Main work")?;

        let repo = GitRepository::discover(&repo_path)?;
        let permanent = Rc::new(repo.load_graph(None)?);
        assert_eq!(permanent.node_count(), 3);

        let main_only = repo.visible_branch_ids(
            &permanent,
            Some(&regex::Regex::new("^main$").unwrap()),
        )?;
        let view = GraphView::new(permanent, Some(main_only));
        // Initial + main work; the orphan commit is filtered out.
        assert_eq!(view.row_count(), 2);
        let summaries: Vec<Option<String>> =
            view.visible_rows().into_iter().map(|row| row.summary).collect();
        assert!(!summaries.contains(&Some("Orphan work".to_string())));
        Ok(())
    }
}

mod cli {
    use super::test_utils::*;
    use assert_cmd::Command;
    use predicates::prelude::*;

    #[test]
    fn prints_one_line_per_visible_row() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_linear_test_repo(3)?;

        let mut cmd = Command::cargo_bin("gitk-graph")?;
        cmd.arg(&repo_path);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Commit 2"))
            .stdout(predicate::str::contains("Commit 0"));
        Ok(())
    }

    #[test]
    fn collapsed_flag_folds_linear_runs() -> anyhow::Result<()> {
        let (_temp_dir, repo_path) = create_linear_test_repo(5)?;

        let mut cmd = Command::cargo_bin("gitk-graph")?;
        cmd.arg(&repo_path).arg("--collapsed");
        let assert = cmd.assert().success();
        let output = String::from_utf8(assert.get_output().stdout.clone())?;
        assert_eq!(output.lines().count(), 2);
        // The folded run is marked by the dotted-edge indicator.
        assert!(output.lines().next().unwrap().starts_with(':'));
        Ok(())
    }

    #[test]
    fn rejects_an_unknown_flag() -> anyhow::Result<()> {
        let mut cmd = Command::cargo_bin("gitk-graph")?;
        cmd.arg("--frobnicate");
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("unexpected argument"));
        Ok(())
    }

    #[test]
    fn help_prints_usage() -> anyhow::Result<()> {
        let mut cmd = Command::cargo_bin("gitk-graph")?;
        cmd.arg("--help");
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Usage: gitk-graph"));
        Ok(())
    }
}
