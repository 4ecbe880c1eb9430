use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use regex::Regex;

use gitk_graph::git::GitRepository;
use gitk_graph::graph::EdgeKind;
use gitk_graph::state::{GraphView, GraphViewConfig};

const USAGE: &str = "Usage: gitk-graph [REPO_PATH] [--limit N] [--branches REGEX] [--collapsed]

Prints the visible rows of the commit graph, one per line.

Options:
  --limit N         Load at most N commits (default: configured commit limit)
  --branches REGEX  Show only commits reachable from branches matching REGEX
  --collapsed       Collapse every linear branch before printing
  -h, --help        Show this help";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut repo_path: Option<PathBuf> = None;
    let mut limit: Option<usize> = None;
    let mut branches: Option<String> = None;
    let mut collapsed = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--limit" => {
                let value = args.next().context("--limit needs a value")?;
                limit = Some(value.parse().context("--limit needs a number")?);
            }
            "--branches" => {
                branches = Some(args.next().context("--branches needs a pattern")?);
            }
            "--collapsed" => collapsed = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            other if repo_path.is_none() && !other.starts_with('-') => {
                repo_path = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument: {other}\n{USAGE}"),
        }
    }

    let config = GraphViewConfig::load();
    let repo_path = repo_path.unwrap_or_else(|| PathBuf::from("."));
    let limit = limit.unwrap_or(config.commit_limit);

    let repo = GitRepository::discover(&repo_path)
        .with_context(|| format!("failed to open repository at {}", repo_path.display()))?;
    let permanent = Rc::new(repo.load_graph(Some(limit))?);

    // The command line wins; otherwise fall back to the configured patterns.
    let pattern = branches.or_else(|| {
        if config.visible_branch_patterns.is_empty() {
            None
        } else {
            Some(config.visible_branch_patterns.join("|"))
        }
    });
    let branch_ids = match pattern {
        Some(pattern) => {
            let regex = Regex::new(&pattern).context("--branches needs a valid regex")?;
            Some(repo.visible_branch_ids(&permanent, Some(&regex))?)
        }
        None => None,
    };

    let mut view = GraphView::new(permanent, branch_ids);
    if collapsed || config.collapse_linear_branches_on_load {
        view.collapse_linear_branches();
    }

    for row in view.visible_rows() {
        let marker = if row
            .down_edges
            .iter()
            .any(|edge| edge.kind == EdgeKind::Dotted)
        {
            ":"
        } else {
            "*"
        };
        let short_id = row.short_id.unwrap_or_else(|| format!("#{}", row.id));
        let summary = row.summary.unwrap_or_default();
        println!("{marker} {short_id} {summary}");
    }

    Ok(())
}
