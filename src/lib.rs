//! # gitk-graph
//!
//! The commit-graph collapsing and filtering engine behind a Git log viewer.
//!
//! A log UI needs more than the raw commit list: long linear runs should fold
//! into a single dotted edge, and the view should be restrictable to the
//! commits reachable from a chosen set of branches, without rebuilding
//! the loaded graph. This crate provides that engine: an immutable permanent
//! graph plus a chain of controllers that each contribute one transformation
//! over the layer below.
//!
//! ## Architecture
//!
//! The library is organized into several main modules:
//! - [`graph`] - The permanent graph, the collapsing engine and the
//!   controller chain
//! - [`git`] - Repository opening and commit-graph loading
//! - [`models`] - Commit and repository metadata
//! - [`state`] - View composition and persisted options
//!
//! ## Example
//!
//! ```rust,no_run
//! use gitk_graph::git::GitRepository;
//! use gitk_graph::state::GraphView;
//! use std::rc::Rc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let repo = GitRepository::discover("/path/to/repo")?;
//! let permanent = Rc::new(repo.load_graph(Some(1000))?);
//!
//! let mut view = GraphView::new(permanent, None);
//! view.collapse_linear_branches();
//! println!("{} visible rows", view.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! Everything here is single-threaded by design: controllers and their
//! collapsed graphs must stay on one logical thread, and no operation blocks
//! or performs I/O once the graph is loaded.

pub mod git;
pub mod graph;
pub mod models;
pub mod state;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
