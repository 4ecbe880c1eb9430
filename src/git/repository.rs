use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use git2::{Oid, Repository, RepositoryOpenFlags, Sort};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::git::error_handling::{GitError, InputValidator};
use crate::graph::{NodeId, PermanentGraphBuilder, PermanentGraphInfo};
use crate::models::{CommitInfo, RepositoryInfo};

/// A repository opened for graph loading.
pub struct GitRepository {
    repo: Repository,
    info: RepositoryInfo,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("info", &self.info)
            .finish()
    }
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open_ext(
            path.as_ref(),
            RepositoryOpenFlags::empty(),
            &[] as &[&std::ffi::OsStr],
        )?;
        let info = RepositoryInfo::from_repo(&repo)?;
        Ok(GitRepository { repo, info })
    }

    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path.as_ref())?;
        let info = RepositoryInfo::from_repo(&repo)?;
        Ok(GitRepository { repo, info })
    }

    pub fn info(&self) -> &RepositoryInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.info.path
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Walk up to `limit` commits from HEAD and every local branch head, in
    /// topological order, and build the permanent graph over them. Parents
    /// beyond the limit stay unloaded and show up as truncated edges.
    pub fn load_graph(&self, limit: Option<usize>) -> Result<PermanentGraphInfo> {
        let limit = limit.unwrap_or(10_000);
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;
        for entry in self.repo.branches(Some(git2::BranchType::Local))?.flatten() {
            let (branch, _) = entry;
            if let Some(oid) = branch.get().target() {
                revwalk.push(oid)?;
            }
        }

        let mut builder: PermanentGraphBuilder<Oid> = PermanentGraphBuilder::new();
        let mut commits = Vec::new();
        for oid in revwalk {
            if commits.len() >= limit {
                debug!(limit, "commit limit reached, truncating graph");
                break;
            }
            let oid = oid?;
            let commit = match self.repo.find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => {
                    warn!("Error finding commit {}: {}", oid, e);
                    continue;
                }
            };
            let parents: Vec<Oid> = commit.parent_ids().collect();
            builder.add_commit(oid, &parents);
            commits.push(CommitInfo::new(&commit)?);
        }

        if builder.is_empty() {
            return Err(GitError::repository("no commits reachable from HEAD").into());
        }
        info!(commits = commits.len(), "loaded commit graph");
        Ok(builder.build().with_commits(commits))
    }

    /// Local branch names with the full hex id of their head commit.
    pub fn branch_heads(&self) -> Result<Vec<(String, String)>> {
        let mut heads = Vec::new();
        for entry in self.repo.branches(Some(git2::BranchType::Local))?.flatten() {
            let (branch, _) = entry;
            let name = match branch.name()? {
                Some(name) => name.to_string(),
                None => continue,
            };
            if let Some(oid) = branch.get().target() {
                heads.push((name, oid.to_string()));
            }
        }
        Ok(heads)
    }

    /// Resolve the head of one named branch to its graph id.
    pub fn head_id_for_branch(
        &self,
        graph: &PermanentGraphInfo,
        name: &str,
    ) -> Result<Option<NodeId>> {
        InputValidator::validate_ref_name(name)?;
        let branch = self.repo.find_branch(name, git2::BranchType::Local)?;
        let Some(oid) = branch.get().target() else {
            return Ok(None);
        };
        Ok(graph.id_for_commit(&oid.to_string()))
    }

    /// The graph ids of every local branch head whose name matches `pattern`
    /// (`None` matches all). Heads outside the loaded graph are skipped.
    pub fn visible_branch_ids(
        &self,
        graph: &PermanentGraphInfo,
        pattern: Option<&Regex>,
    ) -> Result<HashSet<NodeId>> {
        let mut ids = HashSet::new();
        for (name, hash) in self.branch_heads()? {
            if pattern.is_some_and(|p| !p.is_match(&name)) {
                continue;
            }
            match graph.id_for_commit(&hash) {
                Some(id) => {
                    ids.insert(id);
                }
                None => warn!(branch = %name, "branch head is outside the loaded graph"),
            }
        }
        Ok(ids)
    }
}
