use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Static facts about an opened repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_bare: bool,
    pub head_branch: Option<String>,
    pub branches: Vec<String>,
}

impl RepositoryInfo {
    pub fn from_repo(repo: &git2::Repository) -> anyhow::Result<Self> {
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let is_bare = repo.is_bare();

        let head_branch = repo
            .head()
            .ok()
            .and_then(|head| head.shorthand().map(|s| s.to_string()));

        let mut branches = Vec::new();
        if let Ok(branch_iter) = repo.branches(Some(git2::BranchType::Local)) {
            for entry in branch_iter.flatten() {
                let (branch, _) = entry;
                if let Some(name) = branch.name()? {
                    branches.push(name.to_string());
                }
            }
        }

        Ok(RepositoryInfo {
            path,
            name,
            is_bare,
            head_branch,
            branches,
        })
    }
}
