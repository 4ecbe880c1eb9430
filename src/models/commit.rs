use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one loaded commit, in permanent-graph row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub short_id: String,
    pub author: CommitSignature,
    pub summary: String,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

impl CommitInfo {
    pub fn new(commit: &git2::Commit) -> anyhow::Result<Self> {
        let id = commit.id().to_string();
        let short_id = commit
            .as_object()
            .short_id()?
            .as_str()
            .unwrap_or("")
            .to_string();

        let author = CommitSignature {
            name: commit.author().name().unwrap_or("").to_string(),
            email: commit.author().email().unwrap_or("").to_string(),
            when: DateTime::from_timestamp(commit.author().when().seconds(), 0)
                .unwrap_or_else(Utc::now),
        };

        let summary = commit.summary().unwrap_or("").to_string();
        let parent_ids = commit.parent_ids().map(|id| id.to_string()).collect();

        Ok(CommitInfo {
            id,
            short_id,
            author,
            summary,
            parent_ids,
        })
    }

    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}
