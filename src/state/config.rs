use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted options of the graph view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphViewConfig {
    pub commit_limit: usize,
    /// Regex patterns selecting the branches shown by default; empty means
    /// no branch filter.
    pub visible_branch_patterns: Vec<String>,
    /// Collapse every linear branch right after loading.
    pub collapse_linear_branches_on_load: bool,
    pub recent_repositories: Vec<PathBuf>,
    pub max_recent_repos: usize,
}

impl Default for GraphViewConfig {
    fn default() -> Self {
        Self {
            commit_limit: 10_000,
            visible_branch_patterns: Vec::new(),
            collapse_linear_branches_on_load: false,
            recent_repositories: Vec::new(),
            max_recent_repos: 10,
        }
    }
}

impl GraphViewConfig {
    pub fn load() -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("gitk-graph").join("config.json");
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = serde_json::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("gitk-graph");
            std::fs::create_dir_all(&app_config_dir)?;

            let config_path = app_config_dir.join("config.json");
            let content = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, content)?;
        }
        Ok(())
    }

    pub fn add_recent_repository(&mut self, path: PathBuf) {
        self.recent_repositories.retain(|p| p != &path);
        self.recent_repositories.insert(0, path);
        if self.recent_repositories.len() > self.max_recent_repos {
            self.recent_repositories.truncate(self.max_recent_repos);
        }
    }
}
