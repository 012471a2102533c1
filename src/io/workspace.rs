use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Name of the workspace directory discovered by walking up from the cwd.
pub const WORKSPACE_DIR: &str = "tickwatch";

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a tickwatch workspace: no tickwatch/ directory found (run `tw init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A loaded workspace: the root it was discovered from, the `tickwatch/`
/// directory inside it, and the parsed config.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub dir: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn store_path(&self) -> PathBuf {
        self.dir.join("tickets.tsv")
    }
}

/// Discover the workspace by walking up from the given directory, looking
/// for a `tickwatch/` subdirectory with a config.toml in it.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(WORKSPACE_DIR);
        if dir.is_dir() && dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load the workspace at the given root directory.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let dir = root.join(WORKSPACE_DIR);
    if !dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }

    let config_path = dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: Config = toml::from_str(&config_text)?;

    Ok(Workspace {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_workspace(dir: &Path) {
        let ws_dir = dir.join(WORKSPACE_DIR);
        fs::create_dir_all(&ws_dir).unwrap();
        fs::write(
            ws_dir.join("config.toml"),
            r#"
[redmine]
api_key = "abc123"
refresh_minutes = 5

[[feeds]]
title = "Demo"
url = "https://redmine.example.com/issues.atom"
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_discover_workspace() {
        let tmp = TempDir::new().unwrap();
        create_test_workspace(tmp.path());

        // Discover from root
        let root = discover_workspace(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());

        // Discover from a nested directory
        let sub = tmp.path().join("deep/nested");
        fs::create_dir_all(&sub).unwrap();
        let root = discover_workspace(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_discover_workspace_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_workspace(tmp.path()).is_err());
    }

    #[test]
    fn test_load_workspace() {
        let tmp = TempDir::new().unwrap();
        create_test_workspace(tmp.path());

        let ws = load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.config.redmine.api_key, "abc123");
        assert_eq!(ws.config.redmine.refresh_minutes, 5);
        assert_eq!(ws.config.feeds.len(), 1);
        assert_eq!(ws.store_path(), tmp.path().join("tickwatch/tickets.tsv"));
    }

    #[test]
    fn test_load_workspace_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_workspace(tmp.path()),
            Err(WorkspaceError::NotAWorkspace)
        ));
    }
}
