//! Change history lookups.
//!
//! The frequency and recency factors need the number of commits that
//! touched a component's source path within a time window.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stackweave_common::error::{Result, StackError};

/// A source of commit counts.
#[async_trait]
pub trait History: Send + Sync {
    /// Counts commits touching `path`, limited to `since` when given.
    ///
    /// `since` uses git's approximate date syntax, e.g. `90.days`.
    ///
    /// # Errors
    ///
    /// Returns `StackError::HistoryLookup` if the count cannot be obtained.
    async fn commit_count(&self, path: &str, since: Option<&str>) -> Result<u64>;
}

fn lookup_error(path: &str, reason: impl Into<String>) -> StackError {
    StackError::HistoryLookup {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Commit counts from a local git repository.
#[derive(Debug, Clone)]
pub struct GitHistory {
    git: PathBuf,
    repo: PathBuf,
}

impl GitHistory {
    /// Creates a history source for the repository at `repo`.
    ///
    /// # Errors
    ///
    /// Returns `StackError::Config` if no `git` binary is on the `PATH`.
    pub fn new(repo: impl Into<PathBuf>) -> Result<Self> {
        let git = which::which("git").map_err(|e| StackError::Config {
            message: format!("git not found: {e}"),
        })?;
        Ok(Self {
            git,
            repo: repo.into(),
        })
    }

    /// Repository root.
    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }
}

#[async_trait]
impl History for GitHistory {
    async fn commit_count(&self, path: &str, since: Option<&str>) -> Result<u64> {
        let mut command = tokio::process::Command::new(&self.git);
        let _ = command
            .arg("-C")
            .arg(&self.repo)
            .args(["rev-list", "--count", "HEAD"]);
        if let Some(window) = since {
            let _ = command.arg(format!("--since={window}"));
        }
        let _ = command.arg("--").arg(path).kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| lookup_error(path, format!("failed to run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(lookup_error(path, stderr.trim()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse()
            .map_err(|e| lookup_error(path, format!("unexpected git output \"{}\": {e}", stdout.trim())))
    }
}

/// Fixed commit counts, keyed by path and window.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    counts: HashMap<(String, Option<String>), u64>,
}

impl StaticHistory {
    /// Creates an empty history; every lookup fails until counts are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` commits for `path` within `since`.
    #[must_use]
    pub fn with_count(mut self, path: &str, since: Option<&str>, count: u64) -> Self {
        let _ = self
            .counts
            .insert((path.to_string(), since.map(str::to_string)), count);
        self
    }
}

#[async_trait]
impl History for StaticHistory {
    async fn commit_count(&self, path: &str, since: Option<&str>) -> Result<u64> {
        self.counts
            .get(&(path.to_string(), since.map(str::to_string)))
            .copied()
            .ok_or_else(|| lookup_error(path, "no recorded history"))
    }
}

/// A history source that has nothing to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

#[async_trait]
impl History for NoHistory {
    async fn commit_count(&self, path: &str, _since: Option<&str>) -> Result<u64> {
        Err(lookup_error(path, "history disabled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_history_distinguishes_windows() {
        let history = StaticHistory::new()
            .with_count("vpc", Some("90.days"), 12)
            .with_count("vpc", Some("7.days"), 1);
        assert_eq!(history.commit_count("vpc", Some("90.days")).await.expect("count"), 12);
        assert_eq!(history.commit_count("vpc", Some("7.days")).await.expect("count"), 1);
        assert!(history.commit_count("vpc", None).await.is_err());
    }

    #[tokio::test]
    async fn no_history_always_fails() {
        let err = NoHistory.commit_count("sg", None).await.unwrap_err();
        assert!(matches!(err, StackError::HistoryLookup { ref path, .. } if path == "sg"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn git_history_fails_outside_a_repository() {
        let dir = tempfile::tempdir().expect("tempdir");
        let Ok(history) = GitHistory::new(dir.path()) else {
            return;
        };
        assert!(history.commit_count("vpc", Some("90.days")).await.is_err());
    }
}
