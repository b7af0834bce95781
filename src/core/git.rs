use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::utils::command;

/// Source of the POSIX commit timestamp used to name JSON results files.
pub trait CommitTimestamp {
    fn commit_timestamp(&self) -> Result<i64>;
}

/// Reads the HEAD commit time of a git checkout.
#[derive(Debug, Clone)]
pub struct GitCommitTimestamp {
    repo_dir: PathBuf,
}

impl GitCommitTimestamp {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

impl CommitTimestamp for GitCommitTimestamp {
    fn commit_timestamp(&self) -> Result<i64> {
        let stdout = command::run_in(
            &self.repo_dir,
            "git",
            &["log", "-1", "--format=%ct"],
            "git log",
        )
        .map_err(|e| {
            Error::git_command_failed(e.to_string()).with_hint(format!(
                "Check that {} is a git checkout with at least one commit",
                self.repo_dir.display()
            ))
        })?;

        parse_timestamp(&stdout)
    }
}

fn parse_timestamp(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        Error::git_command_failed(format!("Unexpected commit timestamp from git: '{}'", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Bench Bot")
            .env("GIT_AUTHOR_EMAIL", "bench@example.com")
            .env("GIT_COMMITTER_NAME", "Bench Bot")
            .env("GIT_COMMITTER_EMAIL", "bench@example.com")
            .env("GIT_COMMITTER_DATE", "1406721715 +0000")
            .env("GIT_AUTHOR_DATE", "1406721715 +0000")
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn parse_timestamp_trims_whitespace() {
        assert_eq!(parse_timestamp("1406721715\n").unwrap(), 1406721715);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("not-a-number").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::GitCommandFailed);
    }

    #[test]
    fn reads_head_commit_time() {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "First checkin"]);

        let ts = GitCommitTimestamp::new(dir.path()).commit_timestamp().unwrap();
        assert_eq!(ts, 1406721715);
    }

    #[test]
    fn non_repo_is_git_command_failure() {
        let dir = TempDir::new().unwrap();

        let err = GitCommitTimestamp::new(dir.path())
            .commit_timestamp()
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::GitCommandFailed);
        assert_eq!(err.hints.len(), 1);
    }
}
