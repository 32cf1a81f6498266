//! Completing git references against their remote

use std::path::PathBuf;
use std::process::Stdio;

#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::debug;

use crate::checker::error::RemoteError;
use crate::external_data::ExternalGitRef;

/// Default git executable
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Resolves the commit a git reference points to on its remote
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteResolver: Send + Sync {
    /// Returns `git_ref` with its commit filled in from the remote
    async fn fetch_remote(&self, git_ref: ExternalGitRef) -> Result<ExternalGitRef, RemoteError>;
}

/// [`RemoteResolver`] backed by `git ls-remote`
#[derive(Debug, Clone)]
pub struct GitLsRemote {
    program: PathBuf,
}

impl GitLsRemote {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitLsRemote {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_PROGRAM)
    }
}

#[async_trait::async_trait]
impl RemoteResolver for GitLsRemote {
    async fn fetch_remote(&self, git_ref: ExternalGitRef) -> Result<ExternalGitRef, RemoteError> {
        let Some(tag) = git_ref.tag.as_deref() else {
            return Err(RemoteError::MissingTag(git_ref.url.clone()));
        };

        let tag_ref = format!("refs/tags/{}", tag);
        let peeled_ref = format!("{}^{{}}", tag_ref);
        debug!("Resolving {} in {}", tag_ref, git_ref.url);

        let output = Command::new(&self.program)
            .args([
                "ls-remote",
                "--",
                git_ref.url.as_str(),
                tag_ref.as_str(),
                peeled_ref.as_str(),
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(RemoteError::Command {
                url: git_ref.url.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(commit) = find_tag_commit(&stdout, &tag_ref) else {
            return Err(RemoteError::TagNotFound {
                url: git_ref.url.clone(),
                tag: tag.to_string(),
            });
        };

        Ok(ExternalGitRef {
            commit: Some(commit),
            ..git_ref
        })
    }
}

/// Pick the commit for `tag_ref` from `git ls-remote` output
///
/// Annotated tags list the tag object and the peeled `^{}` commit; the peeled
/// entry wins.
fn find_tag_commit(ls_remote_output: &str, tag_ref: &str) -> Option<String> {
    let peeled_ref = format!("{}^{{}}", tag_ref);
    let mut direct = None;

    for line in ls_remote_output.lines() {
        let Some((object, name)) = line.split_once('\t') else {
            continue;
        };
        if name == peeled_ref {
            return Some(object.to_string());
        }
        if name == tag_ref {
            direct = Some(object.to_string());
        }
    }

    direct
}
