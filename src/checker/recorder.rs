//! Handoff of discovered versions
//!
//! Checkers do not persist anything themselves; they pass what they found to a
//! [`VersionRecorder`]. [`ReportRecorder`] collects the results into
//! [`CheckReport`]s for the command line.

#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::external_data::{ExternalData, ExternalFile, ExternalGitRef, ExternalGitRepo};
use crate::version::{CompareResult, compare_versions};

/// Latest version of a downloadable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileUpdate {
    pub version: String,
    pub url: String,
    /// Whether redirects may be followed when the new URL is downloaded
    pub follow_redirects: bool,
}

/// Receives the versions discovered by checkers
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionRecorder: Send + Sync {
    /// Record a newly discovered file version for `data`
    async fn update_file(&self, data: &ExternalData, update: FileUpdate);

    /// Record a newly discovered git reference for `data`
    async fn set_new_version(&self, data: &ExternalData, new_version: ExternalGitRef);
}

/// How a discovered version relates to the one currently in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStatus {
    UpToDate,
    Outdated,
    Newer,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Discovered {
    File(FileUpdate),
    Git(ExternalGitRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub status: UpdateStatus,
    #[serde(flatten)]
    pub discovered: Discovered,
}

/// [`VersionRecorder`] collecting one report per checked record
#[derive(Debug, Default)]
pub struct ReportRecorder {
    reports: Mutex<Vec<CheckReport>>,
}

impl ReportRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected reports, leaving the recorder empty
    pub async fn take_reports(&self) -> Vec<CheckReport> {
        std::mem::take(&mut *self.reports.lock().await)
    }

    async fn push(&self, report: CheckReport) {
        info!("{}: {:?}", report.name, report.status);
        self.reports.lock().await.push(report);
    }
}

#[async_trait::async_trait]
impl VersionRecorder for ReportRecorder {
    async fn update_file(&self, data: &ExternalData, update: FileUpdate) {
        let status = match data {
            ExternalData::File(file) => file_status(file, &update),
            ExternalData::GitRepo(_) => UpdateStatus::Unknown,
        };

        self.push(CheckReport {
            name: data.name().to_string(),
            status,
            discovered: Discovered::File(update),
        })
        .await;
    }

    async fn set_new_version(&self, data: &ExternalData, new_version: ExternalGitRef) {
        let status = match data {
            ExternalData::GitRepo(repo) => git_status(repo, &new_version),
            ExternalData::File(_) => UpdateStatus::Unknown,
        };

        self.push(CheckReport {
            name: data.name().to_string(),
            status,
            discovered: Discovered::Git(new_version),
        })
        .await;
    }
}

fn file_status(file: &ExternalFile, update: &FileUpdate) -> UpdateStatus {
    if file.current_url == update.url {
        UpdateStatus::UpToDate
    } else {
        UpdateStatus::Outdated
    }
}

fn git_status(repo: &ExternalGitRepo, new_version: &ExternalGitRef) -> UpdateStatus {
    let current = &repo.current_version;

    if let (Some(current_commit), Some(new_commit)) = (&current.commit, &new_version.commit)
        && current_commit == new_commit
    {
        return UpdateStatus::UpToDate;
    }

    let current_label = current.version.as_ref().or(current.tag.as_ref());
    let new_label = new_version.version.as_ref().or(new_version.tag.as_ref());
    let (Some(current_label), Some(new_label)) = (current_label, new_label) else {
        return UpdateStatus::Unknown;
    };

    match compare_versions(current_label, new_label) {
        CompareResult::Latest => UpdateStatus::UpToDate,
        CompareResult::Outdated => UpdateStatus::Outdated,
        CompareResult::Newer => UpdateStatus::Newer,
        CompareResult::Invalid => UpdateStatus::Unknown,
    }
}
