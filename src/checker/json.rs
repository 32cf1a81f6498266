//! JSON document checker
//!
//! Fetches the JSON document named by the record's checker data and extracts
//! the latest version with a sequence of jq queries:
//!
//! - files: `tag`, `commit`, `version`, `url` (the last two required)
//! - git repositories: `tag` (required), `commit`, `version`, `timestamp`
//!
//! Git references without a commit are completed against the remote.

use std::sync::Arc;

use tracing::{debug, info};

use crate::checker::backend::Checker;
use crate::checker::error::{CheckError, CheckerQueryError};
use crate::checker::evaluator::QueryEvaluator;
use crate::checker::recorder::{FileUpdate, VersionRecorder};
use crate::checker::remote::RemoteResolver;
use crate::checker::sequence::{QueryPlan, ResultMapping, query_sequence};
use crate::checker::timestamp::parse_timestamp;
use crate::external_data::{ExternalData, ExternalGitRef, ExternalGitRepo};

pub const CHECKER_TYPE: &str = "json";

/// [`Checker`] for records with `type: json` checker data
pub struct JsonChecker {
    client: reqwest::Client,
    evaluator: Arc<dyn QueryEvaluator>,
    remote: Arc<dyn RemoteResolver>,
    recorder: Arc<dyn VersionRecorder>,
}

impl JsonChecker {
    pub fn new(
        client: reqwest::Client,
        evaluator: Arc<dyn QueryEvaluator>,
        remote: Arc<dyn RemoteResolver>,
        recorder: Arc<dyn VersionRecorder>,
    ) -> Self {
        Self {
            client,
            evaluator,
            remote,
            recorder,
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CheckerQueryError> {
        debug!("Fetching JSON document {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CheckerQueryError::with_source(format!("Failed to fetch {}", url), e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CheckerQueryError::with_source(format!("Failed to read {}", url), e))?;

        Ok(body.to_vec())
    }

    async fn check_file(
        &self,
        data: &ExternalData,
        document: &[u8],
        plan: &QueryPlan,
    ) -> Result<(), CheckError> {
        let mut results = query_sequence(&*self.evaluator, document, plan).await?;
        let version = take_result(&mut results, "version")?;
        let url = take_result(&mut results, "url")?;

        info!("{}: latest version {} at {}", data.name(), version, url);
        self.recorder
            .update_file(
                data,
                FileUpdate {
                    version,
                    url,
                    follow_redirects: false,
                },
            )
            .await;

        Ok(())
    }

    async fn check_git(
        &self,
        data: &ExternalData,
        repo: &ExternalGitRepo,
        document: &[u8],
        plan: &QueryPlan,
    ) -> Result<(), CheckError> {
        let mut results = query_sequence(&*self.evaluator, document, plan).await?;
        let timestamp = parse_timestamp(results.get("timestamp").map(String::as_str))?;

        let mut new_version = ExternalGitRef {
            url: repo.current_version.url.clone(),
            commit: results.shift_remove("commit"),
            tag: Some(take_result(&mut results, "tag")?),
            branch: None,
            version: results.shift_remove("version"),
            timestamp,
        };

        if new_version.commit.is_none() {
            debug!(
                "{}: no commit in document, resolving tag {:?} against {}",
                data.name(),
                new_version.tag,
                new_version.url
            );
            new_version = self.remote.fetch_remote(new_version).await?;
        }

        info!(
            "{}: latest tag {:?} at commit {:?}",
            data.name(),
            new_version.tag,
            new_version.commit
        );
        self.recorder.set_new_version(data, new_version).await;

        Ok(())
    }
}

fn take_result(results: &mut ResultMapping, key: &str) -> Result<String, CheckerQueryError> {
    results
        .shift_remove(key)
        .ok_or_else(|| CheckerQueryError::new(format!("Query for {} produced no result", key)))
}

#[async_trait::async_trait]
impl Checker for JsonChecker {
    fn name(&self) -> &'static str {
        CHECKER_TYPE
    }

    fn should_check(&self, data: &ExternalData) -> bool {
        data.json_checker_data().is_some()
    }

    async fn check(&self, data: &ExternalData) -> Result<(), CheckError> {
        let Some(checker_data) = data.json_checker_data() else {
            panic!(
                "{} checker called for ineligible source {}",
                CHECKER_TYPE,
                data.name()
            );
        };

        let plan = match data {
            ExternalData::File(_) => QueryPlan::for_file(checker_data)?,
            ExternalData::GitRepo(_) => QueryPlan::for_git(checker_data)?,
        };

        let document = self.fetch(&checker_data.url).await?;

        match data {
            ExternalData::File(_) => self.check_file(data, &document, &plan).await,
            ExternalData::GitRepo(repo) => self.check_git(data, repo, &document, &plan).await,
        }
    }
}
