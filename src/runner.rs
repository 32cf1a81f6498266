//! Batch checking of external data records

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::checker::backend::Checker;
use crate::checker::error::CheckError;
use crate::checker::evaluator::JqEvaluator;
use crate::checker::json::JsonChecker;
use crate::checker::recorder::{CheckReport, ReportRecorder, VersionRecorder};
use crate::checker::remote::GitLsRemote;
use crate::config::{CheckerConfig, FETCH_STAGGER_DELAY_MS};
use crate::external_data::ExternalData;
use crate::manifest::load_external_data;

/// Outcome of checking a batch of records, by record name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: Vec<String>,
    pub failed: Vec<String>,
    /// Records no checker was able to handle
    pub skipped: Vec<String>,
}

impl CheckSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.checked.len() + self.failed.len() + self.skipped.len()
    }
}

/// Reports and summary of checking one manifest
#[derive(Debug)]
pub struct CheckRun {
    pub reports: Vec<CheckReport>,
    pub summary: CheckSummary,
}

enum Outcome {
    Checked,
    Failed,
    Skipped,
}

/// Check a single record with the first checker that accepts it
///
/// The check is bounded by `check_timeout`; on expiry the in-flight check is
/// dropped, which also kills any query process it was waiting on.
async fn check_record(
    checkers: &[Arc<dyn Checker>],
    data: &ExternalData,
    check_timeout: Duration,
) -> Outcome {
    let Some(checker) = checkers.iter().find(|c| c.should_check(data)) else {
        warn!("No checker available for {}", data.name());
        return Outcome::Skipped;
    };

    info!("Checking {} with the {} checker", data.name(), checker.name());

    let result = match timeout(check_timeout, checker.check(data)).await {
        Ok(result) => result,
        Err(_) => Err(CheckError::Timeout(check_timeout.as_millis() as u64)),
    };

    match result {
        Ok(()) => Outcome::Checked,
        Err(e) => {
            error!("Failed to check {}: {}", data.name(), e);
            Outcome::Failed
        }
    }
}

/// Check all records concurrently
///
/// Errors are logged but do not stop processing of other records.
/// Checks are started with staggered start times to avoid rate limiting.
pub async fn check_all(
    checkers: &[Arc<dyn Checker>],
    records: &[ExternalData],
    check_timeout: Duration,
) -> CheckSummary {
    let futures = records.iter().enumerate().map(|(i, data)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            let outcome = check_record(checkers, data, check_timeout).await;
            (data.name().to_string(), outcome)
        }
    });

    let mut summary = CheckSummary::default();
    for (name, outcome) in join_all(futures).await {
        match outcome {
            Outcome::Checked => summary.checked.push(name),
            Outcome::Failed => summary.failed.push(name),
            Outcome::Skipped => summary.skipped.push(name),
        }
    }

    info!(
        "Checked {} records: {} failed, {} skipped",
        records.len(),
        summary.failed.len(),
        summary.skipped.len()
    );
    summary
}

/// Create the default set of checkers, all reporting to `recorder`
pub fn create_default_checkers(
    config: &CheckerConfig,
    recorder: Arc<dyn VersionRecorder>,
) -> anyhow::Result<Vec<Arc<dyn Checker>>> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()?;

    let json_checker = JsonChecker::new(
        client,
        Arc::new(JqEvaluator::new(&config.jq_path)),
        Arc::new(GitLsRemote::new(&config.git_path)),
        recorder,
    );

    Ok(vec![Arc::new(json_checker)])
}

/// Load the manifest at `manifest_path` and check every record in it
pub async fn run_manifest(config: &CheckerConfig, manifest_path: &Path) -> anyhow::Result<CheckRun> {
    let records = load_external_data(manifest_path)?;
    info!(
        "Loaded {} sources with checker data from {}",
        records.len(),
        manifest_path.display()
    );

    let recorder = Arc::new(ReportRecorder::new());
    let checkers = create_default_checkers(config, recorder.clone())?;

    let summary = check_all(
        &checkers,
        &records,
        Duration::from_millis(config.fetch_timeout),
    )
    .await;

    Ok(CheckRun {
        reports: recorder.take_reports().await,
        summary,
    })
}
