//! Checker test utilities

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mockito::{Mock, ServerGuard};
use serde_json::Value;

use json_version_checker::checker::error::{CheckerQueryError, RemoteError};
use json_version_checker::checker::evaluator::{Bindings, QueryEvaluator};
use json_version_checker::checker::json::JsonChecker;
use json_version_checker::checker::recorder::ReportRecorder;
use json_version_checker::checker::remote::RemoteResolver;
use json_version_checker::external_data::ExternalGitRef;

/// In-process evaluator for `.a.b` paths and `"...\($var)..."` templates
#[derive(Default)]
pub struct FieldEvaluator {
    calls: AtomicUsize,
}

impl FieldEvaluator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryEvaluator for FieldEvaluator {
    async fn evaluate(
        &self,
        query: &str,
        document: &[u8],
        bindings: &Bindings,
    ) -> Result<String, CheckerQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(template) = query.strip_prefix('"').and_then(|q| q.strip_suffix('"')) {
            let mut result = template.to_string();
            for (name, value) in bindings {
                result = result.replace(&format!("\\(${})", name), value);
            }
            return Ok(result);
        }

        let document: Value = serde_json::from_slice(document)
            .map_err(|e| CheckerQueryError::with_source("Error running jq", e))?;
        let value = query
            .split('.')
            .filter(|part| !part.is_empty())
            .fold(&document, |current, part| &current[part]);

        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(CheckerQueryError::new(format!("Error running jq: {}", other))),
        }
    }
}

/// Remote resolver answering every tag with a fixed commit
pub struct FixedRemote {
    commit: String,
    calls: AtomicUsize,
}

impl FixedRemote {
    pub fn new(commit: &str) -> Self {
        Self {
            commit: commit.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteResolver for FixedRemote {
    async fn fetch_remote(&self, git_ref: ExternalGitRef) -> Result<ExternalGitRef, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExternalGitRef {
            commit: Some(self.commit.clone()),
            ..git_ref
        })
    }
}

/// JSON checker wired to fakes, keeping handles for assertions
pub struct TestChecker {
    pub checker: Arc<JsonChecker>,
    pub evaluator: Arc<FieldEvaluator>,
    pub remote: Arc<FixedRemote>,
    pub recorder: Arc<ReportRecorder>,
}

pub fn create_test_checker(remote_commit: &str) -> TestChecker {
    let evaluator = Arc::new(FieldEvaluator::default());
    let remote = Arc::new(FixedRemote::new(remote_commit));
    let recorder = Arc::new(ReportRecorder::new());

    let checker = Arc::new(JsonChecker::new(
        reqwest::Client::new(),
        evaluator.clone(),
        remote.clone(),
        recorder.clone(),
    ));

    TestChecker {
        checker,
        evaluator,
        remote,
        recorder,
    }
}

/// Serve `body` as a JSON document at `path`
pub async fn serve_json(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}
