//! Sequential query resolution
//!
//! A [`QueryPlan`] is evaluated in order. Each result is bound as a variable of
//! the same name for every query that follows it, so a URL query can be built
//! from a version extracted just before (`"https://host/foo-\($version).tgz"`).

use tracing::debug;

use crate::checker::error::{CheckerQueryError, ConfigError};
use crate::checker::evaluator::{Bindings, QueryEvaluator};
use crate::external_data::JsonCheckerData;

/// Extracted values keyed by result name, in evaluation order
pub type ResultMapping = Bindings;

/// One named query of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub key: &'static str,
    pub query: Option<String>,
}

/// Ordered list of named queries evaluated against one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    entries: Vec<PlanEntry>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry; absent queries are kept and skipped at evaluation
    pub fn push(mut self, key: &'static str, query: Option<&str>) -> Self {
        self.entries.push(PlanEntry {
            key,
            query: query.map(str::to_string),
        });
        self
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Plan for a downloadable file: `[tag?, commit?, version!, url!]`
    pub fn for_file(data: &JsonCheckerData) -> Result<Self, ConfigError> {
        let version_query = required(&data.version_query, "version-query")?;
        let url_query = required(&data.url_query, "url-query")?;

        Ok(Self::new()
            .push("tag", data.tag_query.as_deref())
            .push("commit", data.commit_query.as_deref())
            .push("version", Some(version_query))
            .push("url", Some(url_query)))
    }

    /// Plan for a git repository: `[tag!, commit?, version?, timestamp?]`
    pub fn for_git(data: &JsonCheckerData) -> Result<Self, ConfigError> {
        let tag_query = required(&data.tag_query, "tag-query")?;

        Ok(Self::new()
            .push("tag", Some(tag_query))
            .push("commit", data.commit_query.as_deref())
            .push("version", data.version_query.as_deref())
            .push("timestamp", data.timestamp_query.as_deref()))
    }
}

fn required<'a>(query: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    query
        .as_deref()
        .filter(|q| !q.is_empty())
        .ok_or(ConfigError::MissingQuery(name))
}

/// Evaluate `plan` against `document`, threading earlier results as variables
///
/// Entries without a query (absent or empty) are skipped and never appear in
/// the result. The first failing query aborts the remaining plan.
pub async fn query_sequence(
    evaluator: &dyn QueryEvaluator,
    document: &[u8],
    plan: &QueryPlan,
) -> Result<ResultMapping, CheckerQueryError> {
    let mut results = ResultMapping::new();

    for entry in plan.entries() {
        let Some(query) = entry.query.as_deref().filter(|q| !q.is_empty()) else {
            continue;
        };

        let value = evaluator.evaluate(query, document, &results).await?;
        debug!("Query for {} resolved to {:?}", entry.key, value);
        results.insert(entry.key.to_string(), value);
    }

    Ok(results)
}
