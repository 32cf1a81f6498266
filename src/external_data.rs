//! External data records monitored for updates
//!
//! A record describes one externally hosted artifact (a downloadable file) or a
//! git reference, together with the `x-checker-data` that tells a checker where
//! to look for newer versions.

use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::checker::error::ConfigError;

/// Checker configuration attached to a source, selected by its `type` field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum CheckerData {
    #[serde(rename = "json")]
    Json(JsonCheckerData),
    /// Any checker type this crate does not implement
    #[serde(other)]
    Unsupported,
}

/// `x-checker-data` for the JSON checker
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JsonCheckerData {
    /// URL of the JSON document to query
    pub url: String,
    pub tag_query: Option<String>,
    pub commit_query: Option<String>,
    pub version_query: Option<String>,
    pub url_query: Option<String>,
    pub timestamp_query: Option<String>,
}

impl JsonCheckerData {
    /// Validate the checker data as declared by the JSON checker schema:
    /// `url` must be an absolute URI and either `version-query` plus
    /// `url-query`, or `tag-query` must be present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let has_file_queries = is_set(&self.version_query) && is_set(&self.url_query);
        if !has_file_queries && !is_set(&self.tag_query) {
            return Err(ConfigError::NoQuerySet);
        }

        Ok(())
    }
}

fn is_set(query: &Option<String>) -> bool {
    query.as_deref().is_some_and(|q| !q.is_empty())
}

/// A git reference: the current one of a repository, or a newly discovered one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalGitRef {
    pub url: String,
    pub commit: Option<String>,
    pub tag: Option<String>,
    pub branch: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// A downloadable file source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFile {
    pub name: String,
    pub current_url: String,
    pub checker_data: CheckerData,
}

/// A git repository source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalGitRepo {
    pub name: String,
    pub current_version: ExternalGitRef,
    pub checker_data: CheckerData,
}

/// External data record, one per monitored source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalData {
    File(ExternalFile),
    GitRepo(ExternalGitRepo),
}

impl ExternalData {
    pub fn name(&self) -> &str {
        match self {
            ExternalData::File(file) => &file.name,
            ExternalData::GitRepo(repo) => &repo.name,
        }
    }

    pub fn checker_data(&self) -> &CheckerData {
        match self {
            ExternalData::File(file) => &file.checker_data,
            ExternalData::GitRepo(repo) => &repo.checker_data,
        }
    }

    /// Returns the JSON checker data if this record is handled by the JSON checker
    pub fn json_checker_data(&self) -> Option<&JsonCheckerData> {
        match self.checker_data() {
            CheckerData::Json(data) => Some(data),
            CheckerData::Unsupported => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn checker_data(url: &str) -> JsonCheckerData {
        JsonCheckerData {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn checker_data_parses_json_type_with_kebab_case_queries() {
        let result = serde_json::from_value::<CheckerData>(json!({
            "type": "json",
            "url": "https://example.com/releases.json",
            "version-query": ".version",
            "url-query": ".url",
            "timestamp-query": ".date"
        }))
        .unwrap();

        assert_eq!(
            result,
            CheckerData::Json(JsonCheckerData {
                url: "https://example.com/releases.json".to_string(),
                tag_query: None,
                commit_query: None,
                version_query: Some(".version".to_string()),
                url_query: Some(".url".to_string()),
                timestamp_query: Some(".date".to_string()),
            })
        );
    }

    #[test]
    fn checker_data_with_other_type_is_unsupported() {
        let result = serde_json::from_value::<CheckerData>(json!({
            "type": "html",
            "url": "https://example.com/",
            "version-pattern": "v([0-9.]+)"
        }))
        .unwrap();

        assert_eq!(result, CheckerData::Unsupported);
    }

    #[rstest]
    #[case(Some(".v"), Some(".u"), None)]
    #[case(None, None, Some(".tag"))]
    #[case(Some(".v"), Some(".u"), Some(".tag"))]
    fn validate_accepts_either_query_set(
        #[case] version_query: Option<&str>,
        #[case] url_query: Option<&str>,
        #[case] tag_query: Option<&str>,
    ) {
        let data = JsonCheckerData {
            version_query: version_query.map(String::from),
            url_query: url_query.map(String::from),
            tag_query: tag_query.map(String::from),
            ..checker_data("https://example.com/x.json")
        };

        assert_eq!(data.validate(), Ok(()));
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(".v"), None, None)]
    #[case(None, Some(".u"), None)]
    #[case(Some(""), Some(".u"), None)]
    #[case(Some(".v"), Some(""), None)]
    #[case(None, None, Some(""))]
    fn validate_rejects_incomplete_query_sets(
        #[case] version_query: Option<&str>,
        #[case] url_query: Option<&str>,
        #[case] tag_query: Option<&str>,
    ) {
        let data = JsonCheckerData {
            version_query: version_query.map(String::from),
            url_query: url_query.map(String::from),
            tag_query: tag_query.map(String::from),
            ..checker_data("https://example.com/x.json")
        };

        assert_eq!(data.validate(), Err(ConfigError::NoQuerySet));
    }

    #[test]
    fn validate_rejects_relative_url() {
        let data = JsonCheckerData {
            tag_query: Some(".tag".to_string()),
            ..checker_data("releases.json")
        };

        assert!(matches!(
            data.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn json_checker_data_is_none_for_unsupported_checker() {
        let data = ExternalData::File(ExternalFile {
            name: "foo.tar.gz".to_string(),
            current_url: "https://example.com/foo.tar.gz".to_string(),
            checker_data: CheckerData::Unsupported,
        });

        assert_eq!(data.name(), "foo.tar.gz");
        assert!(data.json_checker_data().is_none());
    }
}
