//! Query evaluation against a JSON document

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::checker::error::CheckerQueryError;

/// Post-filter rejecting any query result that is not a string or a number
const SCALAR_TYPE_CHECK: &str =
    r#".|type as $rt | if $rt=="string" or $rt=="number" then . else error($rt) end"#;

/// Default jq executable
pub const DEFAULT_JQ_PROGRAM: &str = "jq";

/// Named string variables visible to a query
pub type Bindings = IndexMap<String, String>;

/// Evaluates one query expression against a JSON document
///
/// The result must be a scalar (string or number); anything else is an error.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait QueryEvaluator: Send + Sync {
    /// Runs `query` against `document` with `bindings` available as variables
    ///
    /// # Returns
    /// * `Ok(String)` - The scalar result, trimmed
    /// * `Err(CheckerQueryError)` - If the query fails or yields a non-scalar
    async fn evaluate(
        &self,
        query: &str,
        document: &[u8],
        bindings: &Bindings,
    ) -> Result<String, CheckerQueryError>;
}

/// Wraps a user query with the scalar type assertion
pub fn build_typed_query(query: &str) -> String {
    format!("( {} ) | ( {} )", query, SCALAR_TYPE_CHECK)
}

/// [`QueryEvaluator`] running the `jq` executable
#[derive(Debug, Clone)]
pub struct JqEvaluator {
    program: PathBuf,
}

impl JqEvaluator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, query: &str, bindings: &Bindings) -> Command {
        let mut cmd = Command::new(&self.program);
        for (name, value) in bindings {
            cmd.arg("--arg").arg(name).arg(value);
        }
        cmd.args(["-r", "-e"])
            .arg(build_typed_query(query))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for JqEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_JQ_PROGRAM)
    }
}

#[async_trait::async_trait]
impl QueryEvaluator for JqEvaluator {
    async fn evaluate(
        &self,
        query: &str,
        document: &[u8],
        bindings: &Bindings,
    ) -> Result<String, CheckerQueryError> {
        debug!("Running jq query {:?} with {} variables", query, bindings.len());

        let mut child = self
            .command(query, bindings)
            .spawn()
            .map_err(|e| CheckerQueryError::with_source("Error running jq", e))?;

        // Output is drained while the document is written, otherwise both
        // sides block once a pipe fills up. stdin is dropped after the write
        // so jq sees EOF.
        let stdin = child.stdin.take();
        let write_document = async move {
            let Some(mut stdin) = stdin else {
                return Ok::<(), std::io::Error>(());
            };
            match stdin.write_all(document).await {
                // jq stopped reading; its exit status tells why
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
        };

        let (_, output) = tokio::try_join!(write_document, child.wait_with_output())
            .map_err(|e| CheckerQueryError::with_source("Error running jq", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CheckerQueryError::with_source(
                "Error running jq",
                format!("jq exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn jq_available() -> bool {
        std::process::Command::new(DEFAULT_JQ_PROGRAM)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn build_typed_query_wraps_query_with_type_check() {
        assert_eq!(
            build_typed_query(".version"),
            r#"( .version ) | ( .|type as $rt | if $rt=="string" or $rt=="number" then . else error($rt) end )"#
        );
    }

    #[tokio::test]
    async fn evaluate_returns_error_when_program_is_missing() {
        let evaluator = JqEvaluator::new("/nonexistent/jq-binary");

        let result = evaluator
            .evaluate(".v", br#"{"v": "1.0"}"#, &Bindings::new())
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.message(), "Error running jq");
    }

    #[rstest]
    #[case(r#"{"v": "1.2.3"}"#, ".v", "1.2.3")]
    #[case(r#"{"v": 42}"#, ".v", "42")]
    #[case(r#"{"v": "  padded\n"}"#, ".v", "padded")]
    #[case(r#"{"releases": [{"v": "2.0"}, {"v": "1.0"}]}"#, ".releases[0].v", "2.0")]
    #[tokio::test]
    async fn evaluate_returns_trimmed_scalar(
        #[case] document: &str,
        #[case] query: &str,
        #[case] expected: &str,
    ) {
        if !jq_available() {
            return;
        }

        let result = JqEvaluator::default()
            .evaluate(query, document.as_bytes(), &Bindings::new())
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[rstest]
    #[case(".flag")]
    #[case(".nothing")]
    #[case(".list")]
    #[case(".object")]
    #[case(".[")]
    #[tokio::test]
    async fn evaluate_rejects_non_scalar_or_invalid_query(#[case] query: &str) {
        if !jq_available() {
            return;
        }
        let document = br#"{"flag": true, "nothing": null, "list": ["1"], "object": {"a": "b"}}"#;

        let result = JqEvaluator::default()
            .evaluate(query, document, &Bindings::new())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn evaluate_exposes_bindings_as_variables() {
        if !jq_available() {
            return;
        }
        let bindings = Bindings::from([("version".to_string(), "1.2.3".to_string())]);

        let result = JqEvaluator::default()
            .evaluate(
                r#""https://example.com/foo-\($version).tar.gz""#,
                b"{}",
                &bindings,
            )
            .await
            .unwrap();

        assert_eq!(result, "https://example.com/foo-1.2.3.tar.gz");
    }

    #[tokio::test]
    async fn evaluate_drains_output_larger_than_pipe_buffer() {
        if !jq_available() {
            return;
        }
        let document = "\"abcdefghijklmnop\"\n".repeat(200_000);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            JqEvaluator::default().evaluate(".", document.as_bytes(), &Bindings::new()),
        )
        .await
        .expect("jq evaluation did not finish")
        .unwrap();

        assert_eq!(result.lines().count(), 200_000);
    }

    #[tokio::test]
    async fn evaluate_reports_type_errors_for_large_streams() {
        if !jq_available() {
            return;
        }
        let document = "[1]\n".repeat(200_000);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            JqEvaluator::default().evaluate(".", document.as_bytes(), &Bindings::new()),
        )
        .await
        .expect("jq evaluation did not finish");

        assert!(result.is_err());
    }

    /// Whether any running process has `marker` in its command line
    #[cfg(target_os = "linux")]
    fn process_with_arg_exists(marker: &str) -> bool {
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return false;
        };
        entries.flatten().any(|entry| {
            std::fs::read(entry.path().join("cmdline"))
                .map(|cmdline| String::from_utf8_lossy(&cmdline).contains(marker))
                .unwrap_or(false)
        })
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn evaluate_kills_jq_when_cancelled() {
        if !jq_available() {
            return;
        }
        let marker = format!("cancelled-{}", std::process::id());
        let query = format!(r#""{}" as $m | reduce range(1e12) as $i (0; . + 1)"#, marker);

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            JqEvaluator::default().evaluate(&query, b"null", &Bindings::new()),
        )
        .await;

        assert!(result.is_err());
        let mut gone = false;
        for _ in 0..50 {
            if !process_with_arg_exists(&marker) {
                gone = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(gone, "jq process outlived the cancelled evaluation");
    }
}
