use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single failure kind of the JSON checker core.
///
/// Covers fetch transport failures, query process failures, non-scalar query
/// results and malformed timestamps. The underlying cause is kept as the
/// error source for diagnostics.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CheckerQueryError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CheckerQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Problems with the `x-checker-data` of a record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required query: {0}")]
    MissingQuery(&'static str),

    #[error("Checker data needs either version-query and url-query, or tag-query")]
    NoQuerySet,

    #[error("Malformed checker data: {0}")]
    Malformed(String),

    #[error("Invalid checker URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git ls-remote {url} failed: {stderr}")]
    Command { url: String, stderr: String },

    #[error("Git reference for {0} has no tag to resolve")]
    MissingTag(String),

    #[error("Tag {tag} not found in {url}")]
    TagNotFound { url: String, tag: String },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid checker data for source {name}: {source}")]
    InvalidCheckerData { name: String, source: ConfigError },
}

/// Error returned by a [`Checker`](crate::checker::backend::Checker)
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Query(#[from] CheckerQueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Check timed out after {0} ms")]
    Timeout(u64),
}
