//! Manifest loading
//!
//! Reads a flatpak-style JSON manifest and collects every source carrying
//! `x-checker-data` as an [`ExternalData`] record.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::checker::error::{ConfigError, ManifestError};
use crate::external_data::{
    CheckerData, ExternalData, ExternalFile, ExternalGitRef, ExternalGitRepo,
};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

/// Modules are either inline objects or paths to separate files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModuleEntry {
    Inline(Module),
    Path(String),
}

#[derive(Debug, Deserialize)]
struct Module {
    name: Option<String>,
    #[serde(default)]
    sources: Vec<SourceEntry>,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceEntry {
    Inline(Source),
    Path(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Source {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    commit: Option<String>,
    tag: Option<String>,
    branch: Option<String>,
    dest_filename: Option<String>,
    x_checker_data: Option<serde_json::Value>,
}

/// Load all checkable sources from the manifest at `path`
pub fn load_external_data(path: &Path) -> Result<Vec<ExternalData>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_external_data(&content).map_err(|e| match e {
        ManifestError::Parse { source, .. } => ManifestError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Parse manifest JSON into external data records
pub fn parse_external_data(content: &str) -> Result<Vec<ExternalData>, ManifestError> {
    let manifest: Manifest =
        serde_json::from_str(content).map_err(|source| ManifestError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;

    let mut records = Vec::new();
    collect_modules(&manifest.modules, &mut records)?;
    debug!("Found {} sources with checker data", records.len());
    Ok(records)
}

fn collect_modules(
    modules: &[ModuleEntry],
    records: &mut Vec<ExternalData>,
) -> Result<(), ManifestError> {
    for entry in modules {
        let module = match entry {
            ModuleEntry::Inline(module) => module,
            ModuleEntry::Path(path) => {
                debug!("Skipping external module file {}", path);
                continue;
            }
        };

        for source in &module.sources {
            let SourceEntry::Inline(source) = source else {
                continue;
            };
            if let Some(record) = external_data_from_source(module.name.as_deref(), source)? {
                records.push(record);
            }
        }

        collect_modules(&module.modules, records)?;
    }

    Ok(())
}

fn external_data_from_source(
    module_name: Option<&str>,
    source: &Source,
) -> Result<Option<ExternalData>, ManifestError> {
    let Some(raw_checker_data) = &source.x_checker_data else {
        return Ok(None);
    };
    let Some(url) = source.url.clone() else {
        warn!(
            "Source of type {} in module {:?} has checker data but no url",
            source.kind, module_name
        );
        return Ok(None);
    };

    let name = source_name(module_name, source, &url);
    let checker_data = serde_json::from_value::<CheckerData>(raw_checker_data.clone())
        .map_err(|e| ConfigError::Malformed(e.to_string()))
        .and_then(|data| -> Result<CheckerData, ConfigError> {
            if let CheckerData::Json(json) = &data {
                json.validate()?;
            }
            Ok(data)
        })
        .map_err(|source| ManifestError::InvalidCheckerData {
            name: name.clone(),
            source,
        })?;

    let record = match source.kind.as_str() {
        "git" => ExternalData::GitRepo(ExternalGitRepo {
            name,
            current_version: ExternalGitRef {
                url,
                commit: source.commit.clone(),
                tag: source.tag.clone(),
                branch: source.branch.clone(),
                version: None,
                timestamp: None,
            },
            checker_data,
        }),
        "file" | "archive" | "extra-data" => ExternalData::File(ExternalFile {
            name,
            current_url: url,
            checker_data,
        }),
        other => {
            debug!("Skipping source {} of unsupported type {}", name, other);
            return Ok(None);
        }
    };

    Ok(Some(record))
}

/// Name a source after its destination file name, the last URL segment, or
/// its module
fn source_name(module_name: Option<&str>, source: &Source, url: &str) -> String {
    if let Some(dest) = &source.dest_filename {
        return dest.clone();
    }

    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(|s| s.trim_end_matches(".git"))
        .filter(|s| !s.is_empty() && !s.contains(':'));

    segment
        .or(module_name)
        .unwrap_or(url)
        .to_string()
}
