use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Latest,
    Outdated,
    Newer,
    Invalid,
}

/// Strip a leading `v`/`V` as used by most git tags (e.g. "v1.2.3")
pub fn normalize_version(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// Does NOT strip 'v' prefix (use `normalize_version` first if needed).
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Compare the version currently in use to a discovered one
///
/// Versions that are not semver (after normalization) compare as `Invalid`
/// unless both strings are identical.
pub fn compare_versions(current_version: &str, discovered_version: &str) -> CompareResult {
    if current_version == discovered_version {
        return CompareResult::Latest;
    }

    let current = parse_version(normalize_version(current_version));
    let discovered = parse_version(normalize_version(discovered_version));

    match (current, discovered) {
        (Some(current), Some(discovered)) => match current.cmp(&discovered) {
            std::cmp::Ordering::Less => CompareResult::Outdated,
            std::cmp::Ordering::Equal => CompareResult::Latest,
            std::cmp::Ordering::Greater => CompareResult::Newer,
        },
        _ => CompareResult::Invalid,
    }
}
