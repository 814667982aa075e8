use crate::error::{Result, SolcError};
use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::sync::OnceLock;

fn valid_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+){1,2}$").expect("version pattern is valid"))
}

/// Whether `version` looks like `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`.
pub fn is_valid(version: &str) -> bool {
    valid_version_regex().is_match(version)
}

pub fn validate(version: &str) -> Result<()> {
    if is_valid(version) {
        Ok(())
    } else {
        Err(SolcError::InvalidVersion(version.to_string()))
    }
}

/// Parse a compiler version, padding a missing patch component with zero.
pub fn parse(version: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(version) {
        return Some(v);
    }
    if version.split('.').count() == 2 {
        return Version::parse(&format!("{}.0", version)).ok();
    }
    None
}

/// `true` when `version` sorts strictly below `threshold`. Unparseable
/// versions never count as older.
pub fn is_older_than(version: &str, threshold: &Version) -> bool {
    parse(version).is_some_and(|v| v < *threshold)
}

/// Semver-aware comparison; unparseable strings sort after parseable ones.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn sort(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(a, b));
}
