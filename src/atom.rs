use crate::error::{Error, Result};
use crate::version::BasicVersion;

/// Split a `name-version` key into package name and version string.
///
/// The version starts after the first `-` that is followed by a digit and
/// whose remainder parses as a version without trailing garbage, so
/// package names may themselves contain dashes and digits.
///
/// # Examples
///
/// ```
/// use eix_cache::split_atom;
///
/// let (name, version) = split_atom("font-adobe-100dpi-1.0.3-r2").unwrap();
/// assert_eq!(name, "font-adobe-100dpi");
/// assert_eq!(version, "1.0.3-r2");
/// assert!(split_atom("no-version-here").is_err());
/// ```
pub fn split_atom(key: &str) -> Result<(&str, &str)> {
    key.match_indices('-')
        .map(|(at, _)| at)
        .filter(|&at| at > 0)
        .filter(|&at| key[at + 1..].starts_with(|c: char| c.is_ascii_digit()))
        .find(|&at| is_clean_version(&key[at + 1..]))
        .map(|at| (&key[..at], &key[at + 1..]))
        .ok_or_else(|| Error::InvalidAtom(key.to_string()))
}

fn is_clean_version(candidate: &str) -> bool {
    if candidate.contains(|c: char| !is_version_char(c)) {
        return false;
    }
    // rejected candidates are not worth a warning
    BasicVersion::parse_quiet(candidate).garbage().is_empty()
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
