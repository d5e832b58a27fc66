//! Dotted numeric versions, as used by SDK build-tools directory names.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A version made of dot-separated unsigned integers, e.g. `23.0.1`.
///
/// Ordering compares components numerically from left to right, so
/// `9.0.0 < 10.0.2`. A shorter version that is a prefix of a longer one
/// sorts first (`23.0 < 23.0.1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedVersion {
    components: Vec<u64>,
}

/// Why a string is not a dotted version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{input}' is not a dotted numeric version")]
pub struct ParseVersionError {
    input: String,
}

impl FromStr for DottedVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .split('.')
            .map(str::parse::<u64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseVersionError { input: s.into() })?;
        Ok(Self { components })
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.components.iter().zip(&other.components) {
            match a.cmp(b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.components.len().cmp(&other.components.len())
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Pick the name with the highest dotted version.
///
/// Names that do not parse are skipped. Returns `None` when nothing parses.
pub fn select_highest<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(|name| match name.parse::<DottedVersion>() {
            Ok(version) => Some((version, name)),
            Err(_) => {
                tracing::debug!(entry = name, "skipping non-version entry");
                None
            }
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> DottedVersion {
        s.parse().unwrap()
    }

    #[test]
    fn numeric_not_lexicographic() {
        assert!(v("9.0.0") < v("10.0.2"));
        assert!(v("10.0.2") < v("23.0.1"));
        assert!(v("23.0.1") > v("23.0.0"));
    }

    #[test]
    fn prefix_sorts_first() {
        assert!(v("23.0") < v("23.0.1"));
        assert_eq!(v("1.2.3"), v("1.2.3"));
    }

    #[test]
    fn selects_highest_build_tools() {
        let names = ["9.0.0", "23.0.1", "10.0.2"];
        assert_eq!(select_highest(names), Some("23.0.1"));
    }

    #[test]
    fn skips_unparsable_names() {
        let names = ["android-4.4W", "19.1.0", "28.0.0-rc1"];
        assert_eq!(select_highest(names), Some("19.1.0"));
        assert_eq!(select_highest(["preview"]), None);
        assert_eq!(select_highest(Vec::<&str>::new()), None);
    }

    #[test]
    fn rejects_empty_components() {
        assert!("1..2".parse::<DottedVersion>().is_err());
        assert!("".parse::<DottedVersion>().is_err());
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(v("30.0.3").to_string(), "30.0.3");
    }
}
