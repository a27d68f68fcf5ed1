//! Package identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Error returned when a string is not a valid package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid package name '{0}': expected a reverse-domain identifier such as com.example.app")]
pub struct PackageNameError(pub String);

fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$")
            .expect("package name pattern is valid")
    })
}

/// A validated reverse-domain package identifier.
///
/// Package names are case-sensitive and must contain at least two
/// dot-separated segments, each starting with a letter.
///
/// # Example
///
/// ```
/// use lellostore::package::PackageName;
///
/// let name = PackageName::parse("com.example.app").unwrap();
/// assert_eq!(name.as_str(), "com.example.app");
///
/// assert!(PackageName::parse("example").is_err());
/// assert!(PackageName::parse("com..app").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Parse and validate a package name.
    pub fn parse(value: impl Into<String>) -> Result<Self, PackageNameError> {
        let value = value.into();
        if package_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(PackageNameError(value))
        }
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the name, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_reverse_domain_names() {
        for name in ["com.test.app", "org.example.App_2", "io.a.b.c.d"] {
            assert!(PackageName::parse(name).is_ok(), "{} should parse", name);
        }
    }

    #[test]
    fn test_rejects_malformed_names() {
        for name in ["", "app", ".com.app", "com.app.", "com..app", "com.1app", "com/app"] {
            let err = PackageName::parse(name).unwrap_err();
            assert_eq!(err.0, name);
        }
    }

    #[test]
    fn test_from_str_and_display() {
        let name: PackageName = "com.test.app".parse().unwrap();
        assert_eq!(name.to_string(), "com.test.app");
        assert_eq!(name.into_string(), "com.test.app");
    }

    #[test]
    fn test_error_message_mentions_input() {
        let err = PackageName::parse("bogus").unwrap_err();
        assert!(err.to_string().contains("'bogus'"));
    }
}
