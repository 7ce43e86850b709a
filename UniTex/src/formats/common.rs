//! Shared format types

use std::cmp::Ordering;
use std::fmt;

/// Unity engine version such as `2019.4.31f1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnityVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Release suffix, e.g. `f1`.
    pub build: String,
}

impl UnityVersion {
    /// Parse a version string; unparseable components become zero.
    ///
    /// Stripped builds report `0.0.0`, which compares lower than everything.
    pub fn parse(text: &str) -> Self {
        let mut numbers = [0u32; 3];
        let mut build = String::new();
        let mut parts = text.split('.');
        for slot in &mut numbers {
            let Some(part) = parts.next() else { break };
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            *slot = digits.parse().unwrap_or(0);
            if digits.len() < part.len() {
                build = part[digits.len()..].to_string();
                break;
            }
        }
        Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            build,
        }
    }

    /// Whether this version is `major.minor` or newer.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Whether this version is `major.minor.patch` or newer.
    pub fn at_least_patch(&self, major: u32, minor: u32, patch: u32) -> bool {
        (self.major, self.minor, self.patch) >= (major, minor, patch)
    }

    pub fn is_stripped(&self) -> bool {
        self.major == 0
    }
}

impl PartialOrd for UnityVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(
            (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)),
        )
    }
}

impl fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}{}", self.major, self.minor, self.patch, self.build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release() {
        let v = UnityVersion::parse("2019.4.31f1");
        assert_eq!((v.major, v.minor, v.patch), (2019, 4, 31));
        assert_eq!(v.build, "f1");
        assert!(v.at_least(2018, 2));
        assert!(!v.at_least(2020, 1));
        assert_eq!(v.to_string(), "2019.4.31f1");
    }

    #[test]
    fn test_parse_short_and_stripped() {
        let v = UnityVersion::parse("5.6.7f1");
        assert!(v.at_least(5, 3));
        assert!(!v.at_least(2017, 3));
        assert!(UnityVersion::parse("0.0.0").is_stripped());
        assert!(UnityVersion::parse("2.6") < UnityVersion::parse("3.0.0"));
    }
}
