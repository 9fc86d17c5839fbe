//! Landmarks: the text a wait is looking for in device output.

use std::fmt;

use regex::Regex;

use crate::error::{ChannelError, Result};

/// Something to look for in a line of device output.
#[derive(Debug, Clone)]
pub enum Landmark {
    /// Case-insensitive substring. Stored lowercased.
    Contains(String),

    /// The whole line, compared exactly.
    Exact(String),

    /// A regular expression searched anywhere in the line.
    Pattern(Regex),
}

impl Landmark {
    /// Case-insensitive substring landmark.
    ///
    /// An empty needle matches any line.
    pub fn contains(needle: impl AsRef<str>) -> Self {
        Landmark::Contains(needle.as_ref().to_lowercase())
    }

    /// Exact whole-line landmark.
    pub fn exact(line: impl Into<String>) -> Self {
        Landmark::Exact(line.into())
    }

    /// Regular expression landmark.
    pub fn regex(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(ChannelError::InvalidPattern)?;
        Ok(Landmark::Pattern(re))
    }

    /// Check a line against this landmark.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Landmark::Contains(needle) => line.to_lowercase().contains(needle.as_str()),
            Landmark::Exact(expected) => line == expected,
            Landmark::Pattern(re) => re.is_match(line),
        }
    }
}

impl From<&str> for Landmark {
    fn from(needle: &str) -> Self {
        Landmark::contains(needle)
    }
}

impl From<String> for Landmark {
    fn from(needle: String) -> Self {
        Landmark::contains(needle)
    }
}

impl From<&String> for Landmark {
    fn from(needle: &String) -> Self {
        Landmark::contains(needle)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::Contains(needle) => write!(f, "~{needle:?}"),
            Landmark::Exact(line) => write!(f, "={line:?}"),
            Landmark::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_case_insensitive() {
        let landmark = Landmark::contains("initialization is done");
        assert!(landmark.matches("Boot: ...Initialization Is Done..."));
        assert!(!landmark.matches("init failed"));
    }

    #[test]
    fn test_exact_requires_whole_line() {
        let landmark = Landmark::exact("ready");
        assert!(landmark.matches("ready"));
        assert!(!landmark.matches("Ready"));
        assert!(!landmark.matches("ready!"));
        assert!(!landmark.matches("not ready"));
    }

    #[test]
    fn test_empty_matches_any_line() {
        let landmark = Landmark::from("");
        assert!(landmark.matches("anything"));
        assert!(landmark.matches(""));
    }

    #[test]
    fn test_regex_landmark() {
        let landmark = Landmark::regex(r"unit [0-9]+ \[MEMBER\]").unwrap();
        assert!(landmark.matches("ICX7150 unit 2 [MEMBER]#"));
        assert!(!landmark.matches("ICX7150 unit 2#"));
        assert!(matches!(
            Landmark::regex(r"(unclosed"),
            Err(crate::error::Error::Channel(ChannelError::InvalidPattern(_)))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Landmark::contains("TFTP Done").to_string(), "~\"tftp done\"");
        assert_eq!(Landmark::exact("y").to_string(), "=\"y\"");
    }
}
