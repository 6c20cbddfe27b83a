use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Colleges of the bulletin. Serialized with their catalog codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum College {
    #[serde(rename = "CAS")]
    Cas,
    #[serde(rename = "LSB")]
    Lsb,
    #[serde(rename = "SOE")]
    Soe,
}

impl College {
    pub fn as_str(&self) -> &'static str {
        match self {
            College::Cas => "CAS",
            College::Lsb => "LSB",
            College::Soe => "SOE",
        }
    }
}

impl fmt::Display for College {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for College {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAS" => Ok(College::Cas),
            "LSB" => Ok(College::Lsb),
            "SOE" => Ok(College::Soe),
            other => Err(format!("unknown college code: {other}")),
        }
    }
}

/// One course of the catalog, as stored and retrieved.
///
/// `category` is the resolved department or sub-category name; `tag` is its
/// registrar short code, empty when the category has no known code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub college: College,
    pub category: String,
    pub number: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub pre_reqs: String,
}

/// Course numbers are a numeric value plus an optional letter suffix
/// ("11", "11L", "179S"). Anything else in a heading is page noise.
pub fn is_course_number(value: &str) -> bool {
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    if digits_end == 0 {
        return false;
    }
    value[digits_end..].chars().all(|c| c.is_ascii_alphabetic())
}

/// Leading numeric value of a course number ("178A" -> 178).
pub fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Content block of a department page, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Top-level section header (h1/h2) that may rename the category.
    SectionHeading,
    /// Course heading (h3): "NUMBER. Title".
    CourseHeading,
    /// Free text belonging to the most recent course heading.
    Text,
}

impl ContentBlock {
    pub fn section(text: impl Into<String>) -> Self {
        ContentBlock {
            kind: BlockKind::SectionHeading,
            text: text.into(),
        }
    }

    pub fn course(text: impl Into<String>) -> Self {
        ContentBlock {
            kind: BlockKind::CourseHeading,
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock {
            kind: BlockKind::Text,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_number_pattern() {
        assert!(is_course_number("11"));
        assert!(is_course_number("11L"));
        assert!(is_course_number("179S"));
        assert!(is_course_number("100EL"));

        assert!(!is_course_number(""));
        assert!(!is_course_number("L11"));
        assert!(!is_course_number("11L2"));
        assert!(!is_course_number("Laboratory Sections"));
        assert!(!is_course_number("11 L"));
    }

    #[test]
    fn leading_number_parses_prefix() {
        assert_eq!(leading_number("178A"), Some(178));
        assert_eq!(leading_number("10"), Some(10));
        assert_eq!(leading_number("abc"), None);
    }

    #[test]
    fn college_round_trip() {
        for code in ["CAS", "LSB", "SOE"] {
            assert_eq!(code.parse::<College>().unwrap().as_str(), code);
        }
        assert!("XYZ".parse::<College>().is_err());
    }
}
