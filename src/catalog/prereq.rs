//! Prerequisite and co-requisite extraction from course descriptions.
//!
//! Bulletin descriptions embed requirements as free text ("Prerequisite:
//! MATH 11.") usually followed by a unit annotation ("(4 units)"). The
//! extractor isolates the requirement span so it can be stored as its own
//! field, and rebuilds the description without it. Lab sections are the
//! exception: their descriptions are often nothing but the requirement, so
//! the text is annotated rather than cut.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum distance (in bytes) between a unit annotation's end and the
/// description's end for the annotation to count as trailing.
const TRAILING_UNITS_SLACK: usize = 4;

/// Short lab descriptions below this word count are annotated, not cut.
const LAB_SHORT_FORM_WORDS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteInfo {
    /// The isolated requirement text, whitespace-collapsed.
    pub prereq_text: String,
    /// Trailing unit annotation, e.g. "(4 units)".
    pub units_text: String,
    /// True when the requirement was cut out of the description. False for
    /// the lab short form, where the description is left untouched.
    pub removed: bool,
}

pub struct PrerequisiteExtractor {
    trigger: Regex,
    units: Regex,
}

impl PrerequisiteExtractor {
    pub fn new() -> Self {
        let trigger = Regex::new(
            r"(?i)pre-?requisites?|prereqs?|co-?requisites?|coreqs?|successful completion of|concurrent enrollment|must have taken|must have completed",
        )
        .expect("trigger pattern is valid");
        let units = Regex::new(r"\(\d+ units?\)").expect("units pattern is valid");
        PrerequisiteExtractor { trigger, units }
    }

    /// Extracts requirement info from `description` and returns the cleaned
    /// description alongside it. For the lab short form the returned
    /// description is byte-identical to the input.
    pub fn extract(&self, description: &str, number: &str) -> (String, PrerequisiteInfo) {
        let Some(trigger) = self.trigger.find(description) else {
            return (description.to_string(), PrerequisiteInfo::default());
        };

        let word_count = description.split_whitespace().count();
        if number.ends_with('L') && word_count < LAB_SHORT_FORM_WORDS {
            return (
                description.to_string(),
                self.extract_short_form(&description[trigger.start()..]),
            );
        }

        let mut span_end = description.len();
        let mut units_text = String::new();

        // A trailing unit annotation belongs to the requirement span only if
        // it starts inside it; one sitting before the trigger stays with the
        // description.
        if let Some(units) = self.units.find_iter(description).last() {
            if units.start() >= trigger.start()
                && description.len() - units.end() <= TRAILING_UNITS_SLACK
            {
                units_text = units.as_str().to_string();
                span_end = units.start();
            }
        }

        let mut prereq_text = collapse_whitespace(&description[trigger.start()..span_end]);
        if let Some(inner) = self.units.find_iter(&prereq_text).last() {
            if inner.end() == prereq_text.len() {
                let start = inner.start();
                prereq_text.truncate(start);
                prereq_text.truncate(prereq_text.trim_end().len());
            }
        }

        let prefix = description[..trigger.start()].trim_end();
        let cleaned = match (prefix.is_empty(), units_text.is_empty()) {
            (true, true) => String::new(),
            (true, false) => units_text.clone(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{prefix} {units_text}"),
        };

        (
            cleaned,
            PrerequisiteInfo {
                prereq_text,
                units_text,
                removed: true,
            },
        )
    }

    fn extract_short_form(&self, span: &str) -> PrerequisiteInfo {
        let mut prereq_text = span.to_string();
        let mut units_text = String::new();

        if let Some(units) = self.units.find(&prereq_text) {
            units_text = units.as_str().to_string();
            let range = units.range();
            prereq_text.replace_range(range, "");
        }

        PrerequisiteInfo {
            prereq_text: collapse_whitespace(&prereq_text),
            units_text,
            removed: false,
        }
    }
}

impl Default for PrerequisiteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PrerequisiteExtractor {
        PrerequisiteExtractor::new()
    }

    #[test]
    fn no_trigger_leaves_description_alone() {
        let desc = "An introduction to cultural anthropology. (4 units)";
        let (cleaned, info) = extractor().extract(desc, "1");
        assert_eq!(cleaned, desc);
        assert_eq!(info, PrerequisiteInfo::default());
    }

    #[test]
    fn standard_case_with_trailing_units() {
        let (cleaned, info) = extractor().extract("Prerequisite: MATH 11. (4 units)", "12");
        assert_eq!(info.prereq_text, "Prerequisite: MATH 11.");
        assert_eq!(info.units_text, "(4 units)");
        assert!(info.removed);
        assert_eq!(cleaned, "(4 units)");
    }

    #[test]
    fn standard_case_keeps_leading_description() {
        let desc = "Multivariate calculus with applications. Prerequisite: MATH 13. (4 units)";
        let (cleaned, info) = extractor().extract(desc, "14");
        assert_eq!(cleaned, "Multivariate calculus with applications. (4 units)");
        assert_eq!(info.prereq_text, "Prerequisite: MATH 13.");
        assert_eq!(info.units_text, "(4 units)");
        assert!(info.removed);
    }

    #[test]
    fn units_before_trigger_stay_in_description() {
        let desc = "Lecture and laboratory. (5 units) Corequisite: CHEM 12L.";
        let (cleaned, info) = extractor().extract(desc, "12");
        assert_eq!(cleaned, "Lecture and laboratory. (5 units)");
        assert_eq!(info.prereq_text, "Corequisite: CHEM 12L.");
        assert_eq!(info.units_text, "");
        assert!(info.removed);
    }

    #[test]
    fn lab_short_form_keeps_description_intact() {
        let desc = "Corequisite: PHYS 31. (1 unit)";
        let (cleaned, info) = extractor().extract(desc, "31L");
        assert_eq!(cleaned, desc);
        assert!(!info.removed);
        assert_eq!(info.prereq_text, "Corequisite: PHYS 31.");
        assert_eq!(info.units_text, "(1 unit)");
    }

    #[test]
    fn long_lab_description_uses_standard_case() {
        let desc = "Laboratory experiments covering mechanics, optics, and circuit analysis in depth. Prerequisite: PHYS 31. (1 unit)";
        let (cleaned, info) = extractor().extract(desc, "33L");
        assert!(info.removed);
        assert!(cleaned.starts_with("Laboratory experiments"));
        assert!(cleaned.ends_with("(1 unit)"));
        assert_eq!(info.prereq_text, "Prerequisite: PHYS 31.");
    }

    #[test]
    fn trigger_phrases_are_case_insensitive() {
        for phrase in [
            "PREREQUISITE: ACTG 11.",
            "Pre-requisite: ACTG 11.",
            "prereq: ACTG 11.",
            "Co-requisite: ACTG 11.",
            "coreq: ACTG 11.",
            "Successful completion of ACTG 11.",
            "Concurrent enrollment in ACTG 11.",
            "Must have taken ACTG 11.",
            "Must have completed ACTG 11.",
        ] {
            let desc = format!("Managerial accounting topics. {phrase}");
            let (_, info) = extractor().extract(&desc, "120");
            assert!(info.removed, "no trigger matched in {phrase:?}");
            assert!(!info.prereq_text.is_empty());
        }
    }

    #[test]
    fn whitespace_is_collapsed_in_prereq_text() {
        let desc = "Topics vary.  Prerequisite:   ECON 1\n and ECON 2. (5 units)";
        let (cleaned, info) = extractor().extract(desc, "100");
        assert_eq!(info.prereq_text, "Prerequisite: ECON 1 and ECON 2.");
        assert_eq!(cleaned, "Topics vary. (5 units)");
    }
}
