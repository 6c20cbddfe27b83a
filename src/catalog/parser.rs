//! Department page parser.
//!
//! Walks one department's content blocks in document order and emits course
//! records. Category resolution is stateful: the department name is the
//! default category, section headers and the table-driven rules in
//! [`departments`] override it as the walk progresses.

use crate::catalog::departments::{self, CategoryTrigger, DepartmentRules, LANGUAGES};
use crate::catalog::types::{
    is_course_number, leading_number, BlockKind, College, ContentBlock, CourseRecord,
};

pub struct CatalogParser;

impl CatalogParser {
    pub fn new() -> Self {
        CatalogParser
    }

    /// Parses one department's blocks into course records. Headings that do
    /// not carry a valid course number (lab section banners and similar
    /// noise) are dropped, as is any text below them.
    pub fn parse_department(
        &self,
        blocks: &[ContentBlock],
        department: &str,
        college: College,
    ) -> Vec<CourseRecord> {
        let rules = departments::rules_for(department);
        let mut state = WalkState::new(department, rules);
        let mut records = Vec::new();
        let mut open: Option<OpenCourse> = None;

        for block in blocks {
            match block.kind {
                BlockKind::SectionHeading => {
                    if let Some(category) = departments::section_category(&block.text) {
                        state.category = category.to_string();
                    }
                }
                BlockKind::CourseHeading => {
                    if let Some(course) = open.take() {
                        records.push(course.finish(college));
                    }

                    let Some((number, title)) = split_heading(&block.text) else {
                        tracing::debug!(
                            department,
                            heading = %block.text,
                            "discarding non-course heading"
                        );
                        continue;
                    };

                    state.apply_triggers(&number, &title);
                    state.last_number = leading_number(&number);

                    open = Some(OpenCourse {
                        number,
                        title,
                        category: state.category.clone(),
                        parts: Vec::new(),
                    });
                }
                BlockKind::Text => {
                    if let Some(course) = open.as_mut() {
                        let text = block.text.trim();
                        if !text.is_empty() {
                            course.parts.push(text.to_string());
                        }
                    }
                }
            }
        }

        if let Some(course) = open.take() {
            records.push(course.finish(college));
        }

        records
    }
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self::new()
    }
}

struct WalkState {
    rules: Option<&'static DepartmentRules>,
    category: String,
    /// Index into the rules' category sequence, for one-way advances.
    sequence_idx: usize,
    last_number: Option<u32>,
}

impl WalkState {
    fn new(department: &str, rules: Option<&'static DepartmentRules>) -> Self {
        let category = match rules {
            Some(r) if !r.categories.is_empty() => r.categories[0].to_string(),
            _ => departments::normalize(department),
        };
        WalkState {
            rules,
            category,
            sequence_idx: 0,
            last_number: None,
        }
    }

    fn apply_triggers(&mut self, number: &str, title: &str) {
        let Some(rules) = self.rules else { return };

        match rules.trigger {
            CategoryTrigger::NumericDrop { margin } => {
                if self.sequence_idx + 1 < rules.categories.len() {
                    if let (Some(last), Some(current)) = (self.last_number, leading_number(number))
                    {
                        if current + margin < last {
                            self.advance(rules);
                        }
                    }
                }
            }
            CategoryTrigger::AnchorNumber { anchor } => {
                if self.sequence_idx + 1 < rules.categories.len() && number == anchor {
                    self.advance(rules);
                }
            }
            CategoryTrigger::LanguageKeyword => {
                let title_lower = title.to_lowercase();
                if let Some(language) = LANGUAGES
                    .iter()
                    .find(|language| title_lower.contains(&language.to_lowercase()))
                {
                    self.category = format!("{language} Studies");
                }
            }
        }
    }

    fn advance(&mut self, rules: &DepartmentRules) {
        self.sequence_idx += 1;
        self.category = rules.categories[self.sequence_idx].to_string();
    }
}

struct OpenCourse {
    number: String,
    title: String,
    category: String,
    parts: Vec<String>,
}

impl OpenCourse {
    fn finish(self, college: College) -> CourseRecord {
        let tag = departments::tag_for(&self.category).to_string();
        CourseRecord {
            college,
            category: self.category,
            number: self.number,
            title: self.title,
            description: self.parts.join(" "),
            tag,
            pre_reqs: String::new(),
        }
    }
}

/// Splits a course heading on its first period: "11. Calculus I" ->
/// ("11", "Calculus I"). Returns None when the left side is not a course
/// number.
fn split_heading(heading: &str) -> Option<(String, String)> {
    let mut parts = heading.splitn(2, '.');
    let number = parts.next().unwrap_or("").trim().to_string();
    if !is_course_number(&number) {
        return None;
    }
    let title = parts
        .next()
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Some((number, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ContentBlock as B;

    fn parse(blocks: &[ContentBlock], department: &str) -> Vec<CourseRecord> {
        CatalogParser::new().parse_department(blocks, department, College::Cas)
    }

    #[test]
    fn numbers_always_match_the_course_pattern() {
        let blocks = vec![
            B::course("1. Introduction to Anthropology"),
            B::text("Survey of the field."),
            B::course("Laboratory Sections"),
            B::text("Orphaned text that must not attach anywhere."),
            B::course("111A. Field Methods"),
            B::text("Hands-on methods."),
        ];
        let records = parse(&blocks, "Anthropology");

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(is_course_number(&record.number), "{:?}", record.number);
        }
        assert_eq!(records[1].description, "Hands-on methods.");
    }

    #[test]
    fn description_blocks_accumulate_space_joined() {
        let blocks = vec![
            B::course("12. Accounting II"),
            B::text("Continuation of financial accounting."),
            B::text("Covers partnerships and corporations."),
        ];
        let records = parse(&blocks, "Accounting");
        assert_eq!(
            records[0].description,
            "Continuation of financial accounting. Covers partnerships and corporations."
        );
        assert_eq!(records[0].tag, "ACTG");
    }

    #[test]
    fn numeric_drop_switches_math_to_computer_science() {
        let blocks = vec![
            B::course("11. Calculus and Analytic Geometry I"),
            B::text("Limits and derivatives."),
            B::course("178. Number Theory"),
            B::text("Divisibility and congruences."),
            B::course("10. Introduction to Computer Science"),
            B::text("Algorithmic problem solving."),
        ];
        let records = parse(&blocks, "Mathematics and Computer Science");

        assert_eq!(records[0].category, "Mathematics");
        assert_eq!(records[0].tag, "MATH");
        assert_eq!(records[1].category, "Mathematics");
        assert_eq!(records[2].category, "Computer Science");
        assert_eq!(records[2].tag, "CSCI");
    }

    #[test]
    fn small_gaps_do_not_trigger_the_numeric_drop() {
        let blocks = vec![
            B::course("100. Real Analysis"),
            B::course("53. Linear Algebra"),
        ];
        let records = parse(&blocks, "Mathematics and Computer Science");
        // A drop of 47 is ordinary renumbering, not a subject restart.
        assert_eq!(records[1].category, "Mathematics");
    }

    #[test]
    fn anchor_number_opens_the_dance_sequence() {
        let blocks = vec![
            B::course("8. Introduction to Theatre"),
            B::course("40. Beginning Ballet"),
            B::course("45. Modern Dance"),
        ];
        let records = parse(&blocks, "Theatre and Dance");

        assert_eq!(records[0].category, "Theatre");
        assert_eq!(records[0].tag, "THTR");
        assert_eq!(records[1].category, "Dance");
        assert_eq!(records[1].tag, "DANC");
        assert_eq!(records[2].category, "Dance");
    }

    #[test]
    fn language_titles_resolve_to_language_studies() {
        let blocks = vec![
            B::course("1. Elementary French I"),
            B::course("21. Intermediate Japanese"),
        ];
        let records = parse(&blocks, "Modern Languages and Literatures");

        assert_eq!(records[0].category, "French Studies");
        assert_eq!(records[1].category, "Japanese Studies");
        // No registrar code for aggregated language offerings.
        assert_eq!(records[0].tag, "");
    }

    #[test]
    fn section_header_overrides_category() {
        let blocks = vec![
            B::course("5. Religions of the Book"),
            B::section("Asian Studies"),
            B::course("100. East Asian Civilizations"),
        ];
        let records = parse(&blocks, "Religious Studies");

        assert_eq!(records[0].category, "Religious Studies");
        assert_eq!(records[0].tag, "TESP");
        assert_eq!(records[1].category, "Asian Studies");
        assert_eq!(records[1].tag, "ASIA");
    }

    #[test]
    fn heading_title_keeps_text_after_later_periods() {
        let blocks = vec![B::course("50. Topics: U.S. History to 1877")];
        let records = parse(&blocks, "History");
        assert_eq!(records[0].number, "50");
        assert_eq!(records[0].title, "Topics: U.S. History to 1877");
    }
}
