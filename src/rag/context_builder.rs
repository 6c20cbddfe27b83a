//! Prompt assembly.
//!
//! Builds the completion prompt in a fixed order: prior conversation
//! summary, retrieved course documents, recent turns, the literal query,
//! and a closing instruction. The persona/grounding system instruction is
//! configuration and travels in the request's system field, not here.

use crate::history::{ChatHistory, Role};

use super::retriever::RetrievedDoc;

pub struct PromptAssembler {
    /// Label replacing the bot role inside the rendered conversation.
    persona_label: String,
    recent_turns: usize,
    /// Budget for the documents block; records past it are dropped.
    max_context_chars: usize,
}

impl PromptAssembler {
    pub fn new(persona_label: &str, recent_turns: usize, max_context_chars: usize) -> Self {
        PromptAssembler {
            persona_label: persona_label.to_string(),
            recent_turns,
            max_context_chars,
        }
    }

    pub fn assemble(
        &self,
        query: &str,
        docs: &[RetrievedDoc],
        history: &ChatHistory,
    ) -> String {
        let mut prompt = String::new();

        if let Some(summary) = history.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt.push_str("CONVERSATION SUMMARY:\n");
            prompt.push_str(summary.trim());
            prompt.push_str("\n\n");
        }

        prompt.push_str("DOCUMENTS:\n");
        let mut used = 0usize;
        for doc in docs {
            let rendered = render_doc(doc);
            if used + rendered.len() > self.max_context_chars {
                tracing::debug!("document block budget reached, truncating context");
                break;
            }
            used += rendered.len();
            prompt.push_str(&rendered);
            prompt.push('\n');
        }

        if !history.turns.is_empty() {
            prompt.push_str("\nCONVERSATION:\n");
            for turn in history.turns.iter().rev().take(self.recent_turns).rev() {
                let label = match turn.role {
                    Role::User => "Student",
                    Role::Bot => self.persona_label.as_str(),
                };
                prompt.push_str(&format!("{label}: {}\n", turn.message));
            }
        }

        prompt.push_str(&format!("\nQUERY: {query}\n"));
        prompt.push_str("Answer the query helpfully using the course documents above.\n");

        prompt
    }
}

fn render_doc(doc: &RetrievedDoc) -> String {
    let record = &doc.record;
    let label = if record.tag.is_empty() {
        record.number.clone()
    } else {
        format!("{}-{}", record.tag, record.number)
    };

    format!(
        "[{label}] {}\nDepartment: {}\nDescription: {}\nPre-requisites: {}\n",
        record.title, record.category, record.description, record.pre_reqs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{College, CourseRecord};
    use crate::history::ChatTurn;

    fn doc(tag: &str, number: &str, title: &str, pre_reqs: &str) -> RetrievedDoc {
        RetrievedDoc {
            record: CourseRecord {
                college: College::Soe,
                category: "Computer Science and Engineering".to_string(),
                number: number.to_string(),
                title: title.to_string(),
                description: "Project-based software engineering.".to_string(),
                tag: tag.to_string(),
                pre_reqs: pre_reqs.to_string(),
            },
            score: 0.9,
        }
    }

    fn turn(role: Role, message: &str) -> ChatTurn {
        ChatTurn {
            role,
            message: message.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn assembler() -> PromptAssembler {
        PromptAssembler::new("Advisor", 5, 6000)
    }

    #[test]
    fn prompt_contains_tag_number_label_and_prereqs() {
        let docs = vec![doc("CSEN", "174", "Software Engineering", "CSEN 146")];
        let prompt = assembler().assemble(
            "What are the prerequisites for CSEN 174?",
            &docs,
            &ChatHistory::default(),
        );

        assert!(prompt.contains("CSEN-174"));
        assert!(prompt.contains("CSEN 146"));
        assert!(prompt.contains("QUERY: What are the prerequisites for CSEN 174?"));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let docs = vec![doc("CSEN", "174", "Software Engineering", "CSEN 146")];
        let history = ChatHistory {
            turns: vec![
                turn(Role::User, "hello"),
                turn(Role::Bot, "hi, how can I help?"),
            ],
            summary: Some("Earlier we discussed intro CS courses.".to_string()),
        };

        let prompt = assembler().assemble("next question", &docs, &history);

        let summary_at = prompt.find("CONVERSATION SUMMARY:").unwrap();
        let docs_at = prompt.find("DOCUMENTS:").unwrap();
        let convo_at = prompt.find("CONVERSATION:\n").unwrap();
        let query_at = prompt.find("QUERY:").unwrap();
        assert!(summary_at < docs_at);
        assert!(docs_at < convo_at);
        assert!(convo_at < query_at);
    }

    #[test]
    fn bot_turns_are_renamed_to_the_persona() {
        let history = ChatHistory {
            turns: vec![
                turn(Role::User, "is math 11 hard?"),
                turn(Role::Bot, "it is a standard first course"),
            ],
            summary: None,
        };

        let prompt = assembler().assemble("ok", &[], &history);
        assert!(prompt.contains("Student: is math 11 hard?"));
        assert!(prompt.contains("Advisor: it is a standard first course"));
        assert!(!prompt.contains("bot:"));
    }

    #[test]
    fn untagged_records_fall_back_to_the_bare_number() {
        let mut d = doc("", "101", "Elementary Arabic", "");
        d.record.category = "Arabic Studies".to_string();
        let prompt = assembler().assemble("arabic courses?", &[d], &ChatHistory::default());
        assert!(prompt.contains("[101] Elementary Arabic"));
    }

    #[test]
    fn document_budget_truncates_extra_records() {
        let docs: Vec<RetrievedDoc> = (0..50)
            .map(|i| doc("MATH", &format!("{i}"), "Course with a long title", ""))
            .collect();
        let small = PromptAssembler::new("Advisor", 5, 300);

        let prompt = small.assemble("query", &docs, &ChatHistory::default());
        assert!(prompt.len() < 1000);
        assert!(prompt.contains("[MATH-0]"));
        assert!(!prompt.contains("[MATH-49]"));
    }

    #[test]
    fn conversation_window_is_bounded() {
        let history = ChatHistory {
            turns: (0..12)
                .map(|i| turn(Role::User, &format!("message {i}")))
                .collect(),
            summary: None,
        };

        let prompt = assembler().assemble("q", &[], &history);
        assert!(!prompt.contains("message 6"));
        assert!(prompt.contains("message 7"));
        assert!(prompt.contains("message 11"));
    }
}
