//! Prompt assembly: history windowing and context injection.
//!
//! The window size and retrieval depth are fixed small constants rather than
//! configuration. A bounded recent window keeps prompt size predictable on
//! local hardware regardless of session length.

use hearth_core::types::{MessageRecord, PromptMessage};
use hearth_retrieval::Passage;

/// How many recent turns are replayed into the prompt.
pub const HISTORY_WINDOW: u64 = 5;

/// How many context passages are requested per turn.
pub const RETRIEVAL_K: usize = 5;

/// Maximum length, in characters, of a title claimed from the first query.
pub const TITLE_MAX_CHARS: usize = 100;

/// Preamble of the system message carrying retrieved context.
pub const CONTEXT_PREAMBLE: &str =
    "Use the following context to inform your response when relevant:";

/// Expand stored turns into role-tagged prompt entries.
///
/// Each turn contributes a user entry and, when a response exists, an
/// assistant entry. `history` must already be in chronological order.
pub fn history_to_messages(history: &[MessageRecord]) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2);
    for turn in history {
        messages.push(PromptMessage::user(turn.user_message.clone()));
        if let Some(response) = &turn.assistant_response {
            messages.push(PromptMessage::assistant(response.clone()));
        }
    }
    messages
}

/// Assemble the full message list for one turn.
///
/// With no context passages the query is appended as a bare user entry and
/// no system message is added. With passages, a single system entry carrying
/// the joined passages precedes the user entry.
pub fn assemble_prompt(
    history: Vec<PromptMessage>,
    passages: &[Passage],
    query: &str,
) -> Vec<PromptMessage> {
    let mut messages = history;

    if !passages.is_empty() {
        let joined = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        messages.push(PromptMessage::system(format!(
            "{}\n{}",
            CONTEXT_PREAMBLE, joined
        )));
    }
    messages.push(PromptMessage::user(query));

    messages
}

/// Truncate a query to the title length limit, respecting char boundaries.
pub fn truncate_title(query: &str) -> String {
    query.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::types::ChatRole;
    use uuid::Uuid;

    fn turn(user: &str, assistant: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_message: user.to_string(),
            assistant_response: assistant.map(String::from),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn passage(content: &str) -> Passage {
        Passage {
            content: content.to_string(),
            score: 0.9,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_history_expansion_pairs() {
        let history = vec![turn("q1", Some("a1")), turn("q2", Some("a2"))];
        let messages = history_to_messages(&history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], PromptMessage::user("q1"));
        assert_eq!(messages[1], PromptMessage::assistant("a1"));
        assert_eq!(messages[2], PromptMessage::user("q2"));
        assert_eq!(messages[3], PromptMessage::assistant("a2"));
    }

    #[test]
    fn test_history_expansion_skips_pending_response() {
        let history = vec![turn("q1", None), turn("q2", Some("a2"))];
        let messages = history_to_messages(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1], PromptMessage::user("q2"));
    }

    #[test]
    fn test_no_context_appends_bare_user_entry() {
        let messages = assemble_prompt(vec![PromptMessage::user("earlier")], &[], "the query");
        assert_eq!(messages.len(), 2);
        assert_eq!(*messages.last().unwrap(), PromptMessage::user("the query"));
        assert!(messages.iter().all(|m| m.role != ChatRole::System));
    }

    #[test]
    fn test_context_branch_exact_template() {
        let messages = assemble_prompt(vec![], &[passage("A"), passage("B")], "the query");
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            PromptMessage::system(
                "Use the following context to inform your response when relevant:\nA\n\nB"
            )
        );
        assert_eq!(messages[1], PromptMessage::user("the query"));
    }

    #[test]
    fn test_context_system_entry_immediately_precedes_user_entry() {
        let messages = assemble_prompt(
            vec![PromptMessage::user("q1"), PromptMessage::assistant("a1")],
            &[passage("only passage")],
            "follow-up",
        );
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role, ChatRole::System);
        assert_eq!(messages[3], PromptMessage::user("follow-up"));
    }

    #[test]
    fn test_single_passage_no_blank_line() {
        let messages = assemble_prompt(vec![], &[passage("P")], "q");
        assert_eq!(
            messages[0].content,
            "Use the following context to inform your response when relevant:\nP"
        );
    }

    #[test]
    fn test_truncate_title_short_query_unchanged() {
        assert_eq!(truncate_title("What is 2+2?"), "What is 2+2?");
    }

    #[test]
    fn test_truncate_title_exactly_100_chars() {
        let query = "x".repeat(250);
        let title = truncate_title(&query);
        assert_eq!(title.chars().count(), 100);
        assert_eq!(title, "x".repeat(100));
    }

    #[test]
    fn test_truncate_title_multibyte_boundary() {
        let query = "é".repeat(150);
        let title = truncate_title(&query);
        assert_eq!(title.chars().count(), 100);
    }
}
