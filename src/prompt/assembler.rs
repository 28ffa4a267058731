//! Named-slot template rendering for the chat flow.
//!
//! Pure function of its inputs: no clock, no I/O, no global state. A slot
//! with an empty binding renders as an empty section; only a slot with no
//! binding at all is an error, so early-session prompts stay coherent
//! before any artifact exists.

use crate::retrieval::RetrievedFragment;
use crate::session::{render_history, ConversationTurn, SessionContext};
use std::collections::HashMap;
use thiserror::Error;

/// Delimiter between retrieved fragment texts in the context section.
pub const FRAGMENT_DELIMITER: &str = "\n\n---\n\n";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("template slot `{slot}` has no binding")]
pub struct MissingFieldError {
    pub slot: String,
}

/// Render `template` with every SessionContext field, the serialized
/// history, the question, and (when present) the retrieved context.
pub fn assemble(
    template: &str,
    session: &SessionContext,
    history: &[ConversationTurn],
    question: &str,
    retrieved: Option<&[RetrievedFragment]>,
) -> Result<String, MissingFieldError> {
    let mut slots = session.slots();
    slots.insert("chat_history", render_history(history));
    slots.insert("question", question.to_string());
    slots.insert(
        "context",
        match retrieved {
            Some(fragments) => fragments
                .iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(FRAGMENT_DELIMITER),
            None => String::new(),
        },
    );
    render(template, &slots)
}

/// Substitute `{name}` tokens from `slots`. Anything between braces that is
/// not a bare lowercase identifier (JSON examples, Mermaid labels) passes
/// through untouched.
fn render(template: &str, slots: &HashMap<&'static str, String>) -> Result<String, MissingFieldError> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = find_slot_end(bytes, i + 1) {
                let name = &template[i + 1..end];
                match slots.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(MissingFieldError {
                            slot: name.to_string(),
                        })
                    }
                }
                i = end + 1;
                continue;
            }
        }
        // Copy the full UTF-8 character, not just one byte.
        let ch = template[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }

    Ok(out)
}

/// Position of the closing brace if `start` begins a `[a-z_][a-z0-9_]*`
/// identifier followed immediately by `}`.
fn find_slot_end(bytes: &[u8], start: usize) -> Option<usize> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_lowercase() || first == b'_') {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'a'..=b'z' | b'0'..=b'9' | b'_' => i += 1,
            b'}' => return Some(i),
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::templates::COPILOT_TEMPLATE;
    use crate::session::{AppType, Authentication, Sensitivity};

    fn sample_session() -> SessionContext {
        SessionContext::new(
            "An online document store",
            AppType::Web,
            Sensitivity::Confidential,
            true,
            Authentication::Oauth2,
        )
    }

    #[test]
    fn empty_artifacts_still_produce_a_prompt_with_the_question() {
        let session = sample_session();
        let prompt = assemble(
            COPILOT_TEMPLATE,
            &session,
            &[],
            "What are my biggest risks?",
            None,
        )
        .unwrap();
        assert!(!prompt.is_empty());
        assert!(prompt.contains("What are my biggest risks?"));
        assert!(prompt.contains("OAUTH2"));
    }

    #[test]
    fn prompts_differ_only_in_the_changed_field() {
        let base = sample_session();
        let mut changed = base.clone();
        changed.threat_model = "| Spoofing | stolen session token |".to_string();

        let a = assemble(COPILOT_TEMPLATE, &base, &[], "q", None).unwrap();
        let b = assemble(COPILOT_TEMPLATE, &changed, &[], "q", None).unwrap();

        // Identical outside the substituted region.
        let prefix_len = a
            .bytes()
            .zip(b.bytes())
            .take_while(|(x, y)| x == y)
            .count();
        let suffix_len = a
            .bytes()
            .rev()
            .zip(b.bytes().rev())
            .take_while(|(x, y)| x == y)
            .count();
        assert_eq!(&b[prefix_len..b.len() - suffix_len], changed.threat_model);
        assert_eq!(a.len() - prefix_len - suffix_len, 0);
    }

    #[test]
    fn retrieved_fragments_join_with_delimiter() {
        let session = sample_session();
        let fragments = vec![
            RetrievedFragment {
                text: "first fragment".into(),
                source_id: "doc-1".into(),
                score: 0.9,
            },
            RetrievedFragment {
                text: "second fragment".into(),
                source_id: "doc-2".into(),
                score: 0.5,
            },
        ];
        let prompt = assemble(COPILOT_TEMPLATE, &session, &[], "q", Some(&fragments)).unwrap();
        assert!(prompt.contains("first fragment\n\n---\n\nsecond fragment"));
    }

    #[test]
    fn unknown_slot_is_a_missing_field_error() {
        let session = sample_session();
        let err = assemble("hello {no_such_slot}", &session, &[], "q", None).unwrap_err();
        assert_eq!(err.slot, "no_such_slot");
    }

    #[test]
    fn json_braces_pass_through() {
        let session = sample_session();
        let out = assemble(
            "ask {question} then emit {\"key\": []} and {}",
            &session,
            &[],
            "why?",
            None,
        )
        .unwrap();
        assert_eq!(out, "ask why? then emit {\"key\": []} and {}");
    }
}
