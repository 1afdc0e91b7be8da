//! Composer rules for locally submitted turns.

use serde_json::json;

use crate::{ChatEvent, Media, Role, Transcript};

/// Assistant text appended when the chat sink rejects a submission.
pub const SUBMIT_FAILURE_TEXT: &str = "Sorry, there was an error processing your request.";

impl ChatEvent {
    pub fn submission_failed() -> Self {
        Self::assistant(SUBMIT_FAILURE_TEXT)
    }
}

/// Build the outbound event for the composer input, or `None` when there is
/// nothing to send.
///
/// A reply typed right after an `interaction` event answers that request:
/// it goes out as `interaction_response` with `{"function_name": input}`.
pub fn compose_outbound(
    transcript: &Transcript,
    input: &str,
    pending_media: Option<Media>,
) -> Option<ChatEvent> {
    let text = input.trim();
    if text.is_empty() && pending_media.is_none() {
        return None;
    }

    let answering = transcript
        .last()
        .is_some_and(|event| event.role == Role::Interaction);
    if answering && !text.is_empty() {
        let content = json!({ "function_name": text }).to_string();
        return Some(ChatEvent::new(Role::InteractionResponse, content));
    }

    let event = ChatEvent::user(text);
    Some(match pending_media {
        Some(media) => event.with_media(vec![media]),
        None => event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_without_media_sends_nothing() {
        let t = Transcript::new();
        assert!(compose_outbound(&t, "   \n", None).is_none());
    }

    #[test]
    fn test_user_turn_is_trimmed_and_carries_media() {
        let t = Transcript::new();
        let media = Media::new("./uploaded_media/cat.png", "http://h/cat.png");
        let event = compose_outbound(&t, "  what is this? ", Some(media.clone())).unwrap();
        assert_eq!(event.role, Role::User);
        assert_eq!(event.content, "what is this?");
        assert_eq!(event.media, vec![media]);
    }

    #[test]
    fn test_media_only_submission_is_allowed() {
        let t = Transcript::new();
        let event = compose_outbound(&t, "", Some(Media::new("p", "u"))).unwrap();
        assert_eq!(event.content, "");
        assert_eq!(event.media.len(), 1);
    }

    #[test]
    fn test_reply_after_interaction_becomes_interaction_response() {
        let mut t = Transcript::new();
        t.append(ChatEvent::new(
            Role::Interaction,
            r#"<interaction>[{"request":{"function_name":"pick"}}]</interaction>"#,
        ));
        let event = compose_outbound(&t, "zoom_in", Some(Media::new("p", "u"))).unwrap();
        assert_eq!(event.role, Role::InteractionResponse);
        assert!(event.media.is_empty());
        let body: serde_json::Value = serde_json::from_str(&event.content).unwrap();
        assert_eq!(body, json!({ "function_name": "zoom_in" }));
    }

    #[test]
    fn test_reply_after_other_roles_is_plain_user_turn() {
        let mut t = Transcript::new();
        t.append(ChatEvent::assistant("<response>ok</response>"));
        let event = compose_outbound(&t, "thanks", None).unwrap();
        assert_eq!(event.role, Role::User);
        assert_eq!(event.content, "thanks");
    }

    #[test]
    fn test_failure_notice_text() {
        let event = ChatEvent::submission_failed();
        assert_eq!(event.role, Role::Assistant);
        assert_eq!(
            event.content,
            "Sorry, there was an error processing your request."
        );
    }
}
