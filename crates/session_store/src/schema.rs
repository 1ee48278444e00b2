use serde::{Deserialize, Serialize};

/// Stored document version accepted by this crate.
pub const STORE_VERSION: u32 = 1;

const DEFAULT_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    pub image_url: Option<String>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            image_url: None,
        }
    }

    #[must_use]
    pub fn bot(text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            image_url,
        }
    }
}

/// Authentication/onboarding status record for the current user.
///
/// Invariant: `is_onboarded` never holds without `is_authenticated`. The
/// store's mutation operations are the only writers and preserve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_onboarded: bool,
    pub token: Option<String>,
    pub display_name: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_onboarded: false,
            token: None,
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

/// On-disk shape of the persisted state: one versioned JSON document holding
/// the session record, the session identifier, and the full chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredDocument {
    pub version: u32,
    pub created_at: String,
    pub session_id: Option<String>,
    pub session: SessionState,
    pub messages: Vec<ChatMessage>,
}

impl StoredDocument {
    #[must_use]
    pub fn v1(created_at: impl Into<String>) -> Self {
        Self {
            version: STORE_VERSION,
            created_at: created_at.into(),
            session_id: None,
            session: SessionState::default(),
            messages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_signed_out_with_fallback_display_name() {
        let session = SessionState::default();
        assert!(!session.is_authenticated);
        assert!(!session.is_onboarded);
        assert_eq!(session.token, None);
        assert_eq!(session.display_name, "User");
    }

    #[test]
    fn sender_serializes_as_snake_case_tag() {
        let user = serde_json::to_value(Sender::User).expect("serialize user sender");
        let bot = serde_json::to_value(Sender::Bot).expect("serialize bot sender");
        assert_eq!(user, serde_json::json!("user"));
        assert_eq!(bot, serde_json::json!("bot"));
    }

    #[test]
    fn chat_message_round_trips_with_optional_image_reference() {
        let message = ChatMessage::bot("look at this", Some("https://img.example/cat.png".into()));
        let encoded = serde_json::to_string(&message).expect("serialize message");
        let decoded: ChatMessage = serde_json::from_str(&encoded).expect("parse message");
        assert_eq!(decoded, message);
    }

    #[test]
    fn stored_document_rejects_unknown_fields() {
        let raw = r#"{
            "version": 1,
            "created_at": "2025-01-01T00:00:00Z",
            "session_id": null,
            "session": {
                "is_authenticated": false,
                "is_onboarded": false,
                "token": null,
                "display_name": "User"
            },
            "messages": [],
            "surprise": true
        }"#;

        assert!(serde_json::from_str::<StoredDocument>(raw).is_err());
    }
}
