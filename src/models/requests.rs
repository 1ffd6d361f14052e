//! Request DTOs for the chat backend
//!
//! Defines the body posted to the streaming chat endpoint.

use serde::{Deserialize, Serialize};

/// Body of the streaming chat request.
///
/// Field names are part of the backend contract. Optional fields are left
/// out of the JSON entirely when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Conversation the message belongs to
    pub session_id: String,
    /// Assistant mode, e.g. "agent" or "chat"
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_react: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
}

impl ChatRequest {
    /// Creates a request with only the required fields set.
    pub fn new(
        message: impl Into<String>,
        session_id: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            mode: mode.into(),
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    pub fn with_react(mut self, use_react: bool) -> Self {
        self.use_react = Some(use_react);
        self
    }

    pub fn with_agent_prompt(mut self, agent_prompt: impl Into<String>) -> Self {
        self.agent_prompt = Some(agent_prompt.into());
        self
    }

    pub fn with_guest_email(mut self, guest_email: impl Into<String>) -> Self {
        self.guest_email = Some(guest_email.into());
        self
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.message.trim().is_empty() {
            return Some("Message cannot be empty".to_string());
        }
        if self.session_id.is_empty() {
            return Some("Session id cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_request_omits_optionals() {
        let req = ChatRequest::new("hi", "s1", "agent");
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value, json!({"message": "hi", "session_id": "s1", "mode": "agent"}));
    }

    #[test]
    fn test_full_request_field_names() {
        let req = ChatRequest::new("hi", "s1", "agent")
            .with_collection("c9")
            .with_react(true)
            .with_agent_prompt("be brief")
            .with_guest_email("guest@example.com");
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["collection_id"], "c9");
        assert_eq!(value["use_react"], true);
        assert_eq!(value["agent_prompt"], "be brief");
        assert_eq!(value["guest_email"], "guest@example.com");
    }

    #[test]
    fn test_validate() {
        assert!(ChatRequest::new("hi", "s1", "agent").validate().is_none());
        assert!(ChatRequest::new("   ", "s1", "agent").validate().is_some());
        assert!(ChatRequest::new("hi", "", "agent").validate().is_some());
    }
}
