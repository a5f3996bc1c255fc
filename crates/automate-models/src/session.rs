//! Session and message types.
//!
//! A [`Session`] is one continuous conversation keyed by `(channel, userId)`.
//! Messages are append-only; the store layer (see `automate-agent`) owns the
//! mutation contract, this crate only owns the shape.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call descriptor. The core treats the contents as opaque JSON; only
/// `id` is inspected, to correlate a later `tool` message back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A single message in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            timestamp: Utc::now(),
        }
    }

    /// Character-count proxy used for token estimation: content length plus
    /// the serialized size of any tool-call payload.
    pub fn estimate_chars(&self) -> usize {
        let content_len = self.content.as_deref().map_or(0, str::len);
        let tool_len = self
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|c| serde_json::to_string(c).map(|s| s.len()).unwrap_or(0))
                    .sum::<usize>()
            })
            .unwrap_or(0);
        content_len + tool_len
    }
}

/// A complete conversation, keyed by `(channel, userId)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub channel: String,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Derive the stable session id for a `(channel, userId)` pair.
    pub fn make_id(channel: &str, user_id: &str) -> String {
        format!("{channel}:{user_id}")
    }

    pub fn new(channel: impl Into<String>, user_id: impl Into<String>) -> Self {
        let channel = channel.into();
        let user_id = user_id.into();
        let id = Self::make_id(&channel, &user_id);
        let now = Utc::now();
        Self {
            id,
            channel,
            user_id,
            messages: Vec::new(),
            message_count: 0,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Number of leading `system`-role messages (the preserved prefix).
    pub fn system_prefix_len(&self) -> usize {
        self.messages
            .iter()
            .take_while(|m| m.role == MessageRole::System)
            .count()
    }
}

/// A lightweight projection of a [`Session`] for listing, never containing
/// the full message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub channel: String,
    pub user_id: String,
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.clone(),
            channel: s.channel.clone(),
            user_id: s.user_id.clone(),
            message_count: s.message_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_channel_colon_user() {
        let s = Session::new("discord:g1", "U1");
        assert_eq!(s.id, "discord:g1:U1");
    }

    #[test]
    fn system_prefix_len_counts_only_leading_system_messages() {
        let mut s = Session::new("c", "u");
        s.messages.push(Message::system("a"));
        s.messages.push(Message::system("b"));
        s.messages.push(Message::user("c"));
        s.messages.push(Message::system("d"));
        assert_eq!(s.system_prefix_len(), 2);
    }

    #[test]
    fn estimate_chars_counts_content_and_tool_payload() {
        let plain = Message::user("hello");
        assert_eq!(plain.estimate_chars(), 5);

        let with_tools = Message::assistant_with_tools(
            "ok",
            vec![ToolCall {
                id: "1".into(),
                name: "fetch".into(),
                arguments: serde_json::json!({"url": "http://x"}),
            }],
        );
        assert!(with_tools.estimate_chars() > 2);
    }

    #[test]
    fn summary_never_carries_messages() {
        let mut s = Session::new("c", "u");
        s.messages.push(Message::user("hi"));
        s.message_count = 1;
        let summary = SessionSummary::from(&s);
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.id, s.id);
    }
}
