//! Message envelope exchanged between engines.

use serde::{Deserialize, Serialize};

/// Advisory priority. Ports deliver strictly in arrival order regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// One message. The payload is opaque to the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub priority: MessagePriority,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "replyPort", default, skip_serializing_if = "Option::is_none")]
    pub reply_port: Option<String>,
    #[serde(rename = "inReplyTo", default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Debited from the sender when the message is sent.
    #[serde(rename = "tokenCost", default)]
    pub token_cost: u64,
}

impl Message {
    /// New message with a fresh id, the current time, normal priority and no
    /// token cost.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.into(),
            receiver: receiver.into(),
            kind: kind.into(),
            priority: MessagePriority::Normal,
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
            reply_port: None,
            in_reply_to: None,
            token_cost: 0,
        }
    }

    /// Reply to `request`, addressed to its reply port or, failing that,
    /// its sender.
    pub fn reply(request: &Message, kind: impl Into<String>, payload: serde_json::Value) -> Self {
        let receiver = request
            .reply_port
            .clone()
            .unwrap_or_else(|| request.sender.clone());
        let mut reply = Self::new(request.receiver.clone(), receiver, kind, payload);
        reply.in_reply_to = Some(request.id.clone());
        reply
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_token_cost(mut self, token_cost: u64) -> Self {
        self.token_cost = token_cost;
        self
    }

    pub fn with_reply_port(mut self, port: impl Into<String>) -> Self {
        self.reply_port = Some(port.into());
        self
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Message::new("e1", "e2", "ping", json!(null));
        let b = Message::new("e1", "e2", "ping", json!(null));
        assert_ne!(a.id, b.id);
        assert_eq!(a.priority, MessagePriority::Normal);
        assert_eq!(a.token_cost, 0);
        assert!(a.timestamp > 0);
    }

    #[test]
    fn test_reply_uses_reply_port() {
        let request = Message::new("planner", "critic", "review", json!({"draft": 1}))
            .with_reply_port("scribe");
        let reply = Message::reply(&request, "verdict", json!({"ok": true}));

        assert_eq!(reply.sender, "critic");
        assert_eq!(reply.receiver, "scribe");
        assert_eq!(reply.in_reply_to.as_deref(), Some(request.id.as_str()));
        assert!(reply.is_reply());
    }

    #[test]
    fn test_reply_falls_back_to_sender() {
        let request = Message::new("planner", "critic", "review", json!(null));
        let reply = Message::reply(&request, "verdict", json!(null));
        assert_eq!(reply.receiver, "planner");
    }

    #[test]
    fn test_json_field_names() {
        let msg = Message::new("e1", "e2", "task", json!({"n": 3}))
            .with_token_cost(50)
            .with_priority(MessagePriority::High);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "task");
        assert_eq!(value["tokenCost"], 50);
        assert_eq!(value["priority"], "high");
        assert!(value.get("replyPort").is_none());

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_deserialize_minimal() {
        let msg: Message = serde_json::from_value(json!({
            "id": "m1",
            "sender": "a",
            "receiver": "b",
            "type": "note",
            "timestamp": 0
        }))
        .unwrap();
        assert_eq!(msg.token_cost, 0);
        assert_eq!(msg.priority, MessagePriority::Normal);
        assert!(msg.payload.is_null());
    }
}
