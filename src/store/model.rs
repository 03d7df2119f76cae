//! Data model: users, messages, and the per-user buckets they live in.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use uuid::Uuid;

/// Identifier of a user. Random v4 UUID, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of a message. Random v4 UUID, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Whether the receiver has read a message yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    Unread,
    Read,
}

/// A message between two users. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub subject: String,
    pub body: String,
}

impl Message {
    /// Plain key-value form handed to the transport layer.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "message_id": self.message_id.to_string(),
            "sender_id": self.sender_id.to_string(),
            "receiver_id": self.receiver_id.to_string(),
            "subject": self.subject,
            "body": self.body,
        })
    }
}

/// Insertion-ordered `message_id -> Message` mapping.
///
/// Serializes as an array of messages in bucket order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    messages: Vec<Message>,
    positions: HashMap<MessageId, usize>,
}

impl Bucket {
    pub(crate) fn push(&mut self, message: Message) {
        self.positions.insert(message.message_id, self.messages.len());
        self.messages.push(message);
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.positions.get(id).map(|&i| &self.messages[i])
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Message ids in bucket order.
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.message_id).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Bucket {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.messages.iter())
    }
}

/// Snapshot of a user and the three buckets of messages addressed from/to them.
///
/// `unread` and `read` are disjoint. A self-addressed message appears in
/// `sent` and in one of `unread`/`read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub sent: Bucket,
    pub unread: Bucket,
    pub read: Bucket,
}

impl User {
    pub(crate) fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            sent: Bucket::default(),
            unread: Bucket::default(),
            read: Bucket::default(),
        }
    }

    /// Plain key-value form handed to the transport layer.
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "user_id": self.user_id.to_string() })
    }
}

/// Result of listing a user's messages. `read` is empty when only unread
/// messages were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageListing {
    pub sent: Vec<Message>,
    pub read: Vec<Message>,
    pub unread: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(subject: &str) -> Message {
        Message {
            message_id: MessageId::generate(),
            sender_id: UserId::generate(),
            receiver_id: UserId::generate(),
            subject: subject.into(),
            body: "body".into(),
        }
    }

    #[test]
    fn ids_parse_back_from_display() {
        let id = MessageId::generate();
        let parsed: MessageId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn message_to_json_has_plain_fields() {
        let msg = make_message("hi");
        let value = msg.to_json();
        assert_eq!(value["message_id"], msg.message_id.to_string());
        assert_eq!(value["sender_id"], msg.sender_id.to_string());
        assert_eq!(value["receiver_id"], msg.receiver_id.to_string());
        assert_eq!(value["subject"], "hi");
        assert_eq!(value["body"], "body");
        // serde form matches the hand-built one
        assert_eq!(serde_json::to_value(&msg).unwrap(), value);
    }

    #[test]
    fn bucket_keeps_insertion_order() {
        let mut bucket = Bucket::default();
        let first = make_message("first");
        let second = make_message("second");
        bucket.push(first.clone());
        bucket.push(second.clone());

        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.ids(), vec![first.message_id, second.message_id]);
        assert_eq!(bucket.get(&second.message_id).unwrap().subject, "second");
        assert!(!bucket.contains(&MessageId::generate()));

        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json[0]["subject"], "first");
        assert_eq!(json[1]["subject"], "second");
    }

    #[test]
    fn user_to_json_only_exposes_id() {
        let user = User::empty(UserId::generate());
        assert_eq!(user.to_json(), json!({ "user_id": user.user_id.to_string() }));
        assert!(user.sent.is_empty() && user.unread.is_empty() && user.read.is_empty());
    }
}
