use chrono::Utc;
use serde::{Deserialize, Serialize};
use stacx_shared::ChatMessage;
use uuid::Uuid;

const TITLE_WORDS: usize = 5;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn fresh_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

impl Sender {
    pub fn role(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// Attachment preview. Never uploaded; `url` only addresses the local file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<UploadedFile>,
}

impl Message {
    pub fn user(content: impl Into<String>, files: Vec<UploadedFile>) -> Self {
        Self {
            id: fresh_id("msg"),
            content: content.into(),
            sender: Sender::User,
            timestamp: now_millis(),
            files,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: fresh_id("msg"),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: now_millis(),
            files: Vec::new(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: fresh_id("chat"),
            title: String::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends in strict time order and refreshes the title on assistant replies.
    pub fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp <= last.timestamp {
                message.timestamp = last.timestamp + 1;
            }
        }

        self.updated_at = now_millis().max(message.timestamp);
        if message.sender == Sender::Assistant {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
    }

    /// Role-tagged history in the shape the proxy expects.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| ChatMessage {
                role: m.sender.role().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { "New chat" } else { &self.title }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// First five words of `reply`, first letter upper-cased, `...` when cut.
pub fn derive_title(reply: &str) -> String {
    let words: Vec<&str> = reply.split_whitespace().collect();
    let mut title = words
        .iter()
        .take(TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(first) = title.chars().next() {
        let upper: String = first.to_uppercase().collect();
        title.replace_range(..first.len_utf8(), &upper);
    }
    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }
    title
}

// Persisted shape; older saves may be missing any of these.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConversation {
    id: Option<String>,
    title: Option<String>,
    messages: Option<Vec<serde_json::Value>>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

#[derive(Deserialize)]
struct StoredMessage {
    id: Option<String>,
    content: Option<String>,
    sender: Sender,
    timestamp: Option<i64>,
    #[serde(default)]
    files: Vec<UploadedFile>,
}

fn load_message(chat_id: &str, raw: serde_json::Value, fallback_ts: i64) -> Option<Message> {
    match serde_json::from_value::<StoredMessage>(raw) {
        Ok(m) => Some(Message {
            id: m.id.filter(|id| !id.is_empty()).unwrap_or_else(|| fresh_id("msg")),
            content: m.content.unwrap_or_default(),
            sender: m.sender,
            timestamp: m.timestamp.unwrap_or(fallback_ts),
            files: m.files,
        }),
        Err(e) => {
            tracing::warn!("Skipping unreadable message in {}: {}", chat_id, e);
            None
        }
    }
}

/// Parses a saved `chats` list, filling gaps the way older saves need.
/// Input that is not a JSON array yields an empty list; a bad entry only
/// drops itself.
pub fn load_conversations(raw: &str) -> Vec<Conversation> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("Discarding unreadable chat list: {}", e);
            return Vec::new();
        }
    };

    let now = now_millis();
    let mut chats = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let stored: StoredConversation = match serde_json::from_value(entry) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Skipping unreadable chat at position {}: {}", idx + 1, e);
                continue;
            }
        };

        let id = stored.id.filter(|id| !id.is_empty()).unwrap_or_else(|| fresh_id("chat"));
        let created_at = stored.created_at.unwrap_or(now);
        let messages = stored
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| load_message(&id, m, created_at))
            .collect();

        chats.push(Conversation {
            title: stored.title.unwrap_or_else(|| format!("Chat {}", idx + 1)),
            messages,
            created_at,
            updated_at: stored.updated_at.unwrap_or(now),
            id,
        });
    }
    chats
}
