use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_avatar: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
}

/// A one-to-one conversation as listed in the inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub participant_id: String,
    pub participant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_avatar: Option<String>,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChat {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub members_count: u32,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    conversations: Vec<Conversation>,
    group_chats: Vec<GroupChat>,
    active_conversation: Option<String>,
    messages: HashMap<String, Vec<Message>>,
    connected: bool,
    typing: HashMap<String, Vec<String>>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    pub fn group_chats(&self) -> &[GroupChat] {
        &self.group_chats
    }

    pub fn set_group_chats(&mut self, group_chats: Vec<GroupChat>) {
        self.group_chats = group_chats;
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    pub fn set_active_conversation(&mut self, id: Option<String>) {
        self.active_conversation = id;
    }

    /// Messages loaded for a conversation, oldest first
    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a message to a conversation's history
    pub fn add_message(&mut self, conversation_id: &str, message: Message) {
        debug!(conversation_id, message_id = %message.id, "Chat message added");
        self.messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }

    /// Replace a conversation's history, e.g. after loading it from the server
    pub fn set_messages(&mut self, conversation_id: &str, messages: Vec<Message>) {
        self.messages.insert(conversation_id.to_string(), messages);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            debug!(connected, "Chat connection changed");
        }
        self.connected = connected;
    }

    /// Users currently typing in a conversation, in the order they started
    pub fn typing_users(&self, conversation_id: &str) -> &[String] {
        self.typing
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Mark a user as typing or not. A user appears at most once.
    pub fn set_typing(&mut self, conversation_id: &str, user_id: &str, is_typing: bool) {
        let users = self.typing.entry(conversation_id.to_string()).or_default();
        if is_typing {
            if !users.iter().any(|u| u == user_id) {
                users.push(user_id.to_string());
            }
        } else {
            users.retain(|u| u != user_id);
        }
    }

    /// Zero the unread count of a direct conversation
    pub fn mark_as_read(&mut self, conversation_id: &str) {
        for conversation in self
            .conversations
            .iter_mut()
            .filter(|c| c.id == conversation_id)
        {
            conversation.unread_count = 0;
        }
    }
}
