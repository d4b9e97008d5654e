//! Messaging state.
//!
//! `ChatState` holds direct conversations, group chats, the messages loaded
//! per conversation, who is typing, and whether the realtime connection is
//! up. It is plain data; callers share it behind their own lock.

pub mod state;

pub use state::{ChatState, Conversation, GroupChat, Message, MessageKind, Reaction};
