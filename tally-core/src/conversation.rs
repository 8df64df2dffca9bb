//! Per-chat conversation state for multi-step interactions.
//!
//! Lives for the life of the process only; a restart forgets every pending
//! interaction.

use std::collections::HashMap;

/// Chat/user identifier as used by the chat transport.
pub type ChatId = i64;

/// What the next free-text message from a chat should be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `<category> <amount> [note]`
    AwaitingExpenseEntry,
    /// `<year> <month>`
    AwaitingMonthQuery,
}

/// At most one pending mode per chat.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    modes: HashMap<ChatId, Mode>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `mode`, replacing whatever was pending.
    pub fn set(&mut self, chat: ChatId, mode: Mode) {
        self.modes.insert(chat, mode);
    }

    pub fn get(&self, chat: ChatId) -> Option<Mode> {
        self.modes.get(&chat).copied()
    }

    /// Drop any pending mode. Clearing an idle chat is a no-op.
    pub fn clear(&mut self, chat: ChatId) {
        self.modes.remove(&chat);
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
