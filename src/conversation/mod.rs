//! Conversation types and bounded transcript

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Role-tagged message history with a cap.
///
/// The system prompt is pinned and never evicted; beyond the cap the oldest
/// non-system message is dropped first. The cap bounds what gets replayed to
/// the LLM collaborator each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    cap: usize,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(2),
            messages: Vec::new(),
        }
    }

    pub fn with_system(mut self, prompt: &str) -> Self {
        self.messages.insert(
            0,
            Message {
                role: Role::System,
                content: prompt.to_string(),
            },
        );
        self
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(Message {
            role: Role::User,
            content: content.to_string(),
        });
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.push(Message {
            role: Role::Assistant,
            content: content.to_string(),
        });
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        while self.messages.len() > self.cap {
            let evict_at = self
                .messages
                .iter()
                .position(|m| m.role != Role::System)
                .unwrap_or(0);
            self.messages.remove(evict_at);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
