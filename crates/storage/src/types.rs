use serde::{Deserialize, Serialize};

/// Fixed key the conversation history lives under.
pub const HISTORY_KEY: &str = "chatbot_history";

/// Key that receives the raw value of a history entry that failed to parse.
pub const CORRUPT_HISTORY_KEY: &str = "chatbot_history.corrupt";

/// Author of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// CSS class / wire name of the sender.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// One unit of conversation, stored exactly as it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: timestamp.into(),
        }
    }

    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self::new(text, Sender::User, timestamp)
    }

    pub fn bot(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, timestamp)
    }

    /// Messages with no visible text are never written back.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
