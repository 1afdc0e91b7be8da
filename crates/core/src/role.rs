//! Speaker / stage roles attached to every chat event.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Role of a chat event.
///
/// Known roles get their own variant; anything else the remote side sends is
/// kept verbatim in [`Role::Other`] and rendered generically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Assistant,
    Conversation,
    Interaction,
    InteractionResponse,
    Coder,
    Planner,
    User,
    Observation,
    Thinking,
    ExecutePython,
    Other(String),
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value {
            "assistant" => Self::Assistant,
            "conversation" => Self::Conversation,
            "interaction" => Self::Interaction,
            "interaction_response" => Self::InteractionResponse,
            "coder" => Self::Coder,
            "planner" => Self::Planner,
            "user" => Self::User,
            "observation" => Self::Observation,
            "thinking" => Self::Thinking,
            "execute_python" => Self::ExecutePython,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Assistant => "assistant",
            Self::Conversation => "conversation",
            Self::Interaction => "interaction",
            Self::InteractionResponse => "interaction_response",
            Self::Coder => "coder",
            Self::Planner => "planner",
            Self::User => "user",
            Self::Observation => "observation",
            Self::Thinking => "thinking",
            Self::ExecutePython => "execute_python",
            Self::Other(value) => value,
        }
    }

    /// Upper-cased name used in bubble labels, e.g. `[CODER]`.
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Turns sent from this side of the conversation.
    pub fn is_outbound(&self) -> bool {
        matches!(self, Self::User | Self::InteractionResponse)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
