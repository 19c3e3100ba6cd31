//! Typed ID wrappers.
//!
//! Wire ids are opaque strings chosen by whichever peer created the object;
//! ids minted locally are UUID v4.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Mint a new random id (UUID v4).
            pub fn new_uuid() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id!(
    /// Identifier of a session event.
    EventId
);
typed_id!(
    /// Identifier of a protocol message.
    MessageId
);
typed_id!(
    /// Identifier of a remote task.
    TaskId
);
typed_id!(
    /// Identifier grouping related tasks and messages into one conversation.
    ContextId
);
typed_id!(
    /// Identifier of an artifact within a task.
    ArtifactId
);
typed_id!(
    /// Identifier of a local session in the journal.
    SessionId
);

impl Default for EventId {
    fn default() -> Self {
        Self::new_uuid()
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new_uuid()
    }
}

// Peers may omit task and context ids; absence reads as the empty id.
impl Default for TaskId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self(String::new())
    }
}
