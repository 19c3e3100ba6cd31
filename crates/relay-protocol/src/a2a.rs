//! Wire types of the external agent-to-agent protocol.
//!
//! Every object is discriminated by a `"kind"` field. Both [`ProtocolEvent`]
//! and [`Part`] are forward-compatible: an unknown `"kind"` deserializes into
//! an `Unknown` variant instead of failing, and the translators reject it
//! explicitly. A known kind with a malformed body is still a decode error.

use crate::ids::{ArtifactId, ContextId, MessageId, TaskId};
use serde::de::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Free-form metadata map carried by most wire objects.
pub type Metadata = Map<String, Value>;

// ─── Events ────────────────────────────────────────────────────────

/// One unit of agent-to-agent communication received from a remote peer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// Full task snapshot.
    Task(Task),
    Message(Message),
    /// Incremental artifact delta for a task.
    ArtifactUpdate(TaskArtifactUpdateEvent),
    /// Incremental status delta for a task; `final` closes the task.
    StatusUpdate(TaskStatusUpdateEvent),
    /// Forward-compatible catch-all for kinds this version does not know.
    /// Serializes back under `original_kind` with `data` flattened.
    Unknown { original_kind: String, data: Value },
}

impl ProtocolEvent {
    /// The wire `"kind"` of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::Task(_) => "task",
            Self::Message(_) => "message",
            Self::ArtifactUpdate(_) => "artifact-update",
            Self::StatusUpdate(_) => "status-update",
            Self::Unknown { original_kind, .. } => original_kind,
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Task(task) => Some(&task.id),
            Self::Message(message) => message.task_id.as_ref(),
            Self::ArtifactUpdate(update) => Some(&update.task_id),
            Self::StatusUpdate(update) => Some(&update.task_id),
            Self::Unknown { .. } => None,
        }
    }
}

/// Helper mirroring the known `ProtocolEvent` variants for deserialization.
#[derive(Deserialize)]
#[serde(tag = "kind")]
enum ProtocolEventKnown {
    #[serde(rename = "task")]
    Task(Task),
    #[serde(rename = "message")]
    Message(Message),
    #[serde(rename = "artifact-update")]
    ArtifactUpdate(TaskArtifactUpdateEvent),
    #[serde(rename = "status-update")]
    StatusUpdate(TaskStatusUpdateEvent),
}

/// Borrowing mirror of the known variants for serialization.
#[derive(Serialize)]
#[serde(tag = "kind")]
enum ProtocolEventRef<'a> {
    #[serde(rename = "task")]
    Task(&'a Task),
    #[serde(rename = "message")]
    Message(&'a Message),
    #[serde(rename = "artifact-update")]
    ArtifactUpdate(&'a TaskArtifactUpdateEvent),
    #[serde(rename = "status-update")]
    StatusUpdate(&'a TaskStatusUpdateEvent),
}

impl Serialize for ProtocolEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Task(task) => ProtocolEventRef::Task(task).serialize(serializer),
            Self::Message(message) => ProtocolEventRef::Message(message).serialize(serializer),
            Self::ArtifactUpdate(update) => {
                ProtocolEventRef::ArtifactUpdate(update).serialize(serializer)
            }
            Self::StatusUpdate(update) => {
                ProtocolEventRef::StatusUpdate(update).serialize(serializer)
            }
            Self::Unknown {
                original_kind,
                data,
            } => serialize_unknown(original_kind, data, serializer),
        }
    }
}

/// Writes an unknown object back in its wire shape: the original `"kind"`
/// next to the fields it arrived with. A non-object body goes under `"data"`.
fn serialize_unknown<S>(kind: &str, data: &Value, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut object = match data {
        Value::Object(fields) => fields.clone(),
        Value::Null => Map::new(),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("data".to_owned(), other.clone());
            wrapped
        }
    };
    object.insert("kind".to_owned(), Value::from(kind));
    object.serialize(serializer)
}

const KNOWN_EVENT_KINDS: [&str; 4] = ["task", "message", "artifact-update", "status-update"];

impl<'de> Deserialize<'de> for ProtocolEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        if !KNOWN_EVENT_KINDS.contains(&kind.as_str()) {
            let mut data = raw;
            if let Some(obj) = data.as_object_mut() {
                obj.remove("kind");
            }
            return Ok(Self::Unknown {
                original_kind: kind,
                data,
            });
        }
        let known = serde_json::from_value::<ProtocolEventKnown>(raw).map_err(D::Error::custom)?;
        Ok(match known {
            ProtocolEventKnown::Task(task) => Self::Task(task),
            ProtocolEventKnown::Message(message) => Self::Message(message),
            ProtocolEventKnown::ArtifactUpdate(update) => Self::ArtifactUpdate(update),
            ProtocolEventKnown::StatusUpdate(update) => Self::StatusUpdate(update),
        })
    }
}

impl From<Task> for ProtocolEvent {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<Message> for ProtocolEvent {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<TaskArtifactUpdateEvent> for ProtocolEvent {
    fn from(update: TaskArtifactUpdateEvent) -> Self {
        Self::ArtifactUpdate(update)
    }
}

impl From<TaskStatusUpdateEvent> for ProtocolEvent {
    fn from(update: TaskStatusUpdateEvent) -> Self {
        Self::StatusUpdate(update)
    }
}

// ─── Tasks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub context_id: ContextId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, context_id: impl Into<ContextId>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(state),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// ISO 8601 timestamp as sent by the peer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// No further updates follow a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Rejected
        )
    }

    /// The remote turn is over: the task either finished or is paused until
    /// the caller supplies more input.
    pub fn ends_turn(self) -> bool {
        self.is_terminal() || matches!(self, Self::InputRequired | Self::AuthRequired)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Artifact {
    pub fn new(artifact_id: impl Into<ArtifactId>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            name: None,
            description: None,
            parts,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    #[serde(default)]
    pub task_id: TaskId,
    #[serde(default)]
    pub context_id: ContextId,
    pub artifact: Artifact,
    /// Append to a previously sent artifact with the same id.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub append: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub last_chunk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    #[serde(default)]
    pub task_id: TaskId,
    #[serde(default)]
    pub context_id: ContextId,
    pub status: TaskStatus,
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

// ─── Messages ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
    /// Role missing or not understood.
    #[default]
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: MessageId,
    #[serde(default)]
    pub role: MessageRole,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_task_ids: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Message {
    /// New message with a freshly minted id.
    pub fn new(role: MessageRole, parts: Vec<Part>) -> Self {
        Self {
            message_id: MessageId::new_uuid(),
            role,
            parts,
            task_id: None,
            context_id: None,
            reference_task_ids: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_task(
        mut self,
        task_id: impl Into<TaskId>,
        context_id: impl Into<ContextId>,
    ) -> Self {
        self.task_id = Some(task_id.into());
        self.context_id = Some(context_id.into());
        self
    }
}

// ─── Parts ─────────────────────────────────────────────────────────

/// One structured content fragment of a message or artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text {
        text: String,
        metadata: Option<Metadata>,
    },
    File {
        file: FileContent,
        metadata: Option<Metadata>,
    },
    /// Structured JSON payload. Function calls and responses travel as data
    /// parts tagged through reserved metadata keys.
    Data {
        data: Map<String, Value>,
        metadata: Option<Metadata>,
    },
    Unknown {
        original_kind: String,
        data: Value,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn data(data: Map<String, Value>, metadata: Option<Metadata>) -> Self {
        Self::Data { data, metadata }
    }

    /// The wire `"kind"` of this part.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::File { .. } => "file",
            Self::Data { .. } => "data",
            Self::Unknown { original_kind, .. } => original_kind,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::Text { metadata, .. }
            | Self::File { metadata, .. }
            | Self::Data { metadata, .. } => metadata.as_ref(),
            Self::Unknown { .. } => None,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum PartRef<'a> {
    Text {
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<&'a Metadata>,
    },
    File {
        file: &'a FileContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<&'a Metadata>,
    },
    Data {
        data: &'a Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<&'a Metadata>,
    },
}

impl Serialize for Part {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let known = match self {
            Self::Text { text, metadata } => PartRef::Text {
                text,
                metadata: metadata.as_ref(),
            },
            Self::File { file, metadata } => PartRef::File {
                file,
                metadata: metadata.as_ref(),
            },
            Self::Data { data, metadata } => PartRef::Data {
                data,
                metadata: metadata.as_ref(),
            },
            Self::Unknown {
                original_kind,
                data,
            } => return serialize_unknown(original_kind, data, serializer),
        };
        known.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum PartKnown {
    Text {
        text: String,
        #[serde(default)]
        metadata: Option<Metadata>,
    },
    File {
        file: FileContent,
        #[serde(default)]
        metadata: Option<Metadata>,
    },
    Data {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Option<Metadata>,
    },
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        if !matches!(kind.as_str(), "text" | "file" | "data") {
            let mut data = raw;
            if let Some(obj) = data.as_object_mut() {
                obj.remove("kind");
            }
            return Ok(Self::Unknown {
                original_kind: kind,
                data,
            });
        }
        let known = serde_json::from_value::<PartKnown>(raw).map_err(D::Error::custom)?;
        Ok(match known {
            PartKnown::Text { text, metadata } => Self::Text { text, metadata },
            PartKnown::File { file, metadata } => Self::File { file, metadata },
            PartKnown::Data { data, metadata } => Self::Data { data, metadata },
        })
    }
}

/// File payload: inline base64 bytes or a URI reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    #[serde(rename_all = "camelCase")]
    Bytes {
        /// Base64 (standard alphabet) encoded content.
        bytes: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Uri {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}
