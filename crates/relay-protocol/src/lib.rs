//! # relay-protocol: contract types for the relay translation layer
//!
//! Shared types used on both sides of the translation boundary: the external
//! agent-to-agent wire protocol and the internal session event model consumed
//! by a single agent's execution engine.
//!
//! Dependency-light (no async runtime) so that transports, stores and the
//! translators can all depend on it.
//!
//! ## Module Overview
//!
//! - [`ids`]: Typed ID wrappers (EventId, MessageId, TaskId, ContextId, ...)
//! - [`a2a`]: Wire protocol: ProtocolEvent (task / message / artifact-update /
//!   status-update, forward-compatible) and its Part union
//! - [`session`]: SessionEvent, Content, Role and the internal Part union
//! - [`metadata`]: Reserved metadata keys shared by writer and reader
//! - [`context`]: The `InvocationContext` capability the translators consume
//! - [`error`]: RelayError, RelayResult

pub mod a2a;
pub mod context;
pub mod error;
pub mod ids;
pub mod metadata;
pub mod session;

pub use a2a::{
    Artifact, FileContent, Message, MessageRole, ProtocolEvent, Task, TaskArtifactUpdateEvent,
    TaskState, TaskStatus, TaskStatusUpdateEvent,
};
pub use context::{InvocationContext, StaticInvocationContext};
pub use error::{RelayError, RelayResult};
pub use ids::{ArtifactId, ContextId, EventId, MessageId, SessionId, TaskId};
pub use metadata::{TaskRef, task_metadata, task_ref_from_metadata};
pub use session::{Blob, Content, FunctionCall, FunctionResponse, Role, SessionEvent};
