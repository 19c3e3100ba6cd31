//! # relay-convert: event translation between the wire protocol and sessions
//!
//! - [`parts`]: 1:1 part conversion and long-running marker extraction
//! - [`inbound`]: protocol event → session event
//! - [`outbound`]: session event → protocol message
//! - [`task_writer`]: a run's session events → task status/artifact updates
//!
//! The translators are pure synchronous functions with no shared state and
//! can be called from any number of tasks concurrently.

pub mod inbound;
pub mod outbound;
pub mod parts;
pub mod task_writer;

pub use inbound::to_session_event;
pub use outbound::to_protocol_message;
pub use parts::{long_running_tool_ids, parts_from_external, parts_to_external};
pub use task_writer::TaskUpdateWriter;
