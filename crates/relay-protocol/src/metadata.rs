//! Reserved metadata keys.
//!
//! Writers and readers on both sides of the translation boundary go through
//! these constants; never spell the keys inline.

use indexmap::IndexMap;
use serde_json::Value;

use crate::ids::{ContextId, TaskId};

/// Common prefix of every key relay reserves in foreign metadata maps.
pub const KEY_PREFIX: &str = "relay_";

/// Session event custom metadata: remote task id.
pub const TASK_ID_KEY: &str = "relay_task_id";
/// Session event custom metadata: remote context id.
pub const CONTEXT_ID_KEY: &str = "relay_context_id";

/// Data part metadata: what the structured payload encodes.
pub const PART_TYPE_KEY: &str = "relay_type";
/// Data part metadata: boolean long-running marker on function calls.
pub const LONG_RUNNING_KEY: &str = "relay_is_long_running";

pub const PART_TYPE_FUNCTION_CALL: &str = "function_call";
pub const PART_TYPE_FUNCTION_RESPONSE: &str = "function_response";

/// A reference to a remote task, recovered from session event metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub task_id: TaskId,
    pub context_id: ContextId,
}

/// Builds the task/context pair. Both keys are always written, missing ids
/// as empty strings.
pub fn task_metadata(
    task_id: Option<&TaskId>,
    context_id: Option<&ContextId>,
) -> IndexMap<String, Value> {
    let mut metadata = IndexMap::with_capacity(2);
    metadata.insert(
        TASK_ID_KEY.to_owned(),
        Value::String(task_id.map(TaskId::to_string).unwrap_or_default()),
    );
    metadata.insert(
        CONTEXT_ID_KEY.to_owned(),
        Value::String(context_id.map(ContextId::to_string).unwrap_or_default()),
    );
    metadata
}

/// Reads the task/context pair back. Returns `None` unless both keys are
/// present as strings and at least one is non-empty.
pub fn task_ref_from_metadata(metadata: &IndexMap<String, Value>) -> Option<TaskRef> {
    let task_id = metadata.get(TASK_ID_KEY)?.as_str()?;
    let context_id = metadata.get(CONTEXT_ID_KEY)?.as_str()?;
    if task_id.is_empty() && context_id.is_empty() {
        return None;
    }
    Some(TaskRef {
        task_id: TaskId::from_string(task_id),
        context_id: ContextId::from_string(context_id),
    })
}
