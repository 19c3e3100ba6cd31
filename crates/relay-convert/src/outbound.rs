//! Session events sent to a remote peer as protocol messages.

use relay_protocol::a2a::Message;
use relay_protocol::metadata::task_ref_from_metadata;
use relay_protocol::session::SessionEvent;
use relay_protocol::{InvocationContext, RelayError, RelayResult};
use tracing::{debug, instrument};

use crate::parts::{message_role, parts_to_external};

/// Translates a session event into a protocol message.
///
/// Returns `Ok(None)` for events without content or whose content has no
/// parts. When the event remembers a remote task, the message is addressed
/// to it so the remote peer continues that task.
///
/// # Errors
///
/// [`RelayError::MissingContext`] when `ctx` is `None`, or a part
/// conversion failure.
#[instrument(skip_all, fields(author = %event.author))]
pub fn to_protocol_message(
    ctx: Option<&dyn InvocationContext>,
    event: &SessionEvent,
) -> RelayResult<Option<Message>> {
    let ctx = ctx.ok_or(RelayError::MissingContext)?;
    let Some(content) = &event.content else {
        return Ok(None);
    };
    let parts = parts_to_external(&content.parts, &event.long_running_tool_ids)?;
    if parts.is_empty() {
        return Ok(None);
    }

    let mut message = Message::new(message_role(&event.author), parts);
    if let Some(task_ref) = task_ref_from_metadata(&event.custom_metadata) {
        message.task_id = Some(task_ref.task_id);
        message.context_id = Some(task_ref.context_id);
    }
    debug!(
        invocation_id = ctx.invocation_id(),
        parts = message.parts.len(),
        "session event translated"
    );
    Ok(Some(message))
}
