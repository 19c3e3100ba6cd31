//! Protocol events received from a remote peer, absorbed as session events.

use relay_protocol::a2a::{
    Message, ProtocolEvent, Task, TaskArtifactUpdateEvent, TaskState, TaskStatusUpdateEvent,
};
use relay_protocol::metadata::task_metadata;
use relay_protocol::session::{Content, Role, SessionEvent};
use relay_protocol::{InvocationContext, RelayError, RelayResult};
use tracing::{debug, instrument};

use crate::parts::{content_role, long_running_tool_ids, parts_from_external};

/// Translates one protocol event into a session event.
///
/// `Ok(None)` means there is nothing to emit (no parts, or no status
/// message on a non-final update). It is not an error.
///
/// # Errors
///
/// - [`RelayError::MissingContext`] when `ctx` is `None`.
/// - [`RelayError::UnrecognizedEvent`] for event kinds this version does not know.
/// - [`RelayError::PartConversion`] when any part fails to convert.
#[instrument(skip_all, fields(kind = %event.kind()))]
pub fn to_session_event(
    ctx: Option<&dyn InvocationContext>,
    event: &ProtocolEvent,
) -> RelayResult<Option<SessionEvent>> {
    let ctx = ctx.ok_or(RelayError::MissingContext)?;
    let converted = match event {
        ProtocolEvent::Task(task) => task_to_event(ctx, task)?,
        ProtocolEvent::Message(message) => message_to_event(ctx, message)?,
        ProtocolEvent::ArtifactUpdate(update) => artifact_update_to_event(ctx, update)?,
        ProtocolEvent::StatusUpdate(update) if update.is_final => {
            Some(final_status_to_event(ctx, update)?)
        }
        ProtocolEvent::StatusUpdate(update) => status_update_to_event(ctx, update)?,
        ProtocolEvent::Unknown { original_kind, .. } => {
            return Err(RelayError::UnrecognizedEvent {
                kind: original_kind.clone(),
            });
        }
    };
    match &converted {
        Some(event) => debug!(
            parts = event.parts().len(),
            long_running = event.long_running_tool_ids.len(),
            turn_complete = event.turn_complete,
            "protocol event translated"
        ),
        None => debug!("protocol event carried nothing to emit"),
    }
    Ok(converted)
}

fn message_to_event(
    ctx: &dyn InvocationContext,
    message: &Message,
) -> RelayResult<Option<SessionEvent>> {
    let parts = parts_from_external(&message.parts)?;
    if parts.is_empty() {
        return Ok(None);
    }
    let mut event = SessionEvent::new(ctx);
    event.long_running_tool_ids = long_running_tool_ids(&message.parts, &parts);
    event.content = Some(Content::new(content_role(message.role), parts));
    if message.task_id.is_some() || message.context_id.is_some() {
        event.custom_metadata.extend(task_metadata(
            message.task_id.as_ref(),
            message.context_id.as_ref(),
        ));
    }
    Ok(Some(event))
}

fn task_to_event(ctx: &dyn InvocationContext, task: &Task) -> RelayResult<Option<SessionEvent>> {
    let mut parts = Vec::new();
    let mut long_running = Vec::new();
    let sources = task
        .artifacts
        .iter()
        .map(|artifact| &artifact.parts)
        .chain(task.status.message.iter().map(|message| &message.parts));
    for external in sources {
        let converted = parts_from_external(external)?;
        long_running.extend(long_running_tool_ids(external, &converted));
        parts.extend(converted);
    }
    if parts.is_empty() {
        return Ok(None);
    }

    let mut event = SessionEvent::new(ctx);
    event.content = Some(Content::new(Role::Model, parts));
    event
        .custom_metadata
        .extend(task_metadata(Some(&task.id), Some(&task.context_id)));
    // Pending calls only matter while the task is paused for input.
    if task.status.state == TaskState::InputRequired {
        event.long_running_tool_ids = long_running;
    }
    event.turn_complete = task.status.state.ends_turn();
    Ok(Some(event))
}

fn artifact_update_to_event(
    ctx: &dyn InvocationContext,
    update: &TaskArtifactUpdateEvent,
) -> RelayResult<Option<SessionEvent>> {
    let external = &update.artifact.parts;
    if external.is_empty() {
        return Ok(None);
    }
    let parts = parts_from_external(external)?;
    let mut event = SessionEvent::new(ctx);
    event.long_running_tool_ids = long_running_tool_ids(external, &parts);
    event.content = Some(Content::new(Role::Model, parts));
    event
        .custom_metadata
        .extend(task_metadata(Some(&update.task_id), Some(&update.context_id)));
    Ok(Some(event))
}

fn status_update_to_event(
    ctx: &dyn InvocationContext,
    update: &TaskStatusUpdateEvent,
) -> RelayResult<Option<SessionEvent>> {
    let Some(message) = &update.status.message else {
        return Ok(None);
    };
    let Some(mut event) = message_to_event(ctx, message)? else {
        return Ok(None);
    };
    if let Some(content) = event.content.as_mut() {
        for part in &mut content.parts {
            part.thought = true;
        }
    }
    event
        .custom_metadata
        .extend(task_metadata(Some(&update.task_id), Some(&update.context_id)));
    Ok(Some(event))
}

fn final_status_to_event(
    ctx: &dyn InvocationContext,
    update: &TaskStatusUpdateEvent,
) -> RelayResult<SessionEvent> {
    let mut event = SessionEvent::new(ctx);
    if let Some(message) = &update.status.message {
        let parts = parts_from_external(&message.parts)?;
        if update.status.state == TaskState::InputRequired {
            event.long_running_tool_ids = long_running_tool_ids(&message.parts, &parts);
        }
        if !parts.is_empty() {
            event.content = Some(Content::new(content_role(message.role), parts));
        }
    }
    event
        .custom_metadata
        .extend(task_metadata(Some(&update.task_id), Some(&update.context_id)));
    event.turn_complete = true;
    Ok(event)
}
