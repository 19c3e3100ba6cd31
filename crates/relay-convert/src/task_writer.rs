//! Publishing a local agent's output as protocol task updates.
//!
//! The serving-side counterpart of inbound task handling: one writer per
//! remote-visible task turns the session events of a run into status and
//! artifact deltas, then closes the task with a final status update.

use relay_protocol::a2a::{
    Artifact, Message, MessageRole, Part, ProtocolEvent, TaskArtifactUpdateEvent, TaskState,
    TaskStatus, TaskStatusUpdateEvent,
};
use relay_protocol::session::SessionEvent;
use relay_protocol::{ArtifactId, ContextId, InvocationContext, RelayResult, TaskId};
use tracing::debug;

use crate::outbound::to_protocol_message;

#[derive(Debug, Clone)]
pub struct TaskUpdateWriter {
    task_id: TaskId,
    context_id: ContextId,
    artifact_id: ArtifactId,
    artifact_started: bool,
    long_running_ids: Vec<String>,
}

impl TaskUpdateWriter {
    pub fn new(task_id: impl Into<TaskId>, context_id: impl Into<ContextId>) -> Self {
        Self {
            task_id: task_id.into(),
            context_id: context_id.into(),
            artifact_id: ArtifactId::new_uuid(),
            artifact_started: false,
            long_running_ids: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Initial non-final `submitted` status.
    pub fn submitted(&self) -> ProtocolEvent {
        self.status(TaskStatus::new(TaskState::Submitted), false)
    }

    /// Translates one session event of the run.
    ///
    /// Thought-only content is narration and goes out as a non-final
    /// `working` status; anything else is appended to the task's artifact.
    pub fn write(
        &mut self,
        ctx: Option<&dyn InvocationContext>,
        event: &SessionEvent,
    ) -> RelayResult<Option<ProtocolEvent>> {
        let Some(message) = to_protocol_message(ctx, event)? else {
            return Ok(None);
        };
        for id in &event.long_running_tool_ids {
            if !self.long_running_ids.contains(id) {
                self.long_running_ids.push(id.clone());
            }
        }

        if event.parts().iter().all(|part| part.thought) {
            let message = message.with_task(self.task_id.clone(), self.context_id.clone());
            return Ok(Some(self.status(
                TaskStatus::new(TaskState::Working).with_message(message),
                false,
            )));
        }

        let update = TaskArtifactUpdateEvent {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            artifact: Artifact::new(self.artifact_id.clone(), message.parts),
            append: self.artifact_started,
            last_chunk: false,
            metadata: None,
        };
        self.artifact_started = true;
        Ok(Some(update.into()))
    }

    /// Closes the task.
    ///
    /// The final state is `failed` when `error` is given, `input-required`
    /// when long-running calls are pending, `completed` otherwise. An open
    /// artifact is closed with an empty last chunk first.
    pub fn finish(self, error: Option<&str>) -> Vec<ProtocolEvent> {
        let mut events = Vec::with_capacity(2);
        if self.artifact_started {
            events.push(
                TaskArtifactUpdateEvent {
                    task_id: self.task_id.clone(),
                    context_id: self.context_id.clone(),
                    artifact: Artifact::new(self.artifact_id.clone(), Vec::new()),
                    append: true,
                    last_chunk: true,
                    metadata: None,
                }
                .into(),
            );
        }

        let status = match error {
            Some(error) => TaskStatus::new(TaskState::Failed).with_message(
                Message::new(MessageRole::Agent, vec![Part::text(error)])
                    .with_task(self.task_id.clone(), self.context_id.clone()),
            ),
            None if !self.long_running_ids.is_empty() => TaskStatus::new(TaskState::InputRequired),
            None => TaskStatus::new(TaskState::Completed),
        };
        debug!(
            task_id = %self.task_id,
            state = ?status.state,
            pending_calls = self.long_running_ids.len(),
            "task finished"
        );
        events.push(self.status(status, true));
        events
    }

    fn status(&self, status: TaskStatus, is_final: bool) -> ProtocolEvent {
        TaskStatusUpdateEvent {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            status,
            is_final,
            metadata: None,
        }
        .into()
    }
}
