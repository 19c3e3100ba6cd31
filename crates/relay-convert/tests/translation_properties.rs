use relay_convert::{TaskUpdateWriter, to_protocol_message, to_session_event};
use relay_protocol::a2a::{
    Artifact, Message, MessageRole, Part, ProtocolEvent, Task, TaskArtifactUpdateEvent, TaskState,
    TaskStatus, TaskStatusUpdateEvent,
};
use relay_protocol::metadata::{
    CONTEXT_ID_KEY, LONG_RUNNING_KEY, PART_TYPE_FUNCTION_CALL, PART_TYPE_KEY, TASK_ID_KEY,
};
use relay_protocol::session::{self, Content, FunctionCall, FunctionResponse, Role, SessionEvent};
use relay_protocol::{InvocationContext, StaticInvocationContext};
use serde_json::{Map, Value, json};

fn ctx() -> StaticInvocationContext {
    StaticInvocationContext::new("inv-42", "weather_agent").with_branch("root.weather_agent")
}

fn inbound(event: impl Into<ProtocolEvent>) -> Option<SessionEvent> {
    let ctx = ctx();
    to_session_event(Some(&ctx), &event.into()).expect("translation should succeed")
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn long_running_call(id: &str) -> Part {
    let mut metadata = Map::new();
    metadata.insert(PART_TYPE_KEY.into(), Value::from(PART_TYPE_FUNCTION_CALL));
    metadata.insert(LONG_RUNNING_KEY.into(), Value::Bool(true));
    Part::data(
        object(json!({"id": id, "name": "request_approval", "args": {"amount": 250}})),
        Some(metadata),
    )
}

fn status_update(
    state: TaskState,
    message: Option<Message>,
    is_final: bool,
) -> TaskStatusUpdateEvent {
    let mut status = TaskStatus::new(state);
    status.message = message;
    TaskStatusUpdateEvent {
        task_id: "t1".into(),
        context_id: "c1".into(),
        status,
        is_final,
        metadata: None,
    }
}

#[test]
fn user_message_scenario() {
    let message = Message::new(MessageRole::User, vec![Part::text("hi")]).with_task("t1", "c1");
    let event = inbound(message).expect("message should produce an event");

    let content = event.content.as_ref().expect("content");
    assert_eq!(content.role, Role::User);
    assert_eq!(content.parts, vec![session::Part::text("hi")]);
    assert_eq!(event.custom_metadata[TASK_ID_KEY], "t1");
    assert_eq!(event.custom_metadata[CONTEXT_ID_KEY], "c1");
    assert_eq!(event.author, "weather_agent");
    assert!(!event.turn_complete);
}

#[test]
fn message_part_count_and_role() {
    for (role, expected) in [
        (MessageRole::User, Role::User),
        (MessageRole::Agent, Role::Model),
        (MessageRole::Unspecified, Role::Model),
    ] {
        let parts = vec![Part::text("a"), Part::text("b"), long_running_call("x")];
        let event = inbound(Message::new(role, parts)).expect("event");
        assert_eq!(event.parts().len(), 3);
        assert_eq!(event.content.as_ref().map(|c| c.role), Some(expected));
    }
}

#[test]
fn metadata_keys_are_written_together_or_not_at_all() {
    let cases: Vec<ProtocolEvent> = vec![
        Message::new(MessageRole::Agent, vec![Part::text("x")]).into(),
        Message::new(MessageRole::Agent, vec![Part::text("x")])
            .with_task("t1", "c1")
            .into(),
        {
            let mut message = Message::new(MessageRole::Agent, vec![Part::text("x")]);
            message.context_id = Some("c-only".into());
            message.into()
        },
        status_update(TaskState::Completed, None, true).into(),
    ];
    for case in cases {
        let ctx = ctx();
        let event = to_session_event(Some(&ctx), &case).unwrap().unwrap();
        let has_task = event.custom_metadata.contains_key(TASK_ID_KEY);
        let has_context = event.custom_metadata.contains_key(CONTEXT_ID_KEY);
        assert_eq!(has_task, has_context, "{case:?}");
    }
}

#[test]
fn outbound_then_inbound_preserves_parts_and_role() {
    let ctx = ctx();
    let parts = vec![
        session::Part::text("checking the forecast"),
        session::Part::inline_data("image/png", vec![0x89, 0x50, 0x4e, 0x47]),
        session::Part::function_call(FunctionCall::new(
            "call-1",
            "get_forecast",
            object(json!({"city": "Lisbon"})),
        )),
        session::Part::function_response(FunctionResponse {
            id: "call-1".into(),
            name: "get_forecast".into(),
            response: object(json!({"temp_c": 21})),
        }),
    ];

    for (author, role) in [("user", Role::User), ("weather_agent", Role::Model)] {
        let mut original = SessionEvent::new(&ctx)
            .with_author(author)
            .with_content(Content::new(role, parts.clone()));
        original.long_running_tool_ids = vec!["call-1".into()];

        let message = to_protocol_message(Some(&ctx), &original)
            .unwrap()
            .expect("message");
        let back = to_session_event(Some(&ctx), &message.into())
            .unwrap()
            .expect("event");

        let content = back.content.expect("content");
        assert_eq!(content.role, role);
        assert_eq!(content.parts, parts);
        assert_eq!(back.long_running_tool_ids, vec!["call-1".to_owned()]);
    }
}

#[test]
fn thought_flags_do_not_survive_the_wire() {
    let ctx = ctx();
    let mut thought = session::Part::text("pondering");
    thought.thought = true;
    let original = SessionEvent::new(&ctx).with_content(Content::new(Role::Model, vec![thought]));
    let message = to_protocol_message(Some(&ctx), &original).unwrap().unwrap();
    let back = to_session_event(Some(&ctx), &message.into()).unwrap().unwrap();
    assert!(!back.parts()[0].thought);
    assert_eq!(back.parts()[0].as_text(), Some("pondering"));
}

#[test]
fn long_running_ids_only_kept_when_input_required() {
    let task_in = |state: TaskState| {
        let mut task = Task::new("t1", "c1", state);
        task.artifacts = vec![Artifact::new(
            "a1",
            vec![Part::text("need approval"), long_running_call("call-9")],
        )];
        task
    };

    let paused = inbound(task_in(TaskState::InputRequired)).expect("event");
    assert_eq!(paused.long_running_tool_ids, vec!["call-9".to_owned()]);
    assert!(paused.turn_complete);

    for state in [TaskState::Working, TaskState::Completed, TaskState::Failed] {
        let event = inbound(task_in(state)).expect("event");
        assert!(event.long_running_tool_ids.is_empty(), "{state:?}");
        assert_eq!(event.parts().len(), 2);
    }
}

#[test]
fn task_long_running_ids_include_status_message_in_order() {
    let mut task = Task::new("t1", "c1", TaskState::InputRequired);
    task.artifacts = vec![Artifact::new("a1", vec![long_running_call("first")])];
    task.status = TaskStatus::new(TaskState::InputRequired).with_message(Message::new(
        MessageRole::Agent,
        vec![long_running_call("second")],
    ));
    let event = inbound(task).expect("event");
    assert_eq!(event.long_running_tool_ids, vec!["first", "second"]);
}

#[test]
fn non_final_status_parts_are_thoughts() {
    let message = Message::new(
        MessageRole::Agent,
        vec![Part::text("looking up"), Part::text("still looking")],
    );
    let event = inbound(status_update(TaskState::Working, Some(message), false)).expect("event");
    assert_eq!(event.parts().len(), 2);
    assert!(event.parts().iter().all(|part| part.thought));
    assert!(!event.turn_complete);
    assert_eq!(event.custom_metadata[TASK_ID_KEY], "t1");
}

#[test]
fn final_status_parts_are_never_thoughts() {
    let message = Message::new(MessageRole::Agent, vec![Part::text("all done")]);
    let event = inbound(status_update(TaskState::Completed, Some(message), true)).expect("event");
    assert!(event.parts().iter().all(|part| !part.thought));
    assert!(event.turn_complete);
}

#[test]
fn final_status_without_message_still_emits() {
    let update = TaskStatusUpdateEvent {
        task_id: "t2".into(),
        context_id: Default::default(),
        status: TaskStatus::new(TaskState::Completed),
        is_final: true,
        metadata: None,
    };
    let event = inbound(update).expect("terminal event");
    assert!(event.content.is_none());
    assert_eq!(event.custom_metadata[TASK_ID_KEY], "t2");
    assert_eq!(event.custom_metadata[CONTEXT_ID_KEY], "");
    assert!(event.turn_complete);
}

#[test]
fn empty_artifact_update_is_a_no_op() {
    let update = TaskArtifactUpdateEvent {
        task_id: "t1".into(),
        context_id: "c1".into(),
        artifact: Artifact::new("a1", Vec::new()),
        append: false,
        last_chunk: true,
        metadata: None,
    };
    assert!(inbound(update).is_none());
}

#[test]
fn artifact_update_long_running_ids_are_unconditional() {
    let update = TaskArtifactUpdateEvent {
        task_id: "t1".into(),
        context_id: "c1".into(),
        artifact: Artifact::new("a1", vec![long_running_call("call-5")]),
        append: false,
        last_chunk: false,
        metadata: None,
    };
    let event = inbound(update).expect("event");
    assert_eq!(event.long_running_tool_ids, vec!["call-5"]);
    assert_eq!(event.custom_metadata[CONTEXT_ID_KEY], "c1");
    assert_eq!(event.content.map(|c| c.role), Some(Role::Model));
}

#[test]
fn conversion_failure_aborts_the_event() {
    let json = json!({
        "kind": "artifact-update",
        "taskId": "t1",
        "contextId": "c1",
        "artifact": {
            "artifactId": "a1",
            "parts": [{"kind": "text", "text": "ok"}, {"kind": "hologram"}]
        }
    });
    let event: ProtocolEvent = serde_json::from_value(json).unwrap();
    let ctx = ctx();
    let err = to_session_event(Some(&ctx), &event).unwrap_err();
    assert!(err.to_string().contains("hologram"));
    assert!(!err.is_contract_violation());
}

#[test]
fn wire_json_translates_end_to_end() {
    let json = json!({
        "kind": "task",
        "id": "t7",
        "contextId": "c7",
        "status": {
            "state": "input-required",
            "message": {
                "kind": "message",
                "messageId": "m1",
                "role": "agent",
                "parts": [{
                    "kind": "data",
                    "data": {"id": "call-1", "name": "confirm", "args": {}},
                    "metadata": {"relay_type": "function_call", "relay_is_long_running": true}
                }]
            }
        }
    });
    let event: ProtocolEvent = serde_json::from_value(json).unwrap();
    let session = inbound(event).expect("event");
    assert_eq!(session.long_running_tool_ids, vec!["call-1"]);
    assert_eq!(
        session.parts()[0].as_function_call().map(|c| c.name.as_str()),
        Some("confirm")
    );
}

#[test]
fn translators_are_usable_across_threads() {
    let ctx = ctx();
    let ctx_ref: &dyn InvocationContext = &ctx;
    let message: ProtocolEvent = Message::new(MessageRole::Agent, vec![Part::text("x")]).into();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| to_session_event(Some(ctx_ref), &message)))
            .collect();
        for handle in handles {
            let event = handle.join().unwrap().unwrap().unwrap();
            assert_eq!(event.parts().len(), 1);
        }
    });
}

#[test]
fn task_writer_output_reads_back_as_session_events() {
    let ctx = ctx();
    let mut writer = TaskUpdateWriter::new("t1", "c1");

    let mut narration = session::Part::text("looking it up");
    narration.thought = true;
    let thinking = SessionEvent::new(&ctx).with_content(Content::new(Role::Model, vec![narration]));
    let mut call = SessionEvent::new(&ctx).with_content(Content::new(
        Role::Model,
        vec![session::Part::function_call(FunctionCall::new(
            "call-1",
            "request_approval",
            Map::new(),
        ))],
    ));
    call.long_running_tool_ids = vec!["call-1".into()];

    let mut wire = vec![writer.submitted()];
    wire.extend(writer.write(Some(&ctx), &thinking).unwrap());
    wire.extend(writer.write(Some(&ctx), &call).unwrap());
    wire.extend(writer.finish(None));

    let events: Vec<SessionEvent> = wire
        .iter()
        .filter_map(|event| to_session_event(Some(&ctx), event).unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert!(events[0].parts()[0].thought);
    assert_eq!(events[1].long_running_tool_ids, vec!["call-1"]);
    assert!(events[2].turn_complete);
    assert!(events[2].content.is_none());
    assert!(events.iter().all(|e| e.custom_metadata[TASK_ID_KEY] == "t1"));
}
