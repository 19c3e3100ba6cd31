//! Part conversion between the wire schema and the session schema.
//!
//! Conversion is strictly 1:1 and order preserving in both directions.
//! Long-running extraction pairs wire parts with converted parts by index,
//! so no mapping here may drop, merge or reorder parts.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use relay_protocol::a2a::{self, FileContent, Metadata, MessageRole};
use relay_protocol::metadata::{
    LONG_RUNNING_KEY, PART_TYPE_FUNCTION_CALL, PART_TYPE_FUNCTION_RESPONSE, PART_TYPE_KEY,
};
use relay_protocol::session::{
    self, Blob, FileData, FunctionCall, FunctionResponse, PartData, Role, USER_AUTHOR,
};
use relay_protocol::{RelayError, RelayResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Converts wire parts into session parts. Fails on the first part that
/// cannot be converted; no partial list is returned.
pub fn parts_from_external(parts: &[a2a::Part]) -> RelayResult<Vec<session::Part>> {
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| part_from_external(index, part))
        .collect()
}

fn part_from_external(index: usize, part: &a2a::Part) -> RelayResult<session::Part> {
    let data = match part {
        a2a::Part::Text { text, .. } => PartData::Text(text.clone()),
        a2a::Part::File { file, .. } => match file {
            FileContent::Bytes {
                bytes, mime_type, ..
            } => {
                let data = STANDARD
                    .decode(bytes)
                    .map_err(|error| RelayError::part(index, part.kind(), error))?;
                PartData::InlineData(Blob {
                    mime_type: mime_type.clone().unwrap_or_default(),
                    data,
                })
            }
            FileContent::Uri { uri, mime_type, .. } => PartData::FileData(FileData {
                mime_type: mime_type.clone().unwrap_or_default(),
                file_uri: uri.clone(),
            }),
        },
        a2a::Part::Data { data, metadata } => data_from_external(index, data, metadata.as_ref())?,
        a2a::Part::Unknown { original_kind, .. } => {
            return Err(RelayError::part(
                index,
                original_kind.as_str(),
                "unsupported part kind",
            ));
        }
    };
    Ok(session::Part::new(data))
}

fn data_from_external(
    index: usize,
    data: &Map<String, Value>,
    metadata: Option<&Metadata>,
) -> RelayResult<PartData> {
    match part_type(metadata) {
        Some(PART_TYPE_FUNCTION_CALL) => {
            decode::<FunctionCall>(index, data).map(PartData::FunctionCall)
        }
        Some(PART_TYPE_FUNCTION_RESPONSE) => {
            decode::<FunctionResponse>(index, data).map(PartData::FunctionResponse)
        }
        // Untyped structured payloads travel as their JSON text.
        _ => Ok(PartData::Text(Value::Object(data.clone()).to_string())),
    }
}

fn part_type(metadata: Option<&Metadata>) -> Option<&str> {
    metadata?.get(PART_TYPE_KEY)?.as_str()
}

fn decode<T: DeserializeOwned>(index: usize, data: &Map<String, Value>) -> RelayResult<T> {
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|error| RelayError::part(index, "data", error))
}

/// Whether a wire part carries the long-running marker.
pub fn is_long_running(part: &a2a::Part) -> bool {
    matches!(part, a2a::Part::Data { .. })
        && part
            .metadata()
            .and_then(|metadata| metadata.get(LONG_RUNNING_KEY))
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

/// Ids of the function calls marked long-running, in wire order.
///
/// `internal` must be the result of [`parts_from_external`] on `external`.
/// A marker whose counterpart is not a function call, or is a call without
/// an id, is skipped.
pub fn long_running_tool_ids(external: &[a2a::Part], internal: &[session::Part]) -> Vec<String> {
    external
        .iter()
        .enumerate()
        .filter(|(_, part)| is_long_running(part))
        .filter_map(
            |(index, _)| match internal.get(index).and_then(session::Part::as_function_call) {
                Some(call) if !call.id.is_empty() => Some(call.id.clone()),
                Some(call) => {
                    warn!(index, name = %call.name, "long-running call has no id");
                    None
                }
                None => {
                    warn!(index, "long-running marker on a part that is not a function call");
                    None
                }
            },
        )
        .collect()
}

/// Converts session parts into wire parts. Function calls listed in
/// `long_running_ids` carry the long-running marker.
pub fn parts_to_external(
    parts: &[session::Part],
    long_running_ids: &[String],
) -> RelayResult<Vec<a2a::Part>> {
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| part_to_external(index, part, long_running_ids))
        .collect()
}

fn part_to_external(
    index: usize,
    part: &session::Part,
    long_running_ids: &[String],
) -> RelayResult<a2a::Part> {
    Ok(match &part.data {
        PartData::Text(text) => a2a::Part::text(text.as_str()),
        PartData::InlineData(blob) => a2a::Part::File {
            file: FileContent::Bytes {
                bytes: STANDARD.encode(&blob.data),
                mime_type: non_empty(&blob.mime_type),
                name: None,
            },
            metadata: None,
        },
        PartData::FileData(file) => a2a::Part::File {
            file: FileContent::Uri {
                uri: file.file_uri.clone(),
                mime_type: non_empty(&file.mime_type),
                name: None,
            },
            metadata: None,
        },
        PartData::FunctionCall(call) => {
            let mut metadata = typed_metadata(PART_TYPE_FUNCTION_CALL);
            if long_running_ids.contains(&call.id) {
                metadata.insert(LONG_RUNNING_KEY.to_owned(), Value::Bool(true));
            }
            a2a::Part::data(encode(index, "function_call", call)?, Some(metadata))
        }
        PartData::FunctionResponse(response) => a2a::Part::data(
            encode(index, "function_response", response)?,
            Some(typed_metadata(PART_TYPE_FUNCTION_RESPONSE)),
        ),
    })
}

fn typed_metadata(part_type: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(PART_TYPE_KEY.to_owned(), Value::from(part_type));
    metadata
}

fn encode<T: Serialize>(index: usize, kind: &str, value: &T) -> RelayResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RelayError::part(
            index,
            kind,
            format!("expected a JSON object, got {other}"),
        )),
        Err(error) => Err(RelayError::part(index, kind, error)),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

/// Wire role to session role. Only `user` is preserved; everything else
/// collapses to `model`.
pub fn content_role(role: MessageRole) -> Role {
    match role {
        MessageRole::User => Role::User,
        MessageRole::Agent | MessageRole::Unspecified => Role::Model,
    }
}

/// Session author to wire role.
pub fn message_role(author: &str) -> MessageRole {
    if author == USER_AUTHOR {
        MessageRole::User
    } else {
        MessageRole::Agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn call_part(id: &str, long_running: bool) -> a2a::Part {
        let mut metadata = typed_metadata(PART_TYPE_FUNCTION_CALL);
        if long_running {
            metadata.insert(LONG_RUNNING_KEY.to_owned(), Value::Bool(true));
        }
        a2a::Part::data(
            object(json!({"id": id, "name": "approve", "args": {"amount": 10}})),
            Some(metadata),
        )
    }

    #[test]
    fn converts_each_kind_in_order() {
        let external = vec![
            a2a::Part::text("hello"),
            a2a::Part::File {
                file: FileContent::Bytes {
                    bytes: "aGk=".into(),
                    mime_type: Some("text/plain".into()),
                    name: None,
                },
                metadata: None,
            },
            a2a::Part::File {
                file: FileContent::Uri {
                    uri: "gs://bucket/cat.png".into(),
                    mime_type: Some("image/png".into()),
                    name: Some("cat.png".into()),
                },
                metadata: None,
            },
            call_part("call-1", false),
            a2a::Part::data(
                object(json!({"id": "call-1", "name": "approve", "response": {"ok": true}})),
                Some(typed_metadata(PART_TYPE_FUNCTION_RESPONSE)),
            ),
        ];

        let internal = parts_from_external(&external).unwrap();
        assert_eq!(internal.len(), external.len());
        assert_eq!(internal[0].as_text(), Some("hello"));
        assert!(matches!(&internal[1].data, PartData::InlineData(blob) if blob.data == b"hi"));
        assert!(
            matches!(&internal[2].data, PartData::FileData(file) if file.file_uri == "gs://bucket/cat.png")
        );
        let call = internal[3].as_function_call().unwrap();
        assert_eq!(call.id, "call-1");
        assert_eq!(call.args["amount"], 10);
        assert!(
            matches!(&internal[4].data, PartData::FunctionResponse(resp) if resp.response["ok"] == true)
        );
        assert!(internal.iter().all(|part| !part.thought));
    }

    #[test]
    fn untyped_data_becomes_json_text() {
        let external = vec![a2a::Part::data(object(json!({"score": 3})), None)];
        let internal = parts_from_external(&external).unwrap();
        assert_eq!(internal[0].as_text(), Some(r#"{"score":3}"#));
    }

    #[test]
    fn unknown_kind_fails_the_whole_batch() {
        let unknown: a2a::Part = serde_json::from_value(json!({"kind": "video"})).unwrap();
        let external = vec![a2a::Part::text("ok"), unknown];
        let err = parts_from_external(&external).unwrap_err();
        assert!(matches!(
            err,
            RelayError::PartConversion { index: 1, ref kind, .. } if kind == "video"
        ));
    }

    #[test]
    fn invalid_base64_is_a_conversion_failure() {
        let external = vec![a2a::Part::File {
            file: FileContent::Bytes {
                bytes: "not base64!".into(),
                mime_type: None,
                name: None,
            },
            metadata: None,
        }];
        let err = parts_from_external(&external).unwrap_err();
        assert!(matches!(err, RelayError::PartConversion { index: 0, .. }));
    }

    #[test]
    fn malformed_function_call_is_a_conversion_failure() {
        let external = vec![a2a::Part::data(
            object(json!({"id": "call-1"})),
            Some(typed_metadata(PART_TYPE_FUNCTION_CALL)),
        )];
        assert!(parts_from_external(&external).is_err());
    }

    #[test]
    fn long_running_ids_follow_positions() {
        let external = vec![
            a2a::Part::text("working on it"),
            call_part("call-1", true),
            call_part("call-2", false),
            call_part("call-3", true),
        ];
        let internal = parts_from_external(&external).unwrap();
        assert_eq!(
            long_running_tool_ids(&external, &internal),
            vec!["call-1".to_owned(), "call-3".to_owned()]
        );
    }

    #[test]
    fn marker_on_non_call_part_is_skipped() {
        let mut metadata = Metadata::new();
        metadata.insert(LONG_RUNNING_KEY.to_owned(), Value::Bool(true));
        let external = vec![
            a2a::Part::data(object(json!({"note": "not a call"})), Some(metadata)),
            call_part("call-2", true),
        ];
        let internal = parts_from_external(&external).unwrap();
        assert_eq!(long_running_tool_ids(&external, &internal), vec!["call-2"]);
    }

    #[test]
    fn long_running_call_without_id_is_skipped() {
        let mut metadata = typed_metadata(PART_TYPE_FUNCTION_CALL);
        metadata.insert(LONG_RUNNING_KEY.to_owned(), Value::Bool(true));
        let external = vec![
            a2a::Part::data(object(json!({"name": "n"})), Some(metadata)),
            call_part("call-2", true),
        ];
        let internal = parts_from_external(&external).unwrap();
        assert_eq!(internal[0].as_function_call().unwrap().id, "");
        assert_eq!(long_running_tool_ids(&external, &internal), vec!["call-2"]);
    }

    #[test]
    fn marker_must_be_boolean_true() {
        let mut metadata = typed_metadata(PART_TYPE_FUNCTION_CALL);
        metadata.insert(LONG_RUNNING_KEY.to_owned(), Value::from("true"));
        let part = a2a::Part::data(object(json!({"id": "c", "name": "n"})), Some(metadata));
        assert!(!is_long_running(&part));
        assert!(is_long_running(&call_part("c", true)));
        assert!(!is_long_running(&a2a::Part::text("t")));
    }

    #[test]
    fn to_external_marks_long_running_calls() {
        let parts = vec![
            session::Part::function_call(FunctionCall::new("a", "approve", Map::new())),
            session::Part::function_call(FunctionCall::new("b", "lookup", Map::new())),
        ];
        let external = parts_to_external(&parts, &["a".to_owned()]).unwrap();
        assert!(is_long_running(&external[0]));
        assert!(!is_long_running(&external[1]));
        assert_eq!(
            external[1].metadata().unwrap()[PART_TYPE_KEY],
            PART_TYPE_FUNCTION_CALL
        );
    }

    #[test]
    fn to_external_encodes_blobs() {
        let parts = vec![session::Part::inline_data("", b"hi".to_vec())];
        let external = parts_to_external(&parts, &[]).unwrap();
        assert_eq!(
            external[0],
            a2a::Part::File {
                file: FileContent::Bytes {
                    bytes: "aGk=".into(),
                    mime_type: None,
                    name: None,
                },
                metadata: None,
            }
        );
    }

    #[test]
    fn role_mapping() {
        assert_eq!(content_role(MessageRole::User), Role::User);
        assert_eq!(content_role(MessageRole::Agent), Role::Model);
        assert_eq!(content_role(MessageRole::Unspecified), Role::Model);
        assert_eq!(message_role("user"), MessageRole::User);
        assert_eq!(message_role("planner"), MessageRole::Agent);
    }
}
