use serde_json::Value;
use weft_types::StreamEvent;

use crate::frame::SseFrame;

/// Decode a parsed SSE frame into a typed event.
///
/// The frame's `event:` name is injected into the data payload as the serde
/// tag, so the wire contract and the `StreamEvent` enum stay aligned. Frames
/// with an unknown name or unparseable JSON are dropped with a warning so a
/// newer backend never terminates an older client's stream.
pub fn decode_frame(frame: &SseFrame) -> Option<StreamEvent> {
    let Some(name) = frame.event.as_deref() else {
        tracing::warn!("Dropping SSE frame without an event name");
        return None;
    };

    let mut data: Value = match serde_json::from_str(&frame.data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(event = name, "Dropping SSE frame with malformed JSON: {}", e);
            return None;
        }
    };

    let Some(object) = data.as_object_mut() else {
        tracing::warn!(event = name, "Dropping SSE frame whose payload is not an object");
        return None;
    };
    object.insert("event".to_string(), Value::String(name.to_string()));

    match serde_json::from_value::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(event = name, "Dropping unrecognized SSE event: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: Some(event.to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_decode_message_chunk() {
        let decoded = decode_frame(&frame(
            "message_chunk",
            r#"{"thread_id":"t1","id":"m1","content":"你好","agent":"coordinator"}"#,
        ))
        .unwrap();

        match decoded {
            StreamEvent::MessageChunk(payload) => {
                assert_eq!(payload.content.as_deref(), Some("你好"));
            }
            _ => panic!("Expected MessageChunk"),
        }
    }

    #[test]
    fn test_decode_unknown_event_dropped() {
        assert!(decode_frame(&frame("hologram", "{}")).is_none());
    }

    #[test]
    fn test_decode_malformed_json_dropped() {
        assert!(decode_frame(&frame("message_chunk", "{not json")).is_none());
    }

    #[test]
    fn test_decode_non_object_payload_dropped() {
        assert!(decode_frame(&frame("message_chunk", "[1,2,3]")).is_none());
    }

    #[test]
    fn test_decode_missing_event_name_dropped() {
        let frame = SseFrame {
            event: None,
            data: "{}".to_string(),
        };
        assert!(decode_frame(&frame).is_none());
    }
}
