//! Line framing and delta extraction for streamed responses.
//!
//! Both server-sent events (`data: {...}`) and newline-delimited JSON are
//! accepted, decided per line.

use serde_json::Value;
use thiserror::Error;

const DATA_MARKER: &str = "data:";
const TERMINAL_SENTINEL: &str = "[DONE]";
const SSE_FIELDS: [&str; 3] = ["event:", "id:", "retry:"];
const PAYLOAD_PREVIEW: usize = 120;

/// A line that claimed to carry JSON but did not parse.
#[derive(Debug, Error)]
#[error("malformed frame `{payload}`: {source}")]
pub struct FrameParseError {
    pub payload: String,
    #[source]
    pub source: serde_json::Error,
}

/// What one line contributes to the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub delta: Option<String>,
    pub terminal: bool,
}

impl Frame {
    const fn skip() -> Self {
        Self {
            delta: None,
            terminal: false,
        }
    }

    const fn terminal() -> Self {
        Self {
            delta: None,
            terminal: true,
        }
    }
}

/// Interpret one complete line.
pub fn parse_line(line: &str) -> Result<Frame, FrameParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(Frame::skip());
    }

    let payload = if let Some(rest) = line.strip_prefix(DATA_MARKER) {
        rest.trim()
    } else if SSE_FIELDS.iter().any(|field| line.starts_with(field)) {
        return Ok(Frame::skip());
    } else {
        line
    };

    if payload == TERMINAL_SENTINEL {
        return Ok(Frame::terminal());
    }
    if payload.is_empty() {
        return Ok(Frame::skip());
    }

    let value: Value = serde_json::from_str(payload).map_err(|source| FrameParseError {
        payload: preview(payload),
        source,
    })?;

    Ok(Frame {
        delta: extract_delta(&value).map(str::to_string),
        terminal: value.get("done").and_then(Value::as_bool) == Some(true),
    })
}

type Extractor = fn(&Value) -> Option<&str>;

/// Tried in order; the first hit wins.
const DELTA_EXTRACTORS: &[Extractor] = &[
    choice_delta_content,
    top_level_content,
    message_content,
    top_level_response,
];

const COMPLETE_EXTRACTORS: &[Extractor] = &[
    choice_message_content,
    top_level_response,
    top_level_content,
    plain_string,
];

/// Incremental text carried by one streamed frame.
#[must_use]
pub fn extract_delta(value: &Value) -> Option<&str> {
    DELTA_EXTRACTORS.iter().find_map(|extract| extract(value))
}

/// Answer text of a non-streaming response; unknown shapes are shown as
/// the serialized payload.
#[must_use]
pub fn extract_complete_text(value: &Value) -> String {
    COMPLETE_EXTRACTORS
        .iter()
        .find_map(|extract| extract(value))
        .map_or_else(|| value.to_string(), str::to_string)
}

fn choice_delta_content(value: &Value) -> Option<&str> {
    value.pointer("/choices/0/delta/content")?.as_str()
}

fn choice_message_content(value: &Value) -> Option<&str> {
    value.pointer("/choices/0/message/content")?.as_str()
}

fn top_level_content(value: &Value) -> Option<&str> {
    value.get("content")?.as_str()
}

fn message_content(value: &Value) -> Option<&str> {
    value.pointer("/message/content")?.as_str()
}

fn top_level_response(value: &Value) -> Option<&str> {
    value.get("response")?.as_str()
}

const fn plain_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn preview(payload: &str) -> String {
    if payload.chars().count() <= PAYLOAD_PREVIEW {
        return payload.to_string();
    }
    let mut cut: String = payload.chars().take(PAYLOAD_PREVIEW).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(line: &str) -> Option<String> {
        parse_line(line).ok().and_then(|f| f.delta)
    }

    #[test]
    fn sse_data_lines() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(delta(line).as_deref(), Some("Hel"));
        assert_eq!(delta(r#"data:{"content":"lo"}"#).as_deref(), Some("lo"));
    }

    #[test]
    fn ndjson_lines() {
        assert_eq!(delta(r#"{"message":{"content":"hi"}}"#).as_deref(), Some("hi"));
        assert_eq!(delta(r#"{"response":"yo"}"#).as_deref(), Some("yo"));
    }

    #[test]
    fn sentinel_and_done_flag_terminate() {
        assert!(parse_line("data: [DONE]").map(|f| f.terminal).unwrap_or_default());
        assert!(parse_line("[DONE]").map(|f| f.terminal).unwrap_or_default());

        let last = parse_line(r#"{"response":"!","done":true}"#).unwrap();
        assert_eq!(last.delta.as_deref(), Some("!"));
        assert!(last.terminal);
    }

    #[test]
    fn sse_bookkeeping_is_skipped() {
        for line in ["", "   ", ": keep-alive", "event: message", "id: 7", "retry: 3000", "data:"] {
            assert_eq!(parse_line(line).unwrap(), Frame::default(), "{line:?}");
        }
    }

    #[test]
    fn role_only_frames_carry_no_delta() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_line(line).unwrap(), Frame::default());
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = parse_line("data: {\"content\": ").unwrap_err();
        assert_eq!(err.payload, "{\"content\":");
    }

    #[test]
    fn long_payloads_are_shortened_in_errors() {
        let junk = format!("{{{}", "x".repeat(500));
        let err = parse_line(&junk).unwrap_err();
        assert_eq!(err.payload.chars().count(), PAYLOAD_PREVIEW + 1);
    }

    #[test]
    fn complete_text_shapes() {
        let chat = json!({"choices": [{"message": {"content": "answer"}}]});
        assert_eq!(extract_complete_text(&chat), "answer");
        assert_eq!(extract_complete_text(&json!({"response": "r"})), "r");
        assert_eq!(extract_complete_text(&json!({"content": "c"})), "c");
        assert_eq!(extract_complete_text(&json!("bare")), "bare");
        assert_eq!(extract_complete_text(&json!({"other": 1})), r#"{"other":1}"#);
    }
}
