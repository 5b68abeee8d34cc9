//! Text frame codec.
//!
//! A frame carries exactly one action encoded as a JSON object. There is no
//! length prefix or envelope; the WebSocket message boundary is the frame
//! boundary.

use serde_json::Value;

use crate::action::Action;
use crate::error::FrameError;

/// Encode an action as a text frame.
pub fn encode_frame(action: &Action) -> String {
    Value::Object(action.to_record()).to_string()
}

/// Decode a text frame into an action.
pub fn decode_frame(frame: &str) -> Result<Action, FrameError> {
    match serde_json::from_str::<Value>(frame)? {
        Value::Object(record) => Action::from_record(record),
        other => Err(FrameError::NotARecord {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
