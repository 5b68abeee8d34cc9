use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::FrameError;

/// Tag of [`Action::Assign`].
pub const ASSIGN_TAG: &str = "assign";
/// Tag of [`Action::Error`].
pub const ERROR_TAG: &str = "error";
/// Tag of [`Action::Axpy`].
pub const AXPY_TAG: &str = "axpy";

/// A state transition request.
///
/// On the wire every action is a single JSON object whose `tag` field names the
/// variant and whose remaining fields are the payload:
///
/// ```json
/// {"tag": "axpy", "a": 2.0, "x": [1.0, 2.0], "y": [3.0, 4.0]}
/// ```
///
/// Tags without a dedicated variant decode to [`Action::Custom`] so that
/// applications can add their own messages without touching this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Merge one field into the session state.
    Assign(Assign),
    /// Attach an error to the session state.
    Error(ErrorReport),
    /// Ask the peer to compute `a * x + y`.
    Axpy(Axpy),
    /// Any other tag, carried opaquely.
    Custom(CustomAction),
}

/// Payload of [`Action::Assign`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assign {
    pub key: String,
    pub value: Value,
}

/// Payload of [`Action::Error`].
///
/// The record is kept exactly as the originator sent it, minus `tag`. Nothing
/// is required and nothing is added; [`ErrorReport::error`] and
/// [`ErrorReport::details`] only interpret it for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorReport {
    fields: Map<String, Value>,
}

/// Payload of [`Action::Axpy`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Axpy {
    pub a: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// An action whose tag has no dedicated variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
    pub tag: String,
    /// Every field of the record except `tag`
    pub payload: Map<String, Value>,
}

impl Action {
    /// Build an [`Action::Assign`].
    pub fn assign(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Action::Assign(Assign {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Build an [`Action::Error`] with details.
    pub fn error(error: impl Into<String>, details: impl Into<String>) -> Self {
        Action::Error(ErrorReport::new(error).with_details(details))
    }

    /// Build an [`Action::Axpy`].
    pub fn axpy(a: f64, x: Vec<f64>, y: Vec<f64>) -> Self {
        Action::Axpy(Axpy { a, x, y })
    }

    /// Build an action from a tag and its payload.
    ///
    /// Reserved tags (`assign`, `error`, `axpy`) yield their dedicated variant
    /// when the payload fits it. Everything else is an [`Action::Custom`].
    pub fn custom(tag: impl Into<String>, mut payload: Map<String, Value>) -> Self {
        let tag = tag.into();
        if is_reserved_tag(&tag) {
            let mut record = payload.clone();
            record.insert("tag".to_string(), Value::from(tag.as_str()));
            if let Ok(action) = Action::from_record(record) {
                return action;
            }
        }
        payload.remove("tag");
        Action::Custom(CustomAction { tag, payload })
    }

    /// Decode a [`Action::Custom`] that carries a reserved tag into its
    /// dedicated variant. Other actions are returned as they are.
    pub fn normalize(self) -> Self {
        match self {
            Action::Custom(CustomAction { tag, payload }) if is_reserved_tag(&tag) => {
                Action::custom(tag, payload)
            }
            action => action,
        }
    }

    /// The record's `tag`.
    pub fn tag(&self) -> &str {
        match self {
            Action::Assign(_) => ASSIGN_TAG,
            Action::Error(_) => ERROR_TAG,
            Action::Axpy(_) => AXPY_TAG,
            Action::Custom(custom) => &custom.tag,
        }
    }

    /// The action as a flat record, `tag` included.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("tag".to_string(), Value::from(self.tag()));
        match self {
            Action::Assign(assign) => {
                record.insert("key".to_string(), Value::from(assign.key.as_str()));
                record.insert("value".to_string(), assign.value.clone());
            }
            Action::Error(report) => {
                for (key, value) in &report.fields {
                    record.insert(key.clone(), value.clone());
                }
            }
            Action::Axpy(axpy) => {
                record.insert("a".to_string(), Value::from(axpy.a));
                record.insert("x".to_string(), Value::from(axpy.x.clone()));
                record.insert("y".to_string(), Value::from(axpy.y.clone()));
            }
            Action::Custom(custom) => {
                for (key, value) in &custom.payload {
                    if key != "tag" {
                        record.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        record
    }

    /// Rebuild an action from a flat record.
    pub fn from_record(mut record: Map<String, Value>) -> Result<Self, FrameError> {
        let tag = match record.remove("tag") {
            Some(Value::String(tag)) => tag,
            _ => return Err(FrameError::MissingTag),
        };

        let action = match tag.as_str() {
            ASSIGN_TAG => Action::Assign(decode_payload(&tag, record)?),
            ERROR_TAG => Action::Error(ErrorReport::from_fields(record)),
            AXPY_TAG => Action::Axpy(decode_payload(&tag, record)?),
            _ => Action::Custom(CustomAction {
                tag: tag.clone(),
                payload: record,
            }),
        };
        Ok(action)
    }
}

/// Whether `tag` has a dedicated [`Action`] variant.
pub fn is_reserved_tag(tag: &str) -> bool {
    matches!(tag, ASSIGN_TAG | ERROR_TAG | AXPY_TAG)
}

fn decode_payload<T: DeserializeOwned>(tag: &str, record: Map<String, Value>) -> Result<T, FrameError> {
    serde_json::from_value(Value::Object(record)).map_err(|source| FrameError::InvalidPayload {
        tag: tag.to_string(),
        source,
    })
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        Action::from_record(record).map_err(de::Error::custom)
    }
}

impl ErrorReport {
    pub fn new(error: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Value::String(error.into()));
        Self { fields }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.fields
            .insert("details".to_string(), Value::String(details.into()));
        self
    }

    /// Wrap a received record. A `tag` field, if present, is dropped.
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        fields.remove("tag");
        Self { fields }
    }

    /// The record as received, without `tag`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The `error` summary for display. Non-string values are rendered as JSON;
    /// an absent or null summary is empty.
    pub fn error(&self) -> String {
        self.display_field("error").unwrap_or_default()
    }

    /// The `details` text for display, if the record carries any.
    pub fn details(&self) -> Option<String> {
        self.display_field("details")
    }

    fn display_field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl Axpy {
    /// `a * x + y`, element-wise. Pairs past the end of the shorter vector are ignored.
    pub fn evaluate(&self) -> Vec<f64> {
        self.x
            .iter()
            .zip(&self.y)
            .map(|(xi, yi)| self.a * xi + yi)
            .collect()
    }
}
