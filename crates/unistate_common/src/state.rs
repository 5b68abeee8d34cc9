use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{Action, ErrorReport};

/// Field holding the session's display name.
pub const NAME_FIELD: &str = "name";
/// Field holding the last vector pushed by the peer.
pub const RESULT_VECTOR_FIELD: &str = "result_vector";
/// Field holding the last error record, when one occurred.
pub const ERROR_FIELD: &str = "error";

/// The shared state of one session: a map from field name to JSON value.
///
/// Values are stored behind `Arc`, so [`SessionState::with_field`] is a shallow
/// copy: every field other than the one being replaced is shared with the
/// previous state rather than deep-cloned. States are never modified in place
/// once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState {
    fields: BTreeMap<String, Arc<Value>>,
}

impl Default for SessionState {
    /// The empty session: `{"name": "", "result_vector": []}`.
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(NAME_FIELD.to_string(), Arc::new(Value::from("")));
        fields.insert(RESULT_VECTOR_FIELD.to_string(), Arc::new(Value::Array(Vec::new())));
        Self { fields }
    }
}

impl SessionState {
    /// A copy of this state with `key` set to `value`.
    pub fn with_field(&self, key: impl Into<String>, value: Value) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), Arc::new(value));
        Self { fields }
    }

    /// A copy of this state whose `error` field is the full error record.
    pub fn with_error(&self, report: ErrorReport) -> Self {
        self.with_field(ERROR_FIELD, Value::Object(Action::Error(report).to_record()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).map(Arc::as_ref)
    }

    /// The shared handle behind a field, for identity comparisons.
    pub fn field(&self, key: &str) -> Option<&Arc<Value>> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `name` field, or `""` when it holds something other than a string.
    pub fn name(&self) -> &str {
        self.get(NAME_FIELD).and_then(Value::as_str).unwrap_or_default()
    }

    /// The numeric entries of `result_vector`.
    pub fn result_vector(&self) -> Vec<f64> {
        self.get(RESULT_VECTOR_FIELD)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    /// The `error` field decoded back into a report.
    pub fn error(&self) -> Option<ErrorReport> {
        let Value::Object(record) = self.get(ERROR_FIELD)? else {
            return None;
        };
        match Action::from_record(record.clone()) {
            Ok(Action::Error(report)) => Some(report),
            _ => None,
        }
    }
}
