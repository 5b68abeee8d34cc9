use thiserror::Error;

/// Errors produced while turning a text frame into an [`Action`](crate::Action).
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame is valid JSON but not an object.
    #[error("expected an action record, found {found}")]
    NotARecord {
        /// JSON kind that was found instead
        found: &'static str,
    },

    /// The record has no string `tag` field.
    #[error("action record has no string `tag` field")]
    MissingTag,

    /// The record's fields do not match what its tag requires.
    #[error("invalid payload for `{tag}`: {source}")]
    InvalidPayload {
        /// Tag of the offending record
        tag: String,
        /// Underlying deserialization error
        source: serde_json::Error,
    },
}
