use thiserror::Error;
use unistate_common::FrameError;

/// Errors that can occur inside a client session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport was closed; nothing more can be sent.
    #[error("transport is closed")]
    Closed,

    /// The transport reported a fault.
    #[error("transport error: {message}")]
    Transport {
        /// Description reported by the transport
        message: String,
    },

    /// The configured socket address does not form a valid URL.
    #[error("invalid socket url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Frame(#[from] FrameError),
}
