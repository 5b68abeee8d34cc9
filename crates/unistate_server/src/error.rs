use async_tungstenite::tungstenite;
use thiserror::Error;
use unistate_common::{ErrorReport, FrameError};

/// Failure while routing one inbound frame.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The frame was not a valid tagged record.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// Tags starting with `_` are never routed.
    #[error("Calling private methods is not allowed: `{tag}`")]
    PrivateRoute { tag: String },

    /// Only text frames carry actions.
    #[error("expected a text frame")]
    NotText,

    /// A route handler reported a failure.
    #[error("{message}")]
    Handler { tag: String, message: String },
}

impl RouteError {
    pub fn handler(tag: impl Into<String>, message: impl Into<String>) -> Self {
        RouteError::Handler {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Whether the connection should be closed after reporting this error.
    ///
    /// A well-formed record whose fields do not fit its tag is answered like a
    /// failing handler. Anything that is not a tagged record ends the connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RouteError::Handler { .. }
                | RouteError::MalformedFrame(FrameError::InvalidPayload { .. })
        )
    }

    /// The error as it is reported back to the client.
    pub fn report(&self) -> ErrorReport {
        let details = match self {
            RouteError::Handler { tag, .. } => format!("route `{tag}` failed: {self}"),
            RouteError::MalformedFrame(source) => source.to_string(),
            RouteError::PrivateRoute { tag } => format!("rejected tag `{tag}`"),
            RouteError::NotText => "binary and ping frames carry no actions".to_string(),
        };
        ErrorReport::new(self.to_string()).with_details(details)
    }
}

/// Errors that stop the server or one of its connections.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("connection closed after routing error: {0}")]
    Route(#[from] RouteError),
}
