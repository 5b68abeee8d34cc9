use crate::error::SessionError;

/// Outbound half of the session's connection.
///
/// In the browser this wraps the `send` closure returned by
/// `leptos_use::use_websocket_with_options`; tests substitute a recorder.
pub trait Transport: Send + Sync {
    /// Transmit one encoded frame to the peer.
    fn send_frame(&self, frame: String) -> Result<(), SessionError>;
}

impl<F> Transport for F
where
    F: Fn(String) -> Result<(), SessionError> + Send + Sync,
{
    fn send_frame(&self, frame: String) -> Result<(), SessionError> {
        self(frame)
    }
}
