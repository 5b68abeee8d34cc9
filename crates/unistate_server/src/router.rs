//! Per-connection routing of tagged actions.
//!
//! Every connection gets its own [`Router`], which keeps a mirror of the
//! client's session state. `assign` and `axpy` are handled directly; any other
//! tag is looked up in the shared [`Routes`] table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use unistate_common::state::RESULT_VECTOR_FIELD;
use unistate_common::{Action, Assign, SessionState, decode_frame};

use crate::error::RouteError;

/// Handler for an application tag.
///
/// Receives the connection's mirrored state and the record without its `tag`.
/// Returned actions are sent back to the client in order.
pub trait RouteHandler: Send + Sync {
    fn call(
        &self,
        state: &mut SessionState,
        payload: &Map<String, Value>,
    ) -> Result<Vec<Action>, RouteError>;
}

impl<F> RouteHandler for F
where
    F: Fn(&mut SessionState, &Map<String, Value>) -> Result<Vec<Action>, RouteError> + Send + Sync,
{
    fn call(
        &self,
        state: &mut SessionState,
        payload: &Map<String, Value>,
    ) -> Result<Vec<Action>, RouteError> {
        self(state, payload)
    }
}

/// Application routes, keyed by tag. Shared by every connection.
#[derive(Default)]
pub struct Routes {
    handlers: HashMap<String, Box<dyn RouteHandler>>,
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `tag`, replacing any earlier handler.
    pub fn route(mut self, tag: impl Into<String>, handler: impl RouteHandler + 'static) -> Self {
        self.handlers.insert(tag.into(), Box::new(handler));
        self
    }

    pub fn get(&self, tag: &str) -> Option<&dyn RouteHandler> {
        self.handlers.get(tag).map(Box::as_ref)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Server end of one session.
pub struct Router {
    routes: Arc<Routes>,
    state: SessionState,
}

impl Router {
    pub fn new(routes: Arc<Routes>) -> Self {
        Self {
            routes,
            state: SessionState::default(),
        }
    }

    /// The mirrored client state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Decode and route one text frame.
    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<Action>, RouteError> {
        let action = decode_frame(frame)?;
        self.dispatch(action)
    }

    /// Route one action, returning the replies for the client.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Action>, RouteError> {
        if action.tag().starts_with('_') {
            return Err(RouteError::PrivateRoute {
                tag: action.tag().to_string(),
            });
        }

        match action {
            Action::Assign(Assign { key, value }) => {
                debug!(%key, "mirroring assign");
                self.state = self.state.with_field(key, value);
                Ok(Vec::new())
            }
            Action::Axpy(axpy) => {
                debug!(a = axpy.a, len = axpy.x.len().min(axpy.y.len()), "computing axpy");
                Ok(vec![Action::assign(RESULT_VECTOR_FIELD, axpy.evaluate())])
            }
            Action::Custom(custom) => match self.routes.get(&custom.tag) {
                Some(handler) => handler.call(&mut self.state, &custom.payload),
                None => {
                    info!(tag = %custom.tag, "route not found");
                    Ok(Vec::new())
                }
            },
            Action::Error(report) => {
                warn!(error = %report.error(), "route not found for client error report");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unistate_common::state::NAME_FIELD;
    use unistate_common::{FrameError, encode_frame};

    fn broken(_: &mut SessionState, _: &Map<String, Value>) -> Result<Vec<Action>, RouteError> {
        Err(RouteError::handler("broken", "Seems I've made a mistake!"))
    }

    fn greet(state: &mut SessionState, _: &Map<String, Value>) -> Result<Vec<Action>, RouteError> {
        Ok(vec![Action::assign("greeting", format!("hello {}", state.name()))])
    }

    fn router() -> Router {
        let routes = Routes::new().route("broken", broken).route("greet", greet);
        Router::new(Arc::new(routes))
    }

    #[test]
    fn test_assign_is_mirrored_without_reply() {
        let mut router = router();
        let replies = router
            .handle_frame(&encode_frame(&Action::assign(NAME_FIELD, "yak")))
            .unwrap();

        assert!(replies.is_empty());
        assert_eq!(router.state().name(), "yak");
    }

    #[test]
    fn test_axpy_replies_with_result_vector() {
        let mut router = router();
        let replies = router
            .handle_frame(r#"{"tag": "axpy", "a": 1, "x": [1, 2], "y": [4, 6]}"#)
            .unwrap();

        assert_eq!(replies, vec![Action::assign(RESULT_VECTOR_FIELD, json!([5.0, 8.0]))]);
    }

    #[test]
    fn test_axpy_truncates_to_shorter_vector() {
        let mut router = router();
        let replies = router
            .dispatch(Action::axpy(2.0, vec![1.0, 2.0, 3.0], vec![1.0]))
            .unwrap();

        assert_eq!(replies, vec![Action::assign(RESULT_VECTOR_FIELD, json!([3.0]))]);
    }

    #[test]
    fn test_custom_route_sees_mirrored_state() {
        let mut router = router();
        router.dispatch(Action::assign(NAME_FIELD, "yak")).unwrap();
        let replies = router.dispatch(Action::custom("greet", Map::new())).unwrap();

        assert_eq!(replies, vec![Action::assign("greeting", "hello yak")]);
    }

    #[test]
    fn test_failing_route_is_recoverable() {
        let mut router = router();
        let err = router.dispatch(Action::custom("broken", Map::new())).unwrap_err();

        assert!(!err.is_fatal());
        assert_eq!(err.report().error(), "Seems I've made a mistake!");
    }

    #[test]
    fn test_unknown_tag_is_ignored() {
        let mut router = router();
        assert!(router.dispatch(Action::custom("shave", Map::new())).unwrap().is_empty());
        assert!(router.dispatch(Action::error("from client", "x")).unwrap().is_empty());
    }

    #[test]
    fn test_private_tag_is_rejected() {
        let mut router = router();
        let err = router.handle_frame(r#"{"tag": "_send"}"#).unwrap_err();

        assert!(matches!(err, RouteError::PrivateRoute { ref tag } if tag == "_send"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_malformed_frame_is_fatal() {
        let mut router = router();
        let err = router.handle_frame("{").unwrap_err();

        assert!(matches!(err, RouteError::MalformedFrame(FrameError::Json(_))));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_bad_axpy_payload_is_recoverable() {
        let mut router = router();
        let err = router.handle_frame(r#"{"tag": "axpy", "a": 1}"#).unwrap_err();

        assert!(!err.is_fatal());
        assert_eq!(router.state(), &SessionState::default());
    }
}
