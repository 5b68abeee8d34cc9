//! A session: one store, one reducer and one link to the peer.
//!
//! Both local dispatches and inbound frames go through [`Session::dispatch`],
//! so the reducer is the single place where state changes. After the reducer
//! runs, the new state is published and any outbound action is encoded and
//! written to the link.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{debug, error, warn};
use unistate_common::{Action, SessionState, decode_frame, encode_frame};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::reducer::{ForwardPolicy, reduce};
use crate::store::{SessionStore, Subscription};
use crate::transport::Transport;

/// Error text recorded when the link faults or closes.
pub const WEBSOCKET_ERROR: &str = "Websocket error";
/// Error text recorded when an inbound frame cannot be decoded.
pub const MALFORMED_FRAME: &str = "Malformed frame";

/// Whether the session can still reach its peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Open,
    /// Terminal: the link is never reopened
    Closed,
}

enum Link {
    Open(Box<dyn Transport>),
    Closed,
}

impl Link {
    fn status(&self) -> LinkStatus {
        match self {
            Link::Open(_) => LinkStatus::Open,
            Link::Closed => LinkStatus::Closed,
        }
    }
}

struct SessionInner {
    store: SessionStore,
    policy: ForwardPolicy,
    link: Mutex<Link>,
}

/// Shared handle to a running session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    /// Start a session with an open link.
    pub fn open(config: &SessionConfig, transport: impl Transport + 'static) -> Self {
        Self::with_link(config, Link::Open(Box::new(transport)))
    }

    /// Start a session whose link could not be established.
    ///
    /// The session is already closed and its state carries the failure.
    pub fn detached(config: &SessionConfig, err: &SessionError) -> Self {
        let session = Self::with_link(config, Link::Closed);
        session.dispatch(Action::error(WEBSOCKET_ERROR, err.to_string()));
        session
    }

    fn with_link(config: &SessionConfig, link: Link) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store: SessionStore::new(SessionState::default()),
                policy: config.forward_policy(),
                link: Mutex::new(link),
            }),
        }
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.inner.store.state()
    }

    pub fn status(&self) -> LinkStatus {
        self.link().status()
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Listen for every state the session publishes.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<SessionState>) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn dispatcher(&self) -> Dispatch {
        Dispatch {
            session: self.clone(),
        }
    }

    /// Reduce `action`, publish the result and transmit the outbound action.
    pub fn dispatch(&self, action: Action) {
        let policy = &self.inner.policy;
        let outbound = self
            .inner
            .store
            .apply(|state| reduce(state, action, policy));

        if let Some(action) = outbound {
            self.transmit(&action);
        }
    }

    fn transmit(&self, action: &Action) {
        let frame = encode_frame(action);
        let result = match &*self.link() {
            Link::Open(transport) => transport.send_frame(frame),
            Link::Closed => Err(SessionError::Closed),
        };

        match result {
            Ok(()) => debug!("sent `{}` to peer", action.tag()),
            Err(SessionError::Closed) => {
                warn!("link closed, dropping outbound `{}`", action.tag());
            }
            Err(err) => self.transport_error(err.to_string()),
        }
    }

    /// Feed one inbound text frame into the reducer.
    pub fn receive_frame(&self, frame: &str) {
        match decode_frame(frame) {
            Ok(action) => {
                debug!("received `{}` from peer", action.tag());
                self.dispatch(action);
            }
            Err(err) => {
                warn!("malformed frame from peer: {err}");
                self.dispatch(Action::error(
                    MALFORMED_FRAME,
                    format!("{err}: {frame}"),
                ));
            }
        }
    }

    /// The link reported a fault. The session closes and records the error.
    pub fn transport_error(&self, details: impl Into<String>) {
        let details = details.into();
        error!("websocket error: {details}");
        self.close_with(details);
    }

    /// The link closed. The session records the closure as an error.
    pub fn transport_closed(&self, details: impl Into<String>) {
        let details = details.into();
        warn!("websocket closed: {details}");
        self.close_with(details);
    }

    fn close_with(&self, details: String) {
        let was_open = {
            let mut link = self.link();
            let was_open = matches!(*link, Link::Open(_));
            *link = Link::Closed;
            was_open
        };

        // Only the first fault is recorded; later ones describe the same loss.
        if was_open {
            self.dispatch(Action::error(WEBSOCKET_ERROR, details));
        }
    }

    fn link(&self) -> MutexGuard<'_, Link> {
        self.inner.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle components use to dispatch actions.
#[derive(Clone)]
pub struct Dispatch {
    session: Session,
}

impl Dispatch {
    pub fn dispatch(&self, action: Action) {
        self.session.dispatch(action);
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

/// Owns the one session of an application.
///
/// The connection is established the first time [`SessionHost::open`] runs.
/// Every later call returns the same session without connecting again.
pub struct SessionHost {
    config: SessionConfig,
    session: OnceLock<Session>,
}

impl SessionHost {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session, once it has been opened.
    pub fn session(&self) -> Option<&Session> {
        self.session.get()
    }

    /// Open the session, calling `connect` to build its transport.
    ///
    /// A failed connect still yields a session, closed and carrying the error.
    pub fn open<T, F>(&self, connect: F) -> &Session
    where
        T: Transport + 'static,
        F: FnOnce(&SessionConfig) -> Result<T, SessionError>,
    {
        self.session.get_or_init(|| match connect(&self.config) {
            Ok(transport) => Session::open(&self.config, transport),
            Err(err) => {
                error!("failed to open session: {err}");
                Session::detached(&self.config, &err)
            }
        })
    }

    /// Open the session and return its current state and a dispatcher.
    pub fn open_session<T, F>(&self, connect: F) -> (Arc<SessionState>, Dispatch)
    where
        T: Transport + 'static,
        F: FnOnce(&SessionConfig) -> Result<T, SessionError>,
    {
        let session = self.open(connect);
        (session.state(), session.dispatcher())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unistate_common::state::ERROR_FIELD;

    fn accepting(_: String) -> Result<(), SessionError> {
        Ok(())
    }

    fn failing(_: String) -> Result<(), SessionError> {
        Err(SessionError::Transport {
            message: "buffer full".to_string(),
        })
    }

    #[test]
    fn test_detached_session_is_closed_with_error() {
        let err = SessionError::Transport {
            message: "refused".to_string(),
        };
        let session = Session::detached(&SessionConfig::default(), &err);

        assert_eq!(session.status(), LinkStatus::Closed);
        let report = session.state().error().unwrap();
        assert_eq!(report.error(), WEBSOCKET_ERROR);
        assert_eq!(report.details().as_deref(), Some("transport error: refused"));
    }

    #[test]
    fn test_send_failure_closes_link() {
        let session = Session::open(&SessionConfig::default(), failing);
        session.dispatch(Action::axpy(1.0, vec![1.0], vec![1.0]));

        assert_eq!(session.status(), LinkStatus::Closed);
        assert!(session.state().contains(ERROR_FIELD));
    }

    #[test]
    fn test_only_first_close_is_recorded() {
        let session = Session::open(&SessionConfig::default(), accepting);
        session.transport_error("first");
        session.transport_closed("second");

        let report = session.state().error().unwrap();
        assert_eq!(report.details().as_deref(), Some("first"));
    }
}
