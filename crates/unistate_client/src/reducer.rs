//! The session reducer.
//!
//! This is the only place session state changes. Every transition produces a
//! new [`SessionState`] (a shallow copy of the previous one) or hands back the
//! previous `Arc` untouched. Actions destined for the peer pass through without
//! being interpreted locally; a tag is either handled here or forwarded, never
//! both, which keeps a peer echo from looping back into local state.

use std::collections::BTreeSet;
use std::sync::Arc;

use unistate_common::action::{ASSIGN_TAG, AXPY_TAG, ERROR_TAG};
use unistate_common::{Action, Assign, SessionState};

/// Application tags that are forwarded to the peer.
///
/// `axpy` is always forwarded. Any other tag without a dedicated [`Action`]
/// variant is ignored unless it has been added here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardPolicy {
    tags: BTreeSet<String>,
}

impl ForwardPolicy {
    /// Forward `tag` as well. Tags with a local meaning (`assign`, `error`) are
    /// never forwarded and are not added.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag != ASSIGN_TAG && tag != ERROR_TAG {
            self.tags.insert(tag);
        }
        self
    }

    pub fn forwards_tag(&self, tag: &str) -> bool {
        tag == AXPY_TAG || self.tags.contains(tag)
    }

    pub fn forwards(&self, action: &Action) -> bool {
        self.forwards_tag(action.tag())
    }
}

/// Result of reducing one action.
#[derive(Debug, Clone)]
pub struct Transition {
    /// State after the action; the same `Arc` when nothing changed
    pub state: Arc<SessionState>,
    /// Action to transmit to the peer, if the action is a remote one
    pub outbound: Option<Action>,
}

impl Transition {
    fn replace(state: SessionState) -> Self {
        Self {
            state: Arc::new(state),
            outbound: None,
        }
    }

    fn unchanged(state: &Arc<SessionState>) -> Self {
        Self {
            state: Arc::clone(state),
            outbound: None,
        }
    }

    fn forward(state: &Arc<SessionState>, action: Action) -> Self {
        Self {
            state: Arc::clone(state),
            outbound: Some(action),
        }
    }

    /// Whether this transition produced a different state than `previous`.
    pub fn changed_from(&self, previous: &Arc<SessionState>) -> bool {
        !Arc::ptr_eq(&self.state, previous)
    }
}

/// Compute the next state for `action`.
pub fn reduce(state: &Arc<SessionState>, action: Action, policy: &ForwardPolicy) -> Transition {
    match action.normalize() {
        Action::Assign(Assign { key, value }) => Transition::replace(state.with_field(key, value)),
        Action::Error(report) => Transition::replace(state.with_error(report)),
        action if policy.forwards(&action) => Transition::forward(state, action),
        // Unrecognized tags are deliberately ignored rather than forwarded.
        Action::Axpy(_) | Action::Custom(_) => Transition::unchanged(state),
    }
}
