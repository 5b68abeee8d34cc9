use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use unistate_common::{Action, SessionState};

use crate::reducer::Transition;

type Listener = Arc<dyn Fn(&Arc<SessionState>) + Send + Sync>;

/// Holds the current session state and the components listening to it.
///
/// Listeners are notified synchronously, in subscription order, every time a
/// new state is published. They are called with no lock held, so a listener may
/// dispatch or subscribe again.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    state: Arc<SessionState>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Handle returned by [`SessionStore::subscribe`].
///
/// Dropping the handle keeps the listener installed; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    store: Weak<Mutex<StoreInner>>,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state: Arc::new(initial),
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
        }
    }

    /// The latest published state.
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.lock().state)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<SessionState>) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Replace the state and notify every listener.
    pub fn publish(&self, state: Arc<SessionState>) {
        let listeners = {
            let mut inner = self.lock();
            inner.state = Arc::clone(&state);
            inner.listeners.clone()
        };
        notify(&listeners, &state);
    }

    /// Run one reducer step against the current state.
    ///
    /// The new state is published before this returns. The transition's
    /// outbound action is handed back to the caller for transmission.
    pub(crate) fn apply<F>(&self, step: F) -> Option<Action>
    where
        F: FnOnce(&Arc<SessionState>) -> Transition,
    {
        let (published, outbound) = {
            let mut inner = self.lock();
            let transition = step(&inner.state);
            let published = if transition.changed_from(&inner.state) {
                inner.state = Arc::clone(&transition.state);
                Some((transition.state, inner.listeners.clone()))
            } else {
                None
            };
            (published, transition.outbound)
        };

        if let Some((state, listeners)) = published {
            notify(&listeners, &state);
        }
        outbound
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn notify(listeners: &[(u64, Listener)], state: &Arc<SessionState>) {
    for (_, listener) in listeners {
        listener(state);
    }
}

impl Subscription {
    /// Stop receiving state updates.
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            let mut inner = store.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
