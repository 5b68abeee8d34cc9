use std::sync::Arc;

use leptos::prelude::*;
use unistate_common::SessionState;

use crate::provider::SessionContext;
use crate::session::{Dispatch, LinkStatus};

/// Hook to read the session state and dispatch actions.
///
/// Every call below the same [`SessionProvider`](crate::SessionProvider)
/// observes the same session; no additional connection is opened.
///
/// # Panics
///
/// Panics if called outside of a `SessionProvider` context.
///
/// # Example
///
/// ```rust,ignore
/// use leptos::prelude::*;
/// use unistate_client::use_session;
/// use unistate_common::Action;
///
/// #[component]
/// fn NameField() -> impl IntoView {
///     let (state, dispatch) = use_session();
///
///     view! {
///         <input
///             prop:value=move || state.get().name().to_string()
///             on:input=move |ev| dispatch.dispatch(Action::assign("name", event_target_value(&ev)))
///         />
///     }
/// }
/// ```
pub fn use_session() -> (Signal<Arc<SessionState>>, Dispatch) {
    let ctx = use_session_context();
    (ctx.state, ctx.dispatcher())
}

/// Hook to access the full [`SessionContext`].
///
/// # Panics
///
/// Panics if called outside of a `SessionProvider` context.
pub fn use_session_context() -> SessionContext {
    expect_context::<SessionContext>()
}

/// Hook for components that only dispatch.
pub fn use_dispatch() -> Dispatch {
    use_session_context().dispatcher()
}

/// Hook to observe whether the session's socket is still usable.
pub fn use_link_status() -> Signal<LinkStatus> {
    use_session_context().status
}
