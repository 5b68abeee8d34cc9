//! # Unistate Client
//!
//! Session store for single-page Leptos applications whose state is shared
//! with a backend over one WebSocket.
//!
//! The browser holds a single [`SessionState`](unistate_common::SessionState).
//! It changes only through the reducer, whether the action came from a local
//! component or from the backend. Actions the backend should see (`axpy`, or
//! any tag listed in [`SessionConfig::forward_tags`]) are written to the socket
//! instead of being applied locally.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leptos::prelude::*;
//! use unistate_client::{SessionConfig, SessionErrorBanner, SessionProvider, use_session};
//! use unistate_common::Action;
//!
//! #[component]
//! fn App() -> impl IntoView {
//!     view! {
//!         <SessionProvider config=SessionConfig::for_host("localhost")>
//!             <SessionErrorBanner />
//!             <Result />
//!         </SessionProvider>
//!     }
//! }
//!
//! #[component]
//! fn Result() -> impl IntoView {
//!     let (state, dispatch) = use_session();
//!     let run = move |_| dispatch.dispatch(Action::axpy(2.0, vec![1.0, 2.0], vec![3.0, 4.0]));
//!
//!     view! {
//!         <button on:click=run>"Run"</button>
//!         <p>{move || format!("{:?}", state.get().result_vector())}</p>
//!     }
//! }
//! ```
//!
//! ## Connection lifetime
//!
//! The socket is opened once, when the provider mounts. There is no
//! reconnect: an error or close records `"Websocket error"` under the
//! state's `error` field and the session stops sending.

pub mod components;
pub mod config;
pub mod error;
pub mod hooks;
pub mod provider;
pub mod reducer;
pub mod session;
pub mod store;
pub mod transport;

pub use components::{LinkStatusBadge, SessionErrorBanner};
pub use config::SessionConfig;
pub use error::SessionError;
pub use hooks::{use_dispatch, use_link_status, use_session, use_session_context};
pub use provider::{SessionContext, SessionProvider};
pub use reducer::{ForwardPolicy, Transition, reduce};
pub use session::{Dispatch, LinkStatus, Session, SessionHost};
pub use store::{SessionStore, Subscription};
pub use transport::Transport;
