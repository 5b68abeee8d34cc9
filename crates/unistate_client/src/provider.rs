use std::sync::{Arc, Mutex, PoisonError};

use codee::string::FromToStringCodec;
use leptos::prelude::*;
use leptos_use::{
    DummyEncoder, ReconnectLimit, UseWebSocketOptions, UseWebSocketReturn,
    use_websocket_with_options,
};
use log::{debug, info};
use unistate_common::SessionState;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::{Dispatch, LinkStatus, Session, SessionHost};
use crate::transport::Transport;

/// Reactive handle to the session, provided to every component below a
/// [`SessionProvider`].
#[derive(Clone)]
pub struct SessionContext {
    /// Latest published session state
    pub state: Signal<Arc<SessionState>>,
    /// Whether the socket is still usable
    pub status: Signal<LinkStatus>,
    dispatch: Dispatch,
}

impl SessionContext {
    pub fn dispatcher(&self) -> Dispatch {
        self.dispatch.clone()
    }

    pub fn dispatch(&self, action: unistate_common::Action) {
        self.dispatch.dispatch(action);
    }
}

type SendFn = Arc<dyn Fn(&String) + Send + Sync>;

/// Frames written before the socket finished its handshake wait here.
#[derive(Default)]
struct Outbox {
    send: Option<SendFn>,
    opened: bool,
    pending: Vec<String>,
}

impl Outbox {
    fn flush(&mut self) {
        if let (true, Some(send)) = (self.opened, &self.send) {
            for frame in self.pending.drain(..) {
                send(&frame);
            }
        }
    }
}

struct SocketTransport {
    outbox: Arc<Mutex<Outbox>>,
}

impl Transport for SocketTransport {
    fn send_frame(&self, frame: String) -> Result<(), SessionError> {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        outbox.pending.push(frame);
        outbox.flush();
        Ok(())
    }
}

/// Opens the application's single WebSocket and provides [`SessionContext`].
///
/// The socket is opened once when the provider mounts and is never reopened.
/// A fault or close records a `"Websocket error"` in the session state.
///
/// # Example
///
/// ```rust,ignore
/// use leptos::prelude::*;
/// use unistate_client::{SessionConfig, SessionProvider};
///
/// #[component]
/// pub fn App() -> impl IntoView {
///     view! {
///         <SessionProvider config=SessionConfig::for_host("localhost")>
///             <Dashboard />
///         </SessionProvider>
///     }
/// }
/// ```
#[component]
pub fn SessionProvider(
    /// Backend location (default: `ws://localhost:8001/ws`)
    #[prop(optional)]
    config: Option<SessionConfig>,
    /// Child components
    children: Children,
) -> impl IntoView {
    let host = Arc::new(SessionHost::new(config.unwrap_or_default()));
    let outbox = Arc::new(Mutex::new(Outbox::default()));

    let session = host.open(|config| {
        let url = config.url()?;
        info!("connecting session to {url}");

        let on_open_outbox = Arc::clone(&outbox);
        let on_message_host = Arc::clone(&host);
        let on_error_host = Arc::clone(&host);
        let on_close_host = Arc::clone(&host);

        let UseWebSocketReturn { send, .. } = use_websocket_with_options::<
            String,
            String,
            FromToStringCodec,
            (),
            DummyEncoder,
        >(
            url.as_str(),
            UseWebSocketOptions::default()
                .immediate(true)
                .reconnect_limit(ReconnectLimit::Limited(0))
                .on_open(move |_| {
                    debug!("websocket open");
                    let mut outbox = on_open_outbox
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    outbox.opened = true;
                    outbox.flush();
                })
                .on_message_raw(move |text: &str| deliver_frame(&on_message_host, text))
                .on_error(move |e| {
                    if let Some(session) = on_error_host.session() {
                        session.transport_error(format!("{e:?}"));
                    }
                })
                .on_close(move |_| {
                    if let Some(session) = on_close_host.session() {
                        session.transport_closed("connection closed");
                    }
                }),
        );

        outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send = Some(Arc::new(move |frame: &String| send(frame)));

        Ok(SocketTransport {
            outbox: Arc::clone(&outbox),
        })
    });

    let context = bind_session(session);
    provide_context(context);

    children()
}

/// Hand an inbound text frame to the host's session. Frames that arrive
/// before the session exists are dropped.
fn deliver_frame(host: &SessionHost, text: &str) {
    match host.session() {
        Some(session) => session.receive_frame(text),
        None => debug!("dropping frame received before the session opened"),
    }
}

/// Mirror the session into signals for the lifetime of the owning component.
fn bind_session(session: &Session) -> SessionContext {
    let state = RwSignal::new(session.state());
    let status = RwSignal::new(session.status());

    let link = session.clone();
    let subscription = session.subscribe(move |next| {
        state.set(Arc::clone(next));
        status.set(link.status());
    });
    on_cleanup(move || subscription.unsubscribe());

    SessionContext {
        state: state.into(),
        status: status.into(),
        dispatch: session.dispatcher(),
    }
}
