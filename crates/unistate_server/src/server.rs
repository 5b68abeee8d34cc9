use std::net::SocketAddr;
use std::sync::Arc;

use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use async_tungstenite::tungstenite::Message;
use async_tungstenite::tungstenite::protocol::WebSocketConfig;
use async_tungstenite::{WebSocketStream, accept_async_with_config};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use unistate_common::{Action, encode_frame};

use crate::error::{RouteError, ServerError};
use crate::router::{Router, Routes};
use crate::settings::ServerSettings;

/// Accepts websocket sessions and serves each one on its own task.
pub struct Server {
    listener: TcpListener,
    settings: ServerSettings,
    routes: Arc<Routes>,
}

impl Server {
    pub async fn bind(settings: ServerSettings, routes: Routes) -> Result<Self, ServerError> {
        info!("[bind] Attempting to bind to {}", settings.bind);
        let listener = TcpListener::bind(settings.bind).await?;
        info!("[bind] Successfully bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            settings,
            routes: Arc::new(routes),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut incoming = self.listener.incoming();

        while let Some(stream) = incoming.next().await {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("[accept] Failed to accept TCP connection: {}", err);
                    continue;
                }
            };

            let routes = Arc::clone(&self.routes);
            let config = self.settings.websocket_config;
            task::spawn(async move {
                let peer = stream
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());

                match serve_connection(stream, routes, config).await {
                    Ok(()) => info!(%peer, "session ended"),
                    Err(err) => warn!(%peer, "session aborted: {}", err),
                }
            });
        }

        Ok(())
    }
}

/// Run one session to completion.
pub async fn serve_connection(
    stream: TcpStream,
    routes: Arc<Routes>,
    config: WebSocketConfig,
) -> Result<(), ServerError> {
    let mut ws = accept_async_with_config(stream, Some(config))
        .await
        .inspect_err(|e| error!("[accept] WebSocket handshake failed: {:?}", e))?;
    debug!("[accept] WebSocket handshake successful");

    let mut router = Router::new(routes);

    while let Some(message) = ws.next().await {
        let outcome = match message? {
            Message::Text(text) => router.handle_frame(text.as_str()),
            Message::Binary(_) => Err(RouteError::NotText),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        };

        match outcome {
            Ok(replies) => {
                for reply in &replies {
                    send(&mut ws, reply).await?;
                }
            }
            Err(err) if err.is_fatal() => {
                error!("[route] {}", err);
                send(&mut ws, &Action::Error(err.report())).await?;
                ws.close(None).await?;
                return Err(err.into());
            }
            Err(err) => {
                warn!("[route] {}", err);
                send(&mut ws, &Action::Error(err.report())).await?;
            }
        }
    }

    Ok(())
}

async fn send(ws: &mut WebSocketStream<TcpStream>, action: &Action) -> Result<(), ServerError> {
    debug!(tag = action.tag(), "sending reply");
    ws.send(Message::text(encode_frame(action))).await?;
    Ok(())
}
