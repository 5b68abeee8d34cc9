use std::net::{Ipv4Addr, SocketAddr};

use async_tungstenite::tungstenite::protocol::WebSocketConfig;
use unistate_common::DEFAULT_PORT;

/// Settings to configure the server
#[derive(Clone, Debug)]
pub struct ServerSettings {
    /// Address the listener binds to (default: `0.0.0.0:8001`)
    pub bind: SocketAddr,
    /// Limits applied to every accepted websocket
    pub websocket_config: WebSocketConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            websocket_config: WebSocketConfig::default(),
        }
    }
}

impl ServerSettings {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }
}
