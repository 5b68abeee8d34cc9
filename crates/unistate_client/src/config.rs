use unistate_common::{DEFAULT_PORT, SOCKET_PATH};
use url::Url;

use crate::error::SessionError;
use crate::reducer::ForwardPolicy;

/// Where the session connects and which extra tags it forwards to the peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Host name of the backend
    pub host: String,
    /// Port of the backend (default: 8001)
    pub port: u16,
    /// Socket path (default: `/ws`)
    pub path: String,
    /// Application tags forwarded to the peer in addition to `axpy`
    pub forward_tags: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            path: SOCKET_PATH.to_string(),
            forward_tags: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Default configuration pointed at `host`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Forward actions carrying `tag` to the peer instead of ignoring them.
    pub fn with_forward_tag(mut self, tag: impl Into<String>) -> Self {
        self.forward_tags.push(tag.into());
        self
    }

    /// `ws://<host>:<port><path>`
    pub fn url(&self) -> Result<Url, SessionError> {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let raw = format!("ws://{}:{}{}", self.host, self.port, path);
        Url::parse(&raw).map_err(|source| SessionError::InvalidUrl { url: raw, source })
    }

    pub fn forward_policy(&self) -> ForwardPolicy {
        self.forward_tags
            .iter()
            .fold(ForwardPolicy::default(), |policy, tag| policy.with_tag(tag.as_str()))
    }
}
