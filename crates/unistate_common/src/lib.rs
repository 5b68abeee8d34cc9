//! # Unistate Common
//!
//! Types shared by both ends of a unistate session:
//!
//! - [`Action`]: the tagged record that flows through the client reducer and
//!   over the wire (`{"tag": "...", ...payload}`)
//! - [`SessionState`]: the field map the client renders from and the server mirrors
//! - [`codec`]: one JSON object per WebSocket text frame

pub mod action;
pub mod codec;
pub mod error;
pub mod state;

pub use action::{Action, Assign, Axpy, CustomAction, ErrorReport};
pub use codec::{decode_frame, encode_frame};
pub use error::FrameError;
pub use state::SessionState;

/// Port the backend listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8001;

/// Path component of the session socket URL.
pub const SOCKET_PATH: &str = "/ws";
