//! # Unistate Server
//!
//! The backend half of a unistate session. Each browser connects over one
//! websocket and gets its own [`Router`], which mirrors the browser's session
//! state and answers the actions the browser forwards.
//!
//! ```rust,ignore
//! use unistate_server::{Routes, Server, ServerSettings};
//!
//! async_std::task::block_on(async {
//!     let server = Server::bind(ServerSettings::default(), Routes::new()).await?;
//!     server.run().await
//! })
//! ```

pub mod error;
pub mod router;
pub mod server;
pub mod settings;

pub use error::{RouteError, ServerError};
pub use router::{RouteHandler, Router, Routes};
pub use server::{Server, serve_connection};
pub use settings::ServerSettings;
