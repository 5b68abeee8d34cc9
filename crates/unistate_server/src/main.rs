use std::net::SocketAddr;

use async_std::task;
use clap::Parser;
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unistate_common::{Action, SessionState};
use unistate_server::{RouteError, Routes, Server, ServerError, ServerSettings};

/// Serve unistate sessions over websocket.
#[derive(Debug, Parser)]
#[command(name = "unistate-server", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value_t = ServerSettings::default().bind)]
    bind: SocketAddr,
}

/// Always fails, to show how handler errors reach the browser.
fn broken(_: &mut SessionState, _: &Map<String, Value>) -> Result<Vec<Action>, RouteError> {
    Err(RouteError::handler("broken", "Seems I've made a mistake!"))
}

fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = ServerSettings::default().with_bind(args.bind);
    let routes = Routes::new().route("broken", broken);

    task::block_on(async {
        let server = Server::bind(settings, routes).await?;
        info!("listening on ws://{}", server.local_addr()?);
        server.run().await
    })
}
