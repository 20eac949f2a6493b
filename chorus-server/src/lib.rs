//! The HTTP and websocket surface of chorus.
//!
//! Rooms are managed over plain HTTP, while participants follow a room's playback over
//! `/v1/rooms/{id}/gateway`.

mod auth;
mod config;
mod connections;
mod context;
mod docs;
mod errors;
mod gateway;
mod messages;
mod rooms;
mod schemas;
mod serialized;

use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::routing::get;
use chorus_collab::Collab;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use config::*;
pub use connections::Connections;
pub use context::ServerContext;
pub use errors::ServerError;
pub use messages::ServerEvent;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Builds the app, with every route and layer
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new().nest("/rooms", rooms::router());

    Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the chorus server
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let connections = Connections::new();
    let collab = Collab::new(config.sync.clone(), connections.clone());

    let context = ServerContext {
        collab: Arc::new(collab),
        connections,
    };

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);
    axum::serve(listener, app(context)).await
}
