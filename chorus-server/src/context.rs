use std::sync::Arc;

use axum::extract::FromRef;
use chorus_collab::Collab;

use crate::connections::Connections;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub collab: Arc<Collab>,
    pub connections: Arc<Connections>,
}
