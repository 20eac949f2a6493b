mod events;
mod rooms;
mod transport;
mod util;

use std::sync::Arc;

use chorus_core::Config;
use dashmap::DashMap;

pub use events::*;
pub use rooms::*;
pub use transport::*;

// Reduces verbosity
type Store<Id, T> = Arc<DashMap<Id, Arc<T>>>;

/// The chorus collab system, facilitating rooms, their participants, and synchronized playback.
pub struct Collab {
    context: CollabContext,

    pub rooms: RoomManager,
}

/// A type passed to various components of the collab system, to access state and deliver events.
#[derive(Clone)]
pub struct CollabContext {
    pub config: Config,
    pub transport: BoxedTransport,

    pub rooms: Store<RoomId, Room>,
}

impl Collab {
    pub fn new(config: Config, transport: BoxedTransport) -> Self {
        let context = CollabContext {
            config,
            transport,
            rooms: Default::default(),
        };

        let rooms = RoomManager::new(&context);

        Self { context, rooms }
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }
}
