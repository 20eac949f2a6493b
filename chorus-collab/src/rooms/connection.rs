use std::sync::Arc;

use chorus_core::{Id, UserId};

use super::{Outcome, Room, RoomCommand, RoomError};

pub type RoomConnectionId = Id<RoomConnection>;

/// Represents a user's presence in a room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConnection {
    pub id: RoomConnectionId,
    pub user_id: UserId,
}

/// A handle to a connection, which when dropped removes the [RoomConnection] from its room
pub struct RoomConnectionHandle {
    connection: RoomConnection,
    room: Arc<Room>,
}

impl RoomConnection {
    pub fn new(id: RoomConnectionId, user_id: impl Into<UserId>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
        }
    }
}

impl RoomConnectionHandle {
    pub(super) fn new(connection: RoomConnection, room: Arc<Room>) -> Self {
        Self { connection, room }
    }

    pub fn connection(&self) -> &RoomConnection {
        &self.connection
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    /// Applies a command to the room on behalf of this connection.
    pub fn dispatch(&self, command: RoomCommand) -> Result<Outcome, RoomError> {
        self.room.dispatch(&self.connection, command)
    }
}

impl Drop for RoomConnectionHandle {
    fn drop(&mut self) {
        self.room.disconnect(self.connection.id)
    }
}
