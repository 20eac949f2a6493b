mod connection;
mod room;
mod session;

use std::sync::Arc;

use chorus_core::{QueueError, UserId};
use dashmap::mapref::entry::Entry;
use log::info;
use thiserror::Error;

use crate::{util::random_string, CollabContext};

pub use connection::*;
pub use room::*;
pub use session::*;

/// How long generated room ids are
const ROOM_ID_LENGTH: usize = 8;

pub struct RoomManager {
    context: CollabContext,
}

#[derive(Debug, Error, PartialEq)]
pub enum RoomError {
    #[error("Only the room's authority may do this")]
    Unauthorized,
    #[error("Only the user who added the song or the room's authority may do this")]
    Forbidden,
    #[error("The room's authority is not connected, playback is frozen")]
    AuthorityLost,
    #[error("Position must be a finite number of seconds")]
    InvalidPosition,
    #[error("Song duration must be a finite, positive number of seconds")]
    InvalidSong,
    #[error("Room {0} does not exist")]
    RoomNotFound(String),
    #[error("Room {0} already exists")]
    RoomExists(String),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// A room to be created
#[derive(Debug)]
pub struct NewRoom {
    /// A random id is generated if this is None
    pub id: Option<RoomId>,
    /// The user in control of playback
    pub authority_id: UserId,
}

impl RoomManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a new room
    pub fn create_room(&self, new_room: NewRoom) -> Result<Arc<Room>, RoomError> {
        let id = new_room
            .id
            .unwrap_or_else(|| random_string(ROOM_ID_LENGTH));

        match self.context.rooms.entry(id.clone()) {
            Entry::Occupied(_) => Err(RoomError::RoomExists(id)),
            Entry::Vacant(entry) => {
                let room = Arc::new(Room::new(&self.context, id, new_room.authority_id));
                entry.insert(room.clone());

                info!("Room {} created", room.id());
                Ok(room)
            }
        }
    }

    pub fn room_by_id(&self, room_id: &str) -> Result<Arc<Room>, RoomError> {
        self.context
            .rooms
            .get(room_id)
            .map(|r| r.clone())
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Reassigns the authority of a room on behalf of its current authority
    pub fn assign_authority(
        &self,
        room_id: &str,
        requested_by: &str,
        user_id: UserId,
    ) -> Result<(), RoomError> {
        self.room_by_id(room_id)?.assign_authority(requested_by, user_id)
    }

    /// Removes a room. Existing connections keep it alive until they are dropped.
    pub fn remove_room(&self, room_id: &str) -> Result<(), RoomError> {
        self.context
            .rooms
            .remove(room_id)
            .map(|_| info!("Room {} removed", room_id))
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Get all rooms in memory
    pub fn list_all(&self) -> Vec<Arc<Room>> {
        self.context.rooms.iter().map(|r| r.clone()).collect()
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use chorus_core::{Config, NewSong, VoteDirection};

    use super::{NewRoom, RoomCommand, RoomError};
    use crate::{ChannelTransport, Collab, CollabEvent, Recipients, RoomConnectionId};

    fn collab() -> (Collab, Arc<ChannelTransport>) {
        let transport = Arc::new(ChannelTransport::new());
        let collab = Collab::new(Config::default(), transport.clone());

        (collab, transport)
    }

    fn new_room(id: &str, authority_id: &str) -> NewRoom {
        NewRoom {
            id: Some(id.to_string()),
            authority_id: authority_id.to_string(),
        }
    }

    fn new_song(title: &str) -> NewSong {
        NewSong {
            title: title.to_string(),
            artist: "Various".to_string(),
            album_name: Some("Compilation".to_string()),
            url: format!("https://media.invalid/{title}.ogg"),
            duration: 240.,
        }
    }

    #[test]
    fn room_ids_are_unique() {
        let (collab, _) = collab();

        collab.rooms.create_room(new_room("den", "host")).unwrap();

        assert_eq!(
            collab.rooms.create_room(new_room("den", "other")).err(),
            Some(RoomError::RoomExists("den".to_string()))
        );

        let generated = collab
            .rooms
            .create_room(NewRoom {
                id: None,
                authority_id: "host".to_string(),
            })
            .unwrap();

        assert_eq!(generated.id().len(), 8);
        assert_eq!(collab.rooms.list_all().len(), 2);
    }

    #[test]
    fn unknown_rooms() {
        let (collab, _) = collab();

        assert_eq!(
            collab.rooms.room_by_id("nowhere").err(),
            Some(RoomError::RoomNotFound("nowhere".to_string()))
        );
        assert!(collab.rooms.remove_room("nowhere").is_err());
    }

    #[test]
    fn dropping_handle_disconnects() {
        let (collab, _) = collab();
        let room = collab.rooms.create_room(new_room("den", "host")).unwrap();

        let handle = room.connect(RoomConnectionId::new(), "host");
        assert_eq!(room.snapshot().members, vec!["host".to_string()]);

        drop(handle);
        assert!(room.snapshot().members.is_empty());
    }

    #[test]
    fn commands_route_through_the_connection() {
        let (collab, transport) = collab();
        let room = collab.rooms.create_room(new_room("den", "host")).unwrap();

        let host = room.connect(RoomConnectionId::new(), "host");
        let guest = room.connect(RoomConnectionId::new(), "guest");

        let song = room.enqueue("guest", new_song("first")).unwrap();
        room.enqueue("guest", new_song("second")).unwrap();
        transport.drain();

        assert_eq!(guest.dispatch(RoomCommand::Skip), Err(RoomError::Unauthorized));
        assert!(host.dispatch(RoomCommand::SongEnded { song_id: song.id }).is_ok());
        assert_eq!(
            room.snapshot().playback.current_song.map(|s| s.title),
            Some("second".to_string())
        );

        guest.dispatch(RoomCommand::RequestState).unwrap();

        let delivered = transport.drain();
        let last = delivered.last().unwrap();

        assert_eq!(last.recipients, Recipients::Connection(guest.connection().id));
        assert!(matches!(last.event, CollabEvent::RoomState { .. }));
    }

    #[test]
    fn reused_ids_get_a_new_instance() {
        let (collab, transport) = collab();

        let old = collab.rooms.create_room(new_room("den", "host")).unwrap();
        let old_host = old.connect(RoomConnectionId::new(), "host");
        collab.rooms.remove_room("den").unwrap();

        let new = collab.rooms.create_room(new_room("den", "alice")).unwrap();
        assert_ne!(old.instance_id(), new.instance_id());
        transport.drain();

        old.enqueue("host", new_song("old")).unwrap();
        old_host.dispatch(RoomCommand::Skip).unwrap();

        let delivered = transport.drain();
        assert!(!delivered.is_empty());
        assert!(delivered
            .iter()
            .all(|e| e.room_id == "den" && e.instance_id == old.instance_id()));
    }

    #[test]
    fn only_the_authority_hands_over() {
        let (collab, _) = collab();
        let room = collab.rooms.create_room(new_room("den", "host")).unwrap();
        let _guest = room.connect(RoomConnectionId::new(), "guest");

        assert_eq!(
            collab.rooms.assign_authority("den", "guest", "guest".to_string()),
            Err(RoomError::Unauthorized)
        );

        collab
            .rooms
            .assign_authority("den", "host", "guest".to_string())
            .unwrap();

        assert_eq!(room.authority_id(), "guest");
    }

    #[test]
    fn rooms_apply_events_serially() {
        let (collab, _) = collab();
        let room = collab.rooms.create_room(new_room("den", "host")).unwrap();

        let _host = room.connect(RoomConnectionId::new(), "host");
        room.enqueue("host", new_song("playing")).unwrap();
        let target_id = room.enqueue("host", new_song("target")).unwrap().id;

        let voters: Vec<_> = (0..8)
            .map(|index| {
                let room = room.clone();

                thread::spawn(move || {
                    let handle = room.connect(RoomConnectionId::new(), format!("voter-{index}"));

                    for _ in 0..24 {
                        handle
                            .dispatch(RoomCommand::Vote {
                                song_id: target_id,
                                direction: VoteDirection::Up,
                            })
                            .unwrap();
                    }

                    // Toggling an even number of times cancels out, so one vote is left
                    handle
                        .dispatch(RoomCommand::Vote {
                            song_id: target_id,
                            direction: VoteDirection::Up,
                        })
                        .unwrap();
                })
            })
            .collect();

        for voter in voters {
            voter.join().unwrap();
        }

        let snapshot = room.snapshot();
        assert_eq!(snapshot.queue[0].tally.upvotes(), 8);
    }
}
