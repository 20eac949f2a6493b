use std::sync::Arc;

use chorus_core::{NewSong, Song, SongId, UserId, VoteDirection};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::CollabContext;

use super::{
    Outcome, RoomConnection, RoomConnectionHandle, RoomConnectionId, RoomError, RoomInstanceId,
    RoomSession, RoomSnapshot,
};

pub type RoomId = String;

/// Everything a participant can ask of a room over its connection
#[derive(Debug, Clone, PartialEq)]
pub enum RoomCommand {
    RequestState,
    UpdatePlayback {
        position: f32,
        is_playing: bool,
        song_id: Option<SongId>,
    },
    UpdateTime {
        position: f32,
    },
    Seek {
        position: f32,
    },
    Skip,
    SongEnded {
        song_id: SongId,
    },
    Vote {
        song_id: SongId,
        direction: VoteDirection,
    },
    DeleteSong {
        song_id: SongId,
    },
}

/// A chorus room, containing listeners, a queue, and the playback everybody follows.
///
/// All access goes through the session lock, so events of one room are applied strictly
/// one after another while separate rooms never wait on each other.
pub struct Room {
    id: RoomId,
    instance_id: RoomInstanceId,
    session: Mutex<RoomSession>,
}

impl Room {
    pub fn new(context: &CollabContext, id: RoomId, authority_id: UserId) -> Self {
        let session = RoomSession::new(
            id.clone(),
            authority_id,
            &context.config,
            context.transport.clone(),
        );

        Self {
            id,
            instance_id: session.instance_id(),
            session: session.into(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id.clone()
    }

    /// Unique to this room, even if a removed room had the same id
    pub fn instance_id(&self) -> RoomInstanceId {
        self.instance_id
    }

    /// Creates a connection to the room. The new connection is sent the room's state.
    ///
    /// The caller picks the connection id, so it can be ready to receive before joining.
    pub fn connect(
        self: &Arc<Self>,
        connection_id: RoomConnectionId,
        user_id: impl Into<UserId>,
    ) -> RoomConnectionHandle {
        let connection = RoomConnection::new(connection_id, user_id);
        self.session.lock().join(connection.clone());

        RoomConnectionHandle::new(connection, self.clone())
    }

    /// Called when a [RoomConnectionHandle] is dropped
    pub fn disconnect(&self, connection_id: RoomConnectionId) {
        self.session.lock().leave(connection_id)
    }

    /// Applies a command on behalf of a connection.
    pub fn dispatch(
        &self,
        connection: &RoomConnection,
        command: RoomCommand,
    ) -> Result<Outcome, RoomError> {
        let user_id = connection.user_id.as_str();
        let mut session = self.session.lock();

        let result = match command.clone() {
            RoomCommand::RequestState => {
                session.request_state(connection.id);
                Ok(Outcome::Applied)
            }
            RoomCommand::UpdatePlayback {
                position,
                is_playing,
                song_id,
            } => session.apply_authority_update(user_id, position, is_playing, song_id),
            RoomCommand::UpdateTime { position } => session.apply_periodic_time(user_id, position),
            RoomCommand::Seek { position } => session.apply_seek(user_id, position),
            RoomCommand::Skip => session.skip(user_id),
            RoomCommand::SongEnded { song_id } => session.song_ended(user_id, song_id),
            RoomCommand::Vote { song_id, direction } => {
                session.vote(user_id, song_id, direction)
            }
            RoomCommand::DeleteSong { song_id } => session.delete_song(user_id, song_id),
        };

        match &result {
            Err(error) => warn!(
                "Rejected {:?} from {} in room {}: {}",
                command, user_id, self.id, error
            ),
            Ok(Outcome::Ignored(reason)) => debug!(
                "Ignored {:?} from {} in room {}: {:?}",
                command, user_id, self.id, reason
            ),
            Ok(Outcome::Applied) => {}
        }

        result
    }

    /// Adds a song to the queue on behalf of a user.
    pub fn enqueue(&self, user_id: &str, new_song: NewSong) -> Result<Song, RoomError> {
        self.session.lock().enqueue(new_song, user_id)
    }

    /// Hands the room over to a new authority. Only the current authority may do this.
    pub fn assign_authority(
        &self,
        requested_by: &str,
        user_id: impl Into<UserId>,
    ) -> Result<(), RoomError> {
        let mut session = self.session.lock();

        if session.authority_id() != requested_by {
            return Err(RoomError::Unauthorized);
        }

        session.assign_authority(user_id);
        Ok(())
    }

    pub fn authority_id(&self) -> UserId {
        self.session.lock().authority_id().clone()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.session.lock().snapshot()
    }
}
