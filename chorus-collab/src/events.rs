use chorus_core::{PlaybackState, RankedSong, Song, UserId};

use crate::{RoomConnectionId, RoomId, RoomInstanceId};

/// Events emitted by a room towards its participants
#[derive(Debug, Clone, PartialEq)]
pub enum CollabEvent {
    /// The full state of a room, sent to a single connection on join or request
    RoomState {
        playback: PlaybackState,
        queue: Vec<RankedSong>,
    },
    /// The authority changed the playback position or play state
    PlaybackStateUpdate { playback: PlaybackState },
    /// The current song changed. Carries the queue too, so clients never observe half a transition.
    NextSong {
        playback: PlaybackState,
        queue: Vec<RankedSong>,
    },
    /// A song was added to the queue
    SongAdded {
        song: Song,
        queue: Vec<RankedSong>,
    },
    /// The queue was modified or reordered
    QueueUpdate { queue: Vec<RankedSong> },
}

/// Who should receive an event within a room
#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    /// Every connection of the room
    All,
    /// All connections of a single user
    User(UserId),
    /// A single connection
    Connection(RoomConnectionId),
}

/// An event addressed to participants of a room
#[derive(Debug, Clone)]
pub struct Envelope {
    pub room_id: RoomId,
    /// Rooms created under a reused id get a new instance id
    pub instance_id: RoomInstanceId,
    pub recipients: Recipients,
    pub event: CollabEvent,
}

impl CollabEvent {
    /// Returns the name of the event, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomState { .. } => "room-state",
            Self::PlaybackStateUpdate { .. } => "playback-state-update",
            Self::NextSong { .. } => "next-song",
            Self::SongAdded { .. } => "song-added",
            Self::QueueUpdate { .. } => "queue-update",
        }
    }
}
