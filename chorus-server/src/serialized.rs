//! All schemas that are exposed from endpoints and the gateway are defined here
//! along with the ToSerialized impls

use chorus_collab::RoomSnapshot;
use chorus_core::{
    PlaybackState as CorePlaybackState, PlayerState, RankedSong, Song as CoreSong,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album_name: Option<String>,
    pub url: String,
    /// Length of the song in seconds
    pub duration: f32,
    pub added_by: String,
}

/// A song in the queue, with its votes
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueuedSong {
    #[serde(flatten)]
    pub song: Song,
    /// Upvotes minus downvotes
    pub votes: i64,
    pub upvotes: usize,
    pub downvotes: usize,
    pub upvoters: Vec<String>,
    pub downvoters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Seconds elapsed in the current song
    pub current_time: f32,
    pub is_playing: bool,
    pub current_song: Option<Song>,
    /// RFC 3339 timestamp of the authority's last report
    pub last_authority_update: Option<String>,
    /// Set when a song was started without the authority confirming playback yet
    pub requires_manual_resume: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub authority_id: String,
    pub members: Vec<String>,
    /// One of idle, playing or paused
    pub state: String,
    pub playback: PlaybackState,
    pub queue: Vec<QueuedSong>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl<I, O> ToSerialized<Option<O>> for Option<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Option<O> {
        self.as_ref().map(|x| x.to_serialized())
    }
}

impl ToSerialized<Song> for CoreSong {
    fn to_serialized(&self) -> Song {
        Song {
            id: self.id.value(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            album_name: self.album_name.clone(),
            url: self.url.clone(),
            duration: self.duration,
            added_by: self.added_by.clone(),
        }
    }
}

impl ToSerialized<QueuedSong> for RankedSong {
    fn to_serialized(&self) -> QueuedSong {
        QueuedSong {
            song: self.song.to_serialized(),
            votes: self.score(),
            upvotes: self.tally.upvotes(),
            downvotes: self.tally.downvotes(),
            upvoters: self.tally.upvoters.iter().cloned().collect(),
            downvoters: self.tally.downvoters.iter().cloned().collect(),
        }
    }
}

impl ToSerialized<PlaybackState> for CorePlaybackState {
    fn to_serialized(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.position,
            is_playing: self.is_playing,
            current_song: self.current_song.to_serialized(),
            last_authority_update: self.last_authority_update.map(|t| t.to_rfc3339()),
            requires_manual_resume: self.requires_manual_resume,
        }
    }
}

impl ToSerialized<Room> for RoomSnapshot {
    fn to_serialized(&self) -> Room {
        let state = match self.state {
            PlayerState::Idle => "idle",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        };

        Room {
            id: self.id.clone(),
            authority_id: self.authority_id.clone(),
            members: self.members.clone(),
            state: state.to_string(),
            playback: self.playback.to_serialized(),
            queue: self.queue.to_serialized(),
        }
    }
}
