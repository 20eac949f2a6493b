//! Frames exchanged over the room gateway. Every frame is `{"event": <name>, "data": <payload>}`.

use chorus_collab::{CollabEvent, RoomCommand};
use chorus_core::{SongId, VoteDirection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::serialized::{PlaybackState, QueuedSong, Song, ToSerialized};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Unknown event {0}")]
    UnknownEvent(String),
    #[error("{0} is not a valid song id")]
    InvalidSongId(String),
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Song ids arrive as numbers or numeric strings depending on the client
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSongId {
    Number(u64),
    Text(String),
}

impl WireSongId {
    fn parse(self) -> Result<SongId, MessageError> {
        match self {
            Self::Number(value) => Ok(SongId::from_value(value)),
            Self::Text(text) => text
                .trim()
                .parse()
                .map(SongId::from_value)
                .map_err(|_| MessageError::InvalidSongId(text)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SongRef {
    #[serde(alias = "_id")]
    id: WireSongId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum VoteType {
    Upvote,
    Downvote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlaybackStatePayload {
    current_time: f32,
    is_playing: bool,
    #[serde(default)]
    current_song: Option<SongRef>,
}

#[derive(Debug, Deserialize)]
struct TimePayload {
    time: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongPayload {
    song_id: WireSongId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VotePayload {
    song_id: WireSongId,
    vote_type: VoteType,
}

/// Parses an inbound text frame into the command it asks for.
///
/// `roomId` and `userId` fields are ignored wherever they appear, the room and user come
/// from the connection itself. So is the queue attached to `songEnded`.
pub fn parse_command(text: &str) -> Result<RoomCommand, MessageError> {
    let Frame { event, data } = serde_json::from_str(text)?;

    let data = match data {
        Value::Null => Value::Object(Default::default()),
        data => data,
    };

    let command = match event.as_str() {
        "requestPlaybackState" => RoomCommand::RequestState,
        "updatePlaybackState" => {
            let payload: UpdatePlaybackStatePayload = serde_json::from_value(data)?;

            RoomCommand::UpdatePlayback {
                position: payload.current_time,
                is_playing: payload.is_playing,
                song_id: payload
                    .current_song
                    .map(|song| song.id.parse())
                    .transpose()?,
            }
        }
        "updatePlaybackTime" => {
            let payload: TimePayload = serde_json::from_value(data)?;
            RoomCommand::UpdateTime {
                position: payload.time,
            }
        }
        "seekTime" => {
            let payload: TimePayload = serde_json::from_value(data)?;
            RoomCommand::Seek {
                position: payload.time,
            }
        }
        "skipSong" => RoomCommand::Skip,
        "songEnded" => {
            let payload: SongPayload = serde_json::from_value(data)?;
            RoomCommand::SongEnded {
                song_id: payload.song_id.parse()?,
            }
        }
        "voteSong" => {
            let payload: VotePayload = serde_json::from_value(data)?;
            let direction = match payload.vote_type {
                VoteType::Upvote => VoteDirection::Up,
                VoteType::Downvote => VoteDirection::Down,
            };

            RoomCommand::Vote {
                song_id: payload.song_id.parse()?,
                direction,
            }
        }
        "deleteSong" => {
            let payload: SongPayload = serde_json::from_value(data)?;
            RoomCommand::DeleteSong {
                song_id: payload.song_id.parse()?,
            }
        }
        _ => return Err(MessageError::UnknownEvent(event)),
    };

    Ok(command)
}

/// Frames sent to gateway connections
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The full state of the room, sent on join and when requested
    RoomState {
        #[serde(flatten)]
        playback: PlaybackState,
        queue: Vec<QueuedSong>,
    },
    /// The authority played, paused, seeked, or drifted
    PlaybackStateUpdate {
        #[serde(flatten)]
        playback: PlaybackState,
    },
    /// A new song started, or playback ran out of songs
    #[serde(rename_all = "camelCase")]
    NextSong {
        song: Option<Song>,
        is_playing: bool,
        current_time: f32,
        requires_manual_resume: bool,
        queue: Vec<QueuedSong>,
    },
    SongAdded {
        song: Song,
        queue: Vec<QueuedSong>,
    },
    QueueUpdate {
        queue: Vec<QueuedSong>,
    },
    /// Sent only to the connection whose message was rejected
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::RoomState { playback, queue } => Self::RoomState {
                playback: playback.to_serialized(),
                queue: queue.to_serialized(),
            },
            CollabEvent::PlaybackStateUpdate { playback } => Self::PlaybackStateUpdate {
                playback: playback.to_serialized(),
            },
            CollabEvent::NextSong { playback, queue } => Self::NextSong {
                song: playback.current_song.to_serialized(),
                is_playing: playback.is_playing,
                current_time: playback.position,
                requires_manual_resume: playback.requires_manual_resume,
                queue: queue.to_serialized(),
            },
            CollabEvent::SongAdded { song, queue } => Self::SongAdded {
                song: song.to_serialized(),
                queue: queue.to_serialized(),
            },
            CollabEvent::QueueUpdate { queue } => Self::QueueUpdate {
                queue: queue.to_serialized(),
            },
        }
    }
}
