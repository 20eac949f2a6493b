use crate::Id;

pub type SongId = Id<Song>;

/// The identity of a participant, as verified by whatever authenticated them.
pub type UserId = String;

/// A track reference placed into a room's queue.
///
/// Votes are deliberately absent, they live in the [crate::VoteLedger].
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album_name: Option<String>,
    /// Where the media can be fetched from. Opaque to the engine.
    pub url: String,
    /// The authoritative length of the song, in seconds.
    pub duration: f32,
    /// The participant that enqueued the song
    pub added_by: UserId,
}

/// A song submitted by a participant, before it receives an identity
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album_name: Option<String>,
    pub url: String,
    pub duration: f32,
}

impl Song {
    pub fn new(new_song: NewSong, added_by: impl Into<UserId>) -> Self {
        Self {
            id: SongId::new(),
            title: new_song.title,
            artist: new_song.artist,
            album_name: new_song.album_name,
            url: new_song.url,
            duration: new_song.duration,
            added_by: added_by.into(),
        }
    }

    /// Creates a song with placeholder metadata.
    /// Only used in tests.
    #[cfg(test)]
    pub fn mock(title: &str) -> Self {
        Self::new(
            NewSong {
                title: title.to_string(),
                artist: "Unknown".to_string(),
                album_name: None,
                url: format!("https://media.invalid/{title}.mp3"),
                duration: 180.,
            },
            "mock",
        )
    }
}
