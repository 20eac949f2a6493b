use chrono::{DateTime, Utc};

use crate::{clamp_position, Config, PlaybackClock, Song};

/// What is audible in a room right now, as a snapshot handed to participants.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_song: Option<Song>,
    /// Seconds elapsed in the current song
    pub position: f32,
    pub is_playing: bool,
    pub last_authority_update: Option<DateTime<Utc>>,
    /// Advisory only. Set when the engine started a song on its own and the
    /// authority has not yet confirmed that playback actually began.
    pub requires_manual_resume: bool,
}

/// The state of a room's player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing is loaded
    Idle,
    Playing,
    Paused,
}

/// The mutable playback of a room: the current song and the clock running it.
#[derive(Debug, Clone)]
pub struct Playback {
    current_song: Option<Song>,
    clock: PlaybackClock,
    requires_manual_resume: bool,
}

impl Playback {
    pub fn new(config: &Config) -> Self {
        Self {
            current_song: None,
            clock: PlaybackClock::new(config),
            requires_manual_resume: false,
        }
    }

    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            current_song: self.current_song.clone(),
            position: self.clock.position(),
            is_playing: self.clock.is_playing(),
            last_authority_update: self.clock.last_authority_update(),
            requires_manual_resume: self.requires_manual_resume,
        }
    }

    pub fn state(&self) -> PlayerState {
        match (&self.current_song, self.clock.is_playing()) {
            (None, _) => PlayerState::Idle,
            (Some(_), true) => PlayerState::Playing,
            (Some(_), false) => PlayerState::Paused,
        }
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Clamps a reported position to the current song, or returns None if it isn't a number.
    pub fn clamp(&self, position: f32) -> Option<f32> {
        clamp_position(position, self.current_song.as_ref().map(|s| s.duration))
    }

    /// Marks the playback as confirmed by the authority.
    /// Clears the manual resume flag. Returns true if it was set.
    pub fn confirm_started(&mut self) -> bool {
        std::mem::replace(&mut self.requires_manual_resume, false)
    }

    pub(crate) fn load(&mut self, song: Song) {
        self.current_song = Some(song);
        self.clock.restart();
        self.requires_manual_resume = true;
    }

    pub(crate) fn unload(&mut self) {
        self.current_song = None;
        self.clock.stop();
        self.requires_manual_resume = false;
    }
}
