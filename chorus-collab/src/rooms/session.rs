use chorus_core::{
    AdvanceReason, Config, Id, NewSong, Playback, PlaybackState, PlayerState, RankedSong, Song,
    SongId, SongQueue, TransitionController, UserId, VoteDirection, VoteLedger,
};
use log::{debug, info, warn};

use crate::{BoxedTransport, CollabEvent, Envelope, Recipients};

use super::{RoomConnection, RoomConnectionId, RoomError, RoomId};

/// What happened to an event that was accepted
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The room changed, or was asked for its state
    Applied,
    /// The event was valid but had nothing to act on
    Ignored(Ignored),
}

/// Why an event was a no-op
#[derive(Debug, Clone, PartialEq)]
pub enum Ignored {
    /// The song isn't queued, most likely the client is behind
    SongNotFound(SongId),
    /// The event refers to a song that is no longer current
    StaleEvent(SongId),
    /// Only the authority's end-of-song reports count
    FollowerReport,
    /// Nothing is loaded, so there is no position to act on
    Idle,
}

/// A read-only view of a room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub authority_id: UserId,
    /// Distinct users with at least one connection
    pub members: Vec<UserId>,
    pub connections: Vec<RoomConnection>,
    pub state: PlayerState,
    pub playback: PlaybackState,
    pub queue: Vec<RankedSong>,
}

/// Tells apart rooms that were created under the same id at different times
pub type RoomInstanceId = Id<RoomSession>;

/// The single source of truth for one room.
///
/// A session is never shared between threads directly, [super::Room] wraps it in a mutex
/// so that exactly one event is applied, and its events delivered, at a time.
pub struct RoomSession {
    id: RoomId,
    instance_id: RoomInstanceId,
    authority_id: UserId,
    connections: Vec<RoomConnection>,
    playback: Playback,
    queue: SongQueue,
    ledger: VoteLedger,
    config: Config,
    transport: BoxedTransport,
}

impl RoomSession {
    pub fn new(
        id: impl Into<RoomId>,
        authority_id: impl Into<UserId>,
        config: &Config,
        transport: BoxedTransport,
    ) -> Self {
        Self {
            id: id.into(),
            instance_id: RoomInstanceId::new(),
            authority_id: authority_id.into(),
            connections: Default::default(),
            playback: Playback::new(config),
            queue: Default::default(),
            ledger: Default::default(),
            config: config.clone(),
            transport,
        }
    }

    /// Registers a connection and sends it the current state of the room.
    pub fn join(&mut self, connection: RoomConnection) {
        let connection_id = connection.id;
        let user_id = connection.user_id.clone();

        self.connections.push(connection);

        if user_id == self.authority_id && self.playback.clock().is_frozen() {
            self.playback.clock_mut().thaw();
            info!("Authority {} is back in room {}", user_id, self.id);
        }

        info!("User {} joined room {}", user_id, self.id);
        self.send_state(connection_id);
    }

    /// Removes a connection. Freezes playback if it was the authority's last one.
    pub fn leave(&mut self, connection_id: RoomConnectionId) {
        let Some(index) = self.connections.iter().position(|c| c.id == connection_id) else {
            return;
        };

        let connection = self.connections.remove(index);
        info!("User {} left room {}", connection.user_id, self.id);

        if connection.user_id == self.authority_id && !self.is_member(&self.authority_id) {
            warn!(
                "Authority {} disconnected from room {}, freezing playback",
                self.authority_id, self.id
            );

            self.freeze();
        }
    }

    /// Sends the current state of the room to a single connection.
    pub fn request_state(&self, connection_id: RoomConnectionId) {
        self.send_state(connection_id)
    }

    /// Applies a full playback report from the authority.
    ///
    /// If the room is idle and `song_id` refers to a queued song, that song is started.
    pub fn apply_authority_update(
        &mut self,
        user_id: &str,
        position: f32,
        is_playing: bool,
        song_id: Option<SongId>,
    ) -> Result<Outcome, RoomError> {
        self.ensure_authority(user_id)?;
        ensure_finite(position)?;

        let current = self.playback.current_song().map(|s| s.id);

        match (current, song_id) {
            (Some(current), Some(referenced)) if current != referenced => {
                return Ok(Outcome::Ignored(Ignored::StaleEvent(referenced)));
            }
            (None, Some(referenced)) => {
                if self.controller().start(referenced).is_none() {
                    return Ok(Outcome::Ignored(Ignored::SongNotFound(referenced)));
                }

                self.confirm(position, is_playing)?;
                self.broadcast_transition();

                return Ok(Outcome::Applied);
            }
            (None, None) => return Ok(Outcome::Ignored(Ignored::Idle)),
            _ => {}
        }

        self.confirm(position, is_playing)?;
        self.broadcast_playback();

        Ok(Outcome::Applied)
    }

    /// Moves playback to a position the authority sought to. Always broadcast.
    pub fn apply_seek(&mut self, user_id: &str, position: f32) -> Result<Outcome, RoomError> {
        self.ensure_authority(user_id)?;

        let Some(position) = self.loaded_position(position)? else {
            return Ok(Outcome::Ignored(Ignored::Idle));
        };

        self.playback.clock_mut().seek(position);
        self.broadcast_playback();

        Ok(Outcome::Applied)
    }

    /// Records the authority's periodic position report.
    ///
    /// Only rebroadcast once followers would have drifted past the configured threshold.
    pub fn apply_periodic_time(
        &mut self,
        user_id: &str,
        position: f32,
    ) -> Result<Outcome, RoomError> {
        self.ensure_authority(user_id)?;

        let Some(position) = self.loaded_position(position)? else {
            return Ok(Outcome::Ignored(Ignored::Idle));
        };

        // Time only moves if the authority actually hears something
        let resumed = self.playback.confirm_started();
        let drifted = self.playback.clock_mut().sample(position);

        if drifted || resumed {
            self.playback.clock_mut().mark_broadcast();
            self.broadcast_playback();
        } else {
            debug!("Room {} at {:.2}s, within drift", self.id, position);
        }

        Ok(Outcome::Applied)
    }

    /// Adds a song to the end of the queue.
    ///
    /// In an idle room the song may start right away, see [Config::autoplay_on_enqueue].
    pub fn enqueue(&mut self, new_song: NewSong, added_by: &str) -> Result<Song, RoomError> {
        if !new_song.duration.is_finite() || new_song.duration <= 0. {
            return Err(RoomError::InvalidSong);
        }

        let song = Song::new(new_song, added_by);
        self.queue.push(song.clone())?;

        info!(
            "User {} queued \"{}\" in room {}",
            added_by, song.title, self.id
        );

        let may_autoplay = self.config.autoplay_on_enqueue && !self.playback.clock().is_frozen();

        if may_autoplay && self.controller().start_if_idle().is_some() {
            self.broadcast_transition();
            return Ok(song);
        }

        self.broadcast(CollabEvent::SongAdded {
            song: song.clone(),
            queue: self.ranked(),
        });

        Ok(song)
    }

    /// Removes a queued song. Only the user who added it and the authority may do so.
    pub fn delete_song(&mut self, user_id: &str, song_id: SongId) -> Result<Outcome, RoomError> {
        let Some(song) = self.queue.get(song_id) else {
            return Ok(Outcome::Ignored(Ignored::SongNotFound(song_id)));
        };

        if song.added_by != user_id && user_id != self.authority_id {
            return Err(RoomError::Forbidden);
        }

        self.queue.remove(song_id);
        self.ledger.clear_votes_for(song_id);

        self.broadcast_queue();
        Ok(Outcome::Applied)
    }

    pub fn vote(
        &mut self,
        user_id: &str,
        song_id: SongId,
        direction: VoteDirection,
    ) -> Result<Outcome, RoomError> {
        if !self.queue.contains(song_id) {
            return Ok(Outcome::Ignored(Ignored::SongNotFound(song_id)));
        }

        let change = self.ledger.set_vote(song_id, user_id, direction);
        debug!("Vote of {} on {} in room {}: {:?}", user_id, song_id, self.id, change);

        self.broadcast_queue();
        Ok(Outcome::Applied)
    }

    /// Moves on to the next song on the authority's request.
    pub fn skip(&mut self, user_id: &str) -> Result<Outcome, RoomError> {
        self.ensure_authority(user_id)?;

        self.controller().advance(AdvanceReason::Skipped);
        self.broadcast_transition();

        Ok(Outcome::Applied)
    }

    /// Handles a report that a song played to the end.
    ///
    /// Reports from followers and reports about a song that is no longer current are ignored,
    /// which is what keeps a late report from skipping a song nobody finished.
    pub fn song_ended(&mut self, user_id: &str, song_id: SongId) -> Result<Outcome, RoomError> {
        if user_id != self.authority_id {
            return Ok(Outcome::Ignored(Ignored::FollowerReport));
        }

        if self.playback.current_song().map(|s| s.id) != Some(song_id) {
            return Ok(Outcome::Ignored(Ignored::StaleEvent(song_id)));
        }

        if self.playback.clock().is_frozen() {
            return Err(RoomError::AuthorityLost);
        }

        self.controller().advance(AdvanceReason::Ended);
        self.broadcast_transition();

        Ok(Outcome::Applied)
    }

    /// Hands authority over the room to another user.
    ///
    /// If the new authority has no connection to the room, playback freezes until it joins.
    pub fn assign_authority(&mut self, user_id: impl Into<UserId>) {
        self.authority_id = user_id.into();
        info!("User {} is now the authority of room {}", self.authority_id, self.id);

        if self.is_member(&self.authority_id) {
            self.playback.clock_mut().thaw();
            self.broadcast_playback();
        } else {
            self.freeze();
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let mut members: Vec<_> = self
            .connections
            .iter()
            .map(|c| c.user_id.clone())
            .collect();

        members.sort();
        members.dedup();

        RoomSnapshot {
            id: self.id.clone(),
            authority_id: self.authority_id.clone(),
            members,
            connections: self.connections.clone(),
            state: self.playback.state(),
            playback: self.playback.snapshot(),
            queue: self.ranked(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn instance_id(&self) -> RoomInstanceId {
        self.instance_id
    }

    pub fn authority_id(&self) -> &UserId {
        &self.authority_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.connections.iter().any(|c| c.user_id == user_id)
    }

    fn ensure_authority(&self, user_id: &str) -> Result<(), RoomError> {
        if user_id != self.authority_id {
            return Err(RoomError::Unauthorized);
        }

        if self.playback.clock().is_frozen() {
            return Err(RoomError::AuthorityLost);
        }

        Ok(())
    }

    /// Validates a position against the current song. Ok(None) if nothing is loaded.
    fn loaded_position(&self, position: f32) -> Result<Option<f32>, RoomError> {
        ensure_finite(position)?;

        if self.playback.current_song().is_none() {
            return Ok(None);
        }

        self.playback
            .clamp(position)
            .map(Some)
            .ok_or(RoomError::InvalidPosition)
    }

    fn confirm(&mut self, position: f32, is_playing: bool) -> Result<(), RoomError> {
        let position = self
            .playback
            .clamp(position)
            .ok_or(RoomError::InvalidPosition)?;

        self.playback.clock_mut().confirm(position, is_playing);
        self.playback.confirm_started();

        Ok(())
    }

    fn freeze(&mut self) {
        self.playback.clock_mut().freeze();
        self.broadcast_playback();
    }

    fn controller(&mut self) -> TransitionController<'_> {
        TransitionController::new(&mut self.playback, &mut self.queue, &mut self.ledger)
    }

    fn ranked(&self) -> Vec<RankedSong> {
        self.queue.ranked(&self.ledger)
    }

    fn send_state(&self, connection_id: RoomConnectionId) {
        self.emit(
            Recipients::Connection(connection_id),
            CollabEvent::RoomState {
                playback: self.playback.snapshot(),
                queue: self.ranked(),
            },
        )
    }

    fn broadcast_playback(&self) {
        self.broadcast(CollabEvent::PlaybackStateUpdate {
            playback: self.playback.snapshot(),
        })
    }

    fn broadcast_queue(&self) {
        self.broadcast(CollabEvent::QueueUpdate {
            queue: self.ranked(),
        })
    }

    /// Playback and queue go out as one event, so nobody sees a half applied transition.
    fn broadcast_transition(&self) {
        self.broadcast(CollabEvent::NextSong {
            playback: self.playback.snapshot(),
            queue: self.ranked(),
        })
    }

    fn broadcast(&self, event: CollabEvent) {
        self.emit(Recipients::All, event)
    }

    fn emit(&self, recipients: Recipients, event: CollabEvent) {
        debug!("Room {} emits {} to {:?}", self.id, event.name(), recipients);

        self.transport.deliver(Envelope {
            room_id: self.id.clone(),
            instance_id: self.instance_id,
            recipients,
            event,
        })
    }
}

fn ensure_finite(position: f32) -> Result<(), RoomError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(RoomError::InvalidPosition)
    }
}
