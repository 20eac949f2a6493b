use log::info;

use crate::{Playback, PlayerState, Song, SongId, SongQueue, VoteLedger};

/// Why the current song is being left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    /// The authority skipped it
    Skipped,
    /// It played to the end
    Ended,
}

/// The result of a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A new song became current and is playing from the start
    Started(Song),
    /// The queue had nothing left, the room is idle
    Exhausted,
}

/// Governs song changes of a room.
///
/// Borrows the parts of the room a transition touches for the duration of one event,
/// so a transition either happens completely or not at all.
pub struct TransitionController<'a> {
    playback: &'a mut Playback,
    queue: &'a mut SongQueue,
    ledger: &'a mut VoteLedger,
}

impl<'a> TransitionController<'a> {
    pub fn new(
        playback: &'a mut Playback,
        queue: &'a mut SongQueue,
        ledger: &'a mut VoteLedger,
    ) -> Self {
        Self {
            playback,
            queue,
            ledger,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.playback.state()
    }

    /// Leaves the current song and moves to the highest ranked song in the queue.
    pub fn advance(&mut self, reason: AdvanceReason) -> Transition {
        if let Some(song) = self.playback.current_song() {
            info!("Leaving \"{}\" ({:?})", song.title, reason);
        }

        match self.queue.take_head(&*self.ledger) {
            Some(next) => Transition::Started(self.play(next)),
            None => {
                self.playback.unload();
                info!("Queue is exhausted, player is idle");

                Transition::Exhausted
            }
        }
    }

    /// Makes a specific queued song current. Returns None if it isn't queued.
    pub fn start(&mut self, song_id: SongId) -> Option<Transition> {
        let song = self.queue.remove(song_id)?;
        Some(Transition::Started(self.play(song)))
    }

    /// Starts the head of the queue if nothing is loaded.
    pub fn start_if_idle(&mut self) -> Option<Transition> {
        if self.state() != PlayerState::Idle {
            return None;
        }

        let next = self.queue.take_head(&*self.ledger)?;
        Some(Transition::Started(self.play(next)))
    }

    /// Loads a song that already left the queue.
    fn play(&mut self, song: Song) -> Song {
        // The song can't be ranked anymore, its votes have no further use
        self.ledger.clear_votes_for(song.id);
        self.playback.load(song.clone());

        info!("Now playing \"{}\" by {}", song.title, song.artist);

        song
    }
}

#[cfg(test)]
mod test {
    use super::{AdvanceReason, Transition, TransitionController};
    use crate::{Config, Playback, PlayerState, Song, SongQueue, VoteDirection, VoteLedger};

    fn vote_score(ledger: &mut VoteLedger, song: &Song, score: usize) {
        for voter in 0..score {
            ledger.set_vote(song.id, &format!("voter-{voter}"), VoteDirection::Up);
        }
    }

    #[test]
    fn advances_to_highest_score() {
        let mut playback = Playback::new(&Config::default());
        let mut queue = SongQueue::new();
        let mut ledger = VoteLedger::new();

        let (x, a, b, c) = (
            Song::mock("x"),
            Song::mock("a"),
            Song::mock("b"),
            Song::mock("c"),
        );

        queue.push(x.clone()).unwrap();
        TransitionController::new(&mut playback, &mut queue, &mut ledger).start(x.id);

        for (song, score) in [(&a, 3), (&b, 5), (&c, 1)] {
            queue.push(song.clone()).unwrap();
            vote_score(&mut ledger, song, score);
        }

        playback.clock_mut().confirm(95., true);

        let transition = TransitionController::new(&mut playback, &mut queue, &mut ledger)
            .advance(AdvanceReason::Skipped);

        assert_eq!(transition, Transition::Started(b.clone()));

        let state = playback.snapshot();
        assert_eq!(state.current_song, Some(b.clone()));
        assert_eq!(state.position, 0.);
        assert!(state.is_playing);

        let remaining: Vec<_> = queue.ranked(&ledger).into_iter().map(|r| r.song).collect();
        assert_eq!(remaining, vec![a, c]);

        // Votes of the song that is now playing are gone
        assert_eq!(ledger.tally(b.id).score(), 0);
    }

    #[test]
    fn exhausted_queue_goes_idle() {
        let mut playback = Playback::new(&Config::default());
        let mut queue = SongQueue::new();
        let mut ledger = VoteLedger::new();

        let song = Song::mock("only");
        queue.push(song.clone()).unwrap();

        let mut controller = TransitionController::new(&mut playback, &mut queue, &mut ledger);
        assert_eq!(controller.start_if_idle(), Some(Transition::Started(song)));
        assert_eq!(controller.state(), PlayerState::Playing);
        assert_eq!(controller.advance(AdvanceReason::Ended), Transition::Exhausted);
        assert_eq!(controller.state(), PlayerState::Idle);

        let state = playback.snapshot();
        assert_eq!(state.current_song, None);
        assert!(!state.is_playing);
        assert_eq!(state.position, 0.);
    }

    #[test]
    fn start_if_idle_leaves_playing_room_alone() {
        let mut playback = Playback::new(&Config::default());
        let mut queue = SongQueue::new();
        let mut ledger = VoteLedger::new();

        queue.push(Song::mock("first")).unwrap();
        queue.push(Song::mock("second")).unwrap();

        let mut controller = TransitionController::new(&mut playback, &mut queue, &mut ledger);
        assert!(controller.start_if_idle().is_some());
        assert!(controller.start_if_idle().is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn automatic_starts_need_confirmation() {
        let mut playback = Playback::new(&Config::default());
        let mut queue = SongQueue::new();
        let mut ledger = VoteLedger::new();

        queue.push(Song::mock("first")).unwrap();
        TransitionController::new(&mut playback, &mut queue, &mut ledger).start_if_idle();

        assert!(playback.snapshot().requires_manual_resume);
        playback.confirm_started();
        assert!(!playback.snapshot().requires_manual_resume);
    }
}
