use std::collections::{BTreeSet, HashMap};

use crate::{SongId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Up,
    Down,
}

/// What a call to [VoteLedger::set_vote] did to the user's vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// The user had no vote on the song before
    Cast,
    /// The user's vote flipped to the other direction
    Replaced,
    /// The user voted the same direction again, which withdraws the vote
    Cleared,
}

/// The votes on a single song
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub upvoters: BTreeSet<UserId>,
    pub downvoters: BTreeSet<UserId>,
}

impl Tally {
    pub fn upvotes(&self) -> usize {
        self.upvoters.len()
    }

    pub fn downvotes(&self) -> usize {
        self.downvoters.len()
    }

    /// Upvotes minus downvotes
    pub fn score(&self) -> i64 {
        self.upvotes() as i64 - self.downvotes() as i64
    }
}

/// Keeps track of who voted what on which song.
///
/// Keyed by song id rather than queue position, so reordering the queue never touches a vote.
#[derive(Debug, Default)]
pub struct VoteLedger {
    votes: HashMap<SongId, HashMap<UserId, VoteDirection>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a user's vote with toggle semantics.
    pub fn set_vote(
        &mut self,
        song_id: SongId,
        user_id: &str,
        direction: VoteDirection,
    ) -> VoteChange {
        let song_votes = self.votes.entry(song_id).or_default();

        let change = match song_votes.get(user_id) {
            Some(existing) if *existing == direction => {
                song_votes.remove(user_id);
                VoteChange::Cleared
            }
            Some(_) => {
                song_votes.insert(user_id.to_string(), direction);
                VoteChange::Replaced
            }
            None => {
                song_votes.insert(user_id.to_string(), direction);
                VoteChange::Cast
            }
        };

        if song_votes.is_empty() {
            self.votes.remove(&song_id);
        }

        change
    }

    /// Forgets every vote on the song. Returns true if there were any.
    pub fn clear_votes_for(&mut self, song_id: SongId) -> bool {
        self.votes.remove(&song_id).is_some()
    }

    /// The user's current vote on a song, if any
    pub fn vote_of(&self, song_id: SongId, user_id: &str) -> Option<VoteDirection> {
        self.votes.get(&song_id)?.get(user_id).copied()
    }

    pub fn tally(&self, song_id: SongId) -> Tally {
        let mut tally = Tally::default();

        let Some(song_votes) = self.votes.get(&song_id) else {
            return tally;
        };

        for (user_id, direction) in song_votes {
            match direction {
                VoteDirection::Up => tally.upvoters.insert(user_id.clone()),
                VoteDirection::Down => tally.downvoters.insert(user_id.clone()),
            };
        }

        tally
    }
}
