use std::collections::HashSet;

use thiserror::Error;

use crate::{rank, RankedSong, Song, SongId, VoteLedger};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Song {0} is already queued")]
    AlreadyQueued(SongId),
    #[error("Song {0} has left the queue and cannot be added again")]
    Retired(SongId),
}

/// The upcoming songs of a room, kept in the order they were enqueued.
///
/// The order people see is derived from this with [rank], the stored order is never touched.
#[derive(Debug, Default)]
pub struct SongQueue {
    items: Vec<Song>,
    /// Ids of songs that left the queue. Never pruned, so it lives as long as the room.
    retired: HashSet<SongId>,
}

impl SongQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a song to the end of the queue.
    pub fn push(&mut self, song: Song) -> Result<(), QueueError> {
        if self.retired.contains(&song.id) {
            return Err(QueueError::Retired(song.id));
        }

        if self.contains(song.id) {
            return Err(QueueError::AlreadyQueued(song.id));
        }

        self.items.push(song);
        Ok(())
    }

    /// Removes a song, retiring its id for good.
    pub fn remove(&mut self, song_id: SongId) -> Option<Song> {
        let index = self.items.iter().position(|s| s.id == song_id)?;

        self.retired.insert(song_id);
        Some(self.items.remove(index))
    }

    pub fn get(&self, song_id: SongId) -> Option<&Song> {
        self.items.iter().find(|s| s.id == song_id)
    }

    pub fn contains(&self, song_id: SongId) -> bool {
        self.get(song_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The songs in enqueue order
    pub fn items(&self) -> &[Song] {
        &self.items
    }

    /// Returns the queue in the order it will be played.
    pub fn ranked(&self, ledger: &VoteLedger) -> Vec<RankedSong> {
        rank(&self.items, ledger)
    }

    /// The id of the song that would play next, if any
    pub fn head(&self, ledger: &VoteLedger) -> Option<SongId> {
        self.ranked(ledger).first().map(|r| r.song.id)
    }

    /// Removes and returns the song that would play next.
    pub fn take_head(&mut self, ledger: &VoteLedger) -> Option<Song> {
        let head = self.head(ledger)?;
        self.remove(head)
    }
}

#[cfg(test)]
mod test {
    use super::{QueueError, SongQueue};
    use crate::{Song, VoteDirection, VoteLedger};

    #[test]
    fn removed_songs_stay_out() {
        let mut queue = SongQueue::new();
        let song = Song::mock("tangerine");

        queue.push(song.clone()).unwrap();
        assert_eq!(
            queue.push(song.clone()),
            Err(QueueError::AlreadyQueued(song.id))
        );

        let removed = queue.remove(song.id).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.push(removed), Err(QueueError::Retired(song.id)));
    }

    #[test]
    fn removing_unknown_song_is_none() {
        let mut queue = SongQueue::new();
        queue.push(Song::mock("one")).unwrap();

        assert!(queue.remove(Song::mock("two").id).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn take_head_follows_ranking() {
        let mut queue = SongQueue::new();
        let mut ledger = VoteLedger::new();

        let (first, second) = (Song::mock("first"), Song::mock("second"));
        queue.push(first.clone()).unwrap();
        queue.push(second.clone()).unwrap();
        ledger.set_vote(second.id, "ann", VoteDirection::Up);

        assert_eq!(queue.take_head(&ledger), Some(second.clone()));
        assert_eq!(queue.take_head(&ledger), Some(first));
        assert_eq!(queue.take_head(&ledger), None);
        assert_eq!(queue.push(second.clone()), Err(QueueError::Retired(second.id)));
    }
}
