use crate::{Song, Tally, VoteLedger};

/// A queued song together with its current votes
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSong {
    pub song: Song,
    pub tally: Tally,
}

impl RankedSong {
    pub fn score(&self) -> i64 {
        self.tally.score()
    }
}

/// Orders a queue for playback.
///
/// `queue` must be in enqueue order. Songs are sorted by net score, highest first, and
/// the sort is stable so equal scores keep the order they were enqueued in.
pub fn rank(queue: &[Song], ledger: &VoteLedger) -> Vec<RankedSong> {
    let mut ranked: Vec<_> = queue
        .iter()
        .map(|song| RankedSong {
            song: song.clone(),
            tally: ledger.tally(song.id),
        })
        .collect();

    ranked.sort_by(|a, b| b.score().cmp(&a.score()));
    ranked
}
