use chrono::{DateTime, Utc};

use crate::Config;

/// Tracks the authoritative playback position of a room and decides when followers need a correction.
///
/// The clock never extrapolates. Between authority reports it holds the last reported position,
/// so a silent authority can never be overtaken by its followers.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Drift allowed before a periodic sample is rebroadcast, in seconds
    threshold: f32,
    position: f32,
    is_playing: bool,
    last_authority_update: Option<DateTime<Utc>>,
    /// The position followers were last told about
    last_broadcast_position: f32,
    frozen: bool,
}

impl PlaybackClock {
    pub fn new(config: &Config) -> Self {
        Self {
            threshold: config.drift_threshold_in_seconds,
            position: 0.,
            is_playing: false,
            last_authority_update: None,
            last_broadcast_position: 0.,
            frozen: false,
        }
    }

    /// Applies a full report from the authority. The result is always broadcast.
    pub fn confirm(&mut self, position: f32, is_playing: bool) {
        self.position = position;
        self.is_playing = is_playing;
        self.touch();
        self.mark_broadcast();
    }

    /// Moves to a position the authority deliberately sought to. The result is always broadcast.
    pub fn seek(&mut self, position: f32) {
        self.position = position;
        self.touch();
        self.mark_broadcast();
    }

    /// Records a periodic position sample from the authority.
    ///
    /// Returns true if followers have drifted far enough to warrant a broadcast,
    /// in which case the sample is considered broadcast.
    pub fn sample(&mut self, position: f32) -> bool {
        self.position = position;
        self.touch();

        if self.drift_exceeds(self.threshold) {
            self.mark_broadcast();
            return true;
        }

        false
    }

    /// Whether the position has moved more than `threshold` seconds away from what was last broadcast
    pub fn drift_exceeds(&self, threshold: f32) -> bool {
        (self.position - self.last_broadcast_position).abs() > threshold
    }

    pub fn mark_broadcast(&mut self) {
        self.last_broadcast_position = self.position;
    }

    /// Rewinds to the start of a new song and plays it.
    pub fn restart(&mut self) {
        self.position = 0.;
        self.is_playing = true;
        self.touch();
        self.mark_broadcast();
    }

    /// Rewinds and stops, used when nothing is left to play.
    pub fn stop(&mut self) {
        self.position = 0.;
        self.is_playing = false;
        self.touch();
        self.mark_broadcast();
    }

    /// Holds the last known position and stops playback until an authority is back.
    pub fn freeze(&mut self) {
        self.is_playing = false;
        self.frozen = true;
        self.mark_broadcast();
    }

    /// Leaves the frozen state. Playback stays paused until the authority reports again.
    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn last_authority_update(&self) -> Option<DateTime<Utc>> {
        self.last_authority_update
    }

    fn touch(&mut self) {
        self.last_authority_update = Some(Utc::now());
    }
}

#[cfg(test)]
mod test {
    use super::PlaybackClock;
    use crate::Config;

    #[test]
    fn rebroadcasts_once_drift_crosses_threshold() {
        let mut clock = PlaybackClock::new(&Config::default());
        clock.confirm(10., true);

        let broadcasts: Vec<_> = [10.1, 10.3, 10.6]
            .into_iter()
            .map(|position| clock.sample(position))
            .collect();

        assert_eq!(broadcasts, vec![false, false, true]);

        // The threshold is measured from the last broadcast, not the last sample
        assert!(!clock.sample(10.9));
        assert!(clock.sample(11.2));
    }

    #[test]
    fn backwards_drift_counts() {
        let mut clock = PlaybackClock::new(&Config::default());
        clock.confirm(30., true);

        assert!(clock.sample(29.));
    }

    #[test]
    fn custom_threshold() {
        let config = Config::default().with_drift_threshold(2.);
        let mut clock = PlaybackClock::new(&config);

        assert!(!clock.sample(1.5));
        assert!(clock.sample(2.5));
    }

    #[test]
    fn freezing_holds_position() {
        let mut clock = PlaybackClock::new(&Config::default());
        clock.confirm(42., true);
        clock.freeze();

        assert!(clock.is_frozen());
        assert!(!clock.is_playing());
        assert_eq!(clock.position(), 42.);

        clock.thaw();
        assert!(!clock.is_frozen());
        assert!(!clock.is_playing());
    }

    #[test]
    fn reports_are_timestamped() {
        let mut clock = PlaybackClock::new(&Config::default());
        assert!(clock.last_authority_update().is_none());

        clock.seek(5.);
        assert!(clock.last_authority_update().is_some());
    }
}
