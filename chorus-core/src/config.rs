/// The configuration of room synchronization
#[derive(Debug, Clone)]
pub struct Config {
    /// How far, in seconds, the authority's reported position may move away from the
    /// last broadcast position before followers are sent a correction
    pub drift_threshold_in_seconds: f32,
    /// Whether a song added to an idle room starts playing right away
    pub autoplay_on_enqueue: bool,
}

impl Config {
    /// Returns a copy with the given drift threshold, ignoring unusable values.
    pub fn with_drift_threshold(mut self, seconds: f32) -> Self {
        if seconds.is_finite() && seconds > 0. {
            self.drift_threshold_in_seconds = seconds;
        }

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Followers notice anything above half a second
            drift_threshold_in_seconds: 0.5,
            autoplay_on_enqueue: true,
        }
    }
}
