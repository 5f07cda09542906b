//! Displayed playback position of the selected session.
//!
//! The media provider reports position only occasionally, so the widget
//! advances it locally once per second while the session plays.

use crate::access::with_default;
use crate::snapshot::MediaSession;

/// Interval of the local position tick.
pub const TICK: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackProgress {
    session_id: Option<String>,
    /// Position as last reported by the provider.
    reported: Option<f64>,
    position: f64,
    end_time: f64,
    playing: bool,
}

impl PlaybackProgress {
    /// Track `session`. Position resets to the reported value when the
    /// selected session changes or the provider reports a new position;
    /// otherwise locally advanced ticks are kept.
    pub fn update(&mut self, session: Option<&MediaSession>) {
        let Some(session) = session else {
            *self = Self::default();
            return;
        };

        let switched = self.session_id.as_deref() != Some(session.session_id.as_str());
        if switched || self.reported != session.position {
            self.session_id = Some(session.session_id.clone());
            self.reported = session.position;
            self.position = with_default(session.position, 0.0);
        }
        self.end_time = with_default(session.end_time, 0.0);
        self.playing = session.is_playing;
    }

    /// Advance one tick. Returns whether the position moved.
    pub fn tick(&mut self) -> bool {
        if self.playing && self.position < self.end_time {
            self.position += 1.0;
            true
        } else {
            false
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Elapsed share of the track, 0 to 100.
    pub fn percent(&self) -> f64 {
        if self.end_time == 0.0 {
            return 0.0;
        }
        let pct = self.position / self.end_time * 100.0;
        if pct.is_finite() { pct } else { 0.0 }
    }
}
