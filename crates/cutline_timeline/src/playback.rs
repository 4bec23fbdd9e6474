// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wall-clock playback.
//!
//! The clock never accumulates per-tick deltas. Each tick recomputes the
//! position from a fixed `(instant, offset)` anchor, so a stalled or
//! restarted tick loop cannot drift.

use std::time::Instant;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Playback position driven by an external monotonic timestamp
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    state: PlaybackState,
    time: f64,
    anchor: Option<(Instant, f64)>,
}

impl PlaybackClock {
    /// Create a stopped clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Last computed position
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Play from the current position
    pub fn play(&mut self, now: Instant) {
        self.anchor = Some((now, self.time));
        self.state = PlaybackState::Playing;
    }

    /// Pause, keeping the position reached at `now`
    pub fn pause(&mut self, now: Instant, duration: f64) {
        if self.is_playing() {
            self.tick(now, duration);
            self.anchor = None;
            if self.state == PlaybackState::Playing {
                self.state = PlaybackState::Paused;
            }
        }
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, now: Instant, duration: f64) {
        if self.is_playing() {
            self.pause(now, duration);
        } else {
            if self.time >= duration {
                self.time = 0.0;
            }
            self.play(now);
        }
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        self.anchor = None;
    }

    /// Seek to a time; playback continues from there if running
    pub fn seek(&mut self, time: f64, now: Instant) {
        self.time = time.max(0.0);
        if self.is_playing() {
            self.anchor = Some((now, self.time));
        }
    }

    /// Advance to `now` and return the query time.
    ///
    /// Reaching `duration` stops playback and clamps to it.
    pub fn tick(&mut self, now: Instant, duration: f64) -> f64 {
        if let (PlaybackState::Playing, Some((started, offset))) = (self.state, self.anchor) {
            let elapsed = now.saturating_duration_since(started).as_secs_f64();
            let time = offset + elapsed;
            if time >= duration {
                tracing::debug!(duration, "Playback reached end");
                self.time = duration;
                self.state = PlaybackState::Stopped;
                self.anchor = None;
            } else {
                self.time = time;
            }
        }
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tick_from_anchor() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.seek(1.0, t0);
        clock.play(t0);
        assert_eq!(clock.tick(t0 + Duration::from_millis(500), 10.0), 1.5);
        // Ticks are independent of each other.
        assert_eq!(clock.tick(t0 + Duration::from_millis(250), 10.0), 1.25);
        assert_eq!(clock.tick(t0 + Duration::from_secs(2), 10.0), 3.0);
    }

    #[test]
    fn test_stops_at_end() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play(t0);
        assert_eq!(clock.tick(t0 + Duration::from_secs(5), 4.0), 4.0);
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_eq!(clock.tick(t0 + Duration::from_secs(9), 4.0), 4.0);
    }

    #[test]
    fn test_pause_and_resume() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play(t0);
        clock.pause(t0 + Duration::from_secs(1), 10.0);
        assert_eq!(clock.state(), PlaybackState::Paused);
        assert_eq!(clock.tick(t0 + Duration::from_secs(3), 10.0), 1.0);

        let t1 = t0 + Duration::from_secs(5);
        clock.toggle(t1, 10.0);
        assert_eq!(clock.tick(t1 + Duration::from_secs(1), 10.0), 2.0);
    }

    #[test]
    fn test_seek_while_playing_reanchors() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play(t0);
        clock.seek(6.0, t0 + Duration::from_secs(1));
        assert_eq!(clock.tick(t0 + Duration::from_secs(2), 10.0), 7.0);
        clock.stop();
        assert_eq!(clock.time(), 0.0);
        assert!(!clock.is_playing());
    }
}
