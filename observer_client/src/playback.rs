//! Playback clock: the fractional turn value the window is advanced to.
//!
//! Owns pause/play/seek policy only; it never talks to the network.
//! One simulation turn takes `secs_per_turn` of wall time, and playback
//! pauses itself at the end of the recorded session.

/// Fractional-turn playback driver.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    turn: f64,
    max_turn: u32,
    secs_per_turn: f32,
    paused: bool,
}

impl PlaybackClock {
    pub fn new(max_turn: u32, secs_per_turn: f32) -> Self {
        Self {
            turn: 0.0,
            max_turn,
            secs_per_turn: secs_per_turn.max(f32::EPSILON),
            paused: false,
        }
    }

    /// Current fractional turn.
    pub fn turn(&self) -> f64 {
        self.turn
    }

    pub fn max_turn(&self) -> u32 {
        self.max_turn
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances by one frame's worth of wall time.
    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.turn += f64::from(dt / self.secs_per_turn);
        if self.turn >= f64::from(self.max_turn) {
            self.turn = f64::from(self.max_turn);
            self.paused = true;
        }
    }

    /// Jumps to an arbitrary turn, clamped to the recorded range.
    pub fn seek(&mut self, turn: f64) {
        self.turn = turn.clamp(0.0, f64::from(self.max_turn));
    }

    /// Steps to the next integer turn.
    pub fn step_forward(&mut self) {
        self.seek(self.turn.floor() + 1.0);
    }

    /// Steps to the preceding integer turn.
    pub fn step_back(&mut self) {
        self.seek(self.turn.ceil() - 1.0);
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn toggle(&mut self) {
        self.paused = !self.paused;
    }

    /// Changes playback speed; values at or below zero are ignored.
    pub fn set_secs_per_turn(&mut self, secs: f32) {
        if secs > 0.0 {
            self.secs_per_turn = secs;
        }
    }
}
