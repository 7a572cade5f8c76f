//! Fixed-timestep game clock.
//!
//! Frames arrive at a variable rate; `GameTime` turns wall-clock deltas
//! into whole ticks of `tick_interval_ms`. A single frame gap is clamped
//! to `MAX_FRAME_GAP_MS`, so a suspended tab resumes with at most that
//! much production and no catch-up burst.

pub const MAX_FRAME_GAP_MS: f64 = 500.0;

pub struct GameTime {
    ms_per_tick: f64,
    /// Milliseconds not yet consumed as ticks.
    accumulator: f64,
    last_timestamp: Option<f64>,
}

impl GameTime {
    pub fn new(tick_interval_ms: u32) -> Self {
        Self {
            ms_per_tick: tick_interval_ms.max(1) as f64,
            accumulator: 0.0,
            last_timestamp: None,
        }
    }

    /// Feed a wall-clock timestamp (ms). Returns the ticks to run this frame.
    pub fn update(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_timestamp {
            Some(prev) => (now_ms - prev).clamp(0.0, MAX_FRAME_GAP_MS),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        ticks
    }
}
