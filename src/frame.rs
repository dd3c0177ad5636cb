use std::time::Instant;

/// Turns successive clock readings into per-frame deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the previous reading; the first reading yields 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        delta
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Monotonic milliseconds since a fixed start point, for hosts without their own frame timer.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
