use std::time::{Duration, Instant};

/// Source of animation frames for [`crate::PlaybackController::run`].
pub trait FrameScheduler {
    /// Wait for the next frame and return the seconds elapsed since the previous one.
    fn next_frame(&mut self) -> f64;
}

/// Deterministic scheduler advancing a fixed step per frame without waiting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStep {
    dt_secs: f64,
}

impl FixedStep {
    /// Step of `1 / fps` seconds.
    pub fn from_fps(fps: u32) -> Self {
        Self {
            dt_secs: 1.0 / f64::from(fps.max(1)),
        }
    }

    /// Step of `dt_secs` seconds.
    pub fn new(dt_secs: f64) -> Self {
        Self {
            dt_secs: dt_secs.max(0.0),
        }
    }
}

impl FrameScheduler for FixedStep {
    fn next_frame(&mut self) -> f64 {
        self.dt_secs
    }
}

/// Wall-clock scheduler sleeping until each frame is due.
#[derive(Debug)]
pub struct Realtime {
    interval: Duration,
    last: Option<Instant>,
}

impl Realtime {
    /// Frames at `fps` per second of wall time.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            last: None,
        }
    }
}

impl FrameScheduler for Realtime {
    fn next_frame(&mut self) -> f64 {
        let Some(last) = self.last else {
            self.last = Some(Instant::now());
            return 0.0;
        };
        let due = last + self.interval;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        let now = Instant::now();
        self.last = Some(now);
        (now - last).as_secs_f64()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/scheduler.rs"]
mod tests;
