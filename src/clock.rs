//! Fixed-rate pacing for the simulation and render loops

use std::thread;
use std::time::{Duration, Instant};

const FPS_WINDOW: usize = 60;

/// Sleeps each loop iteration up to its next tick boundary and measures the
/// achieved rate over the last 60 ticks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_times: [Option<Instant>; FPS_WINDOW],
    frame_index: usize,
    fps: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            frame_times: [None; FPS_WINDOW],
            frame_index: 0,
            fps: 0.0,
        }
    }

    /// Wait until `1/rate` has passed since the previous tick, then return the
    /// real time elapsed since that tick (zero on the first call).
    pub fn tick(&mut self, rate: u32) -> Duration {
        let now = match self.last {
            Some(last) => {
                let period = Duration::from_secs_f64(1.0 / rate.max(1) as f64);
                let target = last + period;
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }
                Instant::now()
            }
            None => Instant::now(),
        };
        let elapsed = self.last.map(|l| now - l).unwrap_or_default();
        self.last = Some(now);
        self.record(now);
        elapsed
    }

    fn record(&mut self, now: Instant) {
        // Oldest sample sits where the newest is about to be written
        let oldest = self.frame_times[self.frame_index];
        self.frame_times[self.frame_index] = Some(now);
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        if let Some(oldest) = oldest {
            let secs = (now - oldest).as_secs_f32();
            if secs > 0.0 {
                self.fps = FPS_WINDOW as f32 / secs;
            }
        }
    }

    /// Average rate over the last 60 ticks (0 until the window fills)
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_paces_to_rate() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(100), Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            let dt = clock.tick(100);
            assert!(dt >= Duration::from_millis(9));
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
