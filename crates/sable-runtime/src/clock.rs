// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A pausable frame-time accumulator.

use std::time::{Duration, Instant};

/// Accumulates frame time while the engine runs and freezes while it is
/// paused, so delta times never include time spent unfocused.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Option<Instant>,
    accumulated: Duration,
    paused: bool,
    frame_count: u64,
}

impl FrameClock {
    /// Creates a stopped clock; the first [`tick`](Self::tick) starts it.
    pub fn new() -> Self {
        Self {
            last_tick: None,
            accumulated: Duration::ZERO,
            paused: false,
            frame_count: 0,
        }
    }

    /// Freezes the accumulator. Subsequent ticks report zero delta.
    pub fn pause(&mut self) {
        if !self.paused {
            if let Some(last) = self.last_tick.take() {
                self.accumulated += last.elapsed();
            }
            self.paused = true;
        }
    }

    /// Unfreezes the accumulator; the pause gap is not counted.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last_tick = Some(Instant::now());
        }
    }

    /// Returns `true` while the clock is frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances the clock one frame and returns the delta time in seconds.
    ///
    /// The first tick after creation or resume returns zero; ticks while
    /// paused return zero and do not advance anything.
    pub fn tick(&mut self) -> f32 {
        if self.paused {
            return 0.0;
        }
        let now = Instant::now();
        let delta = match self.last_tick {
            Some(last) => now - last,
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.accumulated += delta;
        self.frame_count += 1;
        delta.as_secs_f32()
    }

    /// The total run time accumulated while unpaused.
    pub fn total(&self) -> Duration {
        match (self.paused, self.last_tick) {
            (false, Some(last)) => self.accumulated + last.elapsed(),
            _ => self.accumulated,
        }
    }

    /// The number of ticks counted so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn first_tick_reports_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn ticks_accumulate_elapsed_time() {
        let mut clock = FrameClock::new();
        clock.tick();
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();
        assert!(delta > 0.0);
        assert!(clock.total() >= Duration::from_millis(10));
    }

    #[test]
    fn paused_clock_reports_zero_and_freezes_totals() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.pause();
        let frozen = clock.total();

        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.total(), frozen);

        clock.resume();
        // The pause gap is not counted towards the first post-resume delta.
        let delta = clock.tick();
        assert!(delta < 0.005, "pause gap leaked into delta: {delta}");
    }
}
