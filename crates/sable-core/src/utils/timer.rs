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

//! A simple stopwatch for coarse CPU timing.

use std::time::{Duration, Instant};

/// Measures wall-clock time from the moment it is created.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Option<Instant>,
}

impl Stopwatch {
    /// Creates a new stopwatch and starts it immediately.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
        }
    }

    /// Returns the elapsed time since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// Returns the elapsed time in whole milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_millis() as u64)
    }

    /// Returns the elapsed time in seconds as `f32`, suitable for stats fields.
    #[inline]
    pub fn elapsed_secs_f32(&self) -> Option<f32> {
        self.elapsed().map(|d| d.as_secs_f32())
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_starts_on_creation() {
        let watch = Stopwatch::new();
        assert!(watch.elapsed().is_some());
        assert!(watch.elapsed_ms().is_some());
    }

    #[test]
    fn stopwatch_elapsed_is_monotonic() {
        let watch = Stopwatch::new();
        let first = watch.elapsed().expect("started");
        std::thread::sleep(Duration::from_millis(5));
        let second = watch.elapsed().expect("started");
        assert!(second >= first);
    }
}
