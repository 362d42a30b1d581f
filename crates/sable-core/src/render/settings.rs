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

//! Global settings for the rendering system.

use crate::math::LinearRgba;

/// The hard upper bound on render worker threads, fixed at compile time.
///
/// Requested worker counts above this are clamped at startup.
pub const MAX_RENDER_WORKERS: usize = 16;

/// How the dispatcher executes draw work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// All draw work is recorded on the single primary context.
    Immediate,
    /// Draw work fans out across deferred contexts, one per worker, and the
    /// recorded command buffers replay on the primary context in slot order.
    MultiThread,
}

/// A collection of global settings that affect the rendering process.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// The dispatch topology to start in. Later changes go through the
    /// dirty-tracked dispatch state, not this struct.
    pub mode: RenderMode,
    /// The number of render workers used in
    /// [`RenderMode::MultiThread`], clamped to [`MAX_RENDER_WORKERS`].
    pub worker_count: usize,
    /// The color the frame is cleared to.
    pub clear_color: LinearRgba,
    /// The quiet period in milliseconds after a resize event before the
    /// targets are actually recreated.
    pub resize_debounce_ms: u64,
    /// A fallback number of frames after which a pending resize is forced,
    /// even if resize events are still streaming in.
    pub resize_max_pending_frames: u32,
    /// Consecutive reconciliation failures tolerated per object before the
    /// engine treats the failure as fatal.
    pub reconcile_retry_budget: u32,
}

impl RenderSettings {
    /// Returns `worker_count` clamped to the valid range `1..=`
    /// [`MAX_RENDER_WORKERS`], logging when the requested value is cut.
    pub fn clamped_worker_count(&self) -> usize {
        if self.worker_count > MAX_RENDER_WORKERS {
            log::warn!(
                "worker_count {} exceeds the maximum of {MAX_RENDER_WORKERS}; clamping",
                self.worker_count
            );
            MAX_RENDER_WORKERS
        } else {
            self.worker_count.max(1)
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::Immediate,
            worker_count: 4,
            clear_color: LinearRgba::new(0.01, 0.02, 0.03, 1.0),
            resize_debounce_ms: 120,
            resize_max_pending_frames: 10,
            reconcile_retry_budget: crate::state::registry::DEFAULT_RETRY_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_clamped_to_the_hard_maximum() {
        let settings = RenderSettings {
            worker_count: 64,
            ..Default::default()
        };
        assert_eq!(settings.clamped_worker_count(), MAX_RENDER_WORKERS);
    }

    #[test]
    fn zero_workers_round_up_to_one() {
        let settings = RenderSettings {
            worker_count: 0,
            ..Default::default()
        };
        assert_eq!(settings.clamped_worker_count(), 1);
    }
}
