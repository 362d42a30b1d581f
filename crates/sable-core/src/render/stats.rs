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

//! Performance statistics for the rendering system.

/// A collection of statistics for a single rendered frame.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// A sequential counter for rendered frames.
    pub frame_number: u64,
    /// The number of draw calls recorded for the frame.
    pub draw_calls: u32,
    /// The number of effects applied for the frame.
    pub effects_drawn: u32,
    /// The number of worker tasks used (0 in immediate mode).
    pub workers_used: u32,
    /// The number of deferred command buffers replayed on the primary
    /// context.
    pub command_buffers_replayed: u32,
    /// The number of post-process nodes applied.
    pub post_effects_applied: u32,
    /// The CPU time spent in pre-render preparation (reconciliation,
    /// partitioning).
    pub cpu_preparation_time_ms: f32,
    /// The CPU time spent recording and submitting command buffers.
    pub cpu_submission_time_ms: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame_number: 0,
            draw_calls: 0,
            effects_drawn: 0,
            workers_used: 0,
            command_buffers_replayed: 0,
            post_effects_applied: 0,
            cpu_preparation_time_ms: 0.0,
            cpu_submission_time_ms: 0.0,
        }
    }
}
