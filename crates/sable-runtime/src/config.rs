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

//! Engine configuration, loadable from a JSON file.

use anyhow::Context;
use sable_core::render::{RenderMode, RenderSettings, MAX_RENDER_WORKERS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User-facing engine configuration.
///
/// Every field has a default, so a partial (or absent) config file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The window title.
    pub window_title: String,
    /// The initial window width, in logical pixels.
    pub window_width: u32,
    /// The initial window height, in logical pixels.
    pub window_height: u32,
    /// Whether to start in multi-threaded render dispatch.
    pub multi_threaded_rendering: bool,
    /// The number of render workers, clamped to the compile-time maximum.
    pub render_workers: usize,
    /// The quiet period in milliseconds before a pending resize applies.
    pub resize_debounce_ms: u64,
    /// The frame cap after which a pending resize is forced.
    pub resize_max_pending_frames: u32,
    /// Consecutive reconciliation failures tolerated before the engine
    /// gives up on an object.
    pub reconcile_retry_budget: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let render = RenderSettings::default();
        Self {
            window_title: "Sable Engine".to_string(),
            window_width: 1024,
            window_height: 768,
            multi_threaded_rendering: false,
            render_workers: render.worker_count,
            resize_debounce_ms: render.resize_debounce_ms,
            resize_max_pending_frames: render.resize_max_pending_frames,
            reconcile_retry_budget: render.reconcile_retry_budget,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parsing engine config from {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Clamps out-of-range values, logging each cut.
    pub fn sanitized(mut self) -> Self {
        if self.render_workers == 0 || self.render_workers > MAX_RENDER_WORKERS {
            let clamped = self.render_workers.clamp(1, MAX_RENDER_WORKERS);
            log::warn!(
                "render_workers {} out of range; clamping to {clamped}",
                self.render_workers
            );
            self.render_workers = clamped;
        }
        self
    }

    /// Derives the render settings this configuration describes.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            mode: if self.multi_threaded_rendering {
                RenderMode::MultiThread
            } else {
                RenderMode::Immediate
            },
            worker_count: self.render_workers,
            resize_debounce_ms: self.resize_debounce_ms,
            resize_max_pending_frames: self.resize_max_pending_frames,
            reconcile_retry_budget: self.reconcile_retry_budget,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).expect("serializes");
        let parsed: EngineConfig = serde_json::from_str(&json).expect("parses");
        assert_eq!(parsed.window_title, config.window_title);
        assert_eq!(parsed.render_workers, config.render_workers);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let parsed: EngineConfig =
            serde_json::from_str(r#"{"window_title": "Demo", "render_workers": 8}"#)
                .expect("parses");
        assert_eq!(parsed.window_title, "Demo");
        assert_eq!(parsed.render_workers, 8);
        assert_eq!(parsed.window_width, EngineConfig::default().window_width);
    }

    #[test]
    fn sanitize_clamps_worker_count() {
        let config = EngineConfig {
            render_workers: 500,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.render_workers, MAX_RENDER_WORKERS);

        let zero = EngineConfig {
            render_workers: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(zero.render_workers, 1);
    }

    #[test]
    fn multi_threaded_flag_selects_the_render_mode() {
        let config = EngineConfig {
            multi_threaded_rendering: true,
            ..Default::default()
        };
        assert_eq!(config.render_settings().mode, RenderMode::MultiThread);
    }
}
