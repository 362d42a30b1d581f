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

//! The frame scheduler: decides execution topology per frame and replays
//! draw work deterministically regardless of topology.

use super::error::{ConfigError, RenderError};
use super::handle::TextureViewId;
use super::settings::{RenderMode, RenderSettings};
use super::traits::{CommandBuffer, CommandRecorder, ExecutionContexts};
use crate::scene::{Camera, Effect, GpuMesh, Screen};
use crate::state::{ChangeSet, Reconcile, StateError};
use std::ops::Range;
use std::sync::{Arc, Mutex};

/// Splits `mesh_count` meshes across at most `worker_count` contiguous,
/// disjoint index ranges, plus one uniform tail range for the remainder.
///
/// Every range maps to its own context slot; the union of all ranges covers
/// `[0, mesh_count)` exactly once with no gaps and no overlaps. With 37
/// meshes and 4 workers this yields `[0,9) [9,18) [18,27) [27,36) [36,37)`:
/// five ranges, hence five command buffers.
pub fn partition_ranges(mesh_count: usize, worker_count: usize) -> Vec<Range<usize>> {
    if mesh_count == 0 {
        return Vec::new();
    }
    let tasks = worker_count.max(1).min(mesh_count);
    let per_task = mesh_count / tasks;
    let remainder = mesh_count % tasks;

    let mut ranges: Vec<Range<usize>> = (0..tasks)
        .map(|i| i * per_task..(i + 1) * per_task)
        .collect();
    if remainder > 0 {
        ranges.push(tasks * per_task..mesh_count);
    }
    ranges
}

/// The dirty-tracked dispatch topology.
///
/// Mode and worker-count changes are staged and only take effect at
/// reconciliation time: transitioning into [`RenderMode::MultiThread`]
/// allocates the deferred context slots (one per worker plus one for the
/// remainder tail), transitioning back releases them.
#[derive(Debug)]
pub struct DispatchState {
    mode: RenderMode,
    worker_count: usize,
    slots: usize,
    changes: ChangeSet,
}

impl DispatchState {
    /// Builds the initial topology from settings, applied directly (the
    /// engine is not running yet, so there is nothing to stage against).
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let worker_count = settings.clamped_worker_count();
        let mode = settings.mode;
        Self {
            mode,
            worker_count,
            slots: Self::slots_for(mode, worker_count),
            changes: ChangeSet::new("dispatch-topology"),
        }
    }

    fn slots_for(mode: RenderMode, worker_count: usize) -> usize {
        match mode {
            RenderMode::Immediate => 0,
            // One slot per worker plus a dedicated slot for the remainder
            // tail of an uneven partition.
            RenderMode::MultiThread => worker_count + 1,
        }
    }

    /// Stages a render-mode change.
    pub fn set_mode(&mut self, mode: RenderMode) {
        self.changes.stage(&mut self.mode, mode, "mode");
    }

    /// Stages a worker-count change. Values are clamped to
    /// `1..=`[`MAX_RENDER_WORKERS`](super::settings::MAX_RENDER_WORKERS).
    pub fn set_worker_count(&mut self, worker_count: usize) {
        let clamped = worker_count
            .max(1)
            .min(super::settings::MAX_RENDER_WORKERS);
        if clamped != worker_count {
            log::warn!("worker_count {worker_count} clamped to {clamped}");
        }
        self.changes
            .stage(&mut self.worker_count, clamped, "worker-count");
    }

    /// The active render mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// The active worker count.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// The number of allocated deferred context slots.
    pub fn slots(&self) -> usize {
        self.slots
    }
}

impl Reconcile for DispatchState {
    fn reconcile(&mut self) -> Result<(), StateError> {
        if self.changes.is_clean() {
            return Ok(());
        }
        let slots = Self::slots_for(self.mode, self.worker_count);
        if slots != self.slots {
            match self.mode {
                RenderMode::MultiThread => {
                    log::info!("Allocating {slots} deferred context slots");
                }
                RenderMode::Immediate => {
                    log::info!("Releasing {} deferred context slots", self.slots);
                }
            }
            self.slots = slots;
        }
        self.changes.finish();
        Ok(())
    }

    fn is_clean(&self) -> bool {
        self.changes.is_clean()
    }

    fn debug_name(&self) -> &'static str {
        "dispatch-topology"
    }
}

/// The per-frame views the dispatcher draws into.
#[derive(Debug, Clone, Copy)]
pub struct FrameSurfaces {
    /// The fully-rendered scene target (input to the post-process chain).
    pub scene: TextureViewId,
    /// The presentation surface the final image lands on.
    pub presentation: TextureViewId,
}

/// Counters produced by one [`RenderDispatcher::render_screen`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Draw calls recorded across all contexts.
    pub draw_calls: u32,
    /// Effects applied (once per context each).
    pub effects_drawn: u32,
    /// The widest worker fan-out used by any effect group.
    pub workers_used: u32,
    /// Deferred command buffers replayed on the primary context.
    pub command_buffers_replayed: u32,
    /// Post-process nodes applied.
    pub post_effects_applied: u32,
}

/// Renders screens by partitioning their mesh lists across execution
/// contexts.
///
/// Visual output is identical in both render modes: worker ranges are
/// disjoint and contiguous, and deferred command buffers replay in slot
/// order (never completion order), so the effective sequence of
/// material-apply and draw operations matches the immediate path exactly.
pub struct RenderDispatcher {
    state: Arc<Mutex<DispatchState>>,
}

impl RenderDispatcher {
    /// Creates a dispatcher over a shared topology state.
    pub fn new(state: Arc<Mutex<DispatchState>>) -> Self {
        Self { state }
    }

    /// The shared topology state, for enrollment into the dirty registry.
    pub fn state(&self) -> Arc<Mutex<DispatchState>> {
        Arc::clone(&self.state)
    }

    /// Returns the recorder a call site should record into for `slot`.
    ///
    /// In immediate mode the slot is irrelevant and the primary context's
    /// recorder is returned; this indirection is what keeps call sites
    /// mode-agnostic.
    fn pick_recorder(
        contexts: &dyn ExecutionContexts,
        mode: RenderMode,
        slot: usize,
    ) -> Box<dyn CommandRecorder> {
        match mode {
            RenderMode::Immediate => contexts.immediate_recorder(),
            RenderMode::MultiThread => contexts.deferred_recorder(slot),
        }
    }

    /// Renders one screen: every effect group, then the post-process chain.
    ///
    /// An effect owning zero materials aborts the frame with a
    /// configuration error in either mode. Worker failures propagate
    /// through the join barrier and abort the frame; the next frame starts
    /// from a clean slate because contexts are recreated per dispatch.
    pub fn render_screen(
        &self,
        screen: &Screen,
        camera: &Camera,
        contexts: &dyn ExecutionContexts,
        surfaces: &FrameSurfaces,
    ) -> Result<DispatchOutcome, RenderError> {
        let (mode, worker_count) = {
            let state = self
                .state
                .lock()
                .map_err(|_| RenderError::Backend("dispatch state lock poisoned".to_string()))?;
            (state.mode(), state.worker_count())
        };

        let mut outcome = DispatchOutcome::default();
        for group in screen.groups() {
            if !group.effect.has_materials() {
                return Err(ConfigError::EffectWithoutMaterials {
                    effect: group.effect.name.clone(),
                }
                .into());
            }
            outcome.effects_drawn += 1;
            if group.meshes.is_empty() {
                continue;
            }

            match mode {
                RenderMode::Immediate => {
                    // Trivial partition: one range covering every mesh.
                    let mut recorder = Self::pick_recorder(contexts, mode, 0);
                    recorder.apply_effect(&group.effect);
                    for mesh in &group.meshes {
                        render_mesh(recorder.as_mut(), &group.effect, mesh, camera)?;
                    }
                    contexts.replay(recorder.finish()?)?;
                }
                RenderMode::MultiThread => {
                    let ranges = partition_ranges(group.meshes.len(), worker_count);
                    let buffers = record_partitions(
                        contexts,
                        mode,
                        &group.effect,
                        &group.meshes,
                        camera,
                        &ranges,
                    )?;
                    outcome.workers_used = outcome.workers_used.max(ranges.len() as u32);
                    outcome.command_buffers_replayed += buffers.len() as u32;
                    for buffer in buffers {
                        // Replay strictly in slot order; the buffer drops
                        // (is disposed) immediately after its replay.
                        contexts.replay(buffer)?;
                    }
                }
            }
            outcome.draw_calls += group.meshes.len() as u32;
        }

        if screen.has_post_chain() {
            outcome.post_effects_applied = self.render_post_chain(screen, contexts, surfaces)?;
        }

        Ok(outcome)
    }

    /// Draws the scene texture through the post-process chain, nodes linked
    /// output-to-input in ascending key order; only the final node draws to
    /// the presentation surface.
    fn render_post_chain(
        &self,
        screen: &Screen,
        contexts: &dyn ExecutionContexts,
        surfaces: &FrameSurfaces,
    ) -> Result<u32, RenderError> {
        let mut recorder = contexts.immediate_recorder();
        let total = screen.post_chain_len();
        let mut input = surfaces.scene;
        let mut applied = 0u32;

        for (position, node) in screen.post_chain().enumerate() {
            let is_final = position + 1 == total;
            let output = if is_final {
                surfaces.presentation
            } else {
                node.intermediate.ok_or_else(|| {
                    RenderError::from(ConfigError::MissingIntermediateTarget {
                        effect: node.name.clone(),
                    })
                })?
            };
            recorder.apply_post_effect(node, input, output);
            input = output;
            applied += 1;
        }

        contexts.replay(recorder.finish()?)?;
        Ok(applied)
    }
}

/// Records one effect group across deferred contexts, one worker task per
/// range, and returns the finished buffers in slot order.
///
/// This is the only blocking point of the frame: the calling thread waits
/// for every worker before any buffer replays. No recording work outlives
/// this call.
fn record_partitions(
    contexts: &dyn ExecutionContexts,
    mode: RenderMode,
    effect: &Effect,
    meshes: &[GpuMesh],
    camera: &Camera,
    ranges: &[Range<usize>],
) -> Result<Vec<CommandBuffer>, RenderError> {
    let results: Vec<Result<CommandBuffer, RenderError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .iter()
            .cloned()
            .enumerate()
            .map(|(slot, range)| {
                scope.spawn(move || {
                    let mut recorder = RenderDispatcher::pick_recorder(contexts, mode, slot);
                    // The effect applies once per context, not once per mesh.
                    recorder.apply_effect(effect);
                    for mesh in &meshes[range] {
                        render_mesh(recorder.as_mut(), effect, mesh, camera)?;
                    }
                    recorder.finish()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                // A panicking worker is not specially caught: it aborts the
                // frame on the calling thread.
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });
    results.into_iter().collect()
}

/// Renders a single mesh: resolve its material, apply it, draw.
fn render_mesh(
    recorder: &mut dyn CommandRecorder,
    effect: &Effect,
    mesh: &GpuMesh,
    camera: &Camera,
) -> Result<(), RenderError> {
    // Visibility hook: containment is computed per mesh but not yet used to
    // skip draws.
    // TODO: skip Disjoint meshes once DispatchOutcome reports a culled count.
    let containment = camera.frustum().contains_aabb(&mesh.model.bounding_box);
    log::trace!("Mesh '{}' frustum containment: {containment:?}", mesh.name);

    let material = effect.resolve_material(&mesh.material).ok_or_else(|| {
        RenderError::from(ConfigError::MaterialNotFound {
            effect: effect.name.clone(),
            selection: format!("{:?}", mesh.material),
        })
    })?;
    recorder.apply_material(material, effect, mesh);
    recorder.draw_mesh(mesh);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered_indices(ranges: &[Range<usize>]) -> Vec<usize> {
        ranges.iter().flat_map(|r| r.clone()).collect()
    }

    #[test]
    fn partition_covers_every_index_exactly_once() {
        for mesh_count in 1..=64usize {
            for worker_count in 1..=mesh_count {
                let ranges = partition_ranges(mesh_count, worker_count);
                let covered = covered_indices(&ranges);
                assert_eq!(
                    covered,
                    (0..mesh_count).collect::<Vec<_>>(),
                    "gaps or overlaps for {mesh_count} meshes / {worker_count} workers"
                );
            }
        }
    }

    #[test]
    fn partition_ranges_are_contiguous_and_ordered() {
        let ranges = partition_ranges(100, 7);
        let mut expected_start = 0;
        for range in &ranges {
            assert_eq!(range.start, expected_start);
            assert!(range.end > range.start);
            expected_start = range.end;
        }
        assert_eq!(expected_start, 100);
    }

    #[test]
    fn partition_of_37_meshes_across_4_workers() {
        let ranges = partition_ranges(37, 4);
        assert_eq!(ranges, vec![0..9, 9..18, 18..27, 27..36, 36..37]);
    }

    #[test]
    fn partition_with_more_workers_than_meshes_shrinks_the_task_count() {
        let ranges = partition_ranges(3, 8);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn partition_of_zero_meshes_is_empty() {
        assert!(partition_ranges(0, 4).is_empty());
    }

    #[test]
    fn mode_change_takes_effect_only_at_reconciliation() {
        let settings = RenderSettings::default();
        let mut state = DispatchState::from_settings(&settings);
        assert_eq!(state.mode(), RenderMode::Immediate);
        assert_eq!(state.slots(), 0);

        state.set_mode(RenderMode::MultiThread);
        // Still immediate until the registry pass runs.
        assert_eq!(state.slots(), 0);
        assert!(!state.is_clean());

        state.reconcile().expect("reconcile succeeds");
        assert_eq!(state.slots(), settings.clamped_worker_count() + 1);

        state.set_mode(RenderMode::Immediate);
        state.reconcile().expect("reconcile succeeds");
        assert_eq!(state.slots(), 0);
    }

    #[test]
    fn worker_count_is_clamped_when_staged() {
        let mut state = DispatchState::from_settings(&RenderSettings::default());
        state.set_worker_count(1000);
        state.reconcile().expect("reconcile succeeds");
        assert_eq!(
            state.worker_count(),
            super::super::settings::MAX_RENDER_WORKERS
        );
    }
}
