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

//! End-to-end dispatch tests over the software backend: replay ordering,
//! mode-invariant output, and configuration faults.

use sable_core::math::{Aabb, LinearRgba, Vec3};
use sable_core::render::software::{RecordedOp, SoftwareContexts};
use sable_core::render::{
    BufferId, ConfigError, DispatchState, FrameSurfaces, IndexFormat, RenderDispatcher,
    RenderError, RenderMode, RenderPipelineId, RenderSettings, TextureViewId,
};
use sable_core::scene::{
    Camera, Effect, EffectGroup, GpuMesh, Material, MaterialRef, Model, PostEffect, Screen,
};
use sable_core::state::Reconcile;
use std::sync::{Arc, Mutex};

fn test_camera() -> Camera {
    Camera::new(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_2,
        16.0 / 9.0,
    )
}

fn test_meshes(count: usize) -> Vec<GpuMesh> {
    let model = Arc::new(Model {
        name: "shared".to_string(),
        bounding_box: Aabb::from_min_max(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
    });
    (0..count)
        .map(|i| GpuMesh {
            name: format!("mesh-{i:02}"),
            vertex_buffer: BufferId(i as u64 * 2),
            index_buffer: BufferId(i as u64 * 2 + 1),
            index_count: 36,
            index_format: IndexFormat::Uint16,
            model: Arc::clone(&model),
            material: MaterialRef::Default,
        })
        .collect()
}

fn lit_effect(name: &str) -> Effect {
    let mut effect = Effect::new(name, RenderPipelineId(1));
    effect.push_material(Material::new("default", LinearRgba::WHITE));
    effect
}

fn screen_with(groups: Vec<EffectGroup>) -> Screen {
    let mut screen = Screen::new("test-screen");
    for group in groups {
        screen.push_group(group);
    }
    screen
}

fn surfaces() -> FrameSurfaces {
    FrameSurfaces {
        scene: TextureViewId(100),
        presentation: TextureViewId(101),
    }
}

fn dispatcher(mode: RenderMode, workers: usize) -> RenderDispatcher {
    let settings = RenderSettings {
        mode,
        worker_count: workers,
        ..Default::default()
    };
    RenderDispatcher::new(Arc::new(Mutex::new(DispatchState::from_settings(&settings))))
}

/// Filters the executed stream down to the operations whose order the
/// mode-invariance guarantee covers: material applications and draw calls.
fn draw_level_ops(ops: &[RecordedOp]) -> Vec<RecordedOp> {
    ops.iter()
        .filter(|op| {
            matches!(
                op,
                RecordedOp::ApplyMaterial { .. } | RecordedOp::DrawMesh { .. }
            )
        })
        .cloned()
        .collect()
}

#[test]
fn thirty_seven_meshes_across_four_workers_replay_five_buffers_in_slot_order() {
    let screen = screen_with(vec![EffectGroup {
        effect: lit_effect("lit"),
        meshes: test_meshes(37),
    }]);
    let camera = test_camera();
    let contexts = SoftwareContexts::new();

    let outcome = dispatcher(RenderMode::MultiThread, 4)
        .render_screen(&screen, &camera, &contexts, &surfaces())
        .expect("dispatch succeeds");

    assert_eq!(outcome.command_buffers_replayed, 5);
    assert_eq!(outcome.workers_used, 5);
    assert_eq!(outcome.draw_calls, 37);
    assert_eq!(
        contexts.replayed_slots(),
        vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
    );

    // The effect applies once per context, and the merged stream draws
    // every mesh exactly once, in logical index order.
    let ops = contexts.executed_ops();
    let effect_applications = ops
        .iter()
        .filter(|op| matches!(op, RecordedOp::ApplyEffect { .. }))
        .count();
    assert_eq!(effect_applications, 5);

    let drawn: Vec<&str> = ops
        .iter()
        .filter_map(|op| match op {
            RecordedOp::DrawMesh { mesh } => Some(mesh.as_str()),
            _ => None,
        })
        .collect();
    let expected: Vec<String> = (0..37).map(|i| format!("mesh-{i:02}")).collect();
    assert_eq!(drawn, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn immediate_and_multithread_issue_identical_draw_sequences() {
    let build_screen = || {
        screen_with(vec![
            EffectGroup {
                effect: lit_effect("opaque"),
                meshes: test_meshes(23),
            },
            EffectGroup {
                effect: lit_effect("transparent"),
                meshes: test_meshes(5),
            },
        ])
    };
    let camera = test_camera();

    let immediate_contexts = SoftwareContexts::new();
    dispatcher(RenderMode::Immediate, 4)
        .render_screen(&build_screen(), &camera, &immediate_contexts, &surfaces())
        .expect("immediate dispatch succeeds");

    let threaded_contexts = SoftwareContexts::new();
    dispatcher(RenderMode::MultiThread, 4)
        .render_screen(&build_screen(), &camera, &threaded_contexts, &surfaces())
        .expect("threaded dispatch succeeds");

    assert_eq!(
        draw_level_ops(&immediate_contexts.executed_ops()),
        draw_level_ops(&threaded_contexts.executed_ops()),
    );
}

#[test]
fn effect_without_materials_is_fatal_in_both_modes() {
    for mode in [RenderMode::Immediate, RenderMode::MultiThread] {
        let screen = screen_with(vec![EffectGroup {
            effect: Effect::new("empty", RenderPipelineId(1)),
            meshes: test_meshes(4),
        }]);
        let camera = test_camera();
        let contexts = SoftwareContexts::new();

        let err = dispatcher(mode, 4)
            .render_screen(&screen, &camera, &contexts, &surfaces())
            .expect_err("zero materials must abort the frame");
        assert!(matches!(
            err,
            RenderError::Configuration(ConfigError::EffectWithoutMaterials { .. })
        ));
        // Nothing reached the primary context.
        assert!(contexts.executed_ops().is_empty());
    }
}

#[test]
fn unresolvable_material_aborts_the_frame() {
    let mut screen = Screen::new("test-screen");
    let mut meshes = test_meshes(3);
    meshes[1].material = MaterialRef::Named("missing".to_string());
    screen.push_group(EffectGroup {
        effect: lit_effect("lit"),
        meshes,
    });
    let camera = test_camera();
    let contexts = SoftwareContexts::new();

    let err = dispatcher(RenderMode::MultiThread, 2)
        .render_screen(&screen, &camera, &contexts, &surfaces())
        .expect_err("missing material must abort");
    assert!(matches!(
        err,
        RenderError::Configuration(ConfigError::MaterialNotFound { .. })
    ));
}

#[test]
fn post_chain_links_output_to_input_in_ascending_key_order() {
    let mut screen = screen_with(vec![EffectGroup {
        effect: lit_effect("lit"),
        meshes: test_meshes(2),
    }]);
    screen
        .add_post_effect(
            10,
            PostEffect {
                name: "edge".to_string(),
                pipeline: RenderPipelineId(7),
                bind_group: None,
                intermediate: None,
            },
        )
        .expect("unique key");
    screen
        .add_post_effect(
            -5,
            PostEffect {
                name: "ripple".to_string(),
                pipeline: RenderPipelineId(6),
                bind_group: None,
                intermediate: Some(TextureViewId(55)),
            },
        )
        .expect("unique key");

    let camera = test_camera();
    let contexts = SoftwareContexts::new();
    let frame = surfaces();

    let outcome = dispatcher(RenderMode::Immediate, 1)
        .render_screen(&screen, &camera, &contexts, &frame)
        .expect("dispatch succeeds");
    assert_eq!(outcome.post_effects_applied, 2);

    let post_ops: Vec<RecordedOp> = contexts
        .executed_ops()
        .into_iter()
        .filter(|op| matches!(op, RecordedOp::ApplyPost { .. }))
        .collect();
    assert_eq!(
        post_ops,
        vec![
            RecordedOp::ApplyPost {
                effect: "ripple".to_string(),
                input: frame.scene,
                output: TextureViewId(55),
            },
            RecordedOp::ApplyPost {
                effect: "edge".to_string(),
                input: TextureViewId(55),
                output: frame.presentation,
            },
        ]
    );
}

#[test]
fn non_final_post_node_without_intermediate_target_is_a_config_fault() {
    let mut screen = screen_with(vec![EffectGroup {
        effect: lit_effect("lit"),
        meshes: test_meshes(1),
    }]);
    for (key, name) in [(0, "first"), (1, "second")] {
        screen
            .add_post_effect(
                key,
                PostEffect {
                    name: name.to_string(),
                    pipeline: RenderPipelineId(7),
                    bind_group: None,
                    intermediate: None,
                },
            )
            .expect("unique key");
    }
    let camera = test_camera();
    let contexts = SoftwareContexts::new();

    let err = dispatcher(RenderMode::Immediate, 1)
        .render_screen(&screen, &camera, &contexts, &surfaces())
        .expect_err("first node lacks an intermediate target");
    assert!(matches!(
        err,
        RenderError::Configuration(ConfigError::MissingIntermediateTarget { .. })
    ));
}

#[test]
fn dirty_tracked_mode_switch_changes_the_topology_between_frames() {
    let settings = RenderSettings {
        mode: RenderMode::Immediate,
        worker_count: 3,
        ..Default::default()
    };
    let state = Arc::new(Mutex::new(DispatchState::from_settings(&settings)));
    let dispatcher = RenderDispatcher::new(Arc::clone(&state));

    let screen = screen_with(vec![EffectGroup {
        effect: lit_effect("lit"),
        meshes: test_meshes(9),
    }]);
    let camera = test_camera();

    let first = SoftwareContexts::new();
    dispatcher
        .render_screen(&screen, &camera, &first, &surfaces())
        .expect("immediate frame succeeds");
    assert_eq!(first.replayed_slots(), vec![None]);

    {
        let mut guard = state.lock().unwrap();
        guard.set_mode(RenderMode::MultiThread);
        guard.reconcile().expect("reconcile succeeds");
    }

    let second = SoftwareContexts::new();
    dispatcher
        .render_screen(&screen, &camera, &second, &surfaces())
        .expect("threaded frame succeeds");
    assert_eq!(
        second.replayed_slots(),
        vec![Some(0), Some(1), Some(2)]
    );
    assert_eq!(
        draw_level_ops(&first.executed_ops()),
        draw_level_ops(&second.executed_ops()),
    );
}
