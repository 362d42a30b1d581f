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

//! Render-target lifecycle tests over the software device: resize
//! round-trips, coalescing, and the zero-area guard.

use sable_core::math::Extent2D;
use sable_core::render::software::{DeviceOp, SoftwareDevice};
use sable_core::render::{RenderSettings, TargetLifecycle, TargetObserver, TargetSet};
use std::sync::{Arc, Mutex};

/// Settings whose resize gate opens on the first tick.
fn eager_settings() -> RenderSettings {
    RenderSettings {
        resize_debounce_ms: 0,
        resize_max_pending_frames: 1,
        ..Default::default()
    }
}

fn initialized(device: &SoftwareDevice, size: Extent2D) -> TargetLifecycle {
    let mut lifecycle = TargetLifecycle::new();
    lifecycle.initialize(device, size).expect("initialize");
    lifecycle
}

#[test]
fn resize_round_trip_restores_dimensions_without_leaks() {
    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));
    let baseline_live = device.live_resources();
    let first_generation = lifecycle.targets().unwrap().generation;

    lifecycle.request_resize(Extent2D::new(1920, 1080));
    assert!(lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies"));
    assert_eq!(device.swapchain_size(), Extent2D::new(1920, 1080));
    assert_eq!(lifecycle.targets().unwrap().viewport, Extent2D::new(1920, 1080));

    lifecycle.request_resize(Extent2D::new(800, 600));
    assert!(lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies"));

    let targets = lifecycle.targets().unwrap();
    assert_eq!(targets.viewport, Extent2D::new(800, 600));
    assert_eq!(device.swapchain_size(), Extent2D::new(800, 600));
    // Each generation fully replaces the previous: no accumulated handles.
    assert_eq!(device.live_resources(), baseline_live);
    assert_eq!(targets.generation, first_generation + 2);

    // Every target of the set belongs to the same generation.
    assert_eq!(targets.back_buffer.generation, targets.generation);
    assert_eq!(targets.scene.generation, targets.generation);
}

#[test]
fn zero_area_resize_is_a_complete_no_op() {
    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));
    let ops_before = device.ops_log().len();

    lifecycle.request_resize(Extent2D::new(0, 600));
    lifecycle.request_resize(Extent2D::new(800, 0));
    assert!(!lifecycle.has_pending_resize());
    assert!(!lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("nothing to apply"));

    assert_eq!(device.ops_log().len(), ops_before);
    assert_eq!(lifecycle.targets().unwrap().viewport, Extent2D::new(800, 600));
}

#[test]
fn rapid_resize_requests_coalesce_to_the_latest_size() {
    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));

    lifecycle.request_resize(Extent2D::new(1024, 768));
    lifecycle.request_resize(Extent2D::new(1280, 720));
    lifecycle.request_resize(Extent2D::new(1920, 1080));
    assert!(lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies"));

    assert_eq!(lifecycle.targets().unwrap().viewport, Extent2D::new(1920, 1080));
    // Exactly one swapchain reconfiguration happened.
    let reconfigures = device
        .ops_log()
        .iter()
        .filter(|op| matches!(op, DeviceOp::ConfigureSwapchain { .. }))
        .count();
    assert_eq!(reconfigures, 1);
}

#[test]
fn debounce_holds_the_resize_until_the_frame_cap() {
    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));
    let settings = RenderSettings {
        resize_debounce_ms: 60_000,
        resize_max_pending_frames: 3,
        ..Default::default()
    };

    lifecycle.request_resize(Extent2D::new(1024, 768));
    // The quiet period has clearly not elapsed; only the frame cap can
    // force the resize through.
    assert!(!lifecycle.apply_pending(&device, &settings).unwrap());
    assert!(!lifecycle.apply_pending(&device, &settings).unwrap());
    assert!(lifecycle.apply_pending(&device, &settings).unwrap());
    assert_eq!(lifecycle.targets().unwrap().viewport, Extent2D::new(1024, 768));
}

#[test]
fn old_generation_is_disposed_before_the_new_one_is_created() {
    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));
    let ops_before = device.ops_log().len();

    lifecycle.request_resize(Extent2D::new(1024, 768));
    lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies");

    let resize_ops = &device.ops_log()[ops_before..];
    let first_create = resize_ops
        .iter()
        .position(|op| {
            matches!(
                op,
                DeviceOp::CreateTexture(_) | DeviceOp::CreateView(_) | DeviceOp::AcquireBackBuffer(_)
            )
        })
        .expect("something was created");
    let last_destroy = resize_ops
        .iter()
        .rposition(|op| {
            matches!(
                op,
                DeviceOp::DestroyTexture(_) | DeviceOp::DestroyView(_) | DeviceOp::DestroyAlias(_)
            )
        })
        .expect("something was destroyed");
    assert!(
        last_destroy < first_create,
        "every dispose must precede the first recreation"
    );

    // The new viewport and output binding land after recreation.
    assert!(resize_ops
        .iter()
        .any(|op| matches!(op, DeviceOp::SetViewport(size) if *size == Extent2D::new(1024, 768))));
    assert!(resize_ops
        .iter()
        .any(|op| matches!(op, DeviceOp::BindOutputTargets { .. })));
}

#[test]
fn observers_are_rebuilt_against_each_new_generation() {
    struct SpriteLayerProbe {
        generations: Arc<Mutex<Vec<u64>>>,
    }
    impl TargetObserver for SpriteLayerProbe {
        fn targets_recreated(&mut self, targets: &TargetSet) {
            self.generations.lock().unwrap().push(targets.generation);
        }
    }

    let device = SoftwareDevice::new(Extent2D::new(800, 600));
    let mut lifecycle = initialized(&device, Extent2D::new(800, 600));
    let generations = Arc::new(Mutex::new(Vec::new()));
    lifecycle.add_observer(Box::new(SpriteLayerProbe {
        generations: Arc::clone(&generations),
    }));

    lifecycle.request_resize(Extent2D::new(1024, 768));
    lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies");
    lifecycle.request_resize(Extent2D::new(640, 480));
    lifecycle
        .apply_pending(&device, &eager_settings())
        .expect("resize applies");

    assert_eq!(*generations.lock().unwrap(), vec![2, 3]);
}
