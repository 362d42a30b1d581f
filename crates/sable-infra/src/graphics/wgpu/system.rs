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

//! The concrete, WGPU-based implementation of the `RenderSystem` trait.

use super::context::WgpuSurfaceContext;
use super::device::WgpuDevice;
use super::recorder::WgpuExecutionContexts;
use sable_core::math::Extent2D;
use sable_core::platform::window::{EngineWindow, SableWindowHandle};
use sable_core::render::{
    DispatchState, FrameStats, FrameSurfaces, GraphicsDevice, RenderDispatcher, RenderError,
    RenderSettings, RenderSystem, TargetLifecycle, TextureViewId,
};
use sable_core::scene::{Camera, Screen};
use sable_core::Stopwatch;
use std::sync::{Arc, Mutex};

/// Drives rendering with WGPU: surface context, device, render-target
/// lifecycle, and the dispatch core, wired together behind the
/// [`RenderSystem`] seam.
pub struct WgpuRenderSystem {
    context_shared: Option<Arc<Mutex<WgpuSurfaceContext>>>,
    device: Option<Arc<WgpuDevice>>,
    execution: Option<WgpuExecutionContexts>,
    lifecycle: TargetLifecycle,
    dispatcher: RenderDispatcher,
    dispatch_state: Arc<Mutex<DispatchState>>,
    current_frame_view: Option<TextureViewId>,
    frame_count: u64,
    last_frame_stats: FrameStats,
}

impl WgpuRenderSystem {
    /// Creates a new, uninitialized render system. Not usable until
    /// [`RenderSystem::init`] is called.
    pub fn new(settings: &RenderSettings) -> Self {
        let dispatch_state = Arc::new(Mutex::new(DispatchState::from_settings(settings)));
        log::info!("WgpuRenderSystem created (uninitialized).");
        Self {
            context_shared: None,
            device: None,
            execution: None,
            lifecycle: TargetLifecycle::new(),
            dispatcher: RenderDispatcher::new(Arc::clone(&dispatch_state)),
            dispatch_state,
            current_frame_view: None,
            frame_count: 0,
            last_frame_stats: FrameStats::default(),
        }
    }

    /// The device handle, available after a successful init. Applications
    /// use it to create buffers, pipelines, and bind groups.
    pub fn device(&self) -> Option<Arc<WgpuDevice>> {
        self.device.clone()
    }

    async fn initialize(
        &mut self,
        window_handle: SableWindowHandle,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if self.context_shared.is_some() {
            return Err(RenderError::DeviceCreation(
                "WgpuRenderSystem is already initialized.".to_string(),
            ));
        }
        log::info!("WgpuRenderSystem: initializing...");

        let instance = wgpu::Instance::new(
            &wgpu::InstanceDescriptor::new_without_display_handle_from_env(),
        );
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::DeviceCreation(format!("No suitable adapter: {e}")))?;

        let context = WgpuSurfaceContext::new(&instance, window_handle, adapter, width, height)
            .await?;
        let context_arc = Arc::new(Mutex::new(context));
        self.context_shared = Some(Arc::clone(&context_arc));

        let device = Arc::new(WgpuDevice::new(context_arc));
        self.execution = Some(WgpuExecutionContexts::new((*device).clone()));

        self.lifecycle
            .initialize(&*device, Extent2D::new(width.max(1), height.max(1)))?;
        self.device = Some(device);

        log::info!("WgpuRenderSystem: initialized at {width}x{height}");
        Ok(())
    }
}

impl RenderSystem for WgpuRenderSystem {
    fn init(
        &mut self,
        window: &dyn EngineWindow,
        _settings: &RenderSettings,
    ) -> Result<(), RenderError> {
        let (width, height) = window.inner_size();
        let handle = window.clone_handle_arc();
        pollster::block_on(self.initialize(handle, width, height)).inspect_err(|err| {
            log::error!("Graphics device creation failed: {err}");
        })
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        self.lifecycle
            .request_resize(Extent2D::new(width, height));
    }

    fn render(
        &mut self,
        screen: &Screen,
        camera: &Camera,
        settings: &RenderSettings,
    ) -> Result<FrameStats, RenderError> {
        let preparation_timer = Stopwatch::new();

        let device = self.device.clone().ok_or(RenderError::NotInitialized)?;

        // Apply at most one coalesced resize per tick; while the gate holds
        // a request back, skip the frame rather than draw into targets that
        // are about to be replaced.
        let applied = self.lifecycle.apply_pending(&*device, settings)?;
        if self.lifecycle.has_pending_resize() && !applied {
            return Ok(self.last_frame_stats.clone());
        }

        let targets = self
            .lifecycle
            .targets()
            .ok_or(RenderError::NotInitialized)?
            .clone();

        // The previous frame's presentation view is gone with its swapchain
        // image; mint the new one.
        if let Some(old_view) = self.current_frame_view.take() {
            let _ = device.destroy_texture_view(old_view);
        }
        let presentation_view = device.acquire_frame_view()?;
        self.current_frame_view = Some(presentation_view);

        // With a post chain the scene renders offscreen and the chain's
        // final node draws to the presentation surface; without one the
        // scene draws to the presentation surface directly.
        let scene_output = if screen.has_post_chain() {
            targets.scene.view
        } else {
            presentation_view
        };
        device.bind_output_targets(scene_output, targets.depth_view)?;
        device.submit_clear_pass(settings.clear_color, scene_output, targets.depth_view)?;

        let execution = self.execution.as_ref().ok_or(RenderError::NotInitialized)?;
        let surfaces = FrameSurfaces {
            scene: targets.scene.view,
            presentation: presentation_view,
        };

        let preparation_ms = preparation_timer.elapsed_secs_f32().unwrap_or(0.0) * 1000.0;
        let submission_timer = Stopwatch::new();

        let outcome = self
            .dispatcher
            .render_screen(screen, camera, execution, &surfaces)?;

        device.present()?;

        self.frame_count += 1;
        self.last_frame_stats = FrameStats {
            frame_number: self.frame_count,
            draw_calls: outcome.draw_calls,
            effects_drawn: outcome.effects_drawn,
            workers_used: outcome.workers_used,
            command_buffers_replayed: outcome.command_buffers_replayed,
            post_effects_applied: outcome.post_effects_applied,
            cpu_preparation_time_ms: preparation_ms,
            cpu_submission_time_ms: submission_timer.elapsed_secs_f32().unwrap_or(0.0) * 1000.0,
        };
        log::trace!("Frame {} rendered.", self.frame_count);
        Ok(self.last_frame_stats.clone())
    }

    fn dispatch_state(&self) -> Arc<Mutex<DispatchState>> {
        Arc::clone(&self.dispatch_state)
    }

    fn last_frame_stats(&self) -> &FrameStats {
        &self.last_frame_stats
    }

    fn shutdown(&mut self) {
        log::info!("WgpuRenderSystem shutting down...");
        if let Some(device) = self.device.as_ref() {
            if let Some(old_view) = self.current_frame_view.take() {
                let _ = device.destroy_texture_view(old_view);
            }
            self.lifecycle.shutdown(&**device);
        }
        self.execution = None;
        self.device = None;
        self.context_shared = None;
    }

    fn graphics_device(&self) -> Arc<dyn GraphicsDevice> {
        self.device
            .clone()
            .expect("WgpuRenderSystem: no device available; init() must run first.")
    }
}
