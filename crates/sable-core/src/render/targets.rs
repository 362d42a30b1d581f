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

//! The render-target lifecycle: back buffer, depth buffer, and scene
//! (post-process) target managed as one consistent group.

use super::error::RenderError;
use super::handle::{
    BitmapAliasId, TextureDescriptor, TextureFormat, TextureId, TextureViewId,
};
use super::settings::RenderSettings;
use super::traits::GraphicsDevice;
use crate::math::{Extent2D, Extent3D};
use std::time::Instant;

/// A texture, a view for drawing into it, and optionally a 2D-drawable
/// bitmap alias of the same memory.
///
/// The view and the alias always reference the same texture generation: any
/// texture replacement invalidates both, and they are recreated together,
/// never independently.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    /// The underlying texture.
    pub texture: TextureId,
    /// The view usable for drawing into the texture.
    pub view: TextureViewId,
    /// The 2D bitmap alias, when the backend supports 2D interop.
    pub bitmap_alias: Option<BitmapAliasId>,
    /// The target-set generation this target was created in.
    pub generation: u64,
}

impl RenderTarget {
    fn wrap(
        device: &dyn GraphicsDevice,
        texture: TextureId,
        label: &str,
        generation: u64,
    ) -> Result<Self, RenderError> {
        let view = device.create_texture_view(texture, Some(label))?;
        let bitmap_alias = device.create_bitmap_alias(texture)?;
        Ok(Self {
            texture,
            view,
            bitmap_alias,
            generation,
        })
    }

    /// Releases the view and the bitmap alias, leaving the raw texture to
    /// the caller (back-buffer textures belong to the swapchain).
    fn dispose_wrapper(&self, device: &dyn GraphicsDevice) -> Result<(), RenderError> {
        if let Some(alias) = self.bitmap_alias {
            device.destroy_bitmap_alias(alias)?;
        }
        device.destroy_texture_view(self.view)?;
        Ok(())
    }
}

/// Everything that must be recreated together when the client area changes.
#[derive(Debug, Clone)]
pub struct TargetSet {
    /// The wrapper around the swapchain's back-buffer texture.
    pub back_buffer: RenderTarget,
    /// The offscreen scene target the post-process chain reads from.
    pub scene: RenderTarget,
    /// The depth buffer texture.
    pub depth_texture: TextureId,
    /// The depth-stencil view.
    pub depth_view: TextureViewId,
    /// The single viewport, sized to the client area.
    pub viewport: Extent2D,
    /// A counter bumped on every recreation.
    pub generation: u64,
}

/// A subsystem that caches target-dependent state and must be rebuilt after
/// the targets are recreated (the 2D sprite layer, in the original design).
pub trait TargetObserver: Send {
    /// Called after a successful resize, with the freshly created targets.
    fn targets_recreated(&mut self, targets: &TargetSet);
}

/// Owns the target group and runs the resize protocol.
///
/// Resize notifications only record a latest-wins pending size; the actual
/// dispose/recreate sequence runs exclusively from the frame tick, at most
/// once per tick, so a notification arriving mid-resize can only land in
/// the pending slot. Application is gated by a quiet-period debounce plus a
/// max-pending-frames cap from [`RenderSettings`].
pub struct TargetLifecycle {
    targets: Option<TargetSet>,
    generation: u64,
    pending_resize: Option<Extent2D>,
    pending_frames: u32,
    last_resize_request: Option<Instant>,
    observers: Vec<Box<dyn TargetObserver>>,
}

impl TargetLifecycle {
    /// Creates an empty lifecycle; call [`initialize`](Self::initialize)
    /// once a device and window size exist.
    pub fn new() -> Self {
        Self {
            targets: None,
            generation: 0,
            pending_resize: None,
            pending_frames: 0,
            last_resize_request: None,
            observers: Vec::new(),
        }
    }

    /// The current target set, if initialized.
    pub fn targets(&self) -> Option<&TargetSet> {
        self.targets.as_ref()
    }

    /// Registers a subsystem to be rebuilt after every target recreation.
    pub fn add_observer(&mut self, observer: Box<dyn TargetObserver>) {
        self.observers.push(observer);
    }

    /// Creates the first generation of targets at the given size.
    pub fn initialize(
        &mut self,
        device: &dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<(), RenderError> {
        if self.targets.is_some() {
            return Err(RenderError::TargetLifecycle(
                "targets are already initialized".to_string(),
            ));
        }
        if size.is_zero_area() {
            return Err(RenderError::TargetLifecycle(format!(
                "cannot initialize targets with a zero-area client region ({}x{})",
                size.width, size.height
            )));
        }
        let targets = self.create_generation(device, size)?;
        log::info!(
            "Render targets initialized at {}x{}",
            size.width,
            size.height
        );
        self.targets = Some(targets);
        Ok(())
    }

    /// Records a resize request from the windowing collaborator.
    ///
    /// A zero-area size is a no-op, not an error: minimized windows must not
    /// tear down the targets. Consecutive requests coalesce to the latest
    /// size.
    pub fn request_resize(&mut self, size: Extent2D) {
        if size.is_zero_area() {
            log::warn!(
                "Ignoring resize request to zero-area client region ({}x{})",
                size.width,
                size.height
            );
            return;
        }
        if self
            .targets
            .as_ref()
            .is_some_and(|t| t.viewport == size && self.pending_resize.is_none())
        {
            return;
        }
        log::debug!("Resize requested to {}x{}", size.width, size.height);
        self.pending_resize = Some(size);
        self.pending_frames = 0;
        self.last_resize_request = Some(Instant::now());
    }

    /// Returns `true` if a resize is waiting to be applied.
    pub fn has_pending_resize(&self) -> bool {
        self.pending_resize.is_some()
    }

    /// Applies the coalesced pending resize if its gate has opened: either
    /// the quiet period elapsed since the last request, or the request has
    /// been pending for too many frames.
    ///
    /// Returns `Ok(true)` when a resize was applied this tick. Resize
    /// failures are logged with full context and rethrown; a half-resized
    /// target group must not be silently kept.
    pub fn apply_pending(
        &mut self,
        device: &dyn GraphicsDevice,
        settings: &RenderSettings,
    ) -> Result<bool, RenderError> {
        let Some(size) = self.pending_resize else {
            return Ok(false);
        };
        self.pending_frames = self.pending_frames.saturating_add(1);

        let quiet_elapsed_ms = self
            .last_resize_request
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(u64::MAX);
        if quiet_elapsed_ms < settings.resize_debounce_ms
            && self.pending_frames < settings.resize_max_pending_frames
        {
            return Ok(false);
        }

        self.pending_resize = None;
        self.pending_frames = 0;
        self.last_resize_request = None;

        if let Err(err) = self.resize_to(device, size) {
            log::error!(
                "Resize to {}x{} failed mid-protocol: {err}",
                size.width,
                size.height
            );
            return Err(err);
        }
        Ok(true)
    }

    /// Runs the resize protocol: dispose the old generation in dependency
    /// order, resize the swapchain, and recreate everything at `size`.
    fn resize_to(
        &mut self,
        device: &dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<(), RenderError> {
        let Some(old) = self.targets.take() else {
            return Err(RenderError::TargetLifecycle(
                "resize before initialization".to_string(),
            ));
        };

        // Dispose order is load-bearing: the back-buffer wrapper holds a
        // view into the raw texture, so the raw handle goes first and the
        // wrapper after, or the view would be released twice.
        device.destroy_texture(old.back_buffer.texture)?;
        old.scene.dispose_wrapper(device)?;
        device.destroy_texture(old.scene.texture)?;
        old.back_buffer.dispose_wrapper(device)?;
        device.destroy_texture(old.depth_texture)?;
        device.destroy_texture_view(old.depth_view)?;

        device.configure_swapchain(size.width, size.height)?;

        let targets = self.create_generation(device, size)?;
        log::info!(
            "Render targets recreated at {}x{} (generation {})",
            size.width,
            size.height,
            targets.generation
        );
        self.targets = Some(targets);

        let targets = self.targets.as_ref().expect("just stored");
        for observer in &mut self.observers {
            observer.targets_recreated(targets);
        }
        Ok(())
    }

    /// Creates one complete target generation at `size`: back-buffer
    /// wrapper, scene target, depth buffer, viewport, output binding.
    fn create_generation(
        &mut self,
        device: &dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<TargetSet, RenderError> {
        self.generation += 1;
        let generation = self.generation;

        let back_texture = device.acquire_back_buffer()?;
        let back_buffer = RenderTarget::wrap(device, back_texture, "back-buffer", generation)?;

        let scene_texture = device.create_texture(&TextureDescriptor {
            label: Some("scene-target".to_string()),
            size: Extent3D::from(size),
            format: TextureFormat::Rgba16Float,
            render_attachment: true,
            sampled: true,
        })?;
        let scene = RenderTarget::wrap(device, scene_texture, "scene-target", generation)?;

        let depth_texture = device.create_texture(&TextureDescriptor {
            label: Some("depth-buffer".to_string()),
            size: Extent3D::from(size),
            format: TextureFormat::Depth32Float,
            render_attachment: true,
            sampled: false,
        })?;
        let depth_view = device.create_texture_view(depth_texture, Some("depth-stencil-view"))?;

        device.set_viewport(size)?;
        device.bind_output_targets(back_buffer.view, depth_view)?;

        Ok(TargetSet {
            back_buffer,
            scene,
            depth_texture,
            depth_view,
            viewport: size,
            generation,
        })
    }

    /// Disposes the current generation. Called on renderer shutdown.
    pub fn shutdown(&mut self, device: &dyn GraphicsDevice) {
        if let Some(old) = self.targets.take() {
            let disposed = device
                .destroy_texture(old.back_buffer.texture)
                .and_then(|()| old.scene.dispose_wrapper(device))
                .and_then(|()| device.destroy_texture(old.scene.texture))
                .and_then(|()| old.back_buffer.dispose_wrapper(device))
                .and_then(|()| device.destroy_texture(old.depth_texture))
                .and_then(|()| device.destroy_texture_view(old.depth_view));
            if let Err(err) = disposed {
                log::warn!("Failed to dispose render targets during shutdown: {err}");
            }
        }
        self.pending_resize = None;
        self.pending_frames = 0;
    }
}

impl Default for TargetLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
