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

//! The backend-agnostic rendering seams.
//!
//! These traits define the "common language" for all rendering operations:
//! the core records draw work through [`CommandRecorder`], hands the
//! resulting [`CommandBuffer`]s to [`ExecutionContexts::replay`], and drives
//! resource lifetimes through [`GraphicsDevice`]. The immediate-vs-deferred
//! topology is an implementation choice behind these seams, portable to any
//! backend, including the in-tree software backend used by tests.

use super::error::RenderError;
use super::handle::{
    BitmapAliasId, TextureDescriptor, TextureId, TextureViewId,
};
use super::settings::RenderSettings;
use super::stats::FrameStats;
use crate::math::Extent2D;
use crate::scene::{Camera, Effect, GpuMesh, Material, PostEffect, Screen};
use std::any::Any;
use std::sync::{Arc, Mutex};

/// A recorded, replayable sequence of GPU commands.
///
/// The payload is backend-defined; the core never looks inside. Buffers are
/// replayed exactly once and disposed immediately afterwards.
pub struct CommandBuffer {
    label: Option<String>,
    payload: Box<dyn Any + Send>,
}

impl CommandBuffer {
    /// Wraps a backend payload into an opaque command buffer.
    pub fn new(label: Option<String>, payload: Box<dyn Any + Send>) -> Self {
        Self { label, payload }
    }

    /// The buffer's debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Recovers the backend payload. Backends call this inside
    /// [`ExecutionContexts::replay`].
    pub fn downcast<T: 'static>(self) -> Result<Box<T>, RenderError> {
        let label = self.label;
        self.payload.downcast::<T>().map_err(|_| {
            RenderError::Backend(format!(
                "Command buffer {label:?} carried a payload of an unexpected type"
            ))
        })
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("label", &self.label)
            .finish()
    }
}

/// Records draw work for one execution context.
///
/// A recorder is exclusively owned by the code recording into it; in
/// multi-threaded dispatch, that is exactly one worker task for the task's
/// lifetime. Recording operations are infallible; errors surface when the
/// recorder is [`finish`](CommandRecorder::finish)ed.
pub trait CommandRecorder: Send {
    /// Binds the effect's pipeline state. Called once per context, not once
    /// per mesh.
    fn apply_effect(&mut self, effect: &Effect);

    /// Binds a material's resources ahead of drawing `mesh`.
    fn apply_material(&mut self, material: &Material, effect: &Effect, mesh: &GpuMesh);

    /// Records the draw call for a mesh.
    fn draw_mesh(&mut self, mesh: &GpuMesh);

    /// Records one post-process node: draws `input` through the node's
    /// pipeline into `output`.
    fn apply_post_effect(
        &mut self,
        effect: &PostEffect,
        input: TextureViewId,
        output: TextureViewId,
    );

    /// Finalizes the recording, consuming the recorder.
    fn finish(self: Box<Self>) -> Result<CommandBuffer, RenderError>;
}

/// Hands out execution contexts and replays finished command buffers on the
/// primary context.
///
/// [`PickContext`]-style mode agnosticism lives one level up, in the
/// dispatcher: call sites ask it for "the recorder for slot N" and receive
/// either the immediate recorder or a deferred one depending on the current
/// render mode.
///
/// [`PickContext`]: crate::render::dispatch::RenderDispatcher
pub trait ExecutionContexts: Send + Sync {
    /// Returns a recorder that stands in for the primary (immediate)
    /// context.
    fn immediate_recorder(&self) -> Box<dyn CommandRecorder>;

    /// Returns the deferred recorder for a context slot. Each slot is owned
    /// by exactly one worker per dispatch.
    fn deferred_recorder(&self, slot: usize) -> Box<dyn CommandRecorder>;

    /// Executes a finished command buffer on the primary context. Callers
    /// must replay buffers in slot order; the buffer is consumed.
    fn replay(&self, buffer: CommandBuffer) -> Result<(), RenderError>;
}

/// The resource operations the render-target lifecycle drives.
pub trait GraphicsDevice: Send + Sync {
    /// Creates a texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, RenderError>;

    /// Creates a view over a texture, usable for drawing into it.
    fn create_texture_view(
        &self,
        texture: TextureId,
        label: Option<&str>,
    ) -> Result<TextureViewId, RenderError>;

    /// Creates a 2D-drawable bitmap aliasing the texture's memory, when the
    /// backend supports 2D interop. Returns `Ok(None)` otherwise.
    fn create_bitmap_alias(
        &self,
        texture: TextureId,
    ) -> Result<Option<BitmapAliasId>, RenderError>;

    /// Releases a texture handle.
    fn destroy_texture(&self, texture: TextureId) -> Result<(), RenderError>;

    /// Releases a texture view.
    fn destroy_texture_view(&self, view: TextureViewId) -> Result<(), RenderError>;

    /// Releases a bitmap alias.
    fn destroy_bitmap_alias(&self, alias: BitmapAliasId) -> Result<(), RenderError>;

    /// Resizes the swapchain's buffers. A zero width or height means "keep
    /// the existing value" for that dimension.
    fn configure_swapchain(&self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Re-acquires the back-buffer texture handle from the swapchain.
    fn acquire_back_buffer(&self) -> Result<TextureId, RenderError>;

    /// Recreates the single viewport to the given client dimensions.
    fn set_viewport(&self, viewport: Extent2D) -> Result<(), RenderError>;

    /// Rebinds the given color and depth-stencil views as the active output
    /// target for subsequent scene recording.
    fn bind_output_targets(
        &self,
        color: TextureViewId,
        depth: TextureViewId,
    ) -> Result<(), RenderError>;
}

/// Trait representing a complete render system over some graphics backend.
pub trait RenderSystem: Send {
    /// Initializes the rendering system against a window. Device-creation
    /// failures are fatal to the process.
    fn init(
        &mut self,
        window: &dyn crate::platform::EngineWindow,
        settings: &RenderSettings,
    ) -> Result<(), RenderError>;

    /// Records a resize request. The request is coalesced and applied on a
    /// later frame tick; see the render-target lifecycle.
    fn request_resize(&mut self, width: u32, height: u32);

    /// Renders one frame of the given screen.
    fn render(
        &mut self,
        screen: &Screen,
        camera: &Camera,
        settings: &RenderSettings,
    ) -> Result<FrameStats, RenderError>;

    /// The dirty-trackable dispatch topology. Callers stage mode or
    /// worker-count changes on it and enroll it into the registry.
    fn dispatch_state(&self) -> Arc<Mutex<super::dispatch::DispatchState>>;

    /// The stats of the last rendered frame.
    fn last_frame_stats(&self) -> &FrameStats;

    /// Releases the resources of the rendering system.
    fn shutdown(&mut self);

    /// Returns a shared handle to the underlying graphics device.
    fn graphics_device(&self) -> Arc<dyn GraphicsDevice>;
}
