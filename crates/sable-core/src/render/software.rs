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

//! A software backend implementing the rendering seams without a GPU.
//!
//! Every operation is recorded instead of executed, which makes the backend
//! the reference implementation for headless tests: partition coverage,
//! replay ordering, and the target lifecycle's dispose/recreate protocol
//! are all observable through the recorded logs. It also serves as the
//! no-op backend for environments without a graphics device.

use super::error::RenderError;
use super::handle::{
    BitmapAliasId, TextureDescriptor, TextureId, TextureViewId,
};
use super::traits::{CommandBuffer, CommandRecorder, ExecutionContexts, GraphicsDevice};
use crate::math::Extent2D;
use crate::scene::{Effect, GpuMesh, Material, PostEffect};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One recorded draw-level operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    /// An effect's pipeline state was bound on a context.
    ApplyEffect {
        /// The effect name.
        effect: String,
    },
    /// A material was applied ahead of a mesh draw.
    ApplyMaterial {
        /// The effect name.
        effect: String,
        /// The material name.
        material: String,
        /// The mesh name.
        mesh: String,
    },
    /// A mesh draw call.
    DrawMesh {
        /// The mesh name.
        mesh: String,
    },
    /// A post-process node application.
    ApplyPost {
        /// The node name.
        effect: String,
        /// The sampled input view.
        input: TextureViewId,
        /// The output attachment view.
        output: TextureViewId,
    },
}

/// The payload a [`SoftwareRecorder`] finishes into.
#[derive(Debug)]
struct SoftwarePayload {
    slot: Option<usize>,
    ops: Vec<RecordedOp>,
}

/// A [`CommandRecorder`] that appends every operation to an in-memory list.
pub struct SoftwareRecorder {
    slot: Option<usize>,
    ops: Vec<RecordedOp>,
}

impl CommandRecorder for SoftwareRecorder {
    fn apply_effect(&mut self, effect: &Effect) {
        self.ops.push(RecordedOp::ApplyEffect {
            effect: effect.name.clone(),
        });
    }

    fn apply_material(&mut self, material: &Material, effect: &Effect, mesh: &GpuMesh) {
        self.ops.push(RecordedOp::ApplyMaterial {
            effect: effect.name.clone(),
            material: material.name.clone(),
            mesh: mesh.name.clone(),
        });
    }

    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.ops.push(RecordedOp::DrawMesh {
            mesh: mesh.name.clone(),
        });
    }

    fn apply_post_effect(
        &mut self,
        effect: &PostEffect,
        input: TextureViewId,
        output: TextureViewId,
    ) {
        self.ops.push(RecordedOp::ApplyPost {
            effect: effect.name.clone(),
            input,
            output,
        });
    }

    fn finish(self: Box<Self>) -> Result<CommandBuffer, RenderError> {
        let label = match self.slot {
            Some(slot) => format!("software-deferred-{slot}"),
            None => "software-immediate".to_string(),
        };
        Ok(CommandBuffer::new(
            Some(label),
            Box::new(SoftwarePayload {
                slot: self.slot,
                ops: self.ops,
            }),
        ))
    }
}

/// An [`ExecutionContexts`] implementation whose "primary context" is a
/// shared operation log.
#[derive(Default)]
pub struct SoftwareContexts {
    executed: Mutex<Vec<RecordedOp>>,
    replayed_slots: Mutex<Vec<Option<usize>>>,
}

impl SoftwareContexts {
    /// Creates an empty context set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation executed on the primary context so far, in replay
    /// order.
    pub fn executed_ops(&self) -> Vec<RecordedOp> {
        self.executed.lock().unwrap().clone()
    }

    /// The slot labels of replayed buffers, in replay order (`None` marks
    /// the immediate recorder).
    pub fn replayed_slots(&self) -> Vec<Option<usize>> {
        self.replayed_slots.lock().unwrap().clone()
    }
}

impl ExecutionContexts for SoftwareContexts {
    fn immediate_recorder(&self) -> Box<dyn CommandRecorder> {
        Box::new(SoftwareRecorder {
            slot: None,
            ops: Vec::new(),
        })
    }

    fn deferred_recorder(&self, slot: usize) -> Box<dyn CommandRecorder> {
        Box::new(SoftwareRecorder {
            slot: Some(slot),
            ops: Vec::new(),
        })
    }

    fn replay(&self, buffer: CommandBuffer) -> Result<(), RenderError> {
        let payload = buffer.downcast::<SoftwarePayload>()?;
        self.replayed_slots.lock().unwrap().push(payload.slot);
        self.executed.lock().unwrap().extend(payload.ops);
        Ok(())
    }
}

/// One recorded device-level operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOp {
    /// A texture was created.
    CreateTexture(TextureId),
    /// A texture was destroyed.
    DestroyTexture(TextureId),
    /// A texture view was created.
    CreateView(TextureViewId),
    /// A texture view was destroyed.
    DestroyView(TextureViewId),
    /// A bitmap alias was created.
    CreateAlias(BitmapAliasId),
    /// A bitmap alias was destroyed.
    DestroyAlias(BitmapAliasId),
    /// The swapchain was reconfigured.
    ConfigureSwapchain {
        /// The requested width (0 = keep).
        width: u32,
        /// The requested height (0 = keep).
        height: u32,
    },
    /// The back-buffer texture was re-acquired.
    AcquireBackBuffer(TextureId),
    /// The viewport was recreated.
    SetViewport(Extent2D),
    /// The active output targets were rebound.
    BindOutputTargets {
        /// The color attachment view.
        color: TextureViewId,
        /// The depth-stencil view.
        depth: TextureViewId,
    },
}

/// A [`GraphicsDevice`] that tracks live resources and records every
/// operation.
///
/// Destroying an id the device never minted (or already released) is an
/// error, which is exactly what makes double-release bugs in the target
/// lifecycle visible to tests.
pub struct SoftwareDevice {
    next_id: AtomicU64,
    live_textures: Mutex<HashSet<u64>>,
    live_views: Mutex<HashSet<u64>>,
    live_aliases: Mutex<HashSet<u64>>,
    swapchain: Mutex<Extent2D>,
    ops: Mutex<Vec<DeviceOp>>,
}

impl SoftwareDevice {
    /// Creates a device with the given initial swapchain size.
    pub fn new(swapchain: Extent2D) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            live_textures: Mutex::new(HashSet::new()),
            live_views: Mutex::new(HashSet::new()),
            live_aliases: Mutex::new(HashSet::new()),
            swapchain: Mutex::new(swapchain),
            ops: Mutex::new(Vec::new()),
        }
    }

    fn mint(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn record(&self, op: DeviceOp) {
        self.ops.lock().unwrap().push(op);
    }

    /// The number of currently live textures, views, and aliases.
    pub fn live_resources(&self) -> usize {
        self.live_textures.lock().unwrap().len()
            + self.live_views.lock().unwrap().len()
            + self.live_aliases.lock().unwrap().len()
    }

    /// The current swapchain size.
    pub fn swapchain_size(&self) -> Extent2D {
        *self.swapchain.lock().unwrap()
    }

    /// Every device operation so far, in call order.
    pub fn ops_log(&self) -> Vec<DeviceOp> {
        self.ops.lock().unwrap().clone()
    }

    fn release(set: &Mutex<HashSet<u64>>, id: u64, kind: &str) -> Result<(), RenderError> {
        if set.lock().unwrap().remove(&id) {
            Ok(())
        } else {
            Err(RenderError::Backend(format!(
                "{kind} {id} is not live (double release or foreign id)"
            )))
        }
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, RenderError> {
        let id = self.mint();
        self.live_textures.lock().unwrap().insert(id);
        self.record(DeviceOp::CreateTexture(TextureId(id)));
        Ok(TextureId(id))
    }

    fn create_texture_view(
        &self,
        texture: TextureId,
        _label: Option<&str>,
    ) -> Result<TextureViewId, RenderError> {
        if !self.live_textures.lock().unwrap().contains(&texture.0) {
            return Err(RenderError::Backend(format!(
                "texture {} is not live",
                texture.0
            )));
        }
        let id = self.mint();
        self.live_views.lock().unwrap().insert(id);
        self.record(DeviceOp::CreateView(TextureViewId(id)));
        Ok(TextureViewId(id))
    }

    fn create_bitmap_alias(
        &self,
        texture: TextureId,
    ) -> Result<Option<BitmapAliasId>, RenderError> {
        if !self.live_textures.lock().unwrap().contains(&texture.0) {
            return Err(RenderError::Backend(format!(
                "texture {} is not live",
                texture.0
            )));
        }
        let id = self.mint();
        self.live_aliases.lock().unwrap().insert(id);
        self.record(DeviceOp::CreateAlias(BitmapAliasId(id)));
        Ok(Some(BitmapAliasId(id)))
    }

    fn destroy_texture(&self, texture: TextureId) -> Result<(), RenderError> {
        Self::release(&self.live_textures, texture.0, "texture")?;
        self.record(DeviceOp::DestroyTexture(texture));
        Ok(())
    }

    fn destroy_texture_view(&self, view: TextureViewId) -> Result<(), RenderError> {
        Self::release(&self.live_views, view.0, "texture view")?;
        self.record(DeviceOp::DestroyView(view));
        Ok(())
    }

    fn destroy_bitmap_alias(&self, alias: BitmapAliasId) -> Result<(), RenderError> {
        Self::release(&self.live_aliases, alias.0, "bitmap alias")?;
        self.record(DeviceOp::DestroyAlias(alias));
        Ok(())
    }

    fn configure_swapchain(&self, width: u32, height: u32) -> Result<(), RenderError> {
        let mut swapchain = self.swapchain.lock().unwrap();
        // Zero is the "keep the existing value" sentinel.
        if width > 0 {
            swapchain.width = width;
        }
        if height > 0 {
            swapchain.height = height;
        }
        self.record(DeviceOp::ConfigureSwapchain { width, height });
        Ok(())
    }

    fn acquire_back_buffer(&self) -> Result<TextureId, RenderError> {
        let id = self.mint();
        self.live_textures.lock().unwrap().insert(id);
        self.record(DeviceOp::AcquireBackBuffer(TextureId(id)));
        Ok(TextureId(id))
    }

    fn set_viewport(&self, viewport: Extent2D) -> Result<(), RenderError> {
        self.record(DeviceOp::SetViewport(viewport));
        Ok(())
    }

    fn bind_output_targets(
        &self,
        color: TextureViewId,
        depth: TextureViewId,
    ) -> Result<(), RenderError> {
        self.record(DeviceOp::BindOutputTargets { color, depth });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Extent3D;
    use crate::render::handle::TextureFormat;

    fn descriptor() -> TextureDescriptor {
        TextureDescriptor {
            label: None,
            size: Extent3D {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            format: TextureFormat::Rgba8Unorm,
            render_attachment: true,
            sampled: false,
        }
    }

    #[test]
    fn double_release_is_reported() {
        let device = SoftwareDevice::new(Extent2D::new(8, 8));
        let texture = device.create_texture(&descriptor()).unwrap();
        device.destroy_texture(texture).unwrap();
        assert!(device.destroy_texture(texture).is_err());
    }

    #[test]
    fn views_require_a_live_texture() {
        let device = SoftwareDevice::new(Extent2D::new(8, 8));
        let texture = device.create_texture(&descriptor()).unwrap();
        device.destroy_texture(texture).unwrap();
        assert!(device.create_texture_view(texture, None).is_err());
    }

    #[test]
    fn zero_is_the_keep_sentinel_for_swapchain_config() {
        let device = SoftwareDevice::new(Extent2D::new(800, 600));
        device.configure_swapchain(1024, 0).unwrap();
        assert_eq!(device.swapchain_size(), Extent2D::new(1024, 600));
        device.configure_swapchain(0, 0).unwrap();
        assert_eq!(device.swapchain_size(), Extent2D::new(1024, 600));
    }

    #[test]
    fn replayed_buffers_merge_into_one_stream() {
        let contexts = SoftwareContexts::new();
        let mut first = contexts.deferred_recorder(0);
        let mut second = contexts.deferred_recorder(1);

        let mut effect = crate::scene::Effect::new("lit", crate::render::handle::RenderPipelineId(1));
        effect.push_material(crate::scene::Material::new(
            "default",
            crate::math::LinearRgba::WHITE,
        ));
        second.apply_effect(&effect);
        first.apply_effect(&effect);

        // Replay out of completion order on purpose: slot order rules.
        contexts.replay(first.finish().unwrap()).unwrap();
        contexts.replay(second.finish().unwrap()).unwrap();

        assert_eq!(contexts.replayed_slots(), vec![Some(0), Some(1)]);
        assert_eq!(contexts.executed_ops().len(), 2);
    }
}
