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

//! The WGPU command recorder and execution-context set.
//!
//! Recorders buffer abstract draw operations and materialize them into one
//! wgpu render pass at `finish()`. This keeps recording cheap and lock-free
//! on worker threads (wgpu pass objects borrow their encoder, so an open
//! pass cannot cross a thread boundary anyway) while preserving the
//! deferred-context semantics: each recorder yields one command buffer, and
//! buffers execute on the queue strictly in the order they are replayed.

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;
use sable_core::render::{
    BindGroupId, BufferId, CommandBuffer, CommandRecorder, ExecutionContexts, IndexFormat,
    RenderError, RenderPipelineId, TextureViewId,
};
use sable_core::scene::{Effect, GpuMesh, Material, PostEffect};

enum RecordedDraw {
    SetPipeline(RenderPipelineId),
    SetBindGroup {
        index: u32,
        bind_group: BindGroupId,
    },
    DrawIndexed {
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        index_count: u32,
        index_format: IndexFormat,
    },
    Post {
        pipeline: RenderPipelineId,
        bind_group: Option<BindGroupId>,
        output: TextureViewId,
    },
}

/// Records draw operations for one execution context slot.
pub struct WgpuCommandRecorder {
    device: WgpuDevice,
    slot: Option<usize>,
    ops: Vec<RecordedDraw>,
}

impl WgpuCommandRecorder {
    pub(crate) fn new(device: WgpuDevice, slot: Option<usize>) -> Self {
        Self {
            device,
            slot,
            ops: Vec::new(),
        }
    }

    fn label(&self) -> String {
        match self.slot {
            Some(slot) => format!("deferred-context-{slot}"),
            None => "immediate-context".to_string(),
        }
    }
}

impl CommandRecorder for WgpuCommandRecorder {
    fn apply_effect(&mut self, effect: &Effect) {
        self.ops.push(RecordedDraw::SetPipeline(effect.pipeline));
    }

    fn apply_material(&mut self, material: &Material, _effect: &Effect, _mesh: &GpuMesh) {
        if let Some(bind_group) = material.bind_group {
            self.ops.push(RecordedDraw::SetBindGroup {
                index: 0,
                bind_group,
            });
        }
    }

    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.ops.push(RecordedDraw::DrawIndexed {
            vertex_buffer: mesh.vertex_buffer,
            index_buffer: mesh.index_buffer,
            index_count: mesh.index_count,
            index_format: mesh.index_format,
        });
    }

    fn apply_post_effect(
        &mut self,
        effect: &PostEffect,
        _input: TextureViewId,
        output: TextureViewId,
    ) {
        // The node's bind group already samples its chain input; the output
        // selects the pass attachment.
        self.ops.push(RecordedDraw::Post {
            pipeline: effect.pipeline,
            bind_group: effect.bind_group,
            output,
        });
    }

    fn finish(self: Box<Self>) -> Result<CommandBuffer, RenderError> {
        let label = self.label();
        let mut encoder = self.device.create_wgpu_encoder(Some(&label))?;

        let scene_ops: Vec<&RecordedDraw> = self
            .ops
            .iter()
            .filter(|op| !matches!(op, RecordedDraw::Post { .. }))
            .collect();

        if !scene_ops.is_empty() {
            let output = self.device.frame_output();
            let color_id = output.color.ok_or(RenderError::NotInitialized)?;
            let depth_id = output.depth.ok_or(RenderError::NotInitialized)?;
            let color_view = self.device.get_wgpu_texture_view(color_id).ok_or_else(|| {
                RenderError::Backend(format!("view {color_id:?} is not registered"))
            })?;
            let depth_view = self.device.get_wgpu_texture_view(depth_id).ok_or_else(|| {
                RenderError::Backend(format!("view {depth_id:?} is not registered"))
            })?;

            // The frame's clear pass already ran; scene passes load.
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label.as_str()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for op in scene_ops {
                match op {
                    RecordedDraw::SetPipeline(id) => {
                        if let Some(pipeline) = self.device.get_wgpu_pipeline(*id) {
                            pass.set_pipeline(&pipeline);
                        } else {
                            log::warn!("RenderPipelineId {id:?} not found; skipping.");
                        }
                    }
                    RecordedDraw::SetBindGroup { index, bind_group } => {
                        if let Some(group) = self.device.get_wgpu_bind_group(*bind_group) {
                            pass.set_bind_group(*index, group.as_ref(), &[]);
                        } else {
                            log::warn!("BindGroupId {bind_group:?} not found; skipping.");
                        }
                    }
                    RecordedDraw::DrawIndexed {
                        vertex_buffer,
                        index_buffer,
                        index_count,
                        index_format,
                    } => {
                        let (Some(vertices), Some(indices)) = (
                            self.device.get_wgpu_buffer(*vertex_buffer),
                            self.device.get_wgpu_buffer(*index_buffer),
                        ) else {
                            log::warn!("Mesh buffers not found; skipping draw.");
                            continue;
                        };
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.set_index_buffer(indices.slice(..), index_format.into_wgpu());
                        pass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    RecordedDraw::Post { .. } => unreachable!("filtered above"),
                }
            }
        }

        for op in &self.ops {
            let RecordedDraw::Post {
                pipeline,
                bind_group,
                output,
            } = op
            else {
                continue;
            };
            let Some(output_view) = self.device.get_wgpu_texture_view(*output) else {
                log::warn!("Post output view {output:?} not found; skipping node.");
                continue;
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post-process-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            if let Some(pipeline) = self.device.get_wgpu_pipeline(*pipeline) {
                pass.set_pipeline(&pipeline);
            } else {
                log::warn!("Post pipeline not found; skipping node.");
                continue;
            }
            if let Some(id) = bind_group {
                if let Some(group) = self.device.get_wgpu_bind_group(*id) {
                    pass.set_bind_group(0, group.as_ref(), &[]);
                }
            }
            // Full-screen triangle; the vertex shader synthesizes positions.
            pass.draw(0..3, 0..1);
        }

        Ok(CommandBuffer::new(
            Some(label),
            Box::new(encoder.finish()),
        ))
    }
}

/// The execution-context set over one wgpu queue.
///
/// The "primary context" is the queue itself: replaying a buffer submits
/// it, and submission order is execution order.
pub struct WgpuExecutionContexts {
    device: WgpuDevice,
}

impl WgpuExecutionContexts {
    /// Creates the context set.
    pub fn new(device: WgpuDevice) -> Self {
        Self { device }
    }
}

impl ExecutionContexts for WgpuExecutionContexts {
    fn immediate_recorder(&self) -> Box<dyn CommandRecorder> {
        Box::new(WgpuCommandRecorder::new(self.device.clone(), None))
    }

    fn deferred_recorder(&self, slot: usize) -> Box<dyn CommandRecorder> {
        Box::new(WgpuCommandRecorder::new(self.device.clone(), Some(slot)))
    }

    fn replay(&self, buffer: CommandBuffer) -> Result<(), RenderError> {
        let payload = buffer.downcast::<wgpu::CommandBuffer>()?;
        self.device.submit_wgpu_buffer(*payload)
    }
}
