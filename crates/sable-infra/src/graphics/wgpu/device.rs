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

//! The WGPU implementation of the `GraphicsDevice` contract, plus the
//! resource constructors applications use to build scenes.
//!
//! Resources are held in id-keyed registries so the rest of the engine can
//! stay on plain integer handles. Swapchain textures are registered like any
//! other texture when acquired; the per-frame presentation view is created
//! fresh each frame because wgpu hands out a new swapchain image per
//! acquire.

use super::context::WgpuSurfaceContext;
use super::conversions::{surface_format_from_wgpu, IntoWgpu};
use sable_core::math::{Extent2D, LinearRgba};
use sable_core::render::{
    BindGroupId, BitmapAliasId, BufferId, GraphicsDevice, RenderError, RenderPipelineId,
    ShaderModuleId, TextureDescriptor, TextureFormat, TextureId, TextureViewId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use wgpu::util::DeviceExt;

/// The views scene recorders draw into this frame.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FrameOutput {
    pub(crate) color: Option<TextureViewId>,
    pub(crate) depth: Option<TextureViewId>,
    pub(crate) viewport: Extent2D,
}

/// The vertex attribute formats the simple pipeline descriptor supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
}

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// One vertex attribute of a [`SimplePipelineDescriptor`].
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// The attribute data format.
    pub format: VertexFormat,
    /// The byte offset within one vertex.
    pub offset: u64,
    /// The `@location` the shader binds the attribute to.
    pub shader_location: u32,
}

/// A reduced pipeline description covering what the engine's effects need:
/// one shader module with a vertex and fragment entry point, one interleaved
/// vertex buffer, one color target, and optional depth testing.
#[derive(Debug, Clone)]
pub struct SimplePipelineDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The shader module holding both entry points.
    pub shader_module: ShaderModuleId,
    /// The vertex-stage entry point.
    pub vertex_entry_point: String,
    /// The fragment-stage entry point.
    pub fragment_entry_point: String,
    /// The byte stride of one interleaved vertex. Zero means "no vertex
    /// buffer" (full-screen-triangle pipelines).
    pub vertex_stride: u64,
    /// The vertex attributes within one vertex.
    pub vertex_attributes: Vec<VertexAttribute>,
    /// The color target format.
    pub color_format: TextureFormat,
    /// Whether the pipeline tests and writes depth.
    pub depth_test: bool,
}

struct WgpuDeviceInternal {
    context: Arc<Mutex<WgpuSurfaceContext>>,
    textures: Mutex<HashMap<TextureId, Arc<wgpu::Texture>>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    buffers: Mutex<HashMap<BufferId, Arc<wgpu::Buffer>>>,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    next_id: AtomicU64,
    frame_output: Mutex<FrameOutput>,
    current_surface: Mutex<Option<wgpu::SurfaceTexture>>,
}

/// A clonable, thread-safe handle to the WGPU graphics device.
#[derive(Clone)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    /// Wraps an initialized surface context into a device.
    pub fn new(context: Arc<Mutex<WgpuSurfaceContext>>) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                shader_modules: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                frame_output: Mutex::new(FrameOutput::default()),
                current_surface: Mutex::new(None),
            }),
        }
    }

    fn mint(&self) -> u64 {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn with_wgpu_device<R>(
        &self,
        operation: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, RenderError> {
        let guard = self
            .internal
            .context
            .lock()
            .map_err(|e| RenderError::Backend(format!("Surface context lock poisoned: {e}")))?;
        Ok(operation(&guard.device))
    }

    // --- Registry lookups used by the command recorder ---

    pub(crate) fn get_wgpu_pipeline(&self, id: RenderPipelineId) -> Option<Arc<wgpu::RenderPipeline>> {
        self.internal.pipelines.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        self.internal.bind_groups.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        self.internal.buffers.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_texture_view(&self, id: TextureViewId) -> Option<Arc<wgpu::TextureView>> {
        self.internal.texture_views.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn frame_output(&self) -> FrameOutput {
        *self.internal.frame_output.lock().unwrap()
    }

    pub(crate) fn create_wgpu_encoder(&self, label: Option<&str>) -> Result<wgpu::CommandEncoder, RenderError> {
        self.with_wgpu_device(|device| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
        })
    }

    pub(crate) fn submit_wgpu_buffer(&self, buffer: wgpu::CommandBuffer) -> Result<(), RenderError> {
        let guard = self
            .internal
            .context
            .lock()
            .map_err(|e| RenderError::Backend(format!("Surface context lock poisoned: {e}")))?;
        guard.queue.submit(std::iter::once(buffer));
        Ok(())
    }

    // --- Resource constructors for application setup ---

    /// Compiles a WGSL shader module.
    pub fn create_shader_module(
        &self,
        label: Option<&str>,
        wgsl_source: &str,
    ) -> Result<ShaderModuleId, RenderError> {
        let module = self.with_wgpu_device(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label,
                source: wgpu::ShaderSource::Wgsl(wgsl_source.into()),
            })
        })?;
        let id = ShaderModuleId(self.mint());
        self.internal
            .shader_modules
            .lock()
            .unwrap()
            .insert(id, Arc::new(module));
        log::debug!("Created shader module {label:?} as {id:?}");
        Ok(id)
    }

    /// Creates a buffer initialized with `data`.
    pub fn create_buffer_with_data(
        &self,
        label: Option<&str>,
        data: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId, RenderError> {
        let buffer = self.with_wgpu_device(|device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents: data,
                usage,
            })
        })?;
        let id = BufferId(self.mint());
        self.internal
            .buffers
            .lock()
            .unwrap()
            .insert(id, Arc::new(buffer));
        log::debug!("Created buffer {label:?} as {id:?} ({} bytes)", data.len());
        Ok(id)
    }

    /// Overwrites part of a buffer from the CPU.
    pub fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        let buffer = self
            .get_wgpu_buffer(id)
            .ok_or_else(|| RenderError::Backend(format!("buffer {id:?} is not registered")))?;
        let guard = self
            .internal
            .context
            .lock()
            .map_err(|e| RenderError::Backend(format!("Surface context lock poisoned: {e}")))?;
        guard.queue.write_buffer(&buffer, offset, data);
        Ok(())
    }

    /// Builds a render pipeline from a [`SimplePipelineDescriptor`], using
    /// automatic bind-group layout so bind groups can be created against the
    /// pipeline afterwards.
    pub fn create_render_pipeline(
        &self,
        descriptor: &SimplePipelineDescriptor,
    ) -> Result<RenderPipelineId, RenderError> {
        let module = self
            .internal
            .shader_modules
            .lock()
            .unwrap()
            .get(&descriptor.shader_module)
            .cloned()
            .ok_or_else(|| {
                RenderError::Backend(format!(
                    "shader module {:?} is not registered",
                    descriptor.shader_module
                ))
            })?;

        let attributes: Vec<wgpu::VertexAttribute> = descriptor
            .vertex_attributes
            .iter()
            .map(|attr| wgpu::VertexAttribute {
                format: attr.format.into_wgpu(),
                offset: attr.offset,
                shader_location: attr.shader_location,
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = if descriptor.vertex_stride > 0 {
            vec![wgpu::VertexBufferLayout {
                array_stride: descriptor.vertex_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }]
        } else {
            Vec::new()
        };

        let depth_stencil = descriptor.depth_test.then(|| wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = self.with_wgpu_device(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: None, // automatic layout, so bind groups can derive from it
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(descriptor.vertex_entry_point.as_str()),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(descriptor.fragment_entry_point.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: descriptor.color_format.into_wgpu(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })?;

        let id = RenderPipelineId(self.mint());
        self.internal
            .pipelines
            .lock()
            .unwrap()
            .insert(id, Arc::new(pipeline));
        log::info!("Created render pipeline {:?} as {id:?}", descriptor.label);
        Ok(id)
    }

    /// Creates a bind group binding one uniform buffer at the given group
    /// and binding index, laid out by the pipeline's automatic layout.
    pub fn create_uniform_bind_group(
        &self,
        pipeline: RenderPipelineId,
        group_index: u32,
        binding: u32,
        buffer: BufferId,
    ) -> Result<BindGroupId, RenderError> {
        let wgpu_pipeline = self.get_wgpu_pipeline(pipeline).ok_or_else(|| {
            RenderError::Backend(format!("pipeline {pipeline:?} is not registered"))
        })?;
        let wgpu_buffer = self
            .get_wgpu_buffer(buffer)
            .ok_or_else(|| RenderError::Backend(format!("buffer {buffer:?} is not registered")))?;

        let bind_group = self.with_wgpu_device(|device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform-bind-group"),
                layout: &wgpu_pipeline.get_bind_group_layout(group_index),
                entries: &[wgpu::BindGroupEntry {
                    binding,
                    resource: wgpu_buffer.as_entire_binding(),
                }],
            })
        })?;

        let id = BindGroupId(self.mint());
        self.internal
            .bind_groups
            .lock()
            .unwrap()
            .insert(id, Arc::new(bind_group));
        Ok(id)
    }

    /// The swapchain's pixel format, in engine terms.
    pub fn surface_format(&self) -> TextureFormat {
        let guard = self.internal.context.lock().unwrap();
        surface_format_from_wgpu(guard.surface_format())
    }

    // --- Per-frame surface handling ---

    fn ensure_surface_acquired(&self) -> Result<(), RenderError> {
        let mut current = self.internal.current_surface.lock().unwrap();
        if current.is_some() {
            return Ok(());
        }
        let mut guard = self
            .internal
            .context
            .lock()
            .map_err(|e| RenderError::Backend(format!("Surface context lock poisoned: {e}")))?;
        let texture = match guard.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            status @ (wgpu::CurrentSurfaceTexture::Lost
            | wgpu::CurrentSurfaceTexture::Outdated) => {
                log::warn!("Swapchain surface lost or outdated ({status:?}); reconfiguring.");
                guard.resize(0, 0);
                match guard.get_current_texture() {
                    wgpu::CurrentSurfaceTexture::Success(texture)
                    | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
                    other => {
                        return Err(RenderError::SurfaceAcquisition(format!(
                            "after reconfigure: {other:?}"
                        )));
                    }
                }
            }
            other => {
                return Err(RenderError::SurfaceAcquisition(format!("{other:?}")));
            }
        };
        *current = Some(texture);
        Ok(())
    }

    /// Creates the presentation view for the current swapchain image,
    /// acquiring the image first if needed.
    pub fn acquire_frame_view(&self) -> Result<TextureViewId, RenderError> {
        self.ensure_surface_acquired()?;
        let current = self.internal.current_surface.lock().unwrap();
        let surface = current.as_ref().expect("surface was just acquired");
        let view = surface.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("presentation-view"),
            ..Default::default()
        });
        let id = TextureViewId(self.mint());
        self.internal
            .texture_views
            .lock()
            .unwrap()
            .insert(id, Arc::new(view));
        Ok(id)
    }

    /// Submits a pass that clears the given color and depth views.
    pub fn submit_clear_pass(
        &self,
        clear_color: LinearRgba,
        color: TextureViewId,
        depth: TextureViewId,
    ) -> Result<(), RenderError> {
        let color_view = self
            .get_wgpu_texture_view(color)
            .ok_or_else(|| RenderError::Backend(format!("view {color:?} is not registered")))?;
        let depth_view = self
            .get_wgpu_texture_view(depth)
            .ok_or_else(|| RenderError::Backend(format!("view {depth:?} is not registered")))?;

        let mut encoder = self.create_wgpu_encoder(Some("clear-pass"))?;
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color.r as f64,
                            g: clear_color.g as f64,
                            b: clear_color.b as f64,
                            a: clear_color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.submit_wgpu_buffer(encoder.finish())
    }

    /// Presents the current swapchain image.
    pub fn present(&self) -> Result<(), RenderError> {
        let taken = self.internal.current_surface.lock().unwrap().take();
        match taken {
            Some(surface) => {
                surface.present();
                Ok(())
            }
            None => Err(RenderError::SurfaceAcquisition(
                "present called without an acquired surface".to_string(),
            )),
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, RenderError> {
        let mut usage = wgpu::TextureUsages::empty();
        if descriptor.render_attachment {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if descriptor.sampled {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }

        let texture = self.with_wgpu_device(|device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: wgpu::Extent3d {
                    width: descriptor.size.width,
                    height: descriptor.size.height,
                    depth_or_array_layers: descriptor.size.depth_or_array_layers,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.into_wgpu(),
                usage,
                view_formats: &[],
            })
        })?;

        let id = TextureId(self.mint());
        self.internal
            .textures
            .lock()
            .unwrap()
            .insert(id, Arc::new(texture));
        Ok(id)
    }

    fn create_texture_view(
        &self,
        texture: TextureId,
        label: Option<&str>,
    ) -> Result<TextureViewId, RenderError> {
        let wgpu_texture = self
            .internal
            .textures
            .lock()
            .unwrap()
            .get(&texture)
            .cloned()
            .ok_or_else(|| {
                RenderError::Backend(format!("texture {texture:?} is not registered"))
            })?;
        let view = wgpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label,
            ..Default::default()
        });
        let id = TextureViewId(self.mint());
        self.internal
            .texture_views
            .lock()
            .unwrap()
            .insert(id, Arc::new(view));
        Ok(id)
    }

    fn create_bitmap_alias(
        &self,
        _texture: TextureId,
    ) -> Result<Option<BitmapAliasId>, RenderError> {
        // The wgpu backend has no 2D-drawing interop; targets simply carry
        // no alias.
        Ok(None)
    }

    fn destroy_texture(&self, texture: TextureId) -> Result<(), RenderError> {
        if self
            .internal
            .textures
            .lock()
            .unwrap()
            .remove(&texture)
            .is_some()
        {
            Ok(())
        } else {
            Err(RenderError::Backend(format!(
                "texture {texture:?} is not registered"
            )))
        }
    }

    fn destroy_texture_view(&self, view: TextureViewId) -> Result<(), RenderError> {
        if self
            .internal
            .texture_views
            .lock()
            .unwrap()
            .remove(&view)
            .is_some()
        {
            Ok(())
        } else {
            Err(RenderError::Backend(format!(
                "texture view {view:?} is not registered"
            )))
        }
    }

    fn destroy_bitmap_alias(&self, alias: BitmapAliasId) -> Result<(), RenderError> {
        Err(RenderError::Backend(format!(
            "bitmap alias {alias:?} cannot exist: the wgpu backend mints none"
        )))
    }

    fn configure_swapchain(&self, width: u32, height: u32) -> Result<(), RenderError> {
        // Reconfiguring invalidates any acquired swapchain image.
        self.internal.current_surface.lock().unwrap().take();
        let mut guard = self
            .internal
            .context
            .lock()
            .map_err(|e| RenderError::Backend(format!("Surface context lock poisoned: {e}")))?;
        guard.resize(width, height);
        Ok(())
    }

    fn acquire_back_buffer(&self) -> Result<TextureId, RenderError> {
        self.ensure_surface_acquired()?;
        let current = self.internal.current_surface.lock().unwrap();
        let surface = current.as_ref().expect("surface was just acquired");
        let id = TextureId(self.mint());
        self.internal
            .textures
            .lock()
            .unwrap()
            .insert(id, Arc::new(surface.texture.clone()));
        Ok(id)
    }

    fn set_viewport(&self, viewport: Extent2D) -> Result<(), RenderError> {
        self.internal.frame_output.lock().unwrap().viewport = viewport;
        Ok(())
    }

    fn bind_output_targets(
        &self,
        color: TextureViewId,
        depth: TextureViewId,
    ) -> Result<(), RenderError> {
        let mut output = self.internal.frame_output.lock().unwrap();
        output.color = Some(color);
        output.depth = Some(depth);
        Ok(())
    }
}
