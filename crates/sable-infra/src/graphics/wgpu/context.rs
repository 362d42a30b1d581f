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

//! Holds the core WGPU state objects required for rendering a surface.

use sable_core::platform::window::SableWindowHandle;
use sable_core::render::RenderError;
use wgpu::{Adapter, Instance, SurfaceTargetUnsafe};

/// The connection to the graphics API for a specific window surface:
/// surface, adapter, logical device, queue, and swapchain configuration.
#[derive(Debug)]
pub struct WgpuSurfaceContext {
    pub(crate) surface: wgpu::Surface<'static>,
    #[allow(dead_code)]
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) surface_config: wgpu::SurfaceConfiguration,
}

impl WgpuSurfaceContext {
    /// Asynchronously initializes the graphics context for a window surface.
    pub async fn new(
        instance: &Instance,
        window_handle: SableWindowHandle,
        adapter: Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        log::info!("Initializing WGPU surface context...");

        let surface_target = unsafe {
            SurfaceTargetUnsafe::from_window(&window_handle).map_err(|e| {
                RenderError::DeviceCreation(format!("Failed to create surface target: {e}"))
            })?
        };
        let surface = unsafe {
            instance.create_surface_unsafe(surface_target).map_err(|e| {
                RenderError::DeviceCreation(format!("Failed to create surface: {e}"))
            })?
        };

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter \"{}\" (backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Sable Engine Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| {
                RenderError::DeviceCreation(format!("Failed to create logical device: {e}"))
            })?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU uncaptured error: {e:?}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|m| *m == wgpu::PresentMode::Mailbox)
                .unwrap_or(wgpu::PresentMode::Fifo), // Fifo is always supported
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
            surface_config,
        })
    }

    /// Reconfigures the swapchain. A zero width or height keeps the existing
    /// value for that dimension.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        let width = if new_width > 0 {
            new_width
        } else {
            self.surface_config.width
        };
        let height = if new_height > 0 {
            new_height
        } else {
            self.surface_config.height
        };
        log::info!("WgpuSurfaceContext: configuring swapchain to {width}x{height}");
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Acquires the current swapchain texture.
    pub fn get_current_texture(&self) -> wgpu::CurrentSurfaceTexture {
        self.surface.get_current_texture()
    }

    /// The swapchain's pixel format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// The swapchain's current size.
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }
}
