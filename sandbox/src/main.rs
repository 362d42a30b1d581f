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

//! Sandbox: a minimal Sable application. An orbiting camera over a cube,
//! with M toggling multi-threaded dispatch and Escape quitting.

use anyhow::Result;
use sable_core::math::{Aabb, LinearRgba, Mat4, Vec3};
use sable_core::render::{BufferId, IndexFormat, RenderMode};
use sable_core::scene::{
    Camera, Effect, EffectGroup, GpuMesh, Material, MaterialRef, Model, Screen,
};
use sable_infra::{SimplePipelineDescriptor, VertexAttribute, VertexFormat, WgpuDevice};
use sable_runtime::{App, Engine, EngineConfig, EngineContext, EngineTick, ServiceSet};
use std::sync::{Arc, Mutex};

const SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: SceneUniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return scene.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return scene.color;
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniforms {
    view_proj: [f32; 16],
    color: [f32; 4],
}

/// Flattens a matrix into the column-major layout WGSL expects.
fn column_major(matrix: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for (column, chunk) in out.chunks_exact_mut(4).enumerate() {
        for (row, value) in chunk.iter_mut().enumerate() {
            *value = matrix.m[row][column];
        }
    }
    out
}

fn cube_mesh(device: &WgpuDevice) -> Result<GpuMesh> {
    let positions: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    #[rustfmt::skip]
    let indices: [u16; 36] = [
        0, 2, 1, 0, 3, 2, // back
        4, 5, 6, 4, 6, 7, // front
        0, 1, 5, 0, 5, 4, // bottom
        3, 7, 6, 3, 6, 2, // top
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
    ];

    let vertex_buffer = device.create_buffer_with_data(
        Some("cube-vertices"),
        bytemuck::cast_slice(&positions),
        wgpu::BufferUsages::VERTEX,
    )?;
    let index_buffer = device.create_buffer_with_data(
        Some("cube-indices"),
        bytemuck::cast_slice(&indices),
        wgpu::BufferUsages::INDEX,
    )?;

    Ok(GpuMesh {
        name: "cube".to_string(),
        vertex_buffer,
        index_buffer,
        index_count: indices.len() as u32,
        index_format: IndexFormat::Uint16,
        model: Arc::new(Model {
            name: "cube".to_string(),
            bounding_box: Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)),
        }),
        material: MaterialRef::Default,
    })
}

struct DemoApp {
    device: Arc<WgpuDevice>,
    screen: Screen,
    camera: Arc<Mutex<Camera>>,
    uniform_buffer: BufferId,
    orbit_angle: f32,
}

impl App for DemoApp {
    fn create(context: &mut EngineContext) -> Result<Self> {
        let device = Arc::clone(&context.device);

        let shader = device.create_shader_module(Some("cube-shader"), SHADER)?;
        let pipeline = device.create_render_pipeline(&SimplePipelineDescriptor {
            label: Some("cube-pipeline".to_string()),
            shader_module: shader,
            vertex_entry_point: "vs_main".to_string(),
            fragment_entry_point: "fs_main".to_string(),
            vertex_stride: 12,
            vertex_attributes: vec![VertexAttribute {
                format: VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
            color_format: device.surface_format(),
            depth_test: true,
        })?;

        let camera = Camera::new(
            Vec3::new(0.0, 2.0, 6.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_3,
            1024.0 / 768.0,
        )
        .with_notifier(context.state_events.clone());

        let uniforms = SceneUniforms {
            view_proj: column_major(camera.view_projection()),
            color: [0.8, 0.5, 0.2, 1.0],
        };
        let uniform_buffer = device.create_buffer_with_data(
            Some("scene-uniforms"),
            bytemuck::bytes_of(&uniforms),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )?;
        let bind_group = device.create_uniform_bind_group(pipeline, 0, 0, uniform_buffer)?;

        let mut effect = Effect::new("unlit", pipeline);
        effect.push_material(
            Material::new("default", LinearRgba::new(0.8, 0.5, 0.2, 1.0))
                .with_bind_group(bind_group),
        );

        let mut screen = Screen::new("sandbox");
        screen.push_group(EffectGroup {
            effect,
            meshes: vec![cube_mesh(&device)?],
        });

        log::info!("Sandbox content loaded.");
        Ok(Self {
            device,
            screen,
            camera: Arc::new(Mutex::new(camera)),
            uniform_buffer,
            orbit_angle: 0.0,
        })
    }

    fn update(&mut self, tick: &mut EngineTick) {
        if tick.input.key_pressed("Escape") {
            *tick.exit_requested = true;
            return;
        }

        // Stage a dispatch-mode change, then enroll the topology so the
        // reconciliation pass applies it between frames.
        if tick.input.key_pressed("KeyM") {
            if let Ok(mut state) = tick.dispatch_state.lock() {
                let next = match state.mode() {
                    RenderMode::Immediate => RenderMode::MultiThread,
                    RenderMode::MultiThread => RenderMode::Immediate,
                };
                log::info!("Switching render mode to {next:?}");
                state.set_mode(next);
            }
            tick.registry.enroll(Arc::clone(tick.dispatch_state));
        }

        self.orbit_angle += tick.dt * 0.6;
        let eye = Vec3::new(
            6.0 * self.orbit_angle.cos(),
            2.0,
            6.0 * self.orbit_angle.sin(),
        );

        if let Ok(mut camera) = self.camera.lock() {
            camera.set_eye(eye);
            // The camera reconciles after update, so these are the previous
            // tick's matrices, one frame behind.
            let uniforms = SceneUniforms {
                view_proj: column_major(camera.view_projection()),
                color: [0.8, 0.5, 0.2, 1.0],
            };
            if let Err(err) =
                self.device
                    .write_buffer(self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms))
            {
                log::error!("Failed to upload scene uniforms: {err}");
            }
        }
    }

    fn screen(&self) -> &Screen {
        &self.screen
    }

    fn camera(&self) -> &Arc<Mutex<Camera>> {
        &self.camera
    }
}

fn main() -> Result<()> {
    env_logger::init();
    Engine::run_with::<DemoApp>(
        EngineConfig {
            window_title: "Sable Sandbox".to_string(),
            ..Default::default()
        },
        ServiceSet::new(),
    )
}
