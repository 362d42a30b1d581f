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

//! Opaque handles to backend-owned GPU resources.
//!
//! Handles are plain integers minted by the graphics backend; the core
//! passes them around without ever dereferencing them.

/// A handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// A handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// A handle to a view over a GPU texture, usable as a render attachment or
/// a sampled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub u64);

/// A handle to a 2D-drawable bitmap aliasing a texture's memory.
///
/// Backends without 2D interop simply never mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapAliasId(pub u64);

/// A handle to a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderModuleId(pub u64);

/// A handle to a complete render pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub u64);

/// A handle to a group of shader resource bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupId(pub u64);

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

/// Defines the memory format of pixels in a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color
    /// space. A common swapchain format.
    Bgra8UnormSrgb,
    /// Four 16-bit float components; used for HDR scene targets.
    Rgba16Float,
    /// A 32-bit float depth format.
    Depth32Float,
}

/// Describes a texture the core asks the backend to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The texture dimensions.
    pub size: crate::math::Extent3D,
    /// The pixel format.
    pub format: TextureFormat,
    /// Whether render passes may target the texture.
    pub render_attachment: bool,
    /// Whether shaders may sample the texture.
    pub sampled: bool,
}
