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

//! GPU-resident mesh handles and their owning models.

use crate::math::Aabb;
use crate::render::handle::{BufferId, IndexFormat};
use std::sync::Arc;

/// The material key a mesh falls back to when it names no material
/// explicitly.
pub const DEFAULT_MATERIAL_KEY: &str = "default";

/// The bounding-volume owner a mesh belongs to.
///
/// Several meshes can share one model; the model carries the bounding box
/// the visibility hook tests against the camera frustum.
#[derive(Debug)]
pub struct Model {
    /// A descriptive name for logs.
    pub name: String,
    /// The axis-aligned bounding box enclosing all of the model's meshes.
    pub bounding_box: Aabb,
}

/// How a mesh selects its material within its effect.
///
/// Resolution precedence is: explicit name, else explicit index, else the
/// effect's [`DEFAULT_MATERIAL_KEY`] material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialRef {
    /// Select the material with this name.
    Named(String),
    /// Select the material at this position in the effect's ordered list.
    Indexed(usize),
    /// Fall back to the effect's default material.
    Default,
}

/// A GPU-ready mesh: vertex and index data already uploaded, ready to draw.
#[derive(Debug, Clone)]
pub struct GpuMesh {
    /// A descriptive name for logs.
    pub name: String,
    /// The vertex buffer holding interleaved vertex data.
    pub vertex_buffer: BufferId,
    /// The index buffer for indexed drawing.
    pub index_buffer: BufferId,
    /// The number of indices to draw.
    pub index_count: u32,
    /// The format of indices in the index buffer.
    pub index_format: IndexFormat,
    /// The model this mesh belongs to (bounding-volume owner).
    pub model: Arc<Model>,
    /// The material selection for this mesh.
    pub material: MaterialRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn meshes_can_share_one_model() {
        let model = Arc::new(Model {
            name: "crate".to_string(),
            bounding_box: Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)),
        });
        let a = GpuMesh {
            name: "lid".to_string(),
            vertex_buffer: BufferId(0),
            index_buffer: BufferId(1),
            index_count: 36,
            index_format: IndexFormat::Uint16,
            model: Arc::clone(&model),
            material: MaterialRef::Default,
        };
        let b = GpuMesh {
            name: "body".to_string(),
            vertex_buffer: BufferId(2),
            index_buffer: BufferId(3),
            index_count: 36,
            index_format: IndexFormat::Uint16,
            model: Arc::clone(&model),
            material: MaterialRef::Named("wood".to_string()),
        };
        assert!(Arc::ptr_eq(&a.model, &b.model));
        assert_eq!(a.model.bounding_box, b.model.bounding_box);
    }
}
