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

//! Materials: named resource bundles applied to a mesh before its draw call.

use crate::math::LinearRgba;
use crate::render::handle::BindGroupId;

/// A named bundle of shader resources (textures, constants) applied to a
/// mesh before its draw call.
///
/// The core never inspects the resources themselves; `bind_group` is the
/// opaque, already-built binding the backend attaches when the material is
/// applied.
#[derive(Debug, Clone)]
pub struct Material {
    /// The material name, used for name-based resolution.
    pub name: String,
    /// The base color of the material.
    pub base_color: LinearRgba,
    /// The backend bindings this material attaches, if any.
    pub bind_group: Option<BindGroupId>,
}

impl Material {
    /// Creates a material with no backend bindings.
    pub fn new(name: impl Into<String>, base_color: LinearRgba) -> Self {
        Self {
            name: name.into(),
            base_color,
            bind_group: None,
        }
    }

    /// Attaches a prepared bind group to the material.
    pub fn with_bind_group(mut self, bind_group: BindGroupId) -> Self {
        self.bind_group = Some(bind_group);
        self
    }
}
