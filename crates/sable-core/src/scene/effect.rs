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

//! Effects: the unit meshes are grouped by for draw-call batching.

use super::light::Light;
use super::material::Material;
use super::mesh::{MaterialRef, DEFAULT_MATERIAL_KEY};
use crate::render::handle::RenderPipelineId;
use std::collections::HashMap;

/// A bound shader pipeline plus its ordered materials and lights.
///
/// An effect must own at least one material by the time it is rendered;
/// rendering an effect with zero materials is a configuration fault, not a
/// silent skip.
#[derive(Debug, Clone)]
pub struct Effect {
    /// The effect name, used in logs and error reports.
    pub name: String,
    /// The opaque pipeline state object the effect binds when applied.
    pub pipeline: RenderPipelineId,
    /// The lights this effect owns, in application order.
    pub lights: Vec<Light>,
    materials: Vec<Material>,
    by_name: HashMap<String, usize>,
}

impl Effect {
    /// Creates an effect with no materials or lights.
    pub fn new(name: impl Into<String>, pipeline: RenderPipelineId) -> Self {
        Self {
            name: name.into(),
            pipeline,
            lights: Vec::new(),
            materials: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Appends a material, keeping it addressable by name and by index.
    ///
    /// If a material with the same name already exists, name-based lookups
    /// resolve to the newer one; the older material keeps its index.
    pub fn push_material(&mut self, material: Material) {
        let index = self.materials.len();
        self.by_name.insert(material.name.clone(), index);
        self.materials.push(material);
    }

    /// The ordered materials this effect owns.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Returns `true` if the effect owns at least one material.
    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }

    /// Resolves a mesh's material selection against this effect.
    ///
    /// Precedence follows the mesh's [`MaterialRef`]: explicit name, else
    /// explicit index, else the material named [`DEFAULT_MATERIAL_KEY`],
    /// falling back to the first material when no default is named.
    pub fn resolve_material(&self, selection: &MaterialRef) -> Option<&Material> {
        match selection {
            MaterialRef::Named(name) => {
                self.by_name.get(name).and_then(|&i| self.materials.get(i))
            }
            MaterialRef::Indexed(index) => self.materials.get(*index),
            MaterialRef::Default => self
                .by_name
                .get(DEFAULT_MATERIAL_KEY)
                .and_then(|&i| self.materials.get(i))
                .or_else(|| self.materials.first()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::LinearRgba;

    fn effect_with(names: &[&str]) -> Effect {
        let mut effect = Effect::new("lit", RenderPipelineId(0));
        for name in names {
            effect.push_material(Material::new(*name, LinearRgba::WHITE));
        }
        effect
    }

    #[test]
    fn named_resolution_wins() {
        let effect = effect_with(&["default", "wood"]);
        let m = effect
            .resolve_material(&MaterialRef::Named("wood".to_string()))
            .expect("resolves");
        assert_eq!(m.name, "wood");
    }

    #[test]
    fn indexed_resolution_uses_insertion_order() {
        let effect = effect_with(&["default", "wood"]);
        let m = effect
            .resolve_material(&MaterialRef::Indexed(1))
            .expect("resolves");
        assert_eq!(m.name, "wood");
        assert!(effect.resolve_material(&MaterialRef::Indexed(2)).is_none());
    }

    #[test]
    fn default_resolution_prefers_the_default_key() {
        let effect = effect_with(&["wood", "default"]);
        let m = effect
            .resolve_material(&MaterialRef::Default)
            .expect("resolves");
        assert_eq!(m.name, "default");
    }

    #[test]
    fn default_resolution_falls_back_to_first_material() {
        let effect = effect_with(&["wood", "stone"]);
        let m = effect
            .resolve_material(&MaterialRef::Default)
            .expect("resolves");
        assert_eq!(m.name, "wood");
    }

    #[test]
    fn unknown_name_does_not_resolve() {
        let effect = effect_with(&["default"]);
        assert!(effect
            .resolve_material(&MaterialRef::Named("glass".to_string()))
            .is_none());
    }
}
