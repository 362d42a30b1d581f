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

//! Screens: the renderable unit the frame loop drives.

use super::effect::Effect;
use super::mesh::GpuMesh;
use crate::render::error::ConfigError;
use crate::render::handle::{BindGroupId, RenderPipelineId, TextureViewId};
use std::collections::BTreeMap;

/// One effect and the meshes drawn with it.
#[derive(Debug, Clone)]
pub struct EffectGroup {
    /// The effect applied once per execution context.
    pub effect: Effect,
    /// The meshes rendered under this effect, in draw order.
    pub meshes: Vec<GpuMesh>,
}

/// An opaque 2D pipeline-state object applied as one node of the
/// post-process chain.
///
/// Every node except the final one writes into its own `intermediate`
/// target; the final node writes to the presentation surface. The input of
/// each node is the output of its predecessor (the first node reads the
/// fully-rendered scene texture).
#[derive(Debug, Clone)]
pub struct PostEffect {
    /// A descriptive name for logs and error reports.
    pub name: String,
    /// The pipeline state bound when the node is applied.
    pub pipeline: RenderPipelineId,
    /// The node's resource bindings (the sampled input, constants), if any.
    pub bind_group: Option<BindGroupId>,
    /// The node's own output target. `None` is only valid for the final
    /// chain node, which draws to the presentation surface instead.
    pub intermediate: Option<TextureViewId>,
}

/// A renderable screen: meshes grouped by effect, plus an ordered
/// post-process chain.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    /// A descriptive name for logs.
    pub name: String,
    groups: Vec<EffectGroup>,
    post_chain: BTreeMap<i32, PostEffect>,
}

impl Screen {
    /// Creates an empty screen.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            post_chain: BTreeMap::new(),
        }
    }

    /// Appends an effect group. Groups render in insertion order.
    pub fn push_group(&mut self, group: EffectGroup) {
        self.groups.push(group);
    }

    /// The screen's effect groups, in render order.
    pub fn groups(&self) -> &[EffectGroup] {
        &self.groups
    }

    /// Inserts a post-process node at the given chain position.
    ///
    /// Keys order the chain ascending and must be unique; reusing a key is a
    /// configuration fault, because it would make the output-to-input
    /// linking of the chain ambiguous.
    pub fn add_post_effect(&mut self, key: i32, effect: PostEffect) -> Result<(), ConfigError> {
        if self.post_chain.contains_key(&key) {
            return Err(ConfigError::DuplicatePostEffectKey { key });
        }
        self.post_chain.insert(key, effect);
        Ok(())
    }

    /// The post-process nodes in ascending key order.
    pub fn post_chain(&self) -> impl Iterator<Item = &PostEffect> {
        self.post_chain.values()
    }

    /// Returns `true` if any post-process nodes are configured.
    pub fn has_post_chain(&self) -> bool {
        !self.post_chain.is_empty()
    }

    /// The number of post-process nodes.
    pub fn post_chain_len(&self) -> usize {
        self.post_chain.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> PostEffect {
        PostEffect {
            name: name.to_string(),
            pipeline: RenderPipelineId(9),
            bind_group: None,
            intermediate: None,
        }
    }

    #[test]
    fn post_chain_iterates_in_ascending_key_order() {
        let mut screen = Screen::new("main");
        screen.add_post_effect(20, node("edge")).expect("unique");
        screen.add_post_effect(-3, node("ripple")).expect("unique");
        screen.add_post_effect(7, node("blur")).expect("unique");

        let names: Vec<&str> = screen.post_chain().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["ripple", "blur", "edge"]);
    }

    #[test]
    fn duplicate_post_key_is_rejected() {
        let mut screen = Screen::new("main");
        screen.add_post_effect(1, node("ripple")).expect("unique");
        let err = screen.add_post_effect(1, node("edge"));
        assert!(matches!(
            err,
            Err(ConfigError::DuplicatePostEffectKey { key: 1 })
        ));
        // The original node stays in place.
        assert_eq!(screen.post_chain_len(), 1);
        assert_eq!(screen.post_chain().next().unwrap().name, "ripple");
    }
}
