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

//! High-level rendering entities consumed by the dispatch core.
//!
//! These types are produced by the content/asset collaborator (out of scope
//! here): meshes arrive GPU-resident with their bounding volumes computed,
//! effects arrive as bound pipeline state with their ordered materials. The
//! dispatch core groups meshes by effect and never inspects shader internals.

pub mod camera;
pub mod effect;
pub mod light;
pub mod material;
pub mod mesh;
pub mod screen;

pub use camera::Camera;
pub use effect::Effect;
pub use light::{DirectionalLight, Light, PointLight};
pub use material::Material;
pub use mesh::{GpuMesh, MaterialRef, Model, DEFAULT_MATERIAL_KEY};
pub use screen::{EffectGroup, PostEffect, Screen};
