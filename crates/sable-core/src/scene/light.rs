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

//! Light types owned by effects.
//!
//! The dispatch core carries lights as opaque data; shading models are out
//! of scope.

use crate::math::{LinearRgba, Vec3};

/// A light that illuminates the whole scene from one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// The direction the light travels (not towards the light).
    pub direction: Vec3,
    /// The light color.
    pub color: LinearRgba,
    /// A linear intensity multiplier.
    pub intensity: f32,
}

/// A light radiating from a point with distance falloff.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// The world-space position of the light.
    pub position: Vec3,
    /// The light color.
    pub color: LinearRgba,
    /// A linear intensity multiplier.
    pub intensity: f32,
    /// The distance beyond which the light contributes nothing.
    pub range: f32,
}

/// Any light an effect can own.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// A directional light.
    Directional(DirectionalLight),
    /// A point light.
    Point(PointLight),
}
