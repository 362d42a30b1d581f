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

//! A 4x4 matrix type for camera and transform math.

use super::{Vec3, Vec4};

/// A 4x4 row-major matrix of `f32`.
///
/// The convention throughout the engine is `v' = M * v` with column vectors,
/// so `m[row][col]` addresses the element in `row` of the matrix row and
/// `col` of the input component it multiplies.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The matrix elements, addressed as `m[row][col]`.
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Returns the given row as a [`Vec4`].
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        let r = self.m[index];
        Vec4::new(r[0], r[1], r[2], r[3])
    }

    /// Multiplies two matrices (`self * rhs`).
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self { m: out }
    }

    /// Transforms a point (w = 1) and performs the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = Vec4::new(p.x, p.y, p.z, 1.0);
        let x = self.row(0).x * v.x + self.row(0).y * v.y + self.row(0).z * v.z + self.row(0).w;
        let y = self.row(1).x * v.x + self.row(1).y * v.y + self.row(1).z * v.z + self.row(1).w;
        let z = self.row(2).x * v.x + self.row(2).y * v.y + self.row(2).z * v.z + self.row(2).w;
        let w = self.row(3).x * v.x + self.row(3).y * v.y + self.row(3).z * v.z + self.row(3).w;
        if w.abs() <= super::EPSILON {
            Vec3::new(x, y, z)
        } else {
            Vec3::new(x / w, y / w, z / w)
        }
    }

    /// Builds a right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - eye).normalized();
        let side = forward.cross(up).normalized();
        let true_up = side.cross(forward);
        Self {
            m: [
                [side.x, side.y, side.z, -side.dot(eye)],
                [true_up.x, true_up.y, true_up.z, -true_up.dot(eye)],
                [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Builds a right-handed perspective projection with a [0, 1] depth range,
    /// matching the clip-space conventions of modern graphics APIs.
    pub fn perspective(fov_y_radians: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let range = z_near - z_far;
        Self {
            m: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, z_far / range, z_near * z_far / range],
                [0.0, 0.0, -1.0, 0.0],
            ],
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_multiplication_is_a_no_op() {
        let m = Mat4::perspective(1.0, 1.5, 0.1, 100.0);
        let out = Mat4::IDENTITY.mul(&m);
        assert_eq!(out, m);
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::UP);
        let p = view.transform_point(eye);
        assert_relative_eq!(p.length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        let on_near = proj.transform_point(Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(on_near.z, 0.0, epsilon = 1e-5);
        let on_far = proj.transform_point(Vec3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(on_far.z, 1.0, epsilon = 1e-5);
    }
}
