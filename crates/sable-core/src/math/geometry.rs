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

//! Geometric primitives for spatial reasoning (bounding volumes, frustums).

use super::{Mat4, Vec3, EPSILON};

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// An AABB is a rectangular prism aligned with the coordinate axes, defined by
/// its minimum and maximum corner points. It is the bounding volume carried by
/// every model and consumed by the visibility hook of the render dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from two corner points.
    ///
    /// The `min` field is set to the component-wise minimum and `max` to the
    /// component-wise maximum, regardless of the order the points are passed.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let he = Vec3::new(half_extents.x.abs(), half_extents.y.abs(), half_extents.z.abs());
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Returns the center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A plane in the form `dot(normal, p) + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// The plane normal. Points towards the half-space considered "inside".
    pub normal: Vec3,
    /// The plane offset.
    pub d: f32,
}

impl Plane {
    /// Builds a plane from raw coefficients and normalizes it.
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let len = normal.length();
        if len <= EPSILON {
            Self { normal, d }
        } else {
            let inv = 1.0 / len;
            Self {
                normal: normal * inv,
                d: d * inv,
            }
        }
    }

    /// Returns the signed distance from the plane to a point.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }
}

/// The result of testing a volume against a [`Frustum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The volume is entirely outside the frustum.
    Disjoint,
    /// The volume straddles at least one frustum plane.
    Intersects,
    /// The volume is entirely inside the frustum.
    Contains,
}

/// A view frustum described by six inward-facing planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// The planes in order: left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the six frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb-Hartmann method for the engine's `v' = M * v` row-major
    /// convention and [0, 1] clip-space depth.
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        let left = r3 + r0;
        let right = r3 - r0;
        let bottom = r3 + r1;
        let top = r3 - r1;
        let near = r2;
        let far = r3 - r2;

        Self {
            planes: [
                Plane::from_coefficients(left.x, left.y, left.z, left.w),
                Plane::from_coefficients(right.x, right.y, right.z, right.w),
                Plane::from_coefficients(bottom.x, bottom.y, bottom.z, bottom.w),
                Plane::from_coefficients(top.x, top.y, top.z, top.w),
                Plane::from_coefficients(near.x, near.y, near.z, near.w),
                Plane::from_coefficients(far.x, far.y, far.z, far.w),
            ],
        }
    }

    /// Tests an [`Aabb`] against the frustum.
    pub fn contains_aabb(&self, aabb: &Aabb) -> Containment {
        let mut intersects = false;
        for plane in &self.planes {
            // The "positive vertex" is the box corner furthest along the
            // plane normal; the "negative vertex" is the opposite corner.
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            let n = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if plane.normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if plane.normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if plane.distance(p) < 0.0 {
                return Containment::Disjoint;
            }
            if plane.distance(n) < 0.0 {
                intersects = true;
            }
        }
        if intersects {
            Containment::Intersects
        } else {
            Containment::Contains
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::new(0.5, 0.5, 0.5))
    }

    fn test_frustum() -> Frustum {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP);
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&proj.mul(&view))
    }

    #[test]
    fn from_min_max_reorders_corners() {
        let b = Aabb::from_min_max(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn box_in_front_of_camera_is_contained() {
        let frustum = test_frustum();
        let result = frustum.contains_aabb(&unit_box_at(Vec3::ZERO));
        assert_eq!(result, Containment::Contains);
    }

    #[test]
    fn box_behind_camera_is_disjoint() {
        let frustum = test_frustum();
        let result = frustum.contains_aabb(&unit_box_at(Vec3::new(0.0, 0.0, 50.0)));
        assert_eq!(result, Containment::Disjoint);
    }

    #[test]
    fn box_straddling_a_plane_intersects() {
        let frustum = test_frustum();
        // A box centred on the near plane pokes out of the frustum.
        let result = frustum.contains_aabb(&unit_box_at(Vec3::new(0.0, 0.0, 4.9)));
        assert_eq!(result, Containment::Intersects);
    }
}
