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

//! A dirty-tracked perspective camera.

use crate::math::{Frustum, Mat4, Vec3};
use crate::state::{ChangeSet, Reconcile, StateError};

/// A perspective camera whose derived matrices are rebuilt through the
/// dirty-state engine.
///
/// Setters stage changes; the view-projection matrix and frustum are only
/// recomputed when the camera is reconciled, once per dirty episode. Which
/// matrices are rebuilt depends on which properties are staged: view
/// properties (eye, target, up) rebuild the view matrix, projection
/// properties (fov-y, aspect, clip planes) rebuild the projection matrix.
#[derive(Debug)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y_radians: f32,
    aspect: f32,
    z_near: f32,
    z_far: f32,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    frustum: Frustum,

    changes: ChangeSet,
}

impl Camera {
    /// Creates a camera and computes its derived matrices immediately; the
    /// new camera starts clean.
    pub fn new(eye: Vec3, target: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        let up = Vec3::UP;
        let z_near = 0.1;
        let z_far = 1000.0;
        let view = Mat4::look_at(eye, target, up);
        let projection = Mat4::perspective(fov_y_radians, aspect, z_near, z_far);
        let view_projection = projection.mul(&view);
        Self {
            eye,
            target,
            up,
            fov_y_radians,
            aspect,
            z_near,
            z_far,
            view,
            projection,
            view_projection,
            frustum: Frustum::from_view_projection(&view_projection),
            changes: ChangeSet::new("camera"),
        }
    }

    /// Wires the camera's notifications to a state-event channel.
    pub fn with_notifier(mut self, notifier: flume::Sender<crate::state::StateEvent>) -> Self {
        self.changes = ChangeSet::with_notifier("camera", notifier);
        self
    }

    /// Stages a new eye position.
    pub fn set_eye(&mut self, eye: Vec3) {
        self.changes.stage(&mut self.eye, eye, "eye");
    }

    /// Stages a new look-at target.
    pub fn set_target(&mut self, target: Vec3) {
        self.changes.stage(&mut self.target, target, "target");
    }

    /// Stages a new up vector.
    pub fn set_up(&mut self, up: Vec3) {
        self.changes.stage(&mut self.up, up, "up");
    }

    /// Stages a new vertical field of view, in radians.
    pub fn set_fov_y(&mut self, fov_y_radians: f32) {
        self.changes
            .stage(&mut self.fov_y_radians, fov_y_radians, "fov-y");
    }

    /// Stages a new aspect ratio (width / height).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.changes.stage(&mut self.aspect, aspect, "aspect");
    }

    /// Stages new near/far clip distances.
    pub fn set_clip_planes(&mut self, z_near: f32, z_far: f32) {
        self.changes.stage(&mut self.z_near, z_near, "z-near");
        self.changes.stage(&mut self.z_far, z_far, "z-far");
    }

    /// The current eye position.
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// The current look-at target.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// The combined view-projection matrix, as of the last reconciliation.
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// The view frustum, as of the last reconciliation.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// The camera's change set, for inspection.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

impl Reconcile for Camera {
    fn reconcile(&mut self) -> Result<(), StateError> {
        if self.changes.is_clean() {
            return Ok(());
        }

        let view_dirty = ["eye", "target", "up"]
            .iter()
            .any(|p| self.changes.contains(p));
        let projection_dirty = ["fov-y", "aspect", "z-near", "z-far"]
            .iter()
            .any(|p| self.changes.contains(p));

        if view_dirty {
            if (self.target - self.eye).length() <= crate::math::EPSILON {
                return Err(StateError::ReconcileFailed {
                    object: "camera".to_string(),
                    details: "look-at target coincides with the eye position".to_string(),
                });
            }
            self.view = Mat4::look_at(self.eye, self.target, self.up);
        }
        if projection_dirty {
            self.projection =
                Mat4::perspective(self.fov_y_radians, self.aspect, self.z_near, self.z_far);
        }
        self.view_projection = self.projection.mul(&self.view);
        self.frustum = Frustum::from_view_projection(&self.view_projection);

        self.changes.finish();
        Ok(())
    }

    fn is_clean(&self) -> bool {
        self.changes.is_clean()
    }

    fn debug_name(&self) -> &'static str {
        "camera"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_2,
            16.0 / 9.0,
        )
    }

    #[test]
    fn new_camera_is_clean_with_valid_matrices() {
        let camera = test_camera();
        assert!(camera.is_clean());
        let p = camera.view_projection().transform_point(Vec3::ZERO);
        // The origin is in front of the camera, so it lands inside clip space.
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn matrices_update_only_at_reconciliation() {
        let mut camera = test_camera();
        let before = *camera.view_projection();

        camera.set_eye(Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(*camera.view_projection(), before);
        assert!(!camera.is_clean());

        camera.reconcile().expect("reconcile succeeds");
        assert!(camera.is_clean());
        assert_ne!(*camera.view_projection(), before);
    }

    #[test]
    fn reconcile_is_idempotent_when_clean() {
        let mut camera = test_camera();
        camera.reconcile().expect("no-op reconcile succeeds");
        let first = *camera.view_projection();
        camera.reconcile().expect("still succeeds");
        assert_eq!(*camera.view_projection(), first);
    }

    #[test]
    fn degenerate_look_at_fails_and_stays_dirty() {
        let mut camera = test_camera();
        camera.set_target(camera.eye());
        assert!(camera.reconcile().is_err());
        assert!(!camera.is_clean());

        // Repairing the target lets the retry succeed.
        camera.set_target(Vec3::ZERO);
        camera.reconcile().expect("repaired reconcile succeeds");
        assert!(camera.is_clean());
    }

    #[test]
    fn projection_only_change_keeps_the_view() {
        let mut camera = test_camera();
        camera.set_aspect(1.0);
        camera.reconcile().expect("reconcile succeeds");

        let eye = camera.eye();
        let p = camera.view.transform_point(eye);
        assert_relative_eq!(p.length(), 0.0, epsilon = 1e-5);
    }
}
