//! Scene-level rotation state.
//!
//! The scene rotates as a whole, around the world axes, on top of the
//! fixed camera. Angle changes are cheap; the rotation matrix and the
//! uniform uploads happen lazily when the scene is synchronized before
//! a frame.

use glam::{Mat4, Vec3};

use crate::config::CompositionMode;
use crate::device::RenderDevice;
use crate::transform::TransformPipeline;

/// Whole-scene rotation plus the transform chain above it.
#[derive(Debug)]
pub struct Scene {
    /// Rotation angles around the world X, Y and Z axes, in radians.
    rotation: Vec3,
    changed: bool,
    pipeline: TransformPipeline,
}

impl Scene {
    pub fn new(composition: CompositionMode) -> Self {
        Self {
            rotation: Vec3::ZERO,
            changed: true,
            pipeline: TransformPipeline::new(composition),
        }
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Add to the per-axis rotation angles.
    pub fn rotate_by(&mut self, delta: Vec3) {
        if delta != Vec3::ZERO {
            self.rotation += delta;
            self.changed = true;
        }
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.changed = true;
        }
    }

    /// The scene rotation matrix, X then Y then Z.
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    /// Push any pending rotation into the transform chain and bring the
    /// device's uniforms up to date. Call once per frame before drawing.
    pub fn sync(&mut self, device: &mut dyn RenderDevice) {
        if self.changed {
            self.pipeline.set_scene(self.rotation_matrix());
            self.changed = false;
        }
        self.pipeline.apply(device);
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    /// Normal matrix for a model matrix under the current chain.
    pub fn normal_matrix(&self, model: &Mat4) -> Mat4 {
        self.pipeline.normal_matrix(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftwareDevice;

    #[test]
    fn test_rotation_accumulates() {
        let mut scene = Scene::new(CompositionMode::Host);
        scene.rotate_by(Vec3::new(0.1, 0.0, 0.0));
        scene.rotate_by(Vec3::new(0.1, 0.2, 0.0));
        assert_eq!(scene.rotation(), Vec3::new(0.2, 0.2, 0.0));
    }

    #[test]
    fn test_sync_uploads_once_per_change() {
        let mut device = SoftwareDevice::new();
        let mut scene = Scene::new(CompositionMode::Host);

        scene.sync(&mut device);
        scene.sync(&mut device);
        assert_eq!(device.uniform_upload_count("projectionViewScene"), 1);

        scene.rotate_by(Vec3::new(0.0, 0.5, 0.0));
        scene.sync(&mut device);
        assert_eq!(device.uniform_upload_count("projectionViewScene"), 2);

        // A zero delta is not a change.
        scene.rotate_by(Vec3::ZERO);
        scene.sync(&mut device);
        assert_eq!(device.uniform_upload_count("projectionViewScene"), 2);
    }

    #[test]
    fn test_normal_matrix_inverts_the_modelview_chain() {
        let mut scene = Scene::new(CompositionMode::Host);
        scene.set_rotation(Vec3::new(0.2, 0.4, 0.0));
        let mut device = SoftwareDevice::new();
        scene.sync(&mut device);

        let model = Mat4::from_scale(Vec3::splat(2.0));
        let normal = scene.normal_matrix(&model);
        let modelview = *scene.pipeline().view() * scene.rotation_matrix() * model;
        let product = normal.transpose() * modelview;
        // transpose(inverse(MV)) * v has MV^-T as its matrix, so
        // normal^T * MV must be the identity.
        for (i, x) in product.to_cols_array().iter().enumerate() {
            let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
            assert!((x - expected).abs() < 1e-4, "entry {}: {}", i, x);
        }
    }

    #[test]
    fn test_rotation_matrix_axis_order() {
        let mut scene = Scene::new(CompositionMode::Host);
        scene.set_rotation(Vec3::new(0.3, 0.7, 1.2));
        let expected = Mat4::from_rotation_x(0.3)
            * Mat4::from_rotation_y(0.7)
            * Mat4::from_rotation_z(1.2);
        assert_eq!(scene.rotation_matrix(), expected);
    }
}
