//! Projection, view and composition of the scene transform chain.
//!
//! The chain above the per-instance model matrix is projection, view and
//! scene rotation. Depending on the composition mode the product is
//! either multiplied on the host and uploaded as one matrix, or uploaded
//! as three matrices the shader multiplies per vertex. A scalar flag
//! uniform tells the shader which path is live; both paths must land on
//! the same clip-space result.

use glam::{Mat4, Vec3};

use crate::config::CompositionMode;
use crate::device::RenderDevice;

/// Flag value for host-composed transforms.
pub const FLAG_HOST: f32 = 0.0;
/// Flag value for shader-composed transforms.
pub const FLAG_DEVICE: f32 = 1.0;

/// The fixed orthographic projection: a 4-unit cube of world space,
/// depth range 0.1 to 40.
pub fn default_projection() -> Mat4 {
    Mat4::orthographic_rh_gl(-2.0, 2.0, -2.0, 2.0, 0.1, 40.0)
}

/// The fixed camera: on the +Z axis at distance 10, looking at the
/// origin, +Y up.
pub fn default_view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
}

/// Normal matrix for lighting: inverse-transpose of the modelview chain.
pub fn normal_matrix(view: &Mat4, scene: &Mat4, model: &Mat4) -> Mat4 {
    (*view * *scene * *model).inverse().transpose()
}

/// Owns the upper transform chain and keeps the device's uniforms in
/// step with it.
#[derive(Debug)]
pub struct TransformPipeline {
    projection: Mat4,
    view: Mat4,
    scene: Mat4,
    composition: CompositionMode,
    dirty: bool,
}

impl TransformPipeline {
    pub fn new(composition: CompositionMode) -> Self {
        Self {
            projection: default_projection(),
            view: default_view(),
            scene: Mat4::IDENTITY,
            composition,
            dirty: true,
        }
    }

    pub fn composition(&self) -> CompositionMode {
        self.composition
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn scene(&self) -> &Mat4 {
        &self.scene
    }

    /// The full host-side product, regardless of composition mode.
    pub fn composed(&self) -> Mat4 {
        self.projection * self.view * self.scene
    }

    /// Replace the scene rotation matrix. Setting an equal matrix does
    /// not mark the chain dirty.
    pub fn set_scene(&mut self, scene: Mat4) {
        if self.scene != scene {
            self.scene = scene;
            self.dirty = true;
        }
    }

    /// Normal matrix for a given model matrix under the current chain.
    pub fn normal_matrix(&self, model: &Mat4) -> Mat4 {
        normal_matrix(&self.view, &self.scene, model)
    }

    /// Upload the chain's uniforms if anything changed since the last
    /// call. Host composition uploads the single product; shader
    /// composition uploads the three factors. The flag uniform always
    /// travels with them.
    pub fn apply(&mut self, device: &mut dyn RenderDevice) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        match self.composition {
            CompositionMode::Host => {
                if let Some(slot) = device.uniform_slot("projectionViewScene") {
                    device.set_uniform_mat4(slot, &self.composed());
                }
            }
            CompositionMode::Device => {
                if let Some(slot) = device.uniform_slot("projection") {
                    device.set_uniform_mat4(slot, &self.projection);
                }
                if let Some(slot) = device.uniform_slot("view") {
                    device.set_uniform_mat4(slot, &self.view);
                }
                if let Some(slot) = device.uniform_slot("scene") {
                    device.set_uniform_mat4(slot, &self.scene);
                }
            }
        }
        if let Some(slot) = device.uniform_slot("compositionModeFlag") {
            let flag = match self.composition {
                CompositionMode::Host => FLAG_HOST,
                CompositionMode::Device => FLAG_DEVICE,
            };
            device.set_uniform_f32(slot, flag);
        }
    }
}
