//! A drawable object instance.
//!
//! An instance owns its vertex array and its per-instance buffers, holds
//! references to the class-shared ones, and carries the model transform
//! and color slots. The model matrix is recomputed lazily: setters flag
//! it dirty only when a value actually changes, and `redraw` rebuilds it
//! at most once per frame. The model uniform itself is uploaded on every
//! draw because all instances share one uniform slot.

use glam::{Mat4, Vec3, Vec4};
use log::{error, warn};

use crate::config::PackingMode;
use crate::device::{DeviceResult, RenderDevice};
use crate::geometry::AttributeSet;
use crate::layout::{DrawCall, UploadPlan};
use crate::pool::{BufferPool, PoolResult};
use crate::upload::{self, InstanceBuffers};

/// Number of color slots per instance. Slot 0 is the nominal base color.
pub const MAX_COLORS: usize = 8;

/// One placed, scaled, rotated instance of an object class.
#[derive(Debug)]
pub struct ShapeInstance {
    buffers: InstanceBuffers,
    draw: DrawCall,

    location: Vec3,
    scale: Vec3,
    rotation_angle: f32,
    rotation_axis: Vec3,

    colors: [Option<Vec4>; MAX_COLORS],

    model: Mat4,
    model_dirty: bool,
}

impl ShapeInstance {
    /// Upload the attribute data per `plan` and create the instance at
    /// the origin, unit scale, unrotated, nominal color red.
    pub fn new(
        device: &mut dyn RenderDevice,
        pool: &mut BufferPool,
        plan: &UploadPlan,
        set: &AttributeSet,
        packing: PackingMode,
    ) -> PoolResult<Self> {
        let buffers = upload::upload_instance(device, pool, plan, set, packing)?;
        let mut colors = [None; MAX_COLORS];
        colors[0] = Some(Vec4::new(1.0, 0.0, 0.0, 1.0));
        Ok(Self {
            buffers,
            draw: plan.draw,
            location: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_angle: 0.0,
            rotation_axis: Vec3::Y,
            colors,
            model: Mat4::IDENTITY,
            model_dirty: true,
        })
    }

    // ------------------------------------------------------------------
    // Transform
    // ------------------------------------------------------------------

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn set_location(&mut self, location: Vec3) {
        if self.location != location {
            self.location = location;
            self.model_dirty = true;
        }
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        if self.scale != scale {
            self.scale = scale;
            self.model_dirty = true;
        }
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.set_scale(Vec3::splat(s));
    }

    /// Set the rotation as an angle in radians about an axis.
    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        if self.rotation_angle != angle || self.rotation_axis != axis {
            self.rotation_angle = angle;
            self.rotation_axis = axis;
            self.model_dirty = true;
        }
    }

    pub fn is_model_dirty(&self) -> bool {
        self.model_dirty
    }

    /// The model matrix, rebuilt if a setter changed anything since the
    /// last call. Translation, then rotation, then scale.
    pub fn model_matrix(&mut self) -> Mat4 {
        if self.model_dirty {
            let rotation = match self.rotation_axis.try_normalize() {
                Some(axis) if self.rotation_angle != 0.0 => {
                    Mat4::from_axis_angle(axis, self.rotation_angle)
                }
                _ => Mat4::IDENTITY,
            };
            self.model = Mat4::from_translation(self.location)
                * rotation
                * Mat4::from_scale(self.scale);
            self.model_dirty = false;
        }
        self.model
    }

    // ------------------------------------------------------------------
    // Colors
    // ------------------------------------------------------------------

    /// The nominal base color (slot 0).
    pub fn base_color(&self) -> Vec4 {
        self.colors[0].unwrap_or(Vec4::new(1.0, 0.0, 0.0, 1.0))
    }

    pub fn set_base_color(&mut self, color: Vec4) {
        self.colors[0] = Some(color);
    }

    pub fn color(&self, index: usize) -> Option<Vec4> {
        self.colors.get(index).copied().flatten()
    }

    /// Set a color slot. Out-of-range indices are reported and refused.
    pub fn set_color(&mut self, index: usize, color: Vec4) -> bool {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = Some(color);
                true
            }
            None => {
                error!(
                    "color index {} out of range (max {})",
                    index,
                    MAX_COLORS - 1
                );
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Drawing and teardown
    // ------------------------------------------------------------------

    /// Upload the instance uniforms and issue this instance's draw call.
    /// The scene chain must already be synchronized.
    pub fn redraw(&mut self, device: &mut dyn RenderDevice) -> DeviceResult<()> {
        let model = self.model_matrix();
        if let Some(slot) = device.uniform_slot("model") {
            device.set_uniform_mat4(slot, &model);
        }
        if let Some(slot) = device.uniform_slot("baseColor") {
            device.set_uniform_vec4(slot, self.base_color());
        }

        match self.draw {
            DrawCall::Arrays { vertex_count } => {
                device.draw_triangles(self.buffers.vao, vertex_count)
            }
            DrawCall::Indexed { index_count } => match self.buffers.index_buffer() {
                Some(indices) => {
                    device.draw_indexed_triangles(self.buffers.vao, indices, index_count)
                }
                None => {
                    warn!("indexed draw without an index buffer; skipping instance");
                    Ok(())
                }
            },
        }
    }

    /// Destroy the instance's device objects, releasing shared references.
    pub fn destroy(self, device: &mut dyn RenderDevice, pool: &mut BufferPool) -> PoolResult<()> {
        upload::release_instance(device, pool, self.buffers)
    }
}
