//! Plan execution: buffer population and vertex-array wiring.
//!
//! Given an [`UploadPlan`] and the raw attribute data, this module
//! acquires the planned buffers from the pool, uploads payloads, and
//! binds each attribute through the plan's stride/offset declaration.
//! Shared buffers are populated at most once; instances after the first
//! bind the already-filled buffer.

use log::debug;

use crate::config::PackingMode;
use crate::device::{AttributeBinding, BufferHandle, BufferUsage, RenderDevice, VertexArrayHandle};
use crate::geometry::AttributeSet;
use crate::layout::{BufferRole, SharingScope, UploadPlan};
use crate::pool::{BufferPool, PoolResult};

/// Pack positions and normals into one combined payload.
///
/// Blocked packing is the position block followed by the normal block;
/// interleaved packing alternates one vertex's position and normal. Both
/// carry bit-identical floats, only the byte order differs.
pub fn pack_joint(set: &AttributeSet, packing: PackingMode) -> Vec<u8> {
    let positions: &[u8] = bytemuck::cast_slice(&set.positions);
    let normals: &[u8] = match &set.normals {
        Some(normals) => bytemuck::cast_slice(normals),
        None => return positions.to_vec(),
    };

    match packing {
        PackingMode::Blocked => {
            let mut packed = Vec::with_capacity(positions.len() + normals.len());
            packed.extend_from_slice(positions);
            packed.extend_from_slice(normals);
            packed
        }
        PackingMode::Interleaved => {
            let n = set.vertex_count as usize;
            let pos_bytes = positions.len() / n;
            let norm_bytes = normals.len() / n;
            let mut packed = Vec::with_capacity(positions.len() + normals.len());
            for v in 0..n {
                packed.extend_from_slice(&positions[v * pos_bytes..(v + 1) * pos_bytes]);
                packed.extend_from_slice(&normals[v * norm_bytes..(v + 1) * norm_bytes]);
            }
            packed
        }
    }
}

/// The device objects one instance holds after upload.
#[derive(Debug)]
pub struct InstanceBuffers {
    pub vao: VertexArrayHandle,
    buffers: Vec<(BufferRole, SharingScope, BufferHandle)>,
}

impl InstanceBuffers {
    pub fn buffer(&self, role: BufferRole) -> Option<BufferHandle> {
        self.buffers
            .iter()
            .find(|(r, _, _)| *r == role)
            .map(|(_, _, handle)| *handle)
    }

    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.buffer(BufferRole::Index)
    }
}

fn payload_for<'a>(
    role: BufferRole,
    set: &'a AttributeSet,
    joint: &'a [u8],
) -> Option<std::borrow::Cow<'a, [u8]>> {
    use std::borrow::Cow;
    match role {
        BufferRole::Position => Some(Cow::Borrowed(bytemuck::cast_slice(&set.positions))),
        BufferRole::Normal => set
            .normals
            .as_deref()
            .map(|n| Cow::Borrowed(bytemuck::cast_slice(n))),
        BufferRole::Color => set
            .colors
            .as_deref()
            .map(|c| Cow::Borrowed(bytemuck::cast_slice(c))),
        BufferRole::Combined => Some(Cow::Borrowed(joint)),
        BufferRole::Index => set.indices.as_deref().map(Cow::Borrowed),
    }
}

/// Acquire, populate and wire every buffer the plan names, returning the
/// instance's vertex array and handle set.
///
/// A shared buffer is uploaded only if the pool has not seen its payload
/// yet; a planned buffer whose payload is absent from the attribute set
/// (the eagerly allocated index buffer of a non-indexed shared layout)
/// stays allocated but empty.
pub fn upload_instance(
    device: &mut dyn RenderDevice,
    pool: &mut BufferPool,
    plan: &UploadPlan,
    set: &AttributeSet,
    packing: PackingMode,
) -> PoolResult<InstanceBuffers> {
    let joint = if plan.joint.is_some() {
        pack_joint(set, packing)
    } else {
        Vec::new()
    };

    let mut buffers = Vec::with_capacity(plan.allocations.len());
    for &(role, scope) in &plan.allocations {
        let handle = match scope {
            SharingScope::SharedPerClass => pool.acquire_shared(device, role)?,
            SharingScope::PerInstance => pool.acquire_instance(device)?,
        };

        let fill = match scope {
            SharingScope::PerInstance => true,
            SharingScope::SharedPerClass => !pool.shared_populated(role),
        };
        if fill {
            if let Some(payload) = payload_for(role, set, &joint) {
                device.upload_buffer(handle, &payload, BufferUsage::Static)?;
                if scope == SharingScope::SharedPerClass {
                    pool.mark_shared_populated(role);
                    debug!("populated shared {:?} buffer ({} bytes)", role, payload.len());
                }
            }
        }
        buffers.push((role, scope, handle));
    }

    let vao = device.create_vertex_array()?;
    for step in &plan.steps {
        let Some(slot) = device.attribute_slot(step.attribute.shader_name()) else {
            // The program variant omits this input; nothing to bind.
            continue;
        };
        let buffer = buffers
            .iter()
            .find(|(role, scope, _)| *role == step.role && *scope == step.scope)
            .map(|(_, _, handle)| *handle);
        if let Some(buffer) = buffer {
            device.bind_attribute(
                vao,
                slot,
                buffer,
                AttributeBinding {
                    components: step.components,
                    stride_bytes: step.stride_bytes,
                    offset_bytes: step.offset_bytes,
                },
            )?;
        }
    }

    Ok(InstanceBuffers { vao, buffers })
}

/// Tear down one instance's device objects: the vertex array first, then
/// per-instance buffers, then the shared references. Shared buffers
/// themselves outlive every instance and fall only with the pool.
pub fn release_instance(
    device: &mut dyn RenderDevice,
    pool: &mut BufferPool,
    buffers: InstanceBuffers,
) -> PoolResult<()> {
    device.destroy_vertex_array(buffers.vao)?;
    for (role, scope, handle) in buffers.buffers {
        match scope {
            SharingScope::PerInstance => pool.release_instance(device, handle)?,
            SharingScope::SharedPerClass => pool.release_shared(role)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DrawStyle, LayoutConfig};
    use crate::device::SoftwareDevice;
    use crate::geometry::{Cube, GeometryProvider};
    use crate::layout::plan_layout;

    fn two_vertex_set() -> AttributeSet {
        AttributeSet {
            positions: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            normals: Some(vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]),
            colors: None,
            indices: None,
            vertex_count: 2,
        }
    }

    #[test]
    fn test_blocked_packing_concatenates() {
        let set = two_vertex_set();
        let packed = pack_joint(&set, PackingMode::Blocked);
        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(
            floats,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_interleaved_packing_alternates() {
        let set = two_vertex_set();
        let packed = pack_joint(&set, PackingMode::Interleaved);
        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(
            floats,
            &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 4.0, 5.0, 6.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_upload_wires_every_planned_attribute() {
        let mut device = SoftwareDevice::new();
        let mut pool = BufferPool::new();
        let config = LayoutConfig::parse("bua.da");
        let set = Cube::new(true, true).attribute_set(DrawStyle::Arrays);
        let plan = plan_layout(&config, &set.describe());

        let buffers = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();

        let position = device.attribute_slot("position").unwrap();
        assert_eq!(
            device.read_attribute(buffers.vao, position, 0).unwrap(),
            vec![0.5, -0.5, 0.5]
        );
        let color = device.attribute_slot("color").unwrap();
        assert_eq!(
            device.read_attribute(buffers.vao, color, 0).unwrap(),
            vec![1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_shared_payload_uploaded_once() {
        let mut device = SoftwareDevice::new();
        let mut pool = BufferPool::new();
        let config = LayoutConfig::parse("bsj.da.ai");
        let set = Cube::new(true, true).attribute_set(DrawStyle::Arrays);
        let plan = plan_layout(&config, &set.describe());

        let first = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();
        let second = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();

        assert_eq!(
            first.buffer(BufferRole::Combined),
            second.buffer(BufferRole::Combined)
        );
        assert_ne!(first.buffer(BufferRole::Color), second.buffer(BufferRole::Color));
        assert_eq!(pool.shared_allocations(), 1);

        release_instance(&mut device, &mut pool, second).unwrap();
        release_instance(&mut device, &mut pool, first).unwrap();
        // The shared combined buffer outlives both instances.
        assert_eq!(device.live_buffers(), 1);
        pool.shutdown(&mut device).unwrap();
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_shared_buffer_survives_instance_churn() {
        let mut device = SoftwareDevice::new();
        let mut pool = BufferPool::new();
        let config = LayoutConfig::parse("bsa.da");
        let set = Cube::new(true, true).attribute_set(DrawStyle::Arrays);
        let plan = plan_layout(&config, &set.describe());

        let first = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();
        let position = first.buffer(BufferRole::Position);
        release_instance(&mut device, &mut pool, first).unwrap();

        // Rebuilding the scene reuses the still-populated shared buffers.
        let second = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();
        assert_eq!(second.buffer(BufferRole::Position), position);
        assert_eq!(pool.shared_allocations(), 3);
        release_instance(&mut device, &mut pool, second).unwrap();
        pool.shutdown(&mut device).unwrap();
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_eager_index_buffer_stays_empty_without_indices() {
        let mut device = SoftwareDevice::new();
        let mut pool = BufferPool::new();
        let config = LayoutConfig::parse("bsa.da");
        let set = Cube::new(true, true).attribute_set(DrawStyle::Arrays);
        let plan = plan_layout(&config, &set.describe());

        let buffers = upload_instance(&mut device, &mut pool, &plan, &set, config.packing).unwrap();
        let index = buffers.index_buffer().unwrap();
        assert!(device.buffer_data(index).is_none());
        release_instance(&mut device, &mut pool, buffers).unwrap();
    }
}
