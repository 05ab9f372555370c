//! Host-memory reference implementation of [`RenderDevice`].
//!
//! `SoftwareDevice` models device-resident state in ordinary hash maps:
//! buffer payloads, vertex-array attribute bindings, and uniform stores.
//! It counts buffer allocations and draw calls, and it can read attribute
//! values back through the declared stride/offset, which is what lets the
//! harness verify that different packings of the same data are
//! byte-identical at render time.

use std::collections::HashMap;

use glam::{Mat4, Vec4};

use super::traits::*;

/// Vertex inputs the default program variant exposes.
const DEFAULT_ATTRIBUTES: &[&str] = &["position", "normal", "color"];

/// Uniforms the default program variant exposes.
const DEFAULT_UNIFORMS: &[&str] = &[
    "model",
    "baseColor",
    "compositionModeFlag",
    "projectionViewScene",
    "projection",
    "view",
    "scene",
];

#[derive(Debug, Default)]
struct BufferStore {
    data: Vec<u8>,
    uploaded: bool,
}

#[derive(Debug, Default)]
struct VertexArrayStore {
    attributes: HashMap<u32, (BufferHandle, AttributeBinding)>,
}

/// Software device with a fixed "compiled program" interface.
pub struct SoftwareDevice {
    buffers: HashMap<u64, BufferStore>,
    vertex_arrays: HashMap<u64, VertexArrayStore>,

    attribute_names: HashMap<String, AttributeSlot>,
    uniform_names: HashMap<String, UniformSlot>,

    uniforms_mat4: HashMap<u32, Mat4>,
    uniforms_vec4: HashMap<u32, Vec4>,
    uniforms_f32: HashMap<u32, f32>,
    uniform_uploads: HashMap<u32, u64>,

    next_buffer_id: u64,
    next_vao_id: u64,

    buffer_allocations: u64,
    draw_calls: u64,
    diagnostics: Vec<DeviceCode>,
}

impl SoftwareDevice {
    /// Create a device exposing the default shader-program interface.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_ATTRIBUTES, DEFAULT_UNIFORMS)
    }

    /// Create a device exposing a specific program interface. Names not
    /// listed here resolve to `None`, modeling a shader variant that
    /// legitimately omits an attribute or uniform.
    pub fn with_program(attributes: &[&str], uniforms: &[&str]) -> Self {
        let attribute_names = attributes
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), AttributeSlot(i as u32)))
            .collect();
        let uniform_names = uniforms
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), UniformSlot(i as u32)))
            .collect();

        Self {
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            attribute_names,
            uniform_names,
            uniforms_mat4: HashMap::new(),
            uniforms_vec4: HashMap::new(),
            uniforms_f32: HashMap::new(),
            uniform_uploads: HashMap::new(),
            next_buffer_id: 1,
            next_vao_id: 1,
            buffer_allocations: 0,
            draw_calls: 0,
            diagnostics: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Introspection for the harness and its tests
    // ------------------------------------------------------------------

    /// Total number of buffers ever allocated.
    pub fn buffer_allocations(&self) -> u64 {
        self.buffer_allocations
    }

    /// Number of currently live buffers.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Total number of draw calls issued since the last reset.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    /// Reset the draw-call counter, typically at a frame boundary.
    pub fn reset_draw_calls(&mut self) {
        self.draw_calls = 0;
    }

    /// Raw contents of a buffer, if it exists and has been uploaded.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers
            .get(&buffer.0)
            .filter(|store| store.uploaded)
            .map(|store| store.data.as_slice())
    }

    /// Number of times a named uniform has been uploaded.
    pub fn uniform_upload_count(&self, name: &str) -> u64 {
        self.uniform_names
            .get(name)
            .and_then(|slot| self.uniform_uploads.get(&slot.0))
            .copied()
            .unwrap_or(0)
    }

    /// Current value of a named mat4 uniform.
    pub fn uniform_mat4(&self, name: &str) -> Option<Mat4> {
        let slot = self.uniform_names.get(name)?;
        self.uniforms_mat4.get(&slot.0).copied()
    }

    /// Current value of a named vec4 uniform.
    pub fn uniform_vec4(&self, name: &str) -> Option<Vec4> {
        let slot = self.uniform_names.get(name)?;
        self.uniforms_vec4.get(&slot.0).copied()
    }

    /// Current value of a named scalar uniform.
    pub fn uniform_f32(&self, name: &str) -> Option<f32> {
        let slot = self.uniform_names.get(name)?;
        self.uniforms_f32.get(&slot.0).copied()
    }

    /// Read one attribute value for one vertex through the binding
    /// declared on `vao`, honoring the stride-zero-means-tight convention.
    ///
    /// Components that fall outside the buffer read back as `0.0`, which
    /// mirrors reading a 3-wide buffer through a 4-wide declaration.
    pub fn read_attribute(
        &self,
        vao: VertexArrayHandle,
        slot: AttributeSlot,
        vertex_index: u32,
    ) -> Option<Vec<f32>> {
        let store = self.vertex_arrays.get(&vao.0)?;
        let (buffer, binding) = store.attributes.get(&slot.0)?;
        let data = &self.buffers.get(&buffer.0)?.data;

        let stride = if binding.stride_bytes == 0 {
            binding.components * 4
        } else {
            binding.stride_bytes
        };
        let base = (binding.offset_bytes + stride * vertex_index) as usize;

        let mut value = Vec::with_capacity(binding.components as usize);
        for c in 0..binding.components as usize {
            let at = base + c * 4;
            if at + 4 <= data.len() {
                let bytes = [data[at], data[at + 1], data[at + 2], data[at + 3]];
                value.push(f32::from_le_bytes(bytes));
            } else {
                value.push(0.0);
            }
        }
        Some(value)
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for SoftwareDevice {
    fn create_buffer(&mut self) -> DeviceResult<BufferHandle> {
        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        self.buffers.insert(id, BufferStore::default());
        self.buffer_allocations += 1;
        Ok(BufferHandle(id))
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
        _usage: BufferUsage,
    ) -> DeviceResult<()> {
        let store = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or(DeviceError::UnknownBuffer(buffer))?;
        store.data.clear();
        store.data.extend_from_slice(data);
        store.uploaded = true;
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) -> DeviceResult<()> {
        let bound = self
            .vertex_arrays
            .values()
            .any(|vao| vao.attributes.values().any(|(b, _)| *b == buffer));
        if bound {
            self.diagnostics.push(DeviceCode::InvalidOperation);
            return Err(DeviceError::DestroyWhileBound(buffer));
        }
        self.buffers
            .remove(&buffer.0)
            .map(|_| ())
            .ok_or(DeviceError::UnknownBuffer(buffer))
    }

    fn create_vertex_array(&mut self) -> DeviceResult<VertexArrayHandle> {
        let id = self.next_vao_id;
        self.next_vao_id += 1;
        self.vertex_arrays.insert(id, VertexArrayStore::default());
        Ok(VertexArrayHandle(id))
    }

    fn destroy_vertex_array(&mut self, vao: VertexArrayHandle) -> DeviceResult<()> {
        self.vertex_arrays
            .remove(&vao.0)
            .map(|_| ())
            .ok_or(DeviceError::UnknownVertexArray(vao))
    }

    fn attribute_slot(&self, name: &str) -> Option<AttributeSlot> {
        self.attribute_names.get(name).copied()
    }

    fn uniform_slot(&self, name: &str) -> Option<UniformSlot> {
        self.uniform_names.get(name).copied()
    }

    fn bind_attribute(
        &mut self,
        vao: VertexArrayHandle,
        slot: AttributeSlot,
        buffer: BufferHandle,
        binding: AttributeBinding,
    ) -> DeviceResult<()> {
        if !self.buffers.contains_key(&buffer.0) {
            return Err(DeviceError::UnknownBuffer(buffer));
        }
        let store = self
            .vertex_arrays
            .get_mut(&vao.0)
            .ok_or(DeviceError::UnknownVertexArray(vao))?;
        store.attributes.insert(slot.0, (buffer, binding));
        Ok(())
    }

    fn set_uniform_mat4(&mut self, slot: UniformSlot, value: &Mat4) {
        self.uniforms_mat4.insert(slot.0, *value);
        *self.uniform_uploads.entry(slot.0).or_insert(0) += 1;
    }

    fn set_uniform_vec4(&mut self, slot: UniformSlot, value: Vec4) {
        self.uniforms_vec4.insert(slot.0, value);
        *self.uniform_uploads.entry(slot.0).or_insert(0) += 1;
    }

    fn set_uniform_f32(&mut self, slot: UniformSlot, value: f32) {
        self.uniforms_f32.insert(slot.0, value);
        *self.uniform_uploads.entry(slot.0).or_insert(0) += 1;
    }

    fn draw_triangles(&mut self, vao: VertexArrayHandle, vertex_count: u32) -> DeviceResult<()> {
        if !self.vertex_arrays.contains_key(&vao.0) {
            return Err(DeviceError::UnknownVertexArray(vao));
        }
        if vertex_count % 3 != 0 {
            self.diagnostics.push(DeviceCode::InvalidValue);
        }
        self.draw_calls += 1;
        Ok(())
    }

    fn draw_indexed_triangles(
        &mut self,
        vao: VertexArrayHandle,
        indices: BufferHandle,
        index_count: u32,
    ) -> DeviceResult<()> {
        if !self.vertex_arrays.contains_key(&vao.0) {
            return Err(DeviceError::UnknownVertexArray(vao));
        }
        let store = self
            .buffers
            .get(&indices.0)
            .ok_or(DeviceError::UnknownBuffer(indices))?;
        if (index_count as usize) > store.data.len() {
            self.diagnostics.push(DeviceCode::InvalidValue);
        }
        self.draw_calls += 1;
        Ok(())
    }

    fn poll_diagnostics(&mut self) -> Vec<DeviceCode> {
        std::mem::take(&mut self.diagnostics)
    }
}
