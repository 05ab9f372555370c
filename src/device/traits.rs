//! Graphics device abstraction consumed by the harness core.
//!
//! The trait models exactly the API surface the benchmark needs: buffers,
//! vertex arrays, attribute bindings, named uniform slots, and triangle
//! draws. Everything above it is device-agnostic, which is what makes the
//! layout properties testable without a window or a compiled shader.

use glam::{Mat4, Vec4};
use thiserror::Error;

/// Device error type. Only genuinely unrecoverable conditions surface
/// here; advisory conditions go through [`RenderDevice::poll_diagnostics`].
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("unknown vertex array handle {0:?}")]
    UnknownVertexArray(VertexArrayHandle),
    #[error("buffer {0:?} is still bound to a vertex array")]
    DestroyWhileBound(BufferHandle),
    #[error("out of memory")]
    OutOfMemory,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Handle to a device-resident buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub(crate) u64);

/// Resolved location of a vertex attribute in the compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeSlot(pub(crate) u32);

/// Resolved location of a uniform in the compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformSlot(pub(crate) u32);

/// Upload usage hint. The harness only ever uploads once per buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
}

/// How an attribute reads from a bound buffer.
///
/// A stride of zero means tightly packed, matching the convention of the
/// underlying graphics APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub components: u32,
    pub stride_bytes: u32,
    pub offset_bytes: u32,
}

/// Advisory diagnostic codes polled at allocation/upload/draw checkpoints.
/// They are surfaced and logged, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCode {
    InvalidOperation,
    InvalidValue,
    OutOfMemory,
}

/// The graphics API surface the harness consumes.
///
/// All calls are synchronous from the caller's perspective; device-side
/// pipelining is opaque at this level. One logical rendering thread owns
/// every handle, so the trait takes `&mut self` throughout.
pub trait RenderDevice {
    /// Allocate a device buffer without contents.
    fn create_buffer(&mut self) -> DeviceResult<BufferHandle>;

    /// Replace the full contents of a buffer.
    fn upload_buffer(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) -> DeviceResult<()>;

    /// Destroy a buffer. Destroying a buffer still referenced by a vertex
    /// array is a caller error.
    fn destroy_buffer(&mut self, buffer: BufferHandle) -> DeviceResult<()>;

    /// Create a vertex array object.
    fn create_vertex_array(&mut self) -> DeviceResult<VertexArrayHandle>;

    /// Destroy a vertex array object, dropping its attribute bindings.
    fn destroy_vertex_array(&mut self, vao: VertexArrayHandle) -> DeviceResult<()>;

    /// Resolve a named vertex input. `None` means the compiled program
    /// does not expose it; the caller skips the binding.
    fn attribute_slot(&self, name: &str) -> Option<AttributeSlot>;

    /// Resolve a named uniform. `None` means the compiled program does not
    /// expose it; the caller skips the upload.
    fn uniform_slot(&self, name: &str) -> Option<UniformSlot>;

    /// Declare how an attribute reads from a buffer within a vertex array.
    fn bind_attribute(
        &mut self,
        vao: VertexArrayHandle,
        slot: AttributeSlot,
        buffer: BufferHandle,
        binding: AttributeBinding,
    ) -> DeviceResult<()>;

    /// Set a 4x4 matrix uniform.
    fn set_uniform_mat4(&mut self, slot: UniformSlot, value: &Mat4);

    /// Set a vec4 uniform.
    fn set_uniform_vec4(&mut self, slot: UniformSlot, value: Vec4);

    /// Set a scalar uniform.
    fn set_uniform_f32(&mut self, slot: UniformSlot, value: f32);

    /// Issue one non-indexed triangle draw over `vertex_count` vertices.
    fn draw_triangles(&mut self, vao: VertexArrayHandle, vertex_count: u32) -> DeviceResult<()>;

    /// Issue one indexed triangle draw over `index_count` unsigned-byte
    /// indices read from `indices`.
    fn draw_indexed_triangles(
        &mut self,
        vao: VertexArrayHandle,
        indices: BufferHandle,
        index_count: u32,
    ) -> DeviceResult<()>;

    /// Drain pending diagnostic codes.
    fn poll_diagnostics(&mut self) -> Vec<DeviceCode>;
}
