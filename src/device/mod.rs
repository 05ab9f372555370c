//! Device abstraction and the host-memory reference implementation.

pub mod software;
pub mod traits;

pub use software::SoftwareDevice;
pub use traits::{
    AttributeBinding, AttributeSlot, BufferHandle, BufferUsage, DeviceCode, DeviceError,
    DeviceResult, RenderDevice, UniformSlot, VertexArrayHandle,
};

use log::warn;

/// Drain and log any pending device diagnostics. Called at the defined
/// checkpoints around allocation, upload, and draw boundaries.
pub fn log_diagnostics(device: &mut dyn RenderDevice, checkpoint: &str) {
    for code in device.poll_diagnostics() {
        warn!("device diagnostic at {}: {:?}", checkpoint, code);
    }
}
