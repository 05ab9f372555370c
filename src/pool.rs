//! Buffer lifetime tracking for per-instance and class-shared buffers.
//!
//! The pool is the single owner of every buffer handle an object class
//! uses. Per-instance buffers are created on demand and destroyed when
//! their instance is destroyed; shared buffers are created exactly once
//! per role and reference-counted across instances, so ten thousand
//! instances of a shared layout still hold one position buffer between
//! them. The allocation counters here are what the sharing guarantees
//! are checked against.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use thiserror::Error;

use crate::device::{BufferHandle, DeviceError, RenderDevice};
use crate::layout::BufferRole;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("buffer {0:?} was already released")]
    AlreadyReleased(BufferHandle),
    #[error("buffer {0:?} is not owned by this pool")]
    UnknownHandle(BufferHandle),
    #[error("shared {0:?} buffer released more times than acquired")]
    SharedUnderflow(BufferRole),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

pub type PoolResult<T> = Result<T, PoolError>;

#[derive(Debug)]
struct SharedSlot {
    handle: BufferHandle,
    ref_count: usize,
    populated: bool,
}

/// Tracks every buffer one object class has allocated.
#[derive(Debug, Default)]
pub struct BufferPool {
    shared: HashMap<BufferRole, SharedSlot>,
    instance_buffers: HashSet<BufferHandle>,
    instance_allocations: usize,
    shared_allocations: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the class-shared buffer for `role`, creating it on first
    /// use. Every later acquire returns the same handle and bumps the
    /// reference count; the allocation counter moves only on creation.
    pub fn acquire_shared(
        &mut self,
        device: &mut dyn RenderDevice,
        role: BufferRole,
    ) -> PoolResult<BufferHandle> {
        if let Some(slot) = self.shared.get_mut(&role) {
            slot.ref_count += 1;
            return Ok(slot.handle);
        }
        let handle = device.create_buffer()?;
        debug!("allocated shared {:?} buffer {:?}", role, handle);
        self.shared.insert(
            role,
            SharedSlot {
                handle,
                ref_count: 1,
                populated: false,
            },
        );
        self.shared_allocations += 1;
        Ok(handle)
    }

    /// Whether the shared buffer for `role` has had its contents uploaded.
    pub fn shared_populated(&self, role: BufferRole) -> bool {
        self.shared.get(&role).is_some_and(|slot| slot.populated)
    }

    /// Record that the shared buffer for `role` now holds its data.
    pub fn mark_shared_populated(&mut self, role: BufferRole) {
        if let Some(slot) = self.shared.get_mut(&role) {
            slot.populated = true;
        }
    }

    /// Drop one reference to the shared buffer for `role`. The slot and
    /// its device buffer stay alive at zero references: shared buffers
    /// are allocated once per class and destroyed only at [`shutdown`],
    /// so instances can come and go without reallocating them. The count
    /// exists for leak diagnostics.
    ///
    /// [`shutdown`]: BufferPool::shutdown
    pub fn release_shared(&mut self, role: BufferRole) -> PoolResult<()> {
        let slot = self
            .shared
            .get_mut(&role)
            .ok_or(PoolError::SharedUnderflow(role))?;
        if slot.ref_count == 0 {
            return Err(PoolError::SharedUnderflow(role));
        }
        slot.ref_count -= 1;
        Ok(())
    }

    /// Allocate a fresh per-instance buffer.
    pub fn acquire_instance(
        &mut self,
        device: &mut dyn RenderDevice,
    ) -> PoolResult<BufferHandle> {
        let handle = device.create_buffer()?;
        self.instance_buffers.insert(handle);
        self.instance_allocations += 1;
        Ok(handle)
    }

    /// Destroy a per-instance buffer. Releasing a handle twice is a
    /// lifecycle bug in the caller and is reported as such.
    pub fn release_instance(
        &mut self,
        device: &mut dyn RenderDevice,
        handle: BufferHandle,
    ) -> PoolResult<()> {
        if !self.instance_buffers.remove(&handle) {
            return Err(PoolError::AlreadyReleased(handle));
        }
        device.destroy_buffer(handle)?;
        Ok(())
    }

    /// Total per-instance buffers created over the pool's lifetime.
    pub fn instance_allocations(&self) -> usize {
        self.instance_allocations
    }

    /// Total shared buffers created over the pool's lifetime.
    pub fn shared_allocations(&self) -> usize {
        self.shared_allocations
    }

    /// Per-instance buffers currently alive.
    pub fn live_instance_buffers(&self) -> usize {
        self.instance_buffers.len()
    }

    /// Shared buffers currently alive.
    pub fn live_shared_buffers(&self) -> usize {
        self.shared.len()
    }

    /// Destroy everything still alive. Instances should have released
    /// their buffers already; anything left here is leaked and logged.
    pub fn shutdown(&mut self, device: &mut dyn RenderDevice) -> PoolResult<()> {
        if !self.instance_buffers.is_empty() {
            warn!(
                "{} per-instance buffers leaked past instance teardown",
                self.instance_buffers.len()
            );
        }
        for handle in std::mem::take(&mut self.instance_buffers) {
            device.destroy_buffer(handle)?;
        }
        for (role, slot) in std::mem::take(&mut self.shared) {
            if slot.ref_count > 0 {
                warn!(
                    "shared {:?} buffer still has {} references at shutdown",
                    role, slot.ref_count
                );
            }
            device.destroy_buffer(slot.handle)?;
        }
        Ok(())
    }
}
