/// Buffer - one driver storage allocation with optional host mapping

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::gfx_error;
use crate::rhi::{BufferHandle, Driver};

bitflags! {
    /// Storage flags fixed at buffer creation
    ///
    /// The mapping-related bits declare which map accesses the allocation
    /// supports; `map` requests are validated against them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufferStorageFlags: u32 {
        /// Buffer may be mapped for reading
        const MAP_READ = 1 << 0;
        /// Buffer may be mapped for writing
        const MAP_WRITE = 1 << 1;
        /// Mapping may stay live while draws consume the buffer
        const MAP_PERSISTENT = 1 << 2;
        /// Writes through a persistent mapping become visible without a flush
        const MAP_COHERENT = 1 << 3;
        /// Buffer contents may be updated through non-mapped paths
        const DYNAMIC_STORAGE = 1 << 4;
    }
}

bitflags! {
    /// Access mode requested when mapping a buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapAccessFlags: u32 {
        /// Host reads through the mapped pointer
        const READ = 1 << 0;
        /// Host writes through the mapped pointer
        const WRITE = 1 << 1;
        /// Mapping stays live across draw calls
        const PERSISTENT = 1 << 2;
        /// Writes are visible to the driver without an explicit flush
        const COHERENT = 1 << 3;
    }
}

impl MapAccessFlags {
    /// Storage flags the buffer must have been created with for this access
    fn required_storage_flags(self) -> BufferStorageFlags {
        let mut required = BufferStorageFlags::empty();
        if self.contains(MapAccessFlags::READ) {
            required |= BufferStorageFlags::MAP_READ;
        }
        if self.contains(MapAccessFlags::WRITE) {
            required |= BufferStorageFlags::MAP_WRITE;
        }
        if self.contains(MapAccessFlags::PERSISTENT) {
            required |= BufferStorageFlags::MAP_PERSISTENT;
        }
        if self.contains(MapAccessFlags::COHERENT) {
            required |= BufferStorageFlags::MAP_COHERENT;
        }
        required
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Storage flags (immutable for the buffer's lifetime)
    pub flags: BufferStorageFlags,
}

/// One driver storage allocation
///
/// The storage region is allocated once, in the constructor, and its size and
/// flags never change. A buffer is either unmapped or has exactly one live
/// mapped pointer; `unmap` invalidates the pointer returned by the last
/// `map`. The driver allocation is released on drop, which also invalidates
/// any live mapping.
pub struct Buffer {
    driver: Rc<dyn Driver>,
    handle: BufferHandle,
    size: u64,
    flags: BufferStorageFlags,
    mapped: Cell<bool>,
}

impl Buffer {
    /// Allocate a new buffer
    ///
    /// # Arguments
    ///
    /// * `driver` - The driver context that owns the allocation
    /// * `desc` - Size and storage flags
    /// * `initial_data` - Initial contents; must be exactly `desc.size` bytes
    ///   when present
    pub fn new(
        driver: Rc<dyn Driver>,
        desc: &BufferDesc,
        initial_data: Option<&[u8]>,
    ) -> Result<Rc<Buffer>> {
        if let Some(data) = initial_data {
            if data.len() as u64 != desc.size {
                gfx_error!(
                    "prisma::buffer",
                    "initial data is {} bytes but the buffer is {} bytes",
                    data.len(),
                    desc.size
                );
                return Err(Error::InvalidResource(format!(
                    "initial data length {} does not match buffer size {}",
                    data.len(),
                    desc.size
                )));
            }
        }

        let handle = driver.create_buffer(desc.size, initial_data, desc.flags)?;
        Ok(Rc::new(Self {
            driver,
            handle,
            size: desc.size,
            flags: desc.flags,
            mapped: Cell::new(false),
        }))
    }

    /// Buffer size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Storage flags the buffer was created with
    pub fn flags(&self) -> BufferStorageFlags {
        self.flags
    }

    /// Whether a mapping is currently live
    pub fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    /// Driver handle, for components that translate binds
    pub(crate) fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Map the whole buffer into host-visible memory
    ///
    /// Fails if the buffer is already mapped or was not created with storage
    /// flags covering the requested access. The returned pointer is valid
    /// until `unmap` (or, for persistent mappings, until the buffer is
    /// dropped).
    ///
    /// # Safety contract
    ///
    /// Dereferencing the pointer after `unmap` or after the buffer is dropped
    /// is undefined. For non-coherent mappings, writes must be flushed by the
    /// caller; persistent + coherent mappings need no flush but writes must
    /// happen before the draw that consumes them (program order).
    pub fn map(&self, access: MapAccessFlags) -> Result<NonNull<u8>> {
        if self.mapped.get() {
            gfx_error!("prisma::buffer", "map called on an already mapped buffer");
            return Err(Error::InvalidOperation(
                "buffer is already mapped".to_string(),
            ));
        }

        let required = access.required_storage_flags();
        if !self.flags.contains(required) {
            gfx_error!(
                "prisma::buffer",
                "map access {:?} requires storage flags {:?}, buffer has {:?}",
                access,
                required,
                self.flags
            );
            return Err(Error::InvalidOperation(format!(
                "buffer storage flags {:?} do not allow map access {:?}",
                self.flags, access
            )));
        }

        let ptr = self.driver.map_buffer(self.handle, 0, self.size, access)?;
        self.mapped.set(true);
        Ok(ptr)
    }

    /// Invalidate the pointer returned by the last `map`
    pub fn unmap(&self) -> Result<()> {
        if !self.mapped.get() {
            gfx_error!("prisma::buffer", "unmap called on an unmapped buffer");
            return Err(Error::InvalidOperation(
                "buffer is not mapped".to_string(),
            ));
        }
        self.driver.unmap_buffer(self.handle);
        self.mapped.set(false);
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.mapped.get() {
            self.driver.unmap_buffer(self.handle);
        }
        self.driver.destroy_buffer(self.handle);
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
