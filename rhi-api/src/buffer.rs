#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiBufferDx12;
use crate::null::RhiBufferNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiBufferVulkan;
use crate::{RhiBufferDef, RhiResourceState, RhiResult, RhiTrackedState};
use std::ops::{Deref, DerefMut};

/// A buffer is a piece of memory that can be accessed by the GPU. It may reside in CPU or GPU
/// memory depending on how it is created.
///
/// Buffers must not be dropped if they are in use by the GPU.
#[derive(Debug)]
pub enum RhiBuffer {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiBufferVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiBufferDx12),
    Null(RhiBufferNull),
}

impl RhiBuffer {
    pub fn buffer_def(&self) -> &RhiBufferDef {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.buffer_def(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiBuffer::Dx12(inner) => inner.buffer_def(),
            RhiBuffer::Null(inner) => inner.buffer_def(),
        }
    }

    /// The state the last recorded barrier left this buffer in. `UNDEFINED` until the first one.
    pub fn current_state(&self) -> RhiResourceState {
        self.tracked_state().get()
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.tracked_state(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiBuffer::Dx12(inner) => inner.tracked_state(),
            RhiBuffer::Null(inner) => inner.tracked_state(),
        }
    }

    /// Maps a host-visible buffer. The memory is unmapped when the returned guard drops. Fails if
    /// the buffer lives in device-local memory.
    pub fn map(&mut self) -> RhiResult<RhiMappedBuffer> {
        let ptr = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.map_buffer(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiBuffer::Dx12(inner) => inner.map_buffer(),
            RhiBuffer::Null(inner) => inner.map_buffer(),
        }?;

        let len = self.buffer_def().size as usize;
        Ok(RhiMappedBuffer {
            buffer: self,
            ptr,
            len,
        })
    }

    /// Copies data into a host-visible buffer at the given byte offset
    pub fn copy_to_host_visible_buffer_with_offset<T: Copy>(
        &mut self,
        data: &[T],
        buffer_byte_offset: u64,
    ) -> RhiResult<()> {
        let bytes = rhi_base::memory::slice_as_bytes(data);
        let buffer_size = self.buffer_def().size;
        let end = buffer_byte_offset
            .checked_add(bytes.len() as u64)
            .filter(|&end| end <= buffer_size)
            .ok_or_else(|| {
                format!(
                    "copy of {} bytes at offset {} overruns buffer of {} bytes",
                    bytes.len(),
                    buffer_byte_offset,
                    buffer_size
                )
            })?;

        // Both fit in the mapped length, which is a usize
        let offset = buffer_byte_offset as usize;
        let end = end as usize;

        let mut mapped = self.map()?;
        mapped[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn copy_to_host_visible_buffer<T: Copy>(
        &mut self,
        data: &[T],
    ) -> RhiResult<()> {
        self.copy_to_host_visible_buffer_with_offset(data, 0)
    }

    fn unmap(&mut self) -> RhiResult<()> {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.unmap_buffer(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiBuffer::Dx12(inner) => inner.unmap_buffer(),
            RhiBuffer::Null(inner) => inner.unmap_buffer(),
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_buffer(&self) -> Option<&RhiBufferVulkan> {
        match self {
            RhiBuffer::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_buffer(&self) -> Option<&RhiBufferDx12> {
        match self {
            RhiBuffer::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_buffer(&self) -> Option<&RhiBufferNull> {
        match self {
            RhiBuffer::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Host-visible buffer memory, valid while this guard lives
pub struct RhiMappedBuffer<'a> {
    buffer: &'a mut RhiBuffer,
    ptr: *mut u8,
    len: usize,
}

impl<'a> Deref for RhiMappedBuffer<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<'a> DerefMut for RhiMappedBuffer<'a> {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl<'a> Drop for RhiMappedBuffer<'a> {
    fn drop(&mut self) {
        if let Err(e) = self.buffer.unmap() {
            log::error!("Failed to unmap buffer: {}", e);
        }
    }
}
