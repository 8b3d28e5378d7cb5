use super::internal::util;
use super::RhiDeviceContextVulkan;
use crate::{
    RhiBufferDef, RhiError, RhiMemoryUsage, RhiResourceKind, RhiResourceState, RhiResourceType,
    RhiResult, RhiTrackedState,
};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};

/// A vk::Buffer bound to memory from the device's allocator. Host-visible buffers stay mapped
/// for their whole life, so mapping hands out the persistent pointer.
#[derive(Debug)]
pub struct RhiBufferVulkan {
    device_context: RhiDeviceContextVulkan,
    buffer_def: RhiBufferDef,
    buffer: vk::Buffer,
    // Only None while dropping
    allocation: Option<Allocation>,
    allocation_size: u64,
    tracked_state: RhiTrackedState,
    is_mapped: bool,
}

impl Drop for RhiBufferVulkan {
    fn drop(&mut self) {
        log::trace!(
            "destroying buffer {:?} ({} bytes)",
            self.buffer,
            self.allocation_size
        );

        unsafe {
            self.device_context
                .device()
                .destroy_buffer(self.buffer, None);
        }

        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = self.device_context.allocator().lock().free(allocation) {
                log::error!("Failed to free buffer memory: {}", e);
            }
        }
    }
}

impl RhiBufferVulkan {
    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<Self> {
        buffer_def.validate()?;

        let mut allocation_size = buffer_def.size;
        if buffer_def
            .resource_type
            .intersects(RhiResourceType::UNIFORM_BUFFER)
        {
            allocation_size = rhi_base::memory::round_size_up_to_alignment_u64(
                buffer_def.size,
                device_context.limits().min_uniform_buffer_offset_alignment,
            )
        }

        let mut usage_flags = util::resource_type_buffer_usage_flags(buffer_def.resource_type);
        if buffer_def.memory_usage == RhiMemoryUsage::GpuOnly
            || buffer_def.memory_usage == RhiMemoryUsage::CpuToGpu
        {
            usage_flags |= vk::BufferUsageFlags::TRANSFER_DST;
        }

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(allocation_size)
            .usage(usage_flags)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let device = device_context.device();
        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let allocation = device_context
            .allocator()
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "rhi buffer",
                requirements,
                location: buffer_def.memory_usage.into(),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                log::error!("Error allocating {} byte buffer: {}", allocation_size, e);
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e.into());
            }
        };

        let bind_result =
            unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) };
        if let Err(e) = bind_result {
            unsafe { device.destroy_buffer(buffer, None) };
            let _ = device_context.allocator().lock().free(allocation);
            return Err(e.into());
        }

        log::trace!(
            "Buffer {:?} created with size {} ({:?})",
            buffer,
            allocation_size,
            buffer_def.memory_usage
        );

        Ok(RhiBufferVulkan {
            device_context: device_context.clone(),
            buffer_def: buffer_def.clone(),
            buffer,
            allocation: Some(allocation),
            allocation_size,
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            is_mapped: false,
        })
    }

    pub fn buffer_def(&self) -> &RhiBufferDef {
        &self.buffer_def
    }

    pub fn vk_buffer(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.device_context
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        &self.tracked_state
    }

    pub fn map_buffer(&mut self) -> RhiResult<*mut u8> {
        let mapped_ptr = self.allocation.as_ref().and_then(|x| x.mapped_ptr());
        let mapped_ptr = mapped_ptr.ok_or_else(|| {
            RhiError::resource_creation(
                RhiResourceKind::Buffer,
                format!(
                    "map failed: {:?} memory is not host visible",
                    self.buffer_def.memory_usage
                ),
            )
        })?;

        self.is_mapped = true;
        Ok(mapped_ptr.as_ptr() as *mut u8)
    }

    pub fn unmap_buffer(&mut self) -> RhiResult<()> {
        // Host-visible allocations are persistently mapped, nothing to release
        debug_assert!(self.is_mapped);
        self.is_mapped = false;
        Ok(())
    }

    pub fn is_mapped(&self) -> bool {
        self.is_mapped
    }
}
