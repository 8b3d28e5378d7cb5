use super::internal::{d3d12, dxgi};
use super::RhiDeviceContextDx12;
use crate::{
    RhiBufferDef, RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiError,
    RhiMemoryUsage, RhiResourceKind, RhiResourceState, RhiResourceType, RhiResult,
    RhiTrackedState,
};
use gpu_allocator::d3d12::{Allocation, AllocationCreateDesc, ResourceCategory};

// A CBV can't address more than this, larger uniform buffers get no full-buffer view
const MAX_CONSTANT_BUFFER_VIEW_SIZE: u64 = 65536;

/// A placed resource in memory from the device's allocator. Views live in the device's CPU
/// descriptor heaps at the indices this buffer holds.
#[derive(Debug)]
pub struct RhiBufferDx12 {
    device_context: RhiDeviceContextDx12,
    buffer_def: RhiBufferDef,
    resource: d3d12::ID3D12Resource,
    // Only None while dropping
    allocation: Option<Allocation>,
    gpu_address: u64,
    // What the resource was created in, stands in for UNDEFINED in the first barrier
    initial_state: RhiResourceState,
    tracked_state: RhiTrackedState,
    is_mapped: bool,
    cbv: Option<RhiDescriptorIndex>,
    srv: Option<RhiDescriptorIndex>,
    uav: Option<RhiDescriptorIndex>,
    _descriptor_slots: RhiDescriptorSlots,
}

// ID3D12Resource is free-threaded
unsafe impl Send for RhiBufferDx12 {}
unsafe impl Sync for RhiBufferDx12 {}

impl Drop for RhiBufferDx12 {
    fn drop(&mut self) {
        log::trace!("destroying buffer {:?}", self.resource);
        if self.is_mapped {
            unsafe { self.resource.Unmap(0, None) };
        }

        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = self.device_context.allocator().lock().free(allocation) {
                log::error!("Failed to free buffer memory: {}", e);
            }
        }
    }
}

fn initial_resource_state(memory_usage: RhiMemoryUsage) -> RhiResourceState {
    // Upload heaps must stay in GENERIC_READ, readback heaps in COPY_DST
    match memory_usage {
        RhiMemoryUsage::CpuToGpu | RhiMemoryUsage::CpuOnly => RhiResourceState::GENERIC_READ,
        RhiMemoryUsage::GpuToCpu => RhiResourceState::COPY_DST,
        RhiMemoryUsage::GpuOnly | RhiMemoryUsage::Unknown => RhiResourceState::COPY_DST,
    }
}

impl RhiBufferDx12 {
    pub fn new(
        device_context: &RhiDeviceContextDx12,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<Self> {
        buffer_def.validate()?;

        let mut allocation_size = buffer_def.size;
        if buffer_def.resource_type.is_uniform_buffer() {
            allocation_size = rhi_base::memory::round_size_up_to_alignment_u64(
                buffer_def.size,
                device_context
                    .device_info()
                    .min_uniform_buffer_offset_alignment as u64,
            )
        }

        let mut desc = d3d12::D3D12_RESOURCE_DESC {
            Dimension: d3d12::D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: d3d12::D3D12_DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT as u64,
            Width: allocation_size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: dxgi::Common::DXGI_FORMAT_UNKNOWN,
            SampleDesc: dxgi::Common::DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: d3d12::D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: d3d12::D3D12_RESOURCE_FLAG_NONE,
        };

        if buffer_def
            .resource_type
            .intersects(RhiResourceType::BUFFER_READ_WRITE)
        {
            desc.Flags |= d3d12::D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS;
        }

        // Slots come first so running out of them doesn't leave memory to unwind
        let mut descriptor_slots = RhiDescriptorSlots::new(device_context.descriptor_heaps());
        let cbv = descriptor_slots.allocate_if(
            buffer_def.resource_type.is_uniform_buffer()
                && allocation_size < MAX_CONSTANT_BUFFER_VIEW_SIZE,
            RhiDescriptorHeapType::CbvSrvUav,
        )?;
        let srv = descriptor_slots.allocate_if(
            buffer_def.resource_type.intersects(RhiResourceType::BUFFER),
            RhiDescriptorHeapType::CbvSrvUav,
        )?;
        let uav = descriptor_slots.allocate_if(
            buffer_def
                .resource_type
                .intersects(RhiResourceType::BUFFER_READ_WRITE),
            RhiDescriptorHeapType::CbvSrvUav,
        )?;

        let start_state = initial_resource_state(buffer_def.memory_usage);

        let allocation = device_context
            .allocator()
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "rhi buffer",
                location: buffer_def.memory_usage.into(),
                size: allocation_size,
                alignment: d3d12::D3D12_DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT as u64,
                resource_category: ResourceCategory::Buffer,
            })?;

        let mut resource: Option<d3d12::ID3D12Resource> = None;
        let create_result = unsafe {
            device_context.d3d12_device().CreatePlacedResource(
                allocation.heap(),
                allocation.offset(),
                &desc,
                start_state.into(),
                None,
                &mut resource,
            )
        };

        let resource = match create_result.map(|_| resource) {
            Ok(Some(resource)) => resource,
            result => {
                let _ = device_context.allocator().lock().free(allocation);
                return Err(match result {
                    Err(e) => e.into(),
                    _ => RhiError::resource_creation(
                        RhiResourceKind::Buffer,
                        "CreatePlacedResource returned no resource",
                    ),
                });
            }
        };

        let gpu_address = unsafe { resource.GetGPUVirtualAddress() };
        let device = device_context.d3d12_device();

        if let Some(cbv) = cbv {
            let cbv_desc = d3d12::D3D12_CONSTANT_BUFFER_VIEW_DESC {
                BufferLocation: gpu_address,
                SizeInBytes: allocation_size as u32,
            };

            let handle =
                device_context.cpu_descriptor_handle(RhiDescriptorHeapType::CbvSrvUav, cbv);
            unsafe { device.CreateConstantBufferView(Some(&cbv_desc), handle) };
        }

        // Storage views are raw-sized as 4-byte structured elements
        let element_count = (buffer_def.size / 4) as u32;

        if let Some(srv) = srv {
            let mut srv_desc = d3d12::D3D12_SHADER_RESOURCE_VIEW_DESC {
                Format: dxgi::Common::DXGI_FORMAT_UNKNOWN,
                ViewDimension: d3d12::D3D12_SRV_DIMENSION_BUFFER,
                Shader4ComponentMapping: d3d12::D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
                ..Default::default()
            };
            srv_desc.Anonymous.Buffer = d3d12::D3D12_BUFFER_SRV {
                FirstElement: 0,
                NumElements: element_count,
                StructureByteStride: 4,
                Flags: d3d12::D3D12_BUFFER_SRV_FLAG_NONE,
            };

            let handle =
                device_context.cpu_descriptor_handle(RhiDescriptorHeapType::CbvSrvUav, srv);
            unsafe { device.CreateShaderResourceView(&resource, Some(&srv_desc), handle) };
        }

        if let Some(uav) = uav {
            let mut uav_desc = d3d12::D3D12_UNORDERED_ACCESS_VIEW_DESC {
                Format: dxgi::Common::DXGI_FORMAT_UNKNOWN,
                ViewDimension: d3d12::D3D12_UAV_DIMENSION_BUFFER,
                ..Default::default()
            };
            uav_desc.Anonymous.Buffer = d3d12::D3D12_BUFFER_UAV {
                FirstElement: 0,
                NumElements: element_count,
                StructureByteStride: 4,
                CounterOffsetInBytes: 0,
                Flags: d3d12::D3D12_BUFFER_UAV_FLAG_NONE,
            };

            let handle =
                device_context.cpu_descriptor_handle(RhiDescriptorHeapType::CbvSrvUav, uav);
            unsafe { device.CreateUnorderedAccessView(&resource, None, Some(&uav_desc), handle) };
        }

        log::trace!(
            "Buffer {:?} created with size {} ({:?})",
            resource,
            allocation_size,
            buffer_def.memory_usage
        );

        Ok(RhiBufferDx12 {
            device_context: device_context.clone(),
            buffer_def: buffer_def.clone(),
            resource,
            allocation: Some(allocation),
            gpu_address,
            initial_state: start_state,
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            is_mapped: false,
            cbv,
            srv,
            uav,
            _descriptor_slots: descriptor_slots,
        })
    }

    pub fn buffer_def(&self) -> &RhiBufferDef {
        &self.buffer_def
    }

    pub fn device_context(&self) -> &RhiDeviceContextDx12 {
        &self.device_context
    }

    pub fn dx12_resource(&self) -> &d3d12::ID3D12Resource {
        &self.resource
    }

    pub fn gpu_address(&self) -> u64 {
        self.gpu_address
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        &self.tracked_state
    }

    pub(crate) fn initial_state(&self) -> RhiResourceState {
        self.initial_state
    }

    pub fn cbv(&self) -> Option<RhiDescriptorIndex> {
        self.cbv
    }

    pub fn srv(&self) -> Option<RhiDescriptorIndex> {
        self.srv
    }

    pub fn uav(&self) -> Option<RhiDescriptorIndex> {
        self.uav
    }

    pub fn map_buffer(&mut self) -> RhiResult<*mut u8> {
        if !self.buffer_def.memory_usage.is_host_visible() {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Buffer,
                format!(
                    "map failed: {:?} memory is not host visible",
                    self.buffer_def.memory_usage
                ),
            ));
        }

        let mut mapped_ptr = std::ptr::null_mut::<std::ffi::c_void>();
        unsafe {
            self.resource.Map(0, None, Some(&mut mapped_ptr))?;
        }

        // D3D12 counts maps per resource, keep ours balanced at one
        if self.is_mapped {
            unsafe { self.resource.Unmap(0, None) };
        }

        self.is_mapped = true;
        Ok(mapped_ptr as *mut u8)
    }

    pub fn unmap_buffer(&mut self) -> RhiResult<()> {
        debug_assert!(self.is_mapped);
        if self.is_mapped {
            unsafe { self.resource.Unmap(0, None) };
            self.is_mapped = false;
        }

        Ok(())
    }

    pub fn is_mapped(&self) -> bool {
        self.is_mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_visible_buffers_start_readable_by_their_heap() {
        assert_eq!(
            initial_resource_state(RhiMemoryUsage::CpuToGpu),
            RhiResourceState::GENERIC_READ
        );
        assert_eq!(
            initial_resource_state(RhiMemoryUsage::GpuToCpu),
            RhiResourceState::COPY_DST
        );
        assert_eq!(
            initial_resource_state(RhiMemoryUsage::GpuOnly),
            RhiResourceState::COPY_DST
        );
    }
}
