use super::d3d12;
use crate::{RhiDescriptorHeapSizes, RhiDescriptorHeapType, RhiDescriptorIndex, RhiResult};

// Slot indices come from the shared RhiDescriptorHeaps, these heaps only turn an index into a
// CPU handle. Nothing here is shader visible.
pub(crate) struct CpuDescriptorHeap {
    // Keeps the memory behind cpu_first_handle alive
    _heap: d3d12::ID3D12DescriptorHeap,
    cpu_first_handle: d3d12::D3D12_CPU_DESCRIPTOR_HANDLE,
    stride: u32,
    capacity: u32,
}

impl CpuDescriptorHeap {
    fn new(
        device: &d3d12::ID3D12Device,
        heap_type: d3d12::D3D12_DESCRIPTOR_HEAP_TYPE,
        capacity: u32,
    ) -> RhiResult<Self> {
        let heap_desc = d3d12::D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type,
            // Creating a zero-sized heap fails
            NumDescriptors: capacity.max(1),
            Flags: d3d12::D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
            NodeMask: 0,
        };

        let heap: d3d12::ID3D12DescriptorHeap;
        let cpu_first_handle;
        let stride;

        unsafe {
            heap = device.CreateDescriptorHeap(&heap_desc)?;
            cpu_first_handle = heap.GetCPUDescriptorHandleForHeapStart();
            stride = device.GetDescriptorHandleIncrementSize(heap_type);
        }

        log::trace!(
            "Created cpu descriptor heap {:?} with {} descriptors, start {}",
            heap_type,
            capacity,
            cpu_first_handle.ptr
        );

        Ok(CpuDescriptorHeap {
            _heap: heap,
            cpu_first_handle,
            stride,
            capacity,
        })
    }

    pub(crate) fn cpu_handle(
        &self,
        index: RhiDescriptorIndex,
    ) -> d3d12::D3D12_CPU_DESCRIPTOR_HANDLE {
        debug_assert!(index.0 < self.capacity);
        d3d12::D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: self.cpu_first_handle.ptr + (index.0 as usize * self.stride as usize),
        }
    }
}

/// One native heap per slot pool, sized the same so every index maps to a handle
pub(crate) struct CpuDescriptorHeapSet {
    cbv_srv_uav: CpuDescriptorHeap,
    sampler: CpuDescriptorHeap,
    rtv: CpuDescriptorHeap,
    dsv: CpuDescriptorHeap,
}

impl CpuDescriptorHeapSet {
    pub(crate) fn new(
        device: &d3d12::ID3D12Device,
        heap_sizes: &RhiDescriptorHeapSizes,
    ) -> RhiResult<Self> {
        Ok(CpuDescriptorHeapSet {
            cbv_srv_uav: CpuDescriptorHeap::new(
                device,
                d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                heap_sizes.cbv_srv_uav,
            )?,
            sampler: CpuDescriptorHeap::new(
                device,
                d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
                heap_sizes.sampler,
            )?,
            rtv: CpuDescriptorHeap::new(
                device,
                d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                heap_sizes.rtv,
            )?,
            dsv: CpuDescriptorHeap::new(
                device,
                d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
                heap_sizes.dsv,
            )?,
        })
    }

    pub(crate) fn heap(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> &CpuDescriptorHeap {
        match heap_type {
            RhiDescriptorHeapType::CbvSrvUav => &self.cbv_srv_uav,
            RhiDescriptorHeapType::Sampler => &self.sampler,
            RhiDescriptorHeapType::Rtv => &self.rtv,
            RhiDescriptorHeapType::Dsv => &self.dsv,
        }
    }

    pub(crate) fn cpu_handle(
        &self,
        heap_type: RhiDescriptorHeapType,
        index: RhiDescriptorIndex,
    ) -> d3d12::D3D12_CPU_DESCRIPTOR_HANDLE {
        self.heap(heap_type).cpu_handle(index)
    }
}
