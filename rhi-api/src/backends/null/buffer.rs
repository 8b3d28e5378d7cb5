use super::{next_null_object_id, RhiDeviceContextNull};
use crate::{
    RhiBufferDef, RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiError,
    RhiResourceKind, RhiResourceState, RhiResourceType, RhiResult, RhiTrackedState,
};
use std::convert::TryFrom;

/// A buffer backed by system memory when host visible, and by nothing otherwise
#[derive(Debug)]
pub struct RhiBufferNull {
    device_context: RhiDeviceContextNull,
    buffer_def: RhiBufferDef,
    buffer_id: u64,
    tracked_state: RhiTrackedState,
    data: Option<Vec<u8>>,
    is_mapped: bool,
    cbv: Option<RhiDescriptorIndex>,
    srv: Option<RhiDescriptorIndex>,
    uav: Option<RhiDescriptorIndex>,
    _descriptor_slots: RhiDescriptorSlots,
}

// Fails instead of aborting when the system can't provide the memory
fn allocate_host_memory(size: u64) -> RhiResult<Vec<u8>> {
    let allocation_failed = || {
        RhiError::resource_creation(
            RhiResourceKind::Buffer,
            format!("failed to allocate {} bytes of host memory", size),
        )
    };

    let len = usize::try_from(size).map_err(|_| allocation_failed())?;
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| allocation_failed())?;
    data.resize(len, 0);
    Ok(data)
}

impl RhiBufferNull {
    pub fn new(
        device_context: &RhiDeviceContextNull,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<Self> {
        buffer_def.validate()?;

        let mut descriptor_slots = RhiDescriptorSlots::new(device_context.descriptor_heaps());
        let cbv = descriptor_slots.allocate_if(
            buffer_def.resource_type.is_uniform_buffer(),
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

        let data = if buffer_def.memory_usage.is_host_visible() {
            Some(allocate_host_memory(buffer_def.size)?)
        } else {
            None
        };

        let buffer_id = next_null_object_id();
        log::trace!(
            "Created null buffer {} ({} bytes, {:?})",
            buffer_id,
            buffer_def.size,
            buffer_def.memory_usage
        );

        Ok(RhiBufferNull {
            device_context: device_context.clone(),
            buffer_def: buffer_def.clone(),
            buffer_id,
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            data,
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

    pub fn buffer_id(&self) -> u64 {
        self.buffer_id
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.device_context
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        &self.tracked_state
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
        let memory_usage = self.buffer_def.memory_usage;
        let data = self.data.as_mut().ok_or_else(|| {
            RhiError::resource_creation(
                RhiResourceKind::Buffer,
                format!("map failed: {:?} memory is not host visible", memory_usage),
            )
        })?;

        self.is_mapped = true;
        Ok(data.as_mut_ptr())
    }

    pub fn unmap_buffer(&mut self) -> RhiResult<()> {
        debug_assert!(self.is_mapped);
        self.is_mapped = false;
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
    fn oversized_host_memory_is_an_error() {
        let result = allocate_host_memory(1 << 60);
        assert!(matches!(
            result,
            Err(RhiError::ResourceCreation {
                kind: RhiResourceKind::Buffer,
                ..
            })
        ));
    }

    #[test]
    fn host_memory_starts_zeroed() {
        let data = allocate_host_memory(16).unwrap();
        assert_eq!(data, vec![0u8; 16]);
    }
}
