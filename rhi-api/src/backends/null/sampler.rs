use super::RhiDeviceContextNull;
use crate::{
    RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiResult, RhiSamplerDef,
};
use std::sync::Arc;

#[derive(Debug)]
struct RhiSamplerNullInner {
    device_context: RhiDeviceContextNull,
    sampler_def: RhiSamplerDef,
    descriptor_index: RhiDescriptorIndex,
    _descriptor_slots: RhiDescriptorSlots,
}

#[derive(Clone, Debug)]
pub struct RhiSamplerNull {
    inner: Arc<RhiSamplerNullInner>,
}

impl RhiSamplerNull {
    pub fn new(
        device_context: &RhiDeviceContextNull,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerNull> {
        sampler_def.validate()?;

        let mut descriptor_slots = RhiDescriptorSlots::new(device_context.descriptor_heaps());
        let descriptor_index = descriptor_slots.allocate(RhiDescriptorHeapType::Sampler)?;

        let inner = RhiSamplerNullInner {
            device_context: device_context.clone(),
            sampler_def: sampler_def.clone(),
            descriptor_index,
            _descriptor_slots: descriptor_slots,
        };

        Ok(RhiSamplerNull {
            inner: Arc::new(inner),
        })
    }

    pub fn sampler_def(&self) -> &RhiSamplerDef {
        &self.inner.sampler_def
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.inner.device_context
    }

    pub fn descriptor_index(&self) -> RhiDescriptorIndex {
        self.inner.descriptor_index
    }
}
