use super::internal::{conversions, d3d12};
use super::RhiDeviceContextDx12;
use crate::{
    RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiMipMapMode, RhiResult,
    RhiSamplerDef,
};
use std::sync::Arc;

#[derive(Debug)]
struct RhiSamplerDx12Inner {
    sampler_def: RhiSamplerDef,
    sampler_desc: d3d12::D3D12_SAMPLER_DESC,
    sampler_descriptor: RhiDescriptorIndex,
    _descriptor_slots: RhiDescriptorSlots,
}

/// A sampler written into one slot of the device's sampler heap
#[derive(Debug, Clone)]
pub struct RhiSamplerDx12 {
    inner: Arc<RhiSamplerDx12Inner>,
}

impl RhiSamplerDx12 {
    pub fn sampler_def(&self) -> &RhiSamplerDef {
        &self.inner.sampler_def
    }

    pub fn dx12_sampler_descriptor(&self) -> RhiDescriptorIndex {
        self.inner.sampler_descriptor
    }

    pub fn dx12_sampler_desc(&self) -> &d3d12::D3D12_SAMPLER_DESC {
        &self.inner.sampler_desc
    }

    pub fn new(
        device_context: &RhiDeviceContextDx12,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerDx12> {
        sampler_def.validate()?;

        let max_lod = match sampler_def.mip_map_mode {
            RhiMipMapMode::Nearest => 0.0,
            RhiMipMapMode::Linear => f32::MAX,
        };

        let sampler_desc = d3d12::D3D12_SAMPLER_DESC {
            Filter: conversions::sampler_def_filter(sampler_def),
            AddressU: sampler_def.address_mode_u.into(),
            AddressV: sampler_def.address_mode_v.into(),
            AddressW: sampler_def.address_mode_w.into(),
            MipLODBias: sampler_def.mip_lod_bias,
            MaxAnisotropy: (sampler_def.max_anisotropy as u32).clamp(1, 16),
            ComparisonFunc: sampler_def.compare_op.into(),
            BorderColor: [0.0, 0.0, 0.0, 0.0],
            MinLOD: 0.0,
            MaxLOD: max_lod,
        };

        let mut descriptor_slots = RhiDescriptorSlots::new(device_context.descriptor_heaps());
        let sampler_descriptor = descriptor_slots.allocate(RhiDescriptorHeapType::Sampler)?;
        unsafe {
            device_context.d3d12_device().CreateSampler(
                &sampler_desc,
                device_context
                    .cpu_descriptor_handle(RhiDescriptorHeapType::Sampler, sampler_descriptor),
            )
        };

        let inner = RhiSamplerDx12Inner {
            sampler_def: sampler_def.clone(),
            sampler_desc,
            sampler_descriptor,
            _descriptor_slots: descriptor_slots,
        };

        Ok(RhiSamplerDx12 {
            inner: Arc::new(inner),
        })
    }
}
