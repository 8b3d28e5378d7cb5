use super::RhiDeviceContextVulkan;
use crate::{RhiCompareOp, RhiMipMapMode, RhiResult, RhiSamplerDef};
use ash::vk;
use std::sync::Arc;

struct RhiSamplerVulkanInner {
    device_context: RhiDeviceContextVulkan,
    sampler_def: RhiSamplerDef,
    sampler: vk::Sampler,
}

impl Drop for RhiSamplerVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_sampler(self.sampler, None);
        }
    }
}

#[derive(Clone)]
pub struct RhiSamplerVulkan {
    inner: Arc<RhiSamplerVulkanInner>,
}

impl std::fmt::Debug for RhiSamplerVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("RhiSamplerVulkan")
            .field("sampler", &self.inner.sampler)
            .finish()
    }
}

impl RhiSamplerVulkan {
    pub fn sampler_def(&self) -> &RhiSamplerDef {
        &self.inner.sampler_def
    }

    pub fn vk_sampler(&self) -> vk::Sampler {
        self.inner.sampler
    }

    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerVulkan> {
        sampler_def.validate()?;

        let max_lod = if sampler_def.mip_map_mode == RhiMipMapMode::Linear {
            f32::MAX
        } else {
            0.0
        };

        let anisotropy_supported = device_context.enabled_features().sampler_anisotropy == vk::TRUE;
        let max_anisotropy = sampler_def
            .max_anisotropy
            .min(device_context.limits().max_sampler_anisotropy);
        if sampler_def.max_anisotropy > 0.0 && !anisotropy_supported {
            log::warn!("Sampler requested anisotropic filtering but the device doesn't support it");
        }

        let sampler_create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(sampler_def.mag_filter.into())
            .min_filter(sampler_def.min_filter.into())
            .mipmap_mode(sampler_def.mip_map_mode.into())
            .address_mode_u(sampler_def.address_mode_u.into())
            .address_mode_v(sampler_def.address_mode_v.into())
            .address_mode_w(sampler_def.address_mode_w.into())
            .mip_lod_bias(sampler_def.mip_lod_bias)
            .anisotropy_enable(anisotropy_supported && max_anisotropy > 0.0)
            .max_anisotropy(max_anisotropy)
            .compare_enable(sampler_def.compare_op != RhiCompareOp::Never)
            .compare_op(sampler_def.compare_op.into())
            .min_lod(sampler_def.mip_lod_bias)
            .max_lod(max_lod)
            .border_color(vk::BorderColor::FLOAT_TRANSPARENT_BLACK)
            .unnormalized_coordinates(false);

        let sampler = unsafe {
            device_context
                .device()
                .create_sampler(&*sampler_create_info, None)?
        };

        let inner = RhiSamplerVulkanInner {
            device_context: device_context.clone(),
            sampler_def: sampler_def.clone(),
            sampler,
        };

        Ok(RhiSamplerVulkan {
            inner: Arc::new(inner),
        })
    }
}
