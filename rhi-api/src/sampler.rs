#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiSamplerDx12;
use crate::null::RhiSamplerNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiSamplerVulkan;
use crate::RhiSamplerDef;

/// Configures how images will be sampled by the GPU. Each sampler holds one slot of the device's
/// sampler table until it is dropped.
#[derive(Clone, Debug)]
pub enum RhiSampler {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiSamplerVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiSamplerDx12),
    Null(RhiSamplerNull),
}

impl RhiSampler {
    pub fn sampler_def(&self) -> &RhiSamplerDef {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiSampler::Vk(inner) => inner.sampler_def(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiSampler::Dx12(inner) => inner.sampler_def(),
            RhiSampler::Null(inner) => inner.sampler_def(),
        }
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_sampler(&self) -> Option<&RhiSamplerVulkan> {
        match self {
            RhiSampler::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_sampler(&self) -> Option<&RhiSamplerDx12> {
        match self {
            RhiSampler::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_sampler(&self) -> Option<&RhiSamplerNull> {
        match self {
            RhiSampler::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
