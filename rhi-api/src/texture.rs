#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiTextureDx12;
use crate::null::RhiTextureNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiTextureVulkan;
use crate::{RhiExtents3D, RhiResourceState, RhiTextureDef, RhiTrackedState};

/// An image that can be used by the GPU. Cloning is cheap and clones refer to the same image.
///
/// Textures must not be dropped if they are in use by the GPU.
#[derive(Clone, Debug)]
pub enum RhiTexture {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiTextureVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiTextureDx12),
    Null(RhiTextureNull),
}

impl RhiTexture {
    /// Return the metadata used to create the texture
    pub fn texture_def(&self) -> &RhiTextureDef {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiTexture::Vk(inner) => inner.texture_def(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiTexture::Dx12(inner) => inner.texture_def(),
            RhiTexture::Null(inner) => inner.texture_def(),
        }
    }

    pub fn extents(&self) -> &RhiExtents3D {
        &self.texture_def().extents
    }

    /// The state the last recorded barrier left this texture in. A new texture is `UNDEFINED`.
    pub fn current_state(&self) -> RhiResourceState {
        self.tracked_state().get()
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiTexture::Vk(inner) => inner.tracked_state(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiTexture::Dx12(inner) => inner.tracked_state(),
            RhiTexture::Null(inner) => inner.tracked_state(),
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_texture(&self) -> Option<&RhiTextureVulkan> {
        match self {
            RhiTexture::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_texture(&self) -> Option<&RhiTextureDx12> {
        match self {
            RhiTexture::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_texture(&self) -> Option<&RhiTextureNull> {
        match self {
            RhiTexture::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<RhiTextureVulkan> for RhiTexture {
    fn from(texture: RhiTextureVulkan) -> Self {
        RhiTexture::Vk(texture)
    }
}

#[cfg(all(windows, feature = "rhi-dx12"))]
impl From<RhiTextureDx12> for RhiTexture {
    fn from(texture: RhiTextureDx12) -> Self {
        RhiTexture::Dx12(texture)
    }
}
