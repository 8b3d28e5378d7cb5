#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Pixel and vertex attribute formats. Names follow VkFormat.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiFormat {
    UNDEFINED,
    R8_UNORM,
    R8G8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16_UINT,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl Default for RhiFormat {
    fn default() -> Self {
        RhiFormat::UNDEFINED
    }
}

impl RhiFormat {
    pub fn has_depth(self) -> bool {
        match self {
            RhiFormat::D16_UNORM
            | RhiFormat::D32_SFLOAT
            | RhiFormat::D24_UNORM_S8_UINT
            | RhiFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_stencil(self) -> bool {
        match self {
            RhiFormat::D24_UNORM_S8_UINT | RhiFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_depth_or_stencil(self) -> bool {
        self.has_depth() || self.has_stencil()
    }

    pub fn is_srgb(self) -> bool {
        match self {
            RhiFormat::R8G8B8A8_SRGB | RhiFormat::B8G8R8A8_SRGB => true,
            _ => false,
        }
    }

    /// Size of one texel (or one vertex attribute) in bytes. None for UNDEFINED.
    pub fn block_or_pixel_size_in_bytes(self) -> Option<u32> {
        let size = match self {
            RhiFormat::UNDEFINED => return None,
            RhiFormat::R8_UNORM => 1,
            RhiFormat::R8G8_UNORM | RhiFormat::R16_UINT | RhiFormat::D16_UNORM => 2,
            RhiFormat::R8G8B8A8_UNORM
            | RhiFormat::R8G8B8A8_SRGB
            | RhiFormat::B8G8R8A8_UNORM
            | RhiFormat::B8G8R8A8_SRGB
            | RhiFormat::R32_UINT
            | RhiFormat::R32_SFLOAT
            | RhiFormat::D32_SFLOAT
            | RhiFormat::D24_UNORM_S8_UINT => 4,
            RhiFormat::R16G16B16A16_SFLOAT
            | RhiFormat::R32G32_SFLOAT
            | RhiFormat::D32_SFLOAT_S8_UINT => 8,
            RhiFormat::R32G32B32_SFLOAT => 12,
            RhiFormat::R32G32B32A32_SFLOAT => 16,
        };

        Some(size)
    }

    /// Formats that can be bound as a color attachment
    pub fn supports_color_attachment(self) -> bool {
        match self {
            RhiFormat::UNDEFINED | RhiFormat::R32G32B32_SFLOAT => false,
            x => !x.has_depth_or_stencil(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_report_stencil_only_when_present() {
        assert!(RhiFormat::D32_SFLOAT.has_depth());
        assert!(!RhiFormat::D32_SFLOAT.has_stencil());
        assert!(!RhiFormat::D16_UNORM.has_stencil());
        assert!(RhiFormat::D24_UNORM_S8_UINT.has_stencil());
        assert!(RhiFormat::D32_SFLOAT_S8_UINT.has_depth_or_stencil());
        assert!(!RhiFormat::R8G8B8A8_UNORM.has_depth_or_stencil());
    }

    #[test]
    fn color_attachment_support() {
        assert!(RhiFormat::R8G8B8A8_UNORM.supports_color_attachment());
        assert!(!RhiFormat::D32_SFLOAT.supports_color_attachment());
        assert!(!RhiFormat::UNDEFINED.supports_color_attachment());
    }
}
