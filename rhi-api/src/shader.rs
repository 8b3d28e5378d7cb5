#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiShaderDx12;
use crate::null::RhiShaderNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiShaderVulkan;
use crate::{RhiShaderDef, RhiShaderStageFlags};

/// A set of shader stages. Bytecode is compiled when a pipeline is created from the shader, so a
/// malformed module surfaces as a pipeline `ShaderStages` failure.
#[derive(Clone, Debug)]
pub enum RhiShader {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiShaderVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiShaderDx12),
    Null(RhiShaderNull),
}

impl RhiShader {
    pub fn shader_def(&self) -> &RhiShaderDef {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiShader::Vk(inner) => inner.shader_def(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiShader::Dx12(inner) => inner.shader_def(),
            RhiShader::Null(inner) => inner.shader_def(),
        }
    }

    pub fn stage_flags(&self) -> RhiShaderStageFlags {
        self.shader_def().stage_flags()
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_shader(&self) -> Option<&RhiShaderVulkan> {
        match self {
            RhiShader::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_shader(&self) -> Option<&RhiShaderDx12> {
        match self {
            RhiShader::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_shader(&self) -> Option<&RhiShaderNull> {
        match self {
            RhiShader::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
