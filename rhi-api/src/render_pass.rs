#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiRenderPassDx12;
use crate::null::RhiRenderPassNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiRenderPassVulkan;
use crate::{RhiFormat, RhiLoadOp, RhiRenderPassDef, RhiResourceState, RhiSampleCount};

impl RhiRenderPassDef {
    pub fn color_attachment_count(&self) -> usize {
        self.color_attachments.len()
    }

    pub fn depth_stencil_format(&self) -> Option<RhiFormat> {
        self.depth_stencil_attachment.as_ref().map(|x| x.format)
    }

    /// True if color attachment `index` is cleared when the pass begins. Whether the result is
    /// stored afterwards doesn't matter. Out of range indices never clear.
    pub fn should_clear_color(
        &self,
        index: usize,
    ) -> bool {
        self.color_attachments
            .get(index)
            .map(|x| x.load_op == RhiLoadOp::Clear)
            .unwrap_or(false)
    }

    pub fn should_clear_depth_stencil(&self) -> bool {
        self.depth_stencil_attachment
            .as_ref()
            .map(|x| x.load_op == RhiLoadOp::Clear)
            .unwrap_or(false)
    }

    /// Depth and stencil share a load op, but only formats with a stencil channel clear it
    pub fn should_clear_stencil(&self) -> bool {
        self.should_clear_depth_stencil()
            && self
                .depth_stencil_format()
                .map(|x| x.has_stencil())
                .unwrap_or(false)
    }

    /// State color attachment `index` is left in after the pass
    pub fn color_final_state(
        &self,
        index: usize,
    ) -> RhiResourceState {
        self.color_attachments
            .get(index)
            .and_then(|x| x.final_state)
            .unwrap_or(RhiResourceState::RENDER_TARGET)
    }

    pub fn depth_stencil_final_state(&self) -> RhiResourceState {
        self.depth_stencil_attachment
            .as_ref()
            .and_then(|x| x.final_state)
            .unwrap_or(RhiResourceState::DEPTH_WRITE)
    }
}

/// Describes the attachments a set of draws renders into and what happens to their contents at
/// the start and end of the pass. Immutable once created.
#[derive(Clone, Debug)]
pub enum RhiRenderPass {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiRenderPassVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiRenderPassDx12),
    Null(RhiRenderPassNull),
}

impl RhiRenderPass {
    pub fn render_pass_def(&self) -> &RhiRenderPassDef {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiRenderPass::Vk(inner) => inner.render_pass_def(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiRenderPass::Dx12(inner) => inner.render_pass_def(),
            RhiRenderPass::Null(inner) => inner.render_pass_def(),
        }
    }

    pub fn color_attachment_count(&self) -> usize {
        self.render_pass_def().color_attachment_count()
    }

    pub fn has_depth_stencil(&self) -> bool {
        self.render_pass_def().depth_stencil_attachment.is_some()
    }

    pub fn sample_count(&self) -> RhiSampleCount {
        self.render_pass_def().sample_count
    }

    pub fn should_clear_color(
        &self,
        index: usize,
    ) -> bool {
        self.render_pass_def().should_clear_color(index)
    }

    pub fn should_clear_depth_stencil(&self) -> bool {
        self.render_pass_def().should_clear_depth_stencil()
    }

    pub fn should_clear_stencil(&self) -> bool {
        self.render_pass_def().should_clear_stencil()
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_render_pass(&self) -> Option<&RhiRenderPassVulkan> {
        match self {
            RhiRenderPass::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_render_pass(&self) -> Option<&RhiRenderPassDx12> {
        match self {
            RhiRenderPass::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_render_pass(&self) -> Option<&RhiRenderPassNull> {
        match self {
            RhiRenderPass::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn color(load_op: RhiLoadOp, store_op: RhiStoreOp) -> RhiColorAttachmentDef {
        RhiColorAttachmentDef {
            format: RhiFormat::R8G8B8A8_UNORM,
            load_op,
            store_op,
            final_state: None,
        }
    }

    fn pass_with_depth(format: RhiFormat) -> RhiRenderPassDef {
        RhiRenderPassDef {
            color_attachments: vec![],
            depth_stencil_attachment: Some(RhiDepthStencilAttachmentDef {
                format,
                load_op: RhiLoadOp::Clear,
                store_op: RhiStoreOp::DontCare,
                final_state: None,
            }),
            sample_count: RhiSampleCount::SampleCount1,
        }
    }

    #[test]
    fn clear_color_follows_load_op_only() {
        let def = RhiRenderPassDef {
            color_attachments: vec![
                color(RhiLoadOp::Clear, RhiStoreOp::Store),
                color(RhiLoadOp::Clear, RhiStoreOp::DontCare),
                color(RhiLoadOp::Load, RhiStoreOp::Store),
                color(RhiLoadOp::DontCare, RhiStoreOp::Store),
            ],
            ..Default::default()
        };

        assert!(def.should_clear_color(0));
        assert!(def.should_clear_color(1));
        assert!(!def.should_clear_color(2));
        assert!(!def.should_clear_color(3));
        assert!(!def.should_clear_color(4));
        assert!(!def.should_clear_depth_stencil());
    }

    #[test]
    fn stencil_clear_requires_stencil_format() {
        let depth_only = pass_with_depth(RhiFormat::D32_SFLOAT);
        assert!(depth_only.should_clear_depth_stencil());
        assert!(!depth_only.should_clear_stencil());

        assert!(!pass_with_depth(RhiFormat::D16_UNORM).should_clear_stencil());

        let depth_stencil = pass_with_depth(RhiFormat::D24_UNORM_S8_UINT);
        assert!(depth_stencil.should_clear_depth_stencil());
        assert!(depth_stencil.should_clear_stencil());
    }

    #[test]
    fn final_state_defaults_to_attachment_state() {
        let mut def = pass_with_depth(RhiFormat::D32_SFLOAT);
        def.color_attachments
            .push(color(RhiLoadOp::Clear, RhiStoreOp::Store));
        assert_eq!(def.color_final_state(0), RhiResourceState::RENDER_TARGET);
        assert_eq!(def.depth_stencil_final_state(), RhiResourceState::DEPTH_WRITE);

        def.color_attachments[0].final_state = Some(RhiResourceState::SHADER_RESOURCE);
        assert_eq!(def.color_final_state(0), RhiResourceState::SHADER_RESOURCE);
    }

    #[test]
    fn render_pass_needs_an_attachment() {
        assert!(RhiRenderPassDef::default().validate().is_err());
        assert!(pass_with_depth(RhiFormat::D32_SFLOAT).validate().is_ok());
        assert!(pass_with_depth(RhiFormat::R8G8B8A8_UNORM).validate().is_err());
    }
}
