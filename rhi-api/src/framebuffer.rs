#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiFramebufferDx12;
use crate::null::RhiFramebufferNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiFramebufferVulkan;
use crate::{
    RhiCommandBuffer, RhiError, RhiExtents2D, RhiFormat, RhiFramebufferDef, RhiRenderPass,
    RhiResourceState, RhiResourceType, RhiResult, RhiTexture, RhiTextureBarrier,
};

/// The textures a framebuffer binds to its render pass's attachment slots
#[derive(Clone, Debug)]
pub struct RhiFramebufferAttachments {
    pub render_pass: RhiRenderPass,
    pub color_attachments: Vec<RhiTexture>,
    pub depth_stencil_attachment: Option<RhiTexture>,
    pub extents: RhiExtents2D,
}

impl RhiFramebufferAttachments {
    /// Every attachment paired with the state it must be in while the pass renders
    pub fn iter_with_rendering_state(
        &self
    ) -> impl Iterator<Item = (&RhiTexture, RhiResourceState)> {
        self.color_attachments
            .iter()
            .map(|x| (x, RhiResourceState::RENDER_TARGET))
            .chain(
                self.depth_stencil_attachment
                    .iter()
                    .map(|x| (x, RhiResourceState::DEPTH_WRITE)),
            )
    }
}

impl<'a> RhiFramebufferDef<'a> {
    /// Checks the textures against the render pass's slots
    pub fn validate(&self) -> RhiResult<RhiFramebufferAttachments> {
        fn incompatible<T>(reason: String) -> RhiResult<T> {
            Err(RhiError::FramebufferIncompatible(reason))
        }

        let render_pass_def = self.render_pass.render_pass_def();

        if self.color_attachments.len() != render_pass_def.color_attachments.len() {
            return incompatible(format!(
                "render pass has {} color attachments, framebuffer has {}",
                render_pass_def.color_attachments.len(),
                self.color_attachments.len()
            ));
        }

        match (
            &render_pass_def.depth_stencil_attachment,
            self.depth_stencil_attachment,
        ) {
            (Some(_), None) => {
                return incompatible("render pass expects a depth attachment".to_string())
            }
            (None, Some(_)) => {
                return incompatible("render pass has no depth attachment slot".to_string())
            }
            _ => {}
        }

        let mut extents: Option<RhiExtents2D> = None;
        let mut check_texture = |slot: String,
                                 texture: &RhiTexture,
                                 expected_format: RhiFormat,
                                 required_usage: RhiResourceType|
         -> RhiResult<()> {
            let texture_def = texture.texture_def();
            if texture_def.format != expected_format {
                return incompatible(format!(
                    "{} is {:?}, render pass expects {:?}",
                    slot, texture_def.format, expected_format
                ));
            }

            if !texture_def.resource_type.contains(required_usage) {
                return incompatible(format!("{} lacks {:?} usage", slot, required_usage));
            }

            if texture_def.sample_count != render_pass_def.sample_count {
                return incompatible(format!(
                    "{} has {:?}, render pass expects {:?}",
                    slot, texture_def.sample_count, render_pass_def.sample_count
                ));
            }

            let texture_extents = texture_def.extents.to_2d();
            match extents {
                Some(extents) if extents != texture_extents => incompatible(format!(
                    "{} is {}x{}, other attachments are {}x{}",
                    slot,
                    texture_extents.width,
                    texture_extents.height,
                    extents.width,
                    extents.height
                )),
                _ => {
                    extents = Some(texture_extents);
                    Ok(())
                }
            }
        };

        for (i, (texture, slot_def)) in self
            .color_attachments
            .iter()
            .zip(&render_pass_def.color_attachments)
            .enumerate()
        {
            check_texture(
                format!("color attachment {}", i),
                texture,
                slot_def.format,
                RhiResourceType::RENDER_TARGET_COLOR,
            )?;
        }

        if let (Some(texture), Some(slot_def)) = (
            self.depth_stencil_attachment,
            &render_pass_def.depth_stencil_attachment,
        ) {
            check_texture(
                "depth attachment".to_string(),
                texture,
                slot_def.format,
                RhiResourceType::RENDER_TARGET_DEPTH_STENCIL,
            )?;
        }

        Ok(RhiFramebufferAttachments {
            render_pass: self.render_pass.clone(),
            color_attachments: self.color_attachments.iter().map(|&x| x.clone()).collect(),
            depth_stencil_attachment: self.depth_stencil_attachment.cloned(),
            extents: extents.unwrap_or_default(),
        })
    }
}

/// Binds textures to a render pass's attachment slots. Keeps the textures and render pass alive.
#[derive(Clone, Debug)]
pub enum RhiFramebuffer {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiFramebufferVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiFramebufferDx12),
    Null(RhiFramebufferNull),
}

impl RhiFramebuffer {
    pub fn attachments(&self) -> &RhiFramebufferAttachments {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiFramebuffer::Vk(inner) => inner.attachments(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiFramebuffer::Dx12(inner) => inner.attachments(),
            RhiFramebuffer::Null(inner) => inner.attachments(),
        }
    }

    pub fn render_pass(&self) -> &RhiRenderPass {
        &self.attachments().render_pass
    }

    pub fn width(&self) -> u32 {
        self.attachments().extents.width
    }

    pub fn height(&self) -> u32 {
        self.attachments().extents.height
    }

    pub fn color_attachment_count(&self) -> usize {
        self.attachments().color_attachments.len()
    }

    pub fn has_depth_stencil(&self) -> bool {
        self.attachments().depth_stencil_attachment.is_some()
    }

    /// Records transitions that put every attachment into its rendering state. Attachments
    /// already in that state are skipped. `cmd_begin_render_pass` calls this.
    pub fn prepare_for_rendering(
        &self,
        command_buffer: &mut RhiCommandBuffer,
    ) -> RhiResult<()> {
        let barriers: Vec<_> = self
            .attachments()
            .iter_with_rendering_state()
            .filter(|(texture, state)| texture.current_state() != *state)
            .map(|(texture, state)| RhiTextureBarrier::to_state(texture, state))
            .collect();

        if barriers.is_empty() {
            return Ok(());
        }

        command_buffer.cmd_resource_barrier(&[], &barriers)
    }

    /// Transitions from the rendering state to each slot's final state, for slots that have one
    pub(crate) fn final_state_barriers(&self) -> Vec<RhiTextureBarrier> {
        let attachments = self.attachments();
        let render_pass_def = attachments.render_pass.render_pass_def();

        let final_states = (0..attachments.color_attachments.len())
            .map(|i| render_pass_def.color_final_state(i))
            .chain(
                attachments
                    .depth_stencil_attachment
                    .iter()
                    .map(|_| render_pass_def.depth_stencil_final_state()),
            );

        attachments
            .iter_with_rendering_state()
            .zip(final_states)
            .filter(|((_, rendering_state), final_state)| rendering_state != final_state)
            .map(|((texture, rendering_state), final_state)| {
                RhiTextureBarrier::state_transition(texture, rendering_state, final_state)
            })
            .collect()
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_framebuffer(&self) -> Option<&RhiFramebufferVulkan> {
        match self {
            RhiFramebuffer::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_framebuffer(&self) -> Option<&RhiFramebufferDx12> {
        match self {
            RhiFramebuffer::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_framebuffer(&self) -> Option<&RhiFramebufferNull> {
        match self {
            RhiFramebuffer::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
