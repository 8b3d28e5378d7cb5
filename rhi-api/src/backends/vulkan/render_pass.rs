use super::internal::util;
use super::RhiDeviceContextVulkan;
use crate::{RhiRenderPassDef, RhiResourceState, RhiResult};
use ash::vk;
use std::sync::Arc;

struct RhiRenderPassVulkanInner {
    device_context: RhiDeviceContextVulkan,
    render_pass_def: RhiRenderPassDef,
    render_pass: vk::RenderPass,
}

impl Drop for RhiRenderPassVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_render_pass(self.render_pass, None);
        }
    }
}

/// A single-subpass vk::RenderPass. Attachments enter in their attachment layout and leave in
/// the layout matching their final state. An external subpass dependency orders the attachment
/// writes against whatever reads the attachments in their final state.
#[derive(Clone)]
pub struct RhiRenderPassVulkan {
    inner: Arc<RhiRenderPassVulkanInner>,
}

impl std::fmt::Debug for RhiRenderPassVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("RhiRenderPassVulkan")
            .field("render_pass", &self.inner.render_pass)
            .finish()
    }
}

impl RhiRenderPassVulkan {
    pub fn render_pass_def(&self) -> &RhiRenderPassDef {
        &self.inner.render_pass_def
    }

    pub fn vk_render_pass(&self) -> vk::RenderPass {
        self.inner.render_pass
    }

    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<Self> {
        render_pass_def.validate()?;

        let samples = render_pass_def.sample_count.into();
        let mut attachments = Vec::with_capacity(render_pass_def.color_attachments.len() + 1);
        let mut color_attachment_refs =
            Vec::with_capacity(render_pass_def.color_attachments.len());

        for (color_attachment_index, color_attachment) in
            render_pass_def.color_attachments.iter().enumerate()
        {
            let final_layout = util::resource_state_to_image_layout(
                render_pass_def.color_final_state(color_attachment_index),
            );

            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(color_attachment.format.into())
                    .samples(samples)
                    .load_op(color_attachment.load_op.into())
                    .store_op(color_attachment.store_op.into())
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .final_layout(final_layout)
                    .build(),
            );

            color_attachment_refs.push(
                vk::AttachmentReference::builder()
                    .attachment(color_attachment_index as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .build(),
            );
        }

        let mut depth_stencil_attachment_ref = None;
        if let Some(depth_attachment) = &render_pass_def.depth_stencil_attachment {
            let attachment_index = attachments.len() as u32;
            let final_layout =
                util::resource_state_to_image_layout(render_pass_def.depth_stencil_final_state());

            let (stencil_load_op, stencil_store_op) = if depth_attachment.format.has_stencil() {
                (
                    depth_attachment.load_op.into(),
                    depth_attachment.store_op.into(),
                )
            } else {
                (
                    vk::AttachmentLoadOp::DONT_CARE,
                    vk::AttachmentStoreOp::DONT_CARE,
                )
            };

            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(depth_attachment.format.into())
                    .samples(samples)
                    .load_op(depth_attachment.load_op.into())
                    .store_op(depth_attachment.store_op.into())
                    .stencil_load_op(stencil_load_op)
                    .stencil_store_op(stencil_store_op)
                    .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .final_layout(final_layout)
                    .build(),
            );

            depth_stencil_attachment_ref = Some(
                vk::AttachmentReference::builder()
                    .attachment(attachment_index)
                    .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .build(),
            );
        }

        let mut subpass_description = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs);

        if let Some(depth_stencil_attachment_ref) = depth_stencil_attachment_ref.as_ref() {
            subpass_description =
                subpass_description.depth_stencil_attachment(depth_stencil_attachment_ref);
        }

        let subpass_descriptions = [subpass_description.build()];

        let dependencies: Vec<_> = final_state_dependency(render_pass_def).into_iter().collect();

        let render_pass_create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpass_descriptions)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            device_context
                .device()
                .create_render_pass(&*render_pass_create_info, None)?
        };

        let inner = RhiRenderPassVulkanInner {
            device_context: device_context.clone(),
            render_pass_def: render_pass_def.clone(),
            render_pass,
        };

        Ok(RhiRenderPassVulkan {
            inner: Arc::new(inner),
        })
    }
}

// The layout transition into each attachment's final layout happens at the end of the subpass.
// Without a dependency to SUBPASS_EXTERNAL, later reads of that layout are unsynchronized.
fn final_state_dependency(render_pass_def: &RhiRenderPassDef) -> Option<vk::SubpassDependency> {
    let mut src_stage_mask = vk::PipelineStageFlags::empty();
    let mut src_access_mask = vk::AccessFlags::empty();
    let mut dst_access_mask = vk::AccessFlags::empty();

    for color_attachment_index in 0..render_pass_def.color_attachments.len() {
        let final_state = render_pass_def.color_final_state(color_attachment_index);
        if final_state != RhiResourceState::RENDER_TARGET {
            src_stage_mask |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
            src_access_mask |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
            dst_access_mask |= util::resource_state_to_access_flags(final_state);
        }
    }

    if render_pass_def.depth_stencil_attachment.is_some() {
        let final_state = render_pass_def.depth_stencil_final_state();
        if final_state != RhiResourceState::DEPTH_WRITE {
            src_stage_mask |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
            src_access_mask |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
            dst_access_mask |= util::resource_state_to_access_flags(final_state);
        }
    }

    if src_access_mask.is_empty() {
        return None;
    }

    Some(
        vk::SubpassDependency::builder()
            .src_subpass(0)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(src_stage_mask)
            .src_access_mask(src_access_mask)
            .dst_stage_mask(util::determine_pipeline_stage_flags(dst_access_mask))
            .dst_access_mask(dst_access_mask)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn color(final_state: Option<RhiResourceState>) -> RhiColorAttachmentDef {
        RhiColorAttachmentDef {
            format: RhiFormat::R8G8B8A8_UNORM,
            load_op: RhiLoadOp::Clear,
            store_op: RhiStoreOp::Store,
            final_state,
        }
    }

    #[test]
    fn attachments_left_as_targets_need_no_dependency() {
        let def = RhiRenderPassDef {
            color_attachments: vec![color(None), color(Some(RhiResourceState::RENDER_TARGET))],
            depth_stencil_attachment: Some(RhiDepthStencilAttachmentDef {
                format: RhiFormat::D32_SFLOAT,
                load_op: RhiLoadOp::Clear,
                store_op: RhiStoreOp::Store,
                final_state: None,
            }),
            sample_count: RhiSampleCount::SampleCount1,
        };

        assert!(final_state_dependency(&def).is_none());
    }

    #[test]
    fn sampled_color_output_waits_for_attachment_writes() {
        let def = RhiRenderPassDef {
            color_attachments: vec![color(None), color(Some(RhiResourceState::SHADER_RESOURCE))],
            ..Default::default()
        };

        let dependency = final_state_dependency(&def).unwrap();
        assert_eq!(dependency.src_subpass, 0);
        assert_eq!(dependency.dst_subpass, vk::SUBPASS_EXTERNAL);
        assert_eq!(
            dependency.src_stage_mask,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
        assert_eq!(
            dependency.src_access_mask,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
        );
        assert!(dependency
            .dst_stage_mask
            .contains(vk::PipelineStageFlags::FRAGMENT_SHADER));
        assert_eq!(dependency.dst_access_mask, vk::AccessFlags::SHADER_READ);
    }

    #[test]
    fn depth_read_after_pass_waits_for_depth_writes() {
        let def = RhiRenderPassDef {
            color_attachments: vec![],
            depth_stencil_attachment: Some(RhiDepthStencilAttachmentDef {
                format: RhiFormat::D32_SFLOAT,
                load_op: RhiLoadOp::Clear,
                store_op: RhiStoreOp::Store,
                final_state: Some(RhiResourceState::SHADER_RESOURCE),
            }),
            sample_count: RhiSampleCount::SampleCount1,
        };

        let dependency = final_state_dependency(&def).unwrap();
        assert!(dependency
            .src_stage_mask
            .contains(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS));
        assert_eq!(
            dependency.src_access_mask,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
        );
        assert_eq!(dependency.dst_access_mask, vk::AccessFlags::SHADER_READ);
    }
}
