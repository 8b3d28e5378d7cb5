use super::RhiDeviceContextVulkan;
use crate::{RhiFramebufferAttachments, RhiFramebufferDef, RhiResult, RhiTexture};
use ash::vk;
use std::sync::Arc;

struct RhiFramebufferVulkanInner {
    device_context: RhiDeviceContextVulkan,
    attachments: RhiFramebufferAttachments,
    framebuffer: vk::Framebuffer,
}

impl Drop for RhiFramebufferVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_framebuffer(self.framebuffer, None);
        }
    }
}

#[derive(Clone)]
pub struct RhiFramebufferVulkan {
    inner: Arc<RhiFramebufferVulkanInner>,
}

impl std::fmt::Debug for RhiFramebufferVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("RhiFramebufferVulkan")
            .field("framebuffer", &self.inner.framebuffer)
            .field("extents", &self.inner.attachments.extents)
            .finish()
    }
}

fn render_target_view(
    texture: &RhiTexture,
    slot: &str,
) -> RhiResult<vk::ImageView> {
    texture
        .vk_texture()
        .and_then(|x| x.vk_render_target_view())
        .ok_or_else(|| format!("{} is not a vulkan render target", slot).into())
}

impl RhiFramebufferVulkan {
    pub fn attachments(&self) -> &RhiFramebufferAttachments {
        &self.inner.attachments
    }

    pub fn vk_framebuffer(&self) -> vk::Framebuffer {
        self.inner.framebuffer
    }

    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<Self> {
        let attachments = framebuffer_def.validate()?;

        let vk_render_pass = attachments
            .render_pass
            .vk_render_pass()
            .ok_or("render pass is not a vulkan render pass")?
            .vk_render_pass();

        let mut image_views = Vec::with_capacity(attachments.color_attachments.len() + 1);
        for (i, texture) in attachments.color_attachments.iter().enumerate() {
            image_views.push(render_target_view(
                texture,
                &format!("color attachment {}", i),
            )?);
        }

        if let Some(texture) = &attachments.depth_stencil_attachment {
            image_views.push(render_target_view(texture, "depth attachment")?);
        }

        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(vk_render_pass)
            .attachments(&image_views)
            .width(attachments.extents.width)
            .height(attachments.extents.height)
            .layers(1);

        let framebuffer = unsafe {
            device_context
                .device()
                .create_framebuffer(&*framebuffer_create_info, None)?
        };

        let inner = RhiFramebufferVulkanInner {
            device_context: device_context.clone(),
            attachments,
            framebuffer,
        };

        Ok(RhiFramebufferVulkan {
            inner: Arc::new(inner),
        })
    }
}
