use super::{next_null_object_id, RhiDeviceContextNull};
use crate::{RhiDescriptorIndex, RhiFramebufferAttachments, RhiFramebufferDef, RhiResult};
use std::sync::Arc;

#[derive(Debug)]
struct RhiFramebufferNullInner {
    attachments: RhiFramebufferAttachments,
    framebuffer_id: u64,
    color_rtvs: Vec<RhiDescriptorIndex>,
    dsv: Option<RhiDescriptorIndex>,
}

/// Refers to the attachments' existing render target slots, allocates none of its own
#[derive(Clone, Debug)]
pub struct RhiFramebufferNull {
    inner: Arc<RhiFramebufferNullInner>,
}

impl RhiFramebufferNull {
    pub fn new(
        _device_context: &RhiDeviceContextNull,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<Self> {
        let attachments = framebuffer_def.validate()?;

        let mut color_rtvs = Vec::with_capacity(attachments.color_attachments.len());
        for texture in &attachments.color_attachments {
            let rtv = texture
                .null_texture()
                .and_then(|x| x.rtv())
                .ok_or("color attachment is not a null render target")?;
            color_rtvs.push(rtv);
        }

        let dsv = match &attachments.depth_stencil_attachment {
            Some(texture) => Some(
                texture
                    .null_texture()
                    .and_then(|x| x.dsv())
                    .ok_or("depth attachment is not a null depth target")?,
            ),
            None => None,
        };

        let inner = RhiFramebufferNullInner {
            attachments,
            framebuffer_id: next_null_object_id(),
            color_rtvs,
            dsv,
        };

        Ok(RhiFramebufferNull {
            inner: Arc::new(inner),
        })
    }

    pub fn attachments(&self) -> &RhiFramebufferAttachments {
        &self.inner.attachments
    }

    pub fn framebuffer_id(&self) -> u64 {
        self.inner.framebuffer_id
    }

    pub fn color_rtvs(&self) -> &[RhiDescriptorIndex] {
        &self.inner.color_rtvs
    }

    pub fn dsv(&self) -> Option<RhiDescriptorIndex> {
        self.inner.dsv
    }
}
