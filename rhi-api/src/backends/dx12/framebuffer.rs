use super::internal::d3d12;
use super::RhiDeviceContextDx12;
use crate::{RhiFramebufferAttachments, RhiFramebufferDef, RhiResult};
use std::sync::Arc;

#[derive(Debug)]
struct RhiFramebufferDx12Inner {
    attachments: RhiFramebufferAttachments,
    color_rtv_handles: Vec<d3d12::D3D12_CPU_DESCRIPTOR_HANDLE>,
    dsv_handle: Option<d3d12::D3D12_CPU_DESCRIPTOR_HANDLE>,
}

/// The CPU handles of the attachments' views, ready for OMSetRenderTargets. Allocates no
/// descriptors of its own.
#[derive(Clone, Debug)]
pub struct RhiFramebufferDx12 {
    inner: Arc<RhiFramebufferDx12Inner>,
}

impl RhiFramebufferDx12 {
    pub fn new(
        _device_context: &RhiDeviceContextDx12,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<Self> {
        let attachments = framebuffer_def.validate()?;

        let mut color_rtv_handles = Vec::with_capacity(attachments.color_attachments.len());
        for (i, texture) in attachments.color_attachments.iter().enumerate() {
            let handle = texture
                .dx12_texture()
                .and_then(|x| x.rtv_handle())
                .ok_or_else(|| format!("color attachment {} is not a dx12 render target", i))?;
            color_rtv_handles.push(handle);
        }

        let dsv_handle = match &attachments.depth_stencil_attachment {
            Some(texture) => Some(
                texture
                    .dx12_texture()
                    .and_then(|x| x.dsv_handle())
                    .ok_or("depth attachment is not a dx12 depth target")?,
            ),
            None => None,
        };

        let inner = RhiFramebufferDx12Inner {
            attachments,
            color_rtv_handles,
            dsv_handle,
        };

        Ok(RhiFramebufferDx12 {
            inner: Arc::new(inner),
        })
    }

    pub fn attachments(&self) -> &RhiFramebufferAttachments {
        &self.inner.attachments
    }

    pub fn color_rtv_handles(&self) -> &[d3d12::D3D12_CPU_DESCRIPTOR_HANDLE] {
        &self.inner.color_rtv_handles
    }

    pub fn dsv_handle(&self) -> Option<d3d12::D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.inner.dsv_handle
    }
}
