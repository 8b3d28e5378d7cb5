use super::*;
use crate::{
    RhiApiDef, RhiBackendType, RhiBufferDef, RhiDescriptorAllocator, RhiDescriptorHeapType,
    RhiDescriptorHeaps, RhiDeviceInfo, RhiFramebufferDef, RhiGraphicsPipelineDef, RhiLogSink,
    RhiRenderPassDef, RhiResult, RhiSamplerDef, RhiShaderDef, RhiTextureDef,
};
use std::sync::Arc;

pub struct RhiDeviceContextNullInner {
    device_info: RhiDeviceInfo,
    log_sink: Arc<dyn RhiLogSink>,
    descriptor_heaps: Arc<RhiDescriptorHeaps>,
}

impl Drop for RhiDeviceContextNullInner {
    fn drop(&mut self) {
        log::trace!("destroyed null device context");
    }
}

#[derive(Clone)]
pub struct RhiDeviceContextNull {
    inner: Arc<RhiDeviceContextNullInner>,
}

impl std::fmt::Debug for RhiDeviceContextNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContextNull")
            .field("device_name", &self.inner.device_info.device_name)
            .finish()
    }
}

impl RhiDeviceContextNull {
    pub(crate) fn new(api_def: &RhiApiDef) -> RhiResult<Self> {
        let device_info = RhiDeviceInfo {
            backend_type: RhiBackendType::Null,
            device_name: "Null Device".to_string(),
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 16,
            upload_buffer_texture_alignment: 512,
            upload_buffer_texture_row_alignment: 256,
            max_vertex_attribute_count: 16,
            max_color_attachments: crate::MAX_RENDER_TARGET_ATTACHMENTS as u32,
            max_texture_dimension_2d: 16384,
        };

        let inner = RhiDeviceContextNullInner {
            device_info,
            log_sink: api_def.log_sink.clone(),
            descriptor_heaps: Arc::new(RhiDescriptorHeaps::new(&api_def.descriptor_heap_sizes)),
        };

        Ok(RhiDeviceContextNull {
            inner: Arc::new(inner),
        })
    }

    pub fn device_info(&self) -> &RhiDeviceInfo {
        &self.inner.device_info
    }

    pub fn log_sink(&self) -> &Arc<dyn RhiLogSink> {
        &self.inner.log_sink
    }

    pub(crate) fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn descriptor_heap(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> &RhiDescriptorAllocator {
        self.inner.descriptor_heaps.heap(heap_type)
    }

    pub(crate) fn descriptor_heaps(&self) -> &Arc<RhiDescriptorHeaps> {
        &self.inner.descriptor_heaps
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBufferNull> {
        RhiBufferNull::new(self, buffer_def)
    }

    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureNull> {
        RhiTextureNull::new(self, texture_def)
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerNull> {
        RhiSamplerNull::new(self, sampler_def)
    }

    pub fn create_shader(
        &self,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<RhiShaderNull> {
        RhiShaderNull::new(self, shader_def)
    }

    pub fn create_render_pass(
        &self,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<RhiRenderPassNull> {
        RhiRenderPassNull::new(self, render_pass_def)
    }

    pub fn create_framebuffer(
        &self,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<RhiFramebufferNull> {
        RhiFramebufferNull::new(self, framebuffer_def)
    }

    pub fn create_graphics_pipeline(
        &self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipelineNull> {
        RhiPipelineNull::new(self, pipeline_def)
    }

    pub fn create_command_buffer(&self) -> RhiResult<RhiCommandBufferNull> {
        RhiCommandBufferNull::new(self)
    }

    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBufferNull],
    ) -> RhiResult<()> {
        for command_buffer in command_buffers {
            log::trace!(
                "null submit of {} commands",
                command_buffer.recorded_commands().len()
            );
        }

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        Ok(())
    }
}
