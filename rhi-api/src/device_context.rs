#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiDeviceContextDx12;
use crate::null::RhiDeviceContextNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiDeviceContextVulkan;
use crate::*;
use std::sync::Arc;

/// A cloneable, thread-safe handle used to create graphics resources.
///
/// All objects created through the device context keep a clone of it. The native device is
/// released once the `RhiApi` has been destroyed and the last object referencing it is dropped.
///
/// Every creation failure is returned as an error and reported once through the log sink the
/// device was created with.
#[derive(Clone)]
pub enum RhiDeviceContext {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiDeviceContextVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiDeviceContextDx12),
    Null(RhiDeviceContextNull),
}

impl std::fmt::Debug for RhiDeviceContext {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContext")
            .field("backend_type", &self.backend_type())
            .field("device_name", &self.device_info().device_name)
            .finish()
    }
}

impl RhiDeviceContext {
    /// Get metadata about the device
    pub fn device_info(&self) -> &RhiDeviceInfo {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.device_info(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner.device_info(),
            RhiDeviceContext::Null(inner) => inner.device_info(),
        }
    }

    pub fn backend_type(&self) -> RhiBackendType {
        self.device_info().backend_type
    }

    pub fn log_sink(&self) -> &Arc<dyn RhiLogSink> {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.log_sink(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner.log_sink(),
            RhiDeviceContext::Null(inner) => inner.log_sink(),
        }
    }

    // Every create_* funnels its result through here so failures reach the sink exactly once
    fn report_creation<T>(
        &self,
        what: &str,
        result: RhiResult<T>,
    ) -> RhiResult<T> {
        if let Err(e) = &result {
            self.log_sink()
                .log(log::Level::Error, &format!("Failed to create {}: {}", what, e));
        }

        result
    }

    /// Create a buffer
    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBuffer> {
        profiling::scope!("create_buffer");
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.create_buffer(buffer_def).map(RhiBuffer::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner.create_buffer(buffer_def).map(RhiBuffer::Dx12),
            RhiDeviceContext::Null(inner) => inner.create_buffer(buffer_def).map(RhiBuffer::Null),
        };

        self.report_creation("buffer", result)
    }

    /// Create a texture. Its tracked state starts as `UNDEFINED`.
    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTexture> {
        profiling::scope!("create_texture");
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.create_texture(texture_def).map(RhiTexture::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => {
                inner.create_texture(texture_def).map(RhiTexture::Dx12)
            }
            RhiDeviceContext::Null(inner) => {
                inner.create_texture(texture_def).map(RhiTexture::Null)
            }
        };

        self.report_creation("texture", result)
    }

    /// Create a sampler
    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSampler> {
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.create_sampler(sampler_def).map(RhiSampler::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => {
                inner.create_sampler(sampler_def).map(RhiSampler::Dx12)
            }
            RhiDeviceContext::Null(inner) => {
                inner.create_sampler(sampler_def).map(RhiSampler::Null)
            }
        };

        self.report_creation("sampler", result)
    }

    /// Create a shader. Bytecode is compiled when a pipeline uses the shader.
    pub fn create_shader(
        &self,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<RhiShader> {
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.create_shader(shader_def).map(RhiShader::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner.create_shader(shader_def).map(RhiShader::Dx12),
            RhiDeviceContext::Null(inner) => inner.create_shader(shader_def).map(RhiShader::Null),
        };

        self.report_creation("shader", result)
    }

    pub fn create_render_pass(
        &self,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<RhiRenderPass> {
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner
                .create_render_pass(render_pass_def)
                .map(RhiRenderPass::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner
                .create_render_pass(render_pass_def)
                .map(RhiRenderPass::Dx12),
            RhiDeviceContext::Null(inner) => inner
                .create_render_pass(render_pass_def)
                .map(RhiRenderPass::Null),
        };

        self.report_creation("render pass", result)
    }

    /// Bind textures to a render pass. Fails with `FramebufferIncompatible` if the textures don't
    /// match the pass's attachment slots.
    pub fn create_framebuffer(
        &self,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<RhiFramebuffer> {
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner
                .create_framebuffer(framebuffer_def)
                .map(RhiFramebuffer::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner
                .create_framebuffer(framebuffer_def)
                .map(RhiFramebuffer::Dx12),
            RhiDeviceContext::Null(inner) => inner
                .create_framebuffer(framebuffer_def)
                .map(RhiFramebuffer::Null),
        };

        self.report_creation("framebuffer", result)
    }

    /// Create a graphics pipeline. Stages are built in `RhiPipelineStage::CONSTRUCTION_ORDER`
    /// and the first failing stage is reported in the error.
    pub fn create_graphics_pipeline(
        &self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipeline> {
        profiling::scope!("create_graphics_pipeline");
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner
                .create_graphics_pipeline(pipeline_def)
                .map(RhiPipeline::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner
                .create_graphics_pipeline(pipeline_def)
                .map(RhiPipeline::Dx12),
            RhiDeviceContext::Null(inner) => inner
                .create_graphics_pipeline(pipeline_def)
                .map(RhiPipeline::Null),
        };

        self.report_creation("graphics pipeline", result)
    }

    /// Rebuild a pipeline in place. On failure the pipeline keeps its previous native objects.
    pub fn rebuild_graphics_pipeline(
        &self,
        pipeline: &mut RhiPipeline,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<()> {
        let result = pipeline.rebuild(pipeline_def);
        self.report_creation("graphics pipeline (rebuild)", result)
    }

    pub fn create_command_buffer(&self) -> RhiResult<RhiCommandBuffer> {
        let result = match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner
                .create_command_buffer()
                .map(RhiCommandBufferBackend::Vk),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner
                .create_command_buffer()
                .map(RhiCommandBufferBackend::Dx12),
            RhiDeviceContext::Null(inner) => inner
                .create_command_buffer()
                .map(RhiCommandBufferBackend::Null),
        };

        let backend = self.report_creation("command buffer", result)?;
        Ok(RhiCommandBuffer::new(backend, self.log_sink().clone()))
    }

    /// Hands executable command buffers to the graphics queue, in order. All of them must be
    /// `Executable`; on success they become `Pending` until reset.
    pub fn submit(
        &self,
        command_buffers: &mut [&mut RhiCommandBuffer],
    ) -> RhiResult<()> {
        profiling::scope!("submit");
        for command_buffer in command_buffers.iter() {
            command_buffer.validate_submit()?;
        }

        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                let mut backends = Vec::with_capacity(command_buffers.len());
                for command_buffer in command_buffers.iter() {
                    backends.push(
                        command_buffer
                            .vk_command_buffer()
                            .ok_or("command buffer belongs to a different backend")?,
                    );
                }
                inner.submit(&backends)
            }
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => {
                let mut backends = Vec::with_capacity(command_buffers.len());
                for command_buffer in command_buffers.iter() {
                    backends.push(
                        command_buffer
                            .dx12_command_buffer()
                            .ok_or("command buffer belongs to a different backend")?,
                    );
                }
                inner.submit(&backends)
            }
            RhiDeviceContext::Null(inner) => {
                let mut backends = Vec::with_capacity(command_buffers.len());
                for command_buffer in command_buffers.iter() {
                    backends.push(
                        command_buffer
                            .null_command_buffer()
                            .ok_or("command buffer belongs to a different backend")?,
                    );
                }
                inner.submit(&backends)
            }
        }?;

        for command_buffer in command_buffers.iter_mut() {
            command_buffer.mark_submitted();
        }

        Ok(())
    }

    /// Blocks until all submitted work has completed
    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.wait_for_device_idle(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiDeviceContext::Dx12(inner) => inner.wait_for_device_idle(),
            RhiDeviceContext::Null(inner) => inner.wait_for_device_idle(),
        }
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_device_context(&self) -> Option<&RhiDeviceContextVulkan> {
        match self {
            RhiDeviceContext::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_device_context(&self) -> Option<&RhiDeviceContextDx12> {
        match self {
            RhiDeviceContext::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_device_context(&self) -> Option<&RhiDeviceContextNull> {
        match self {
            RhiDeviceContext::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
