#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiPipelineDx12;
use crate::null::RhiPipelineNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiPipelineVulkan;
use crate::{
    RhiError, RhiGraphicsPipelineDef, RhiPipelineStage, RhiPrimitiveTopology, RhiResult,
    RhiShaderStageFlags,
};

impl RhiPipelineStage {
    /// Pipelines are built one stage at a time in this order. The first failing stage aborts.
    pub const CONSTRUCTION_ORDER: [RhiPipelineStage; 8] = [
        RhiPipelineStage::ShaderStages,
        RhiPipelineStage::VertexInput,
        RhiPipelineStage::InputAssembly,
        RhiPipelineStage::Rasterization,
        RhiPipelineStage::Multisample,
        RhiPipelineStage::DepthStencil,
        RhiPipelineStage::ColorBlend,
        RhiPipelineStage::Layout,
    ];

    pub fn error(
        self,
        reason: impl Into<String>,
    ) -> RhiError {
        RhiError::PipelineStageCreation {
            stage: self,
            reason: reason.into(),
        }
    }
}

impl<'a> RhiGraphicsPipelineDef<'a> {
    /// Backend-independent checks for one construction stage. Backends run these before doing
    /// their native work for the stage.
    pub fn validate_stage(
        &self,
        stage: RhiPipelineStage,
    ) -> RhiResult<()> {
        let render_pass_def = self.render_pass.render_pass_def();

        let result = match stage {
            RhiPipelineStage::ShaderStages => {
                let stage_flags = self.shader.stage_flags();
                if !stage_flags.contains(RhiShaderStageFlags::VERTEX) {
                    Err("graphics pipelines require a vertex stage".to_string())
                } else if stage_flags.intersects(RhiShaderStageFlags::COMPUTE) {
                    Err("compute stages cannot be part of a graphics pipeline".to_string())
                } else {
                    Ok(())
                }
            }
            RhiPipelineStage::VertexInput => self.vertex_layout.validate(),
            RhiPipelineStage::InputAssembly => match self.primitive_topology {
                RhiPrimitiveTopology::PatchList => {
                    Err("patch list topology requires tessellation, which is unsupported".into())
                }
                _ => Ok(()),
            },
            RhiPipelineStage::Rasterization => self.rasterizer_state.validate(),
            RhiPipelineStage::Multisample => {
                if self.sample_count != render_pass_def.sample_count {
                    Err(format!(
                        "pipeline uses {:?} but the render pass uses {:?}",
                        self.sample_count, render_pass_def.sample_count
                    ))
                } else {
                    Ok(())
                }
            }
            RhiPipelineStage::DepthStencil => self
                .depth_state
                .validate(render_pass_def.depth_stencil_format()),
            RhiPipelineStage::ColorBlend => self
                .blend_state
                .validate(render_pass_def.color_attachment_count()),
            RhiPipelineStage::Layout => {
                self.layout.validate().and_then(|_| {
                    if self.layout.push_constant_size > 0
                        && self.layout.push_constant_stages.is_empty()
                    {
                        Err("push constants are not visible to any stage".to_string())
                    } else {
                        Ok(())
                    }
                })
            }
        };

        result.map_err(|reason| stage.error(reason))
    }
}

/// A compiled graphics pipeline and its layout.
///
/// Rebuilt through `RhiDeviceContext::rebuild_graphics_pipeline`, which reports failures to the
/// log sink. The native objects are replaced only once the replacement is fully built. If any
/// stage fails, the pipeline keeps its previous native objects and stays usable.
#[derive(Debug)]
pub enum RhiPipeline {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiPipelineVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiPipelineDx12),
    Null(RhiPipelineNull),
}

impl RhiPipeline {
    pub(crate) fn rebuild(
        &mut self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<()> {
        profiling::scope!("RhiPipeline::rebuild");
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.rebuild(pipeline_def),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiPipeline::Dx12(inner) => inner.rebuild(pipeline_def),
            RhiPipeline::Null(inner) => inner.rebuild(pipeline_def),
        }
    }

    /// Identifies the current native pipeline object. Changes only on a successful rebuild.
    pub fn pipeline_id(&self) -> u64 {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.pipeline_id(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiPipeline::Dx12(inner) => inner.pipeline_id(),
            RhiPipeline::Null(inner) => inner.pipeline_id(),
        }
    }

    /// Identifies the current native layout (vulkan pipeline layout or dx12 root signature)
    pub fn pipeline_layout_id(&self) -> u64 {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.pipeline_layout_id(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiPipeline::Dx12(inner) => inner.pipeline_layout_id(),
            RhiPipeline::Null(inner) => inner.pipeline_layout_id(),
        }
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_pipeline(&self) -> Option<&RhiPipelineVulkan> {
        match self {
            RhiPipeline::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_pipeline(&self) -> Option<&RhiPipelineDx12> {
        match self {
            RhiPipeline::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_pipeline(&self) -> Option<&RhiPipelineNull> {
        match self {
            RhiPipeline::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
