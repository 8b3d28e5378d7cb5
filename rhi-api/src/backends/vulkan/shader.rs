use super::RhiDeviceContextVulkan;
use crate::{RhiResult, RhiShaderDef};
use std::sync::Arc;

#[derive(Debug)]
struct RhiShaderVulkanInner {
    shader_def: RhiShaderDef,
}

/// Stage bytecode is turned into shader modules when a pipeline is built, and the modules are
/// released as soon as the pipeline exists
#[derive(Clone, Debug)]
pub struct RhiShaderVulkan {
    inner: Arc<RhiShaderVulkanInner>,
}

impl RhiShaderVulkan {
    pub fn new(
        _device_context: &RhiDeviceContextVulkan,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<Self> {
        shader_def.validate()?;

        let inner = RhiShaderVulkanInner {
            shader_def: shader_def.clone(),
        };

        Ok(RhiShaderVulkan {
            inner: Arc::new(inner),
        })
    }

    pub fn shader_def(&self) -> &RhiShaderDef {
        &self.inner.shader_def
    }
}
