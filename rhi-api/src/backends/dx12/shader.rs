use super::RhiDeviceContextDx12;
use crate::{RhiResult, RhiShaderDef};
use std::sync::Arc;

#[derive(Debug)]
struct RhiShaderDx12Inner {
    shader_def: RhiShaderDef,
}

/// DXBC bytecode per stage, handed to the pipeline state when a pipeline is built
#[derive(Clone, Debug)]
pub struct RhiShaderDx12 {
    inner: Arc<RhiShaderDx12Inner>,
}

impl RhiShaderDx12 {
    pub fn new(
        _device_context: &RhiDeviceContextDx12,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<Self> {
        shader_def.validate()?;

        let inner = RhiShaderDx12Inner {
            shader_def: shader_def.clone(),
        };

        Ok(RhiShaderDx12 {
            inner: Arc::new(inner),
        })
    }

    pub fn shader_def(&self) -> &RhiShaderDef {
        &self.inner.shader_def
    }
}
