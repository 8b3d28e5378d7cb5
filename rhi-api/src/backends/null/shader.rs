use super::{next_null_object_id, RhiDeviceContextNull};
use crate::{RhiResult, RhiShaderDef};
use std::sync::Arc;

#[derive(Debug)]
struct RhiShaderNullInner {
    shader_def: RhiShaderDef,
    shader_id: u64,
}

/// Holds stage bytecode until a pipeline compiles it
#[derive(Clone, Debug)]
pub struct RhiShaderNull {
    inner: Arc<RhiShaderNullInner>,
}

impl RhiShaderNull {
    pub fn new(
        _device_context: &RhiDeviceContextNull,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<Self> {
        shader_def.validate()?;

        let inner = RhiShaderNullInner {
            shader_def: shader_def.clone(),
            shader_id: next_null_object_id(),
        };

        Ok(RhiShaderNull {
            inner: Arc::new(inner),
        })
    }

    pub fn shader_def(&self) -> &RhiShaderDef {
        &self.inner.shader_def
    }

    pub fn shader_id(&self) -> u64 {
        self.inner.shader_id
    }
}
