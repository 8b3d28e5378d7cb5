use super::{next_null_object_id, RhiDeviceContextNull};
use crate::{RhiRenderPassDef, RhiResult};
use std::sync::Arc;

#[derive(Debug)]
struct RhiRenderPassNullInner {
    render_pass_def: RhiRenderPassDef,
    render_pass_id: u64,
}

#[derive(Clone, Debug)]
pub struct RhiRenderPassNull {
    inner: Arc<RhiRenderPassNullInner>,
}

impl RhiRenderPassNull {
    pub fn new(
        _device_context: &RhiDeviceContextNull,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<Self> {
        render_pass_def.validate()?;

        let inner = RhiRenderPassNullInner {
            render_pass_def: render_pass_def.clone(),
            render_pass_id: next_null_object_id(),
        };

        Ok(RhiRenderPassNull {
            inner: Arc::new(inner),
        })
    }

    pub fn render_pass_def(&self) -> &RhiRenderPassDef {
        &self.inner.render_pass_def
    }

    pub fn render_pass_id(&self) -> u64 {
        self.inner.render_pass_id
    }
}
