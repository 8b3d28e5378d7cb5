use super::RhiDeviceContextDx12;
use crate::{RhiRenderPassDef, RhiResult};
use std::sync::Arc;

#[derive(Debug)]
struct RhiRenderPassDx12Inner {
    render_pass_def: RhiRenderPassDef,
}

/// D3D12 has no render pass object. The def is kept so pipelines can read attachment formats and
/// command buffers can apply load ops when the pass begins.
#[derive(Clone, Debug)]
pub struct RhiRenderPassDx12 {
    inner: Arc<RhiRenderPassDx12Inner>,
}

impl RhiRenderPassDx12 {
    pub fn new(
        _device_context: &RhiDeviceContextDx12,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<Self> {
        render_pass_def.validate()?;

        let inner = RhiRenderPassDx12Inner {
            render_pass_def: render_pass_def.clone(),
        };

        Ok(RhiRenderPassDx12 {
            inner: Arc::new(inner),
        })
    }

    pub fn render_pass_def(&self) -> &RhiRenderPassDef {
        &self.inner.render_pass_def
    }
}
