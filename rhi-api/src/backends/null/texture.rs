use super::{next_null_object_id, RhiDeviceContextNull};
use crate::{
    RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiResourceState,
    RhiResourceType, RhiResult, RhiTextureDef, RhiTrackedState,
};
use std::sync::Arc;

#[derive(Debug)]
struct RhiTextureNullInner {
    device_context: RhiDeviceContextNull,
    texture_def: RhiTextureDef,
    texture_id: u64,
    tracked_state: RhiTrackedState,
    srv: Option<RhiDescriptorIndex>,
    uav: Option<RhiDescriptorIndex>,
    rtv: Option<RhiDescriptorIndex>,
    dsv: Option<RhiDescriptorIndex>,
    _descriptor_slots: RhiDescriptorSlots,
}

/// Texture with view slots but no storage. Clones share the same texture.
#[derive(Clone, Debug)]
pub struct RhiTextureNull {
    inner: Arc<RhiTextureNullInner>,
}

impl PartialEq for RhiTextureNull {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.inner.texture_id == other.inner.texture_id
    }
}

impl RhiTextureNull {
    pub fn new(
        device_context: &RhiDeviceContextNull,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureNull> {
        texture_def.validate()?;

        let resource_type = texture_def.resource_type;
        let mut descriptor_slots = RhiDescriptorSlots::new(device_context.descriptor_heaps());
        let srv = descriptor_slots.allocate_if(
            resource_type.intersects(RhiResourceType::TEXTURE),
            RhiDescriptorHeapType::CbvSrvUav,
        )?;
        let uav = descriptor_slots.allocate_if(
            resource_type.intersects(RhiResourceType::TEXTURE_READ_WRITE),
            RhiDescriptorHeapType::CbvSrvUav,
        )?;
        let rtv = descriptor_slots.allocate_if(
            resource_type.intersects(RhiResourceType::RENDER_TARGET_COLOR),
            RhiDescriptorHeapType::Rtv,
        )?;
        let dsv = descriptor_slots.allocate_if(
            resource_type.intersects(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL),
            RhiDescriptorHeapType::Dsv,
        )?;

        let texture_id = next_null_object_id();
        log::trace!(
            "Created null texture {} {:?} {:?}",
            texture_id,
            texture_def.extents,
            texture_def.format
        );

        let inner = RhiTextureNullInner {
            device_context: device_context.clone(),
            texture_def: texture_def.clone(),
            texture_id,
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            srv,
            uav,
            rtv,
            dsv,
            _descriptor_slots: descriptor_slots,
        };

        Ok(RhiTextureNull {
            inner: Arc::new(inner),
        })
    }

    pub fn texture_def(&self) -> &RhiTextureDef {
        &self.inner.texture_def
    }

    pub fn texture_id(&self) -> u64 {
        self.inner.texture_id
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.inner.device_context
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        &self.inner.tracked_state
    }

    pub fn srv(&self) -> Option<RhiDescriptorIndex> {
        self.inner.srv
    }

    pub fn uav(&self) -> Option<RhiDescriptorIndex> {
        self.inner.uav
    }

    pub fn rtv(&self) -> Option<RhiDescriptorIndex> {
        self.inner.rtv
    }

    pub fn dsv(&self) -> Option<RhiDescriptorIndex> {
        self.inner.dsv
    }
}
