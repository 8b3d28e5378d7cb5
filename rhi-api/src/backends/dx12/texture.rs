use super::internal::conversions::{dxgi_to_srv_format, dxgi_to_typeless, dxgi_to_uav_format};
use super::internal::{d3d12, dxgi};
use super::RhiDeviceContextDx12;
use crate::{
    RhiDescriptorHeapType, RhiDescriptorIndex, RhiDescriptorSlots, RhiError, RhiResourceKind,
    RhiResourceState, RhiResourceType, RhiResult, RhiSampleCount, RhiTextureDef,
    RhiTextureDimensions, RhiTrackedState,
};
use dxgi::Common::DXGI_FORMAT;
use gpu_allocator::d3d12::{Allocation, AllocationCreateDesc, ResourceCategory};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

/// A resource plus the memory backing it. Resources created elsewhere (such as swapchain
/// buffers) have no allocation.
#[derive(Debug)]
pub struct RhiRawImageDx12 {
    pub resource: d3d12::ID3D12Resource,
    pub allocation: Option<Allocation>,
}

// What the views of a texture have to describe
#[derive(Copy, Clone, Debug)]
struct ViewShape {
    dimensions: RhiTextureDimensions,
    array_length: u32,
    mip_count: u32,
    depth: u32,
    is_cube_map: bool,
    is_multisampled: bool,
}

fn create_srv_desc(
    shape: &ViewShape,
    format: DXGI_FORMAT,
) -> d3d12::D3D12_SHADER_RESOURCE_VIEW_DESC {
    let mut srv_desc = d3d12::D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: dxgi_to_srv_format(format),
        Shader4ComponentMapping: d3d12::D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
        ..Default::default()
    };

    match shape.dimensions {
        RhiTextureDimensions::Dim1D => {
            if shape.array_length > 1 {
                srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE1DARRAY;
                srv_desc.Anonymous.Texture1DArray.ArraySize = shape.array_length;
                srv_desc.Anonymous.Texture1DArray.MipLevels = shape.mip_count;
            } else {
                srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE1D;
                srv_desc.Anonymous.Texture1D.MipLevels = shape.mip_count;
            }
        }
        RhiTextureDimensions::Dim3D => {
            srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE3D;
            srv_desc.Anonymous.Texture3D.MipLevels = shape.mip_count;
        }
        RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => {
            if shape.is_cube_map {
                if shape.array_length > 6 {
                    srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURECUBEARRAY;
                    srv_desc.Anonymous.TextureCubeArray.MipLevels = shape.mip_count;
                    srv_desc.Anonymous.TextureCubeArray.NumCubes = shape.array_length / 6;
                } else {
                    srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURECUBE;
                    srv_desc.Anonymous.TextureCube.MipLevels = shape.mip_count;
                }
            } else if shape.is_multisampled {
                if shape.array_length > 1 {
                    srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE2DMSARRAY;
                    srv_desc.Anonymous.Texture2DMSArray.ArraySize = shape.array_length;
                } else {
                    srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE2DMS;
                }
            } else if shape.array_length > 1 {
                srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE2DARRAY;
                srv_desc.Anonymous.Texture2DArray.ArraySize = shape.array_length;
                srv_desc.Anonymous.Texture2DArray.MipLevels = shape.mip_count;
            } else {
                srv_desc.ViewDimension = d3d12::D3D12_SRV_DIMENSION_TEXTURE2D;
                srv_desc.Anonymous.Texture2D.MipLevels = shape.mip_count;
            }
        }
    }

    srv_desc
}

// Mip 0 only. Cube maps are written as 2D arrays.
fn create_uav_desc(
    shape: &ViewShape,
    format: DXGI_FORMAT,
) -> d3d12::D3D12_UNORDERED_ACCESS_VIEW_DESC {
    let mut uav_desc = d3d12::D3D12_UNORDERED_ACCESS_VIEW_DESC {
        Format: dxgi_to_uav_format(format),
        ..Default::default()
    };

    match shape.dimensions {
        RhiTextureDimensions::Dim1D => {
            if shape.array_length > 1 {
                uav_desc.ViewDimension = d3d12::D3D12_UAV_DIMENSION_TEXTURE1DARRAY;
                uav_desc.Anonymous.Texture1DArray.ArraySize = shape.array_length;
            } else {
                uav_desc.ViewDimension = d3d12::D3D12_UAV_DIMENSION_TEXTURE1D;
            }
        }
        RhiTextureDimensions::Dim3D => {
            uav_desc.ViewDimension = d3d12::D3D12_UAV_DIMENSION_TEXTURE3D;
            uav_desc.Anonymous.Texture3D.WSize = shape.depth;
        }
        RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => {
            if shape.array_length > 1 {
                uav_desc.ViewDimension = d3d12::D3D12_UAV_DIMENSION_TEXTURE2DARRAY;
                uav_desc.Anonymous.Texture2DArray.ArraySize = shape.array_length;
            } else {
                uav_desc.ViewDimension = d3d12::D3D12_UAV_DIMENSION_TEXTURE2D;
            }
        }
    }

    uav_desc
}

// Mip 0 of every layer
fn create_rtv_desc(
    shape: &ViewShape,
    format: DXGI_FORMAT,
) -> d3d12::D3D12_RENDER_TARGET_VIEW_DESC {
    let mut rtv_desc = d3d12::D3D12_RENDER_TARGET_VIEW_DESC {
        Format: format,
        ..Default::default()
    };

    match shape.dimensions {
        RhiTextureDimensions::Dim1D => {
            if shape.array_length > 1 {
                rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE1DARRAY;
                rtv_desc.Anonymous.Texture1DArray.ArraySize = shape.array_length;
            } else {
                rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE1D;
            }
        }
        RhiTextureDimensions::Dim3D => {
            rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE3D;
            rtv_desc.Anonymous.Texture3D.WSize = shape.depth;
        }
        RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => {
            if shape.is_multisampled {
                if shape.array_length > 1 {
                    rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE2DMSARRAY;
                    rtv_desc.Anonymous.Texture2DMSArray.ArraySize = shape.array_length;
                } else {
                    rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE2DMS;
                }
            } else if shape.array_length > 1 {
                rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE2DARRAY;
                rtv_desc.Anonymous.Texture2DArray.ArraySize = shape.array_length;
            } else {
                rtv_desc.ViewDimension = d3d12::D3D12_RTV_DIMENSION_TEXTURE2D;
            }
        }
    }

    rtv_desc
}

fn create_dsv_desc(
    shape: &ViewShape,
    format: DXGI_FORMAT,
) -> RhiResult<d3d12::D3D12_DEPTH_STENCIL_VIEW_DESC> {
    let mut dsv_desc = d3d12::D3D12_DEPTH_STENCIL_VIEW_DESC {
        Format: format,
        ..Default::default()
    };

    match shape.dimensions {
        RhiTextureDimensions::Dim1D => {
            if shape.array_length > 1 {
                dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE1DARRAY;
                dsv_desc.Anonymous.Texture1DArray.ArraySize = shape.array_length;
            } else {
                dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE1D;
            }
        }
        RhiTextureDimensions::Dim3D => {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Texture,
                "3D textures cannot be depth/stencil targets",
            ));
        }
        RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => {
            if shape.is_multisampled {
                if shape.array_length > 1 {
                    dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE2DMSARRAY;
                    dsv_desc.Anonymous.Texture2DMSArray.ArraySize = shape.array_length;
                } else {
                    dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE2DMS;
                }
            } else if shape.array_length > 1 {
                dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE2DARRAY;
                dsv_desc.Anonymous.Texture2DArray.ArraySize = shape.array_length;
            } else {
                dsv_desc.ViewDimension = d3d12::D3D12_DSV_DIMENSION_TEXTURE2D;
            }
        }
    }

    Ok(dsv_desc)
}

#[derive(Debug)]
struct RhiTextureDx12Inner {
    device_context: RhiDeviceContextDx12,
    texture_def: RhiTextureDef,
    resource: d3d12::ID3D12Resource,
    allocation: Option<Allocation>,
    tracked_state: RhiTrackedState,
    srv: Option<RhiDescriptorIndex>,
    uav: Option<RhiDescriptorIndex>,
    rtv: Option<RhiDescriptorIndex>,
    dsv: Option<RhiDescriptorIndex>,
    _descriptor_slots: RhiDescriptorSlots,
}

impl Drop for RhiTextureDx12Inner {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            log::trace!("destroying texture {:?}", self.resource);
            if let Err(e) = self.device_context.allocator().lock().free(allocation) {
                log::error!("Failed to free texture memory: {}", e);
            }
        } else {
            log::trace!(
                "texture {:?} has no allocation associated with it, only releasing our reference",
                self.resource
            );
        }
    }
}

/// Holds the ID3D12Resource and the views its resource type asks for. Clones share the same
/// resource.
#[derive(Clone, Debug)]
pub struct RhiTextureDx12 {
    inner: Arc<RhiTextureDx12Inner>,
}

// ID3D12Resource is free-threaded
unsafe impl Send for RhiTextureDx12 {}
unsafe impl Sync for RhiTextureDx12 {}

impl PartialEq for RhiTextureDx12 {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl RhiTextureDx12 {
    pub fn texture_def(&self) -> &RhiTextureDef {
        &self.inner.texture_def
    }

    pub fn device_context(&self) -> &RhiDeviceContextDx12 {
        &self.inner.device_context
    }

    pub fn dx12_resource(&self) -> &d3d12::ID3D12Resource {
        &self.inner.resource
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

    pub fn rtv_handle(&self) -> Option<d3d12::D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.inner.rtv.map(|rtv| {
            self.inner
                .device_context
                .cpu_descriptor_handle(RhiDescriptorHeapType::Rtv, rtv)
        })
    }

    pub fn dsv_handle(&self) -> Option<d3d12::D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.inner.dsv.map(|dsv| {
            self.inner
                .device_context
                .cpu_descriptor_handle(RhiDescriptorHeapType::Dsv, dsv)
        })
    }

    pub fn new(
        device_context: &RhiDeviceContextDx12,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureDx12> {
        Self::from_existing(device_context, None, texture_def)
    }

    /// Wraps a resource created elsewhere, or allocates a new one if `existing_image` is None
    pub fn from_existing(
        device_context: &RhiDeviceContextDx12,
        existing_image: Option<RhiRawImageDx12>,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureDx12> {
        texture_def.validate()?;

        let dimensions = texture_def
            .dimensions
            .determine_dimensions(texture_def.extents)
            .ok_or_else(|| {
                RhiError::resource_creation(
                    RhiResourceKind::Texture,
                    format!(
                        "extents {:?} don't fit {:?}",
                        texture_def.extents, texture_def.dimensions
                    ),
                )
            })?;

        let shape = ViewShape {
            dimensions,
            array_length: texture_def.array_length,
            mip_count: texture_def.mip_count,
            depth: texture_def.extents.depth,
            is_cube_map: texture_def
                .resource_type
                .contains(RhiResourceType::TEXTURE_CUBE),
            is_multisampled: texture_def.sample_count != RhiSampleCount::SampleCount1,
        };

        let resource_type = texture_def.resource_type;
        if shape.is_multisampled && resource_type.intersects(RhiResourceType::TEXTURE_READ_WRITE) {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Texture,
                "multisampled textures cannot be written by shaders",
            ));
        }

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

        let format: DXGI_FORMAT = texture_def.format.into();
        let RhiRawImageDx12 {
            resource,
            allocation,
        } = match existing_image {
            Some(existing_image) => existing_image,
            None => Self::create_image(device_context, texture_def, dimensions, format)?,
        };

        // From here on the inner owns the resource, so an early return frees the memory
        let inner = RhiTextureDx12Inner {
            device_context: device_context.clone(),
            texture_def: texture_def.clone(),
            resource,
            allocation,
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            srv,
            uav,
            rtv,
            dsv,
            _descriptor_slots: descriptor_slots,
        };

        let device = device_context.d3d12_device();
        if let Some(srv) = srv {
            let srv_desc = create_srv_desc(&shape, format);
            let handle =
                device_context.cpu_descriptor_handle(RhiDescriptorHeapType::CbvSrvUav, srv);
            unsafe { device.CreateShaderResourceView(&inner.resource, Some(&srv_desc), handle) };
        }

        if let Some(uav) = uav {
            let uav_desc = create_uav_desc(&shape, format);
            let handle =
                device_context.cpu_descriptor_handle(RhiDescriptorHeapType::CbvSrvUav, uav);
            unsafe {
                device.CreateUnorderedAccessView(&inner.resource, None, Some(&uav_desc), handle)
            };
        }

        if let Some(rtv) = rtv {
            let rtv_desc = create_rtv_desc(&shape, format);
            let handle = device_context.cpu_descriptor_handle(RhiDescriptorHeapType::Rtv, rtv);
            unsafe { device.CreateRenderTargetView(&inner.resource, Some(&rtv_desc), handle) };
        }

        if let Some(dsv) = dsv {
            let dsv_desc = create_dsv_desc(&shape, format)?;
            let handle = device_context.cpu_descriptor_handle(RhiDescriptorHeapType::Dsv, dsv);
            unsafe { device.CreateDepthStencilView(&inner.resource, Some(&dsv_desc), handle) };
        }

        log::trace!(
            "Texture {:?} created {:?} {:?}",
            inner.resource,
            texture_def.extents,
            texture_def.format
        );

        Ok(RhiTextureDx12 {
            inner: Arc::new(inner),
        })
    }

    fn create_image(
        device_context: &RhiDeviceContextDx12,
        texture_def: &RhiTextureDef,
        dimensions: RhiTextureDimensions,
        format: DXGI_FORMAT,
    ) -> RhiResult<RhiRawImageDx12> {
        let d3d12_dimension = match dimensions {
            RhiTextureDimensions::Dim1D => d3d12::D3D12_RESOURCE_DIMENSION_TEXTURE1D,
            RhiTextureDimensions::Dim3D => d3d12::D3D12_RESOURCE_DIMENSION_TEXTURE3D,
            RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => {
                d3d12::D3D12_RESOURCE_DIMENSION_TEXTURE2D
            }
        };

        let depth_or_array_size = if dimensions == RhiTextureDimensions::Dim3D {
            texture_def.extents.depth
        } else {
            texture_def.array_length
        };

        let mut desc = d3d12::D3D12_RESOURCE_DESC {
            Dimension: d3d12_dimension,
            // Zero lets the runtime pick 64KB, or 4MB for MSAA
            Alignment: 0,
            Width: texture_def.extents.width as u64,
            Height: texture_def.extents.height,
            DepthOrArraySize: depth_or_array_size as u16,
            MipLevels: texture_def.mip_count as u16,
            // Views reinterpret the format, so the resource itself is typeless
            Format: dxgi_to_typeless(format),
            SampleDesc: texture_def.sample_count.into(),
            Layout: d3d12::D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: d3d12::D3D12_RESOURCE_FLAG_NONE,
        };

        let resource_type = texture_def.resource_type;
        if resource_type.intersects(RhiResourceType::TEXTURE_READ_WRITE) {
            desc.Flags |= d3d12::D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS;
        }

        let mut resource_category = ResourceCategory::OtherTexture;
        let mut d3d_clear_value = d3d12::D3D12_CLEAR_VALUE {
            Format: format,
            ..Default::default()
        };

        let clear_value: Option<*const d3d12::D3D12_CLEAR_VALUE> =
            if resource_type.intersects(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL) {
                desc.Flags |= d3d12::D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL;
                resource_category = ResourceCategory::RtvDsvTexture;
                d3d_clear_value.Anonymous.DepthStencil.Depth = 1.0;
                d3d_clear_value.Anonymous.DepthStencil.Stencil = 0;
                Some(&d3d_clear_value)
            } else if resource_type.intersects(RhiResourceType::RENDER_TARGET_COLOR) {
                desc.Flags |= d3d12::D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET;
                resource_category = ResourceCategory::RtvDsvTexture;
                d3d_clear_value.Anonymous.Color = [0.0, 0.0, 0.0, 0.0];
                Some(&d3d_clear_value)
            } else {
                None
            };

        let device = device_context.d3d12_device();
        let allocation_info = unsafe { device.GetResourceAllocationInfo(0, &[desc]) };

        let allocation = device_context
            .allocator()
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "rhi texture",
                location: MemoryLocation::GpuOnly,
                size: allocation_info.SizeInBytes,
                alignment: allocation_info.Alignment,
                resource_category,
            });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                log::error!("Error allocating texture {:?}: {}", texture_def.extents, e);
                return Err(e.into());
            }
        };

        let mut resource: Option<d3d12::ID3D12Resource> = None;
        let create_result = unsafe {
            device.CreatePlacedResource(
                allocation.heap(),
                allocation.offset(),
                &desc,
                d3d12::D3D12_RESOURCE_STATE_COMMON,
                clear_value,
                &mut resource,
            )
        };

        match create_result.map(|_| resource) {
            Ok(Some(resource)) => Ok(RhiRawImageDx12 {
                resource,
                allocation: Some(allocation),
            }),
            result => {
                let _ = device_context.allocator().lock().free(allocation);
                Err(match result {
                    Err(e) => e.into(),
                    _ => RhiError::resource_creation(
                        RhiResourceKind::Texture,
                        "CreatePlacedResource returned no resource",
                    ),
                })
            }
        }
    }
}
