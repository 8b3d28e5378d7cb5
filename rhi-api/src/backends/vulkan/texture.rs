use super::internal::util;
use super::RhiDeviceContextVulkan;
use crate::{
    RhiError, RhiResourceKind, RhiResourceState, RhiResourceType, RhiResult, RhiTextureDef,
    RhiTextureDimensions, RhiTrackedState,
};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

/// An image plus the memory backing it. Images created elsewhere (such as swapchain images) have
/// no allocation and are not destroyed when the texture drops.
#[derive(Debug)]
pub struct RhiRawImageVulkan {
    pub image: vk::Image,
    pub allocation: Option<Allocation>,
}

#[derive(Debug)]
struct RhiTextureVulkanInner {
    device_context: RhiDeviceContextVulkan,
    texture_def: RhiTextureDef,
    image: vk::Image,
    allocation: Option<Allocation>,
    aspect_mask: vk::ImageAspectFlags,
    tracked_state: RhiTrackedState,

    // For reading
    srv_view: Option<vk::ImageView>,
    // For writing, one per mip
    uav_views: Vec<vk::ImageView>,
    // Mip 0 of the first layer, what framebuffers attach
    render_target_view: Option<vk::ImageView>,
}

impl Drop for RhiTextureVulkanInner {
    fn drop(&mut self) {
        let device = self.device_context.device();

        unsafe {
            for view in self
                .srv_view
                .iter()
                .chain(self.uav_views.iter())
                .chain(self.render_target_view.iter())
            {
                device.destroy_image_view(*view, None);
            }
        }

        if let Some(allocation) = self.allocation.take() {
            log::trace!("destroying image {:?}", self.image);
            unsafe {
                device.destroy_image(self.image, None);
            }

            if let Err(e) = self.device_context.allocator().lock().free(allocation) {
                log::error!("Failed to free image memory: {}", e);
            }
        } else {
            log::trace!(
                "image {:?} has no allocation associated with it, not destroying it",
                self.image
            );
        }
    }
}

/// Holds the vk::Image and a few vk::ImageViews depending on the resource type in the texture
/// def. Clones share the same image.
#[derive(Clone, Debug)]
pub struct RhiTextureVulkan {
    inner: Arc<RhiTextureVulkanInner>,
}

impl PartialEq for RhiTextureVulkan {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.inner.image == other.inner.image
    }
}

impl RhiTextureVulkan {
    pub fn texture_def(&self) -> &RhiTextureDef {
        &self.inner.texture_def
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.inner.device_context
    }

    pub fn texture_id(&self) -> u64 {
        self.inner.image.as_raw()
    }

    pub fn vk_image(&self) -> vk::Image {
        self.inner.image
    }

    pub fn vk_aspect_mask(&self) -> vk::ImageAspectFlags {
        self.inner.aspect_mask
    }

    pub fn vk_srv_view(&self) -> Option<vk::ImageView> {
        self.inner.srv_view
    }

    pub fn vk_uav_views(&self) -> &[vk::ImageView] {
        &self.inner.uav_views
    }

    pub fn vk_render_target_view(&self) -> Option<vk::ImageView> {
        self.inner.render_target_view
    }

    pub(crate) fn tracked_state(&self) -> &RhiTrackedState {
        &self.inner.tracked_state
    }

    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureVulkan> {
        Self::from_existing(device_context, None, texture_def)
    }

    /// Wraps an image created elsewhere, or allocates a new one if `existing_image` is None
    pub fn from_existing(
        device_context: &RhiDeviceContextVulkan,
        existing_image: Option<RhiRawImageVulkan>,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureVulkan> {
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

        let image_type = match dimensions {
            RhiTextureDimensions::Dim1D => vk::ImageType::TYPE_1D,
            RhiTextureDimensions::Dim3D => vk::ImageType::TYPE_3D,
            RhiTextureDimensions::Dim2D | RhiTextureDimensions::Auto => vk::ImageType::TYPE_2D,
        };

        let is_cubemap = texture_def
            .resource_type
            .contains(RhiResourceType::TEXTURE_CUBE);
        let format_vk: vk::Format = texture_def.format.into();

        let device = device_context.device();
        let RhiRawImageVulkan { image, allocation } = match existing_image {
            Some(existing_image) => existing_image,
            None => {
                Self::create_image(device_context, texture_def, image_type, is_cubemap, format_vk)?
            }
        };

        // From here on the inner owns the image, so an early return cleans up whatever was made
        let mut inner = RhiTextureVulkanInner {
            device_context: device_context.clone(),
            texture_def: texture_def.clone(),
            image,
            allocation,
            aspect_mask: util::image_format_to_aspect_mask(texture_def.format),
            tracked_state: RhiTrackedState::new(RhiResourceState::UNDEFINED),
            srv_view: None,
            uav_views: vec![],
            render_target_view: None,
        };

        let mut image_view_type = if image_type == vk::ImageType::TYPE_1D {
            if texture_def.array_length > 1 {
                vk::ImageViewType::TYPE_1D_ARRAY
            } else {
                vk::ImageViewType::TYPE_1D
            }
        } else if image_type == vk::ImageType::TYPE_2D {
            if is_cubemap {
                if texture_def.array_length > 6 {
                    vk::ImageViewType::CUBE_ARRAY
                } else {
                    vk::ImageViewType::CUBE
                }
            } else if texture_def.array_length > 1 {
                vk::ImageViewType::TYPE_2D_ARRAY
            } else {
                vk::ImageViewType::TYPE_2D
            }
        } else {
            vk::ImageViewType::TYPE_3D
        };

        let subresource_range = vk::ImageSubresourceRange::builder()
            .aspect_mask(inner.aspect_mask)
            .base_array_layer(0)
            .layer_count(texture_def.array_length)
            .base_mip_level(0)
            .level_count(texture_def.mip_count);

        let mut image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(image_view_type)
            .format(format_vk)
            .components(vk::ComponentMapping::default())
            .subresource_range(*subresource_range)
            .build();

        // Shaders sample depth only
        if texture_def.resource_type.intersects(RhiResourceType::TEXTURE) {
            let mut create_info = image_view_create_info;
            create_info.subresource_range.aspect_mask &= !vk::ImageAspectFlags::STENCIL;
            inner.srv_view = Some(unsafe { device.create_image_view(&create_info, None)? });
        }

        if texture_def
            .resource_type
            .intersects(RhiResourceType::TEXTURE_READ_WRITE)
        {
            if image_view_type == vk::ImageViewType::CUBE_ARRAY
                || image_view_type == vk::ImageViewType::CUBE
            {
                image_view_type = vk::ImageViewType::TYPE_2D_ARRAY;
            }

            image_view_create_info.view_type = image_view_type;
            image_view_create_info.subresource_range.level_count = 1;

            for i in 0..texture_def.mip_count {
                image_view_create_info.subresource_range.base_mip_level = i;
                let view = unsafe { device.create_image_view(&image_view_create_info, None)? };
                inner.uav_views.push(view);
            }
        }

        if texture_def.resource_type.is_render_target() {
            let view_type = if image_type == vk::ImageType::TYPE_1D {
                vk::ImageViewType::TYPE_1D
            } else {
                vk::ImageViewType::TYPE_2D
            };

            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(view_type)
                .format(format_vk)
                .components(vk::ComponentMapping::default())
                .subresource_range(
                    vk::ImageSubresourceRange::builder()
                        .aspect_mask(inner.aspect_mask)
                        .base_array_layer(0)
                        .layer_count(1)
                        .base_mip_level(0)
                        .level_count(1)
                        .build(),
                );
            inner.render_target_view =
                Some(unsafe { device.create_image_view(&create_info, None)? });
        }

        Ok(RhiTextureVulkan {
            inner: Arc::new(inner),
        })
    }

    fn create_image(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
        image_type: vk::ImageType,
        is_cubemap: bool,
        format_vk: vk::Format,
    ) -> RhiResult<RhiRawImageVulkan> {
        let usage_flags = util::resource_type_image_usage_flags(texture_def.resource_type);

        let mut create_flags = vk::ImageCreateFlags::empty();
        if is_cubemap {
            create_flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        }

        let extent = vk::Extent3D {
            width: texture_def.extents.width,
            height: texture_def.extents.height,
            depth: texture_def.extents.depth,
        };

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(image_type)
            .extent(extent)
            .mip_levels(texture_def.mip_count)
            .array_layers(texture_def.array_length)
            .format(format_vk)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(usage_flags)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(texture_def.sample_count.into())
            .flags(create_flags);

        let device = device_context.device();
        let image = unsafe { device.create_image(&image_create_info, None)? };
        let requirements = unsafe { device.get_image_memory_requirements(image) };

        let allocation = device_context
            .allocator()
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "rhi texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                log::error!("Error allocating image {:?}: {}", texture_def.extents, e);
                unsafe { device.destroy_image(image, None) };
                return Err(e.into());
            }
        };

        let bind_result =
            unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) };
        if let Err(e) = bind_result {
            unsafe { device.destroy_image(image, None) };
            let _ = device_context.allocator().lock().free(allocation);
            return Err(e.into());
        }

        Ok(RhiRawImageVulkan {
            image,
            allocation: Some(allocation),
        })
    }
}
