use super::internal::util;
use super::*;
use crate::{
    RhiBuffer, RhiBufferBarrier, RhiClearValues, RhiCmdCopyBufferToTextureParams, RhiFramebuffer,
    RhiIndexBufferBinding, RhiPipeline, RhiResult, RhiTexture, RhiTextureBarrier,
    RhiVertexBufferBinding,
};
use ash::vk;

fn vk_buffer(buffer: &RhiBuffer) -> RhiResult<&RhiBufferVulkan> {
    Ok(buffer
        .vk_buffer()
        .ok_or("buffer was not created by the vulkan backend")?)
}

fn vk_texture(texture: &RhiTexture) -> RhiResult<&RhiTextureVulkan> {
    Ok(texture
        .vk_texture()
        .ok_or("texture was not created by the vulkan backend")?)
}

/// A primary command buffer allocated from a pool it owns alone, so resetting the pool resets
/// just this command buffer
#[derive(Debug)]
pub struct RhiCommandBufferVulkan {
    device_context: RhiDeviceContextVulkan,
    vk_command_pool: vk::CommandPool,
    vk_command_buffer: vk::CommandBuffer,
}

impl Drop for RhiCommandBufferVulkan {
    fn drop(&mut self) {
        // Destroying the pool frees the command buffer allocated from it
        unsafe {
            self.device_context
                .device()
                .destroy_command_pool(self.vk_command_pool, None);
        }
    }
}

impl RhiCommandBufferVulkan {
    pub fn new(device_context: &RhiDeviceContextVulkan) -> RhiResult<RhiCommandBufferVulkan> {
        let device = device_context.device();

        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::TRANSIENT)
            .queue_family_index(device_context.graphics_queue_family_index());

        let vk_command_pool = unsafe { device.create_command_pool(&pool_create_info, None)? };

        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(vk_command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers =
            match unsafe { device.allocate_command_buffers(&command_buffer_allocate_info) } {
                Ok(command_buffers) => command_buffers,
                Err(e) => {
                    unsafe { device.destroy_command_pool(vk_command_pool, None) };
                    return Err(e.into());
                }
            };

        log::trace!(
            "Created command buffer {:?} from pool {:?}",
            command_buffers[0],
            vk_command_pool
        );

        Ok(RhiCommandBufferVulkan {
            device_context: device_context.clone(),
            vk_command_pool,
            vk_command_buffer: command_buffers[0],
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.device_context
    }

    pub fn vk_command_buffer(&self) -> vk::CommandBuffer {
        self.vk_command_buffer
    }

    pub fn vk_command_pool(&self) -> vk::CommandPool {
        self.vk_command_pool
    }

    pub fn begin(&mut self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device_context
                .device()
                .begin_command_buffer(self.vk_command_buffer, &*begin_info)?;
        }

        Ok(())
    }

    pub fn end(&mut self) -> RhiResult<()> {
        unsafe {
            self.device_context
                .device()
                .end_command_buffer(self.vk_command_buffer)?;
        }

        Ok(())
    }

    pub fn reset(&mut self) -> RhiResult<()> {
        unsafe {
            self.device_context
                .device()
                .reset_command_pool(self.vk_command_pool, vk::CommandPoolResetFlags::empty())?;
        }

        Ok(())
    }

    pub fn cmd_begin_render_pass(
        &mut self,
        framebuffer: &RhiFramebuffer,
        clear_values: &RhiClearValues,
    ) -> RhiResult<()> {
        let vk_framebuffer = framebuffer
            .vk_framebuffer()
            .ok_or("framebuffer was not created by the vulkan backend")?;
        let vk_render_pass = framebuffer
            .render_pass()
            .vk_render_pass()
            .ok_or("render pass was not created by the vulkan backend")?;

        // Entries line up with the render pass's attachments, non-clearing ones are ignored
        let mut vk_clear_values: Vec<vk::ClearValue> =
            Vec::with_capacity(framebuffer.color_attachment_count() + 1);
        for i in 0..framebuffer.color_attachment_count() {
            vk_clear_values.push(clear_values.color_or_default(i).into());
        }

        if framebuffer.has_depth_stencil() {
            vk_clear_values.push(clear_values.depth_stencil.into());
        }

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: framebuffer.width(),
                height: framebuffer.height(),
            },
        };

        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(vk_render_pass.vk_render_pass())
            .framebuffer(vk_framebuffer.vk_framebuffer())
            .render_area(render_area)
            .clear_values(&vk_clear_values);

        unsafe {
            self.device_context.device().cmd_begin_render_pass(
                self.vk_command_buffer,
                &*begin_info,
                vk::SubpassContents::INLINE,
            );
        }

        Ok(())
    }

    pub fn cmd_end_render_pass(&mut self) -> RhiResult<()> {
        unsafe {
            self.device_context
                .device()
                .cmd_end_render_pass(self.vk_command_buffer);
        }

        Ok(())
    }

    pub fn cmd_set_viewport(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        depth_min: f32,
        depth_max: f32,
    ) -> RhiResult<()> {
        unsafe {
            // We invert the viewport by using negative height and setting y = y + height, so
            // clip space matches D3D12. Requires vulkan 1.1.
            self.device_context.device().cmd_set_viewport(
                self.vk_command_buffer,
                0,
                &[vk::Viewport {
                    x,
                    y: y + height,
                    width,
                    height: height * -1.0,
                    min_depth: depth_min,
                    max_depth: depth_max,
                }],
            );
        }
        Ok(())
    }

    pub fn cmd_set_scissor(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        unsafe {
            self.device_context.device().cmd_set_scissor(
                self.vk_command_buffer,
                0,
                &[vk::Rect2D {
                    offset: vk::Offset2D {
                        x: x as i32,
                        y: y as i32,
                    },
                    extent: vk::Extent2D { width, height },
                }],
            );
        }
        Ok(())
    }

    pub fn cmd_bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        let pipeline = pipeline
            .vk_pipeline()
            .ok_or("pipeline was not created by the vulkan backend")?;

        unsafe {
            self.device_context.device().cmd_bind_pipeline(
                self.vk_command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.vk_pipeline(),
            );
        }
        Ok(())
    }

    pub fn cmd_bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        bindings: &[RhiVertexBufferBinding],
    ) -> RhiResult<()> {
        let mut buffers = Vec::with_capacity(bindings.len());
        let mut offsets = Vec::with_capacity(bindings.len());
        for binding in bindings {
            buffers.push(vk_buffer(binding.buffer)?.vk_buffer());
            offsets.push(binding.byte_offset);
        }

        unsafe {
            self.device_context.device().cmd_bind_vertex_buffers(
                self.vk_command_buffer,
                first_binding,
                &buffers,
                &offsets,
            )
        }

        Ok(())
    }

    pub fn cmd_bind_index_buffer(
        &mut self,
        binding: &RhiIndexBufferBinding,
    ) -> RhiResult<()> {
        unsafe {
            self.device_context.device().cmd_bind_index_buffer(
                self.vk_command_buffer,
                vk_buffer(binding.buffer)?.vk_buffer(),
                binding.byte_offset,
                binding.index_type.into(),
            )
        }

        Ok(())
    }

    pub fn cmd_draw(
        &mut self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        unsafe {
            self.device_context.device().cmd_draw(
                self.vk_command_buffer,
                vertex_count,
                1,
                first_vertex,
                0,
            )
        }

        Ok(())
    }

    pub fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> RhiResult<()> {
        unsafe {
            self.device_context.device().cmd_draw_indexed(
                self.vk_command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            )
        }

        Ok(())
    }

    pub fn cmd_copy_buffer_to_buffer(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_buffer: &RhiBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> RhiResult<()> {
        unsafe {
            self.device_context.device().cmd_copy_buffer(
                self.vk_command_buffer,
                vk_buffer(src_buffer)?.vk_buffer(),
                vk_buffer(dst_buffer)?.vk_buffer(),
                &[vk::BufferCopy {
                    size,
                    src_offset,
                    dst_offset,
                }],
            );
        }

        Ok(())
    }

    pub fn cmd_copy_buffer_to_texture(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> RhiResult<()> {
        let dst_texture = vk_texture(dst_texture)?;
        let texture_def = dst_texture.texture_def();

        let width = 1.max(texture_def.extents.width >> params.mip_level);
        let height = 1.max(texture_def.extents.height >> params.mip_level);
        let depth = 1.max(texture_def.extents.depth >> params.mip_level);

        unsafe {
            self.device_context.device().cmd_copy_buffer_to_image(
                self.vk_command_buffer,
                vk_buffer(src_buffer)?.vk_buffer(),
                dst_texture.vk_image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[vk::BufferImageCopy {
                    image_extent: vk::Extent3D {
                        width,
                        height,
                        depth,
                    },
                    image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                    image_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: dst_texture.vk_aspect_mask(),
                        mip_level: params.mip_level as u32,
                        base_array_layer: params.array_layer as u32,
                        layer_count: 1,
                    },
                    buffer_offset: params.buffer_offset,
                    buffer_image_height: 0,
                    buffer_row_length: 0,
                }],
            );
        }

        Ok(())
    }

    pub fn cmd_resource_barrier(
        &mut self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        let mut vk_buffer_barriers = Vec::with_capacity(buffer_barriers.len());
        let mut vk_image_barriers = Vec::with_capacity(texture_barriers.len());

        let mut src_access_flags = vk::AccessFlags::empty();
        let mut dst_access_flags = vk::AccessFlags::empty();

        for barrier in buffer_barriers {
            let buffer = vk_buffer(barrier.buffer)?;

            let vk_buffer_barrier = vk::BufferMemoryBarrier::builder()
                .src_access_mask(util::resource_state_to_access_flags(barrier.src_state))
                .dst_access_mask(util::resource_state_to_access_flags(barrier.dst_state))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .buffer(buffer.vk_buffer())
                .size(vk::WHOLE_SIZE)
                .offset(0)
                .build();

            src_access_flags |= vk_buffer_barrier.src_access_mask;
            dst_access_flags |= vk_buffer_barrier.dst_access_mask;

            vk_buffer_barriers.push(vk_buffer_barrier);
        }

        for barrier in texture_barriers {
            let texture = vk_texture(barrier.texture)?;

            let subresource_range = vk::ImageSubresourceRange::builder()
                .aspect_mask(texture.vk_aspect_mask())
                .base_array_layer(0)
                .layer_count(vk::REMAINING_ARRAY_LAYERS)
                .base_mip_level(0)
                .level_count(vk::REMAINING_MIP_LEVELS)
                .build();

            let old_layout = util::resource_state_to_image_layout(barrier.src_state);
            let new_layout = util::resource_state_to_image_layout(barrier.dst_state);
            log::trace!(
                "Transition texture {:?} from {:?} to {:?}",
                texture.vk_image(),
                old_layout,
                new_layout
            );

            let vk_image_barrier = vk::ImageMemoryBarrier::builder()
                .src_access_mask(util::resource_state_to_access_flags(barrier.src_state))
                .dst_access_mask(util::resource_state_to_access_flags(barrier.dst_state))
                .old_layout(old_layout)
                .new_layout(new_layout)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(texture.vk_image())
                .subresource_range(subresource_range)
                .build();

            src_access_flags |= vk_image_barrier.src_access_mask;
            dst_access_flags |= vk_image_barrier.dst_access_mask;

            vk_image_barriers.push(vk_image_barrier);
        }

        let src_stage_mask = util::determine_pipeline_stage_flags(src_access_flags);
        let dst_stage_mask = util::determine_pipeline_stage_flags(dst_access_flags);

        if !vk_buffer_barriers.is_empty() || !vk_image_barriers.is_empty() {
            unsafe {
                self.device_context.device().cmd_pipeline_barrier(
                    self.vk_command_buffer,
                    src_stage_mask,
                    dst_stage_mask,
                    vk::DependencyFlags::empty(),
                    &[],
                    &vk_buffer_barriers,
                    &vk_image_barriers,
                );
            }
        }

        Ok(())
    }
}
