use super::internal::{d3d, d3d12};
use super::*;
use crate::{
    RhiBuffer, RhiBufferBarrier, RhiClearValues, RhiCmdCopyBufferToTextureParams, RhiFramebuffer,
    RhiIndexBufferBinding, RhiPipeline, RhiResourceState, RhiResult, RhiTexture,
    RhiTextureBarrier, RhiVertexBufferBinding, MAX_VERTEX_INPUT_BINDINGS,
};
use std::mem::ManuallyDrop;

fn dx12_buffer(buffer: &RhiBuffer) -> RhiResult<&RhiBufferDx12> {
    Ok(buffer
        .dx12_buffer()
        .ok_or("buffer was not created by the dx12 backend")?)
}

fn dx12_texture(texture: &RhiTexture) -> RhiResult<&RhiTextureDx12> {
    Ok(texture
        .dx12_texture()
        .ok_or("texture was not created by the dx12 backend")?)
}

fn transition_barrier(
    resource: &d3d12::ID3D12Resource,
    state_before: d3d12::D3D12_RESOURCE_STATES,
    state_after: d3d12::D3D12_RESOURCE_STATES,
) -> d3d12::D3D12_RESOURCE_BARRIER {
    let mut barrier = d3d12::D3D12_RESOURCE_BARRIER::default();
    barrier.Type = d3d12::D3D12_RESOURCE_BARRIER_TYPE_TRANSITION;
    barrier.Flags = d3d12::D3D12_RESOURCE_BARRIER_FLAG_NONE;
    barrier.Anonymous.Transition = ManuallyDrop::new(d3d12::D3D12_RESOURCE_TRANSITION_BARRIER {
        pResource: windows::core::ManuallyDrop::new(resource),
        Subresource: d3d12::D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
        StateBefore: state_before,
        StateAfter: state_after,
    });
    barrier
}

fn uav_barrier(resource: &d3d12::ID3D12Resource) -> d3d12::D3D12_RESOURCE_BARRIER {
    let mut barrier = d3d12::D3D12_RESOURCE_BARRIER::default();
    barrier.Type = d3d12::D3D12_RESOURCE_BARRIER_TYPE_UAV;
    barrier.Flags = d3d12::D3D12_RESOURCE_BARRIER_FLAG_NONE;
    barrier.Anonymous.UAV = ManuallyDrop::new(d3d12::D3D12_RESOURCE_UAV_BARRIER {
        pResource: windows::core::ManuallyDrop::new(resource),
    });
    barrier
}

// None when there is nothing to wait on. D3D12 rejects transitions between identical states.
fn state_barrier(
    resource: &d3d12::ID3D12Resource,
    src_state: RhiResourceState,
    dst_state: RhiResourceState,
) -> Option<d3d12::D3D12_RESOURCE_BARRIER> {
    if src_state == RhiResourceState::UNORDERED_ACCESS
        && dst_state == RhiResourceState::UNORDERED_ACCESS
    {
        return Some(uav_barrier(resource));
    }

    let state_before: d3d12::D3D12_RESOURCE_STATES = src_state.into();
    let state_after: d3d12::D3D12_RESOURCE_STATES = dst_state.into();
    if state_before == state_after {
        return None;
    }

    Some(transition_barrier(resource, state_before, state_after))
}

/// A direct command list with an allocator of its own. The list is created closed so `begin`
/// always starts from a reset.
#[derive(Debug)]
pub struct RhiCommandBufferDx12 {
    device_context: RhiDeviceContextDx12,
    command_allocator: d3d12::ID3D12CommandAllocator,
    command_list: d3d12::ID3D12GraphicsCommandList,
    // D3D12 takes vertex strides per bind rather than from the pipeline
    vertex_buffer_strides: [u32; MAX_VERTEX_INPUT_BINDINGS],
}

// Only one thread records at a time, &mut self guarantees it
unsafe impl Send for RhiCommandBufferDx12 {}
unsafe impl Sync for RhiCommandBufferDx12 {}

impl RhiCommandBufferDx12 {
    pub fn new(device_context: &RhiDeviceContextDx12) -> RhiResult<RhiCommandBufferDx12> {
        let device = device_context.d3d12_device();

        let command_allocator: d3d12::ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(d3d12::D3D12_COMMAND_LIST_TYPE_DIRECT)? };

        let command_list: d3d12::ID3D12GraphicsCommandList = unsafe {
            let command_list = device.CreateCommandList(
                0,
                d3d12::D3D12_COMMAND_LIST_TYPE_DIRECT,
                &command_allocator,
                None,
            )?;
            command_list.Close()?;
            command_list
        };

        log::trace!(
            "Created command list {:?} with allocator {:?}",
            command_list,
            command_allocator
        );

        Ok(RhiCommandBufferDx12 {
            device_context: device_context.clone(),
            command_allocator,
            command_list,
            vertex_buffer_strides: [0; MAX_VERTEX_INPUT_BINDINGS],
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextDx12 {
        &self.device_context
    }

    pub fn dx12_graphics_command_list(&self) -> &d3d12::ID3D12GraphicsCommandList {
        &self.command_list
    }

    pub fn dx12_command_allocator(&self) -> &d3d12::ID3D12CommandAllocator {
        &self.command_allocator
    }

    pub fn begin(&mut self) -> RhiResult<()> {
        unsafe {
            self.command_list.Reset(&self.command_allocator, None)?;
        }

        self.vertex_buffer_strides = [0; MAX_VERTEX_INPUT_BINDINGS];
        Ok(())
    }

    pub fn end(&mut self) -> RhiResult<()> {
        unsafe {
            self.command_list.Close()?;
        }

        Ok(())
    }

    pub fn reset(&mut self) -> RhiResult<()> {
        // Only legal when the list is closed. An open list is closed first so the reset succeeds.
        unsafe {
            let _ = self.command_list.Close();
            self.command_allocator.Reset()?;
        }

        Ok(())
    }

    pub fn cmd_begin_render_pass(
        &mut self,
        framebuffer: &RhiFramebuffer,
        clear_values: &RhiClearValues,
    ) -> RhiResult<()> {
        let dx12_framebuffer = framebuffer
            .dx12_framebuffer()
            .ok_or("framebuffer was not created by the dx12 backend")?;
        let render_pass = framebuffer.render_pass();

        let rtvs = dx12_framebuffer.color_rtv_handles();

        // OMSetRenderTargets reads through this pointer, so the handle must live on this frame
        let dsv_value = dx12_framebuffer.dsv_handle();
        let dsv_ptr = dsv_value
            .as_ref()
            .map(|x| x as *const d3d12::D3D12_CPU_DESCRIPTOR_HANDLE);

        let cmd_list = &self.command_list;
        unsafe {
            cmd_list.OMSetRenderTargets(
                rtvs.len() as u32,
                if rtvs.is_empty() {
                    None
                } else {
                    Some(rtvs.as_ptr())
                },
                false,
                dsv_ptr,
            );
        }

        for (i, rtv) in rtvs.iter().enumerate() {
            if render_pass.should_clear_color(i) {
                let clear_value = clear_values.color_or_default(i);
                unsafe {
                    cmd_list.ClearRenderTargetView(*rtv, clear_value.0.as_ptr(), &[]);
                }
            }
        }

        if let Some(dsv_value) = dsv_value {
            if render_pass.should_clear_depth_stencil() {
                let mut flags = d3d12::D3D12_CLEAR_FLAG_DEPTH;
                if render_pass.should_clear_stencil() {
                    flags |= d3d12::D3D12_CLEAR_FLAG_STENCIL;
                }

                unsafe {
                    cmd_list.ClearDepthStencilView(
                        dsv_value,
                        flags,
                        clear_values.depth_stencil.depth,
                        clear_values.depth_stencil.stencil as u8,
                        &[],
                    );
                }
            }
        }

        let width = framebuffer.width();
        let height = framebuffer.height();
        self.cmd_set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0)?;
        self.cmd_set_scissor(0, 0, width, height)
    }

    pub fn cmd_end_render_pass(&mut self) -> RhiResult<()> {
        // no action necessary
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
            self.command_list.RSSetViewports(&[d3d12::D3D12_VIEWPORT {
                TopLeftX: x,
                TopLeftY: y,
                Width: width,
                Height: height,
                MinDepth: depth_min,
                MaxDepth: depth_max,
            }]);
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
            self.command_list
                .RSSetScissorRects(&[windows::Win32::Foundation::RECT {
                    left: x as i32,
                    top: y as i32,
                    right: (x + width) as i32,
                    bottom: (y + height) as i32,
                }]);
        }

        Ok(())
    }

    pub fn cmd_bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        let pipeline = pipeline
            .dx12_pipeline()
            .ok_or("pipeline was not created by the dx12 backend")?;

        self.vertex_buffer_strides = *pipeline.vertex_buffer_strides();

        let topology: d3d::D3D_PRIMITIVE_TOPOLOGY = pipeline.topology();
        unsafe {
            self.command_list
                .SetGraphicsRootSignature(pipeline.dx12_root_signature());
            self.command_list.IASetPrimitiveTopology(topology);
            self.command_list
                .SetPipelineState(pipeline.dx12_pipeline_state());
        }

        Ok(())
    }

    pub fn cmd_bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        bindings: &[RhiVertexBufferBinding],
    ) -> RhiResult<()> {
        if first_binding as usize + bindings.len() > MAX_VERTEX_INPUT_BINDINGS {
            Err(format!(
                "vertex buffer bindings {}..{} exceed the limit of {}",
                first_binding,
                first_binding as usize + bindings.len(),
                MAX_VERTEX_INPUT_BINDINGS
            ))?;
        }

        let mut buffer_views = Vec::with_capacity(bindings.len());
        for (i, binding) in bindings.iter().enumerate() {
            let buffer = dx12_buffer(binding.buffer)?;
            buffer_views.push(d3d12::D3D12_VERTEX_BUFFER_VIEW {
                BufferLocation: buffer.gpu_address() + binding.byte_offset,
                SizeInBytes: buffer.buffer_def().size.saturating_sub(binding.byte_offset) as u32,
                StrideInBytes: self.vertex_buffer_strides[first_binding as usize + i],
            });
        }

        unsafe {
            self.command_list
                .IASetVertexBuffers(first_binding, Some(&buffer_views));
        }

        Ok(())
    }

    pub fn cmd_bind_index_buffer(
        &mut self,
        binding: &RhiIndexBufferBinding,
    ) -> RhiResult<()> {
        let buffer = dx12_buffer(binding.buffer)?;
        let view = d3d12::D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: buffer.gpu_address() + binding.byte_offset,
            SizeInBytes: buffer.buffer_def().size.saturating_sub(binding.byte_offset) as u32,
            Format: binding.index_type.into(),
        };

        unsafe {
            self.command_list.IASetIndexBuffer(Some(&view));
        }

        Ok(())
    }

    pub fn cmd_draw(
        &mut self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        unsafe {
            self.command_list
                .DrawInstanced(vertex_count, 1, first_vertex, 0);
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
            self.command_list
                .DrawIndexedInstanced(index_count, 1, first_index, vertex_offset, 0);
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
        let src_buffer = dx12_buffer(src_buffer)?;
        let dst_buffer = dx12_buffer(dst_buffer)?;

        unsafe {
            self.command_list.CopyBufferRegion(
                dst_buffer.dx12_resource(),
                dst_offset,
                src_buffer.dx12_resource(),
                src_offset,
                size,
            )
        }

        Ok(())
    }

    pub fn cmd_copy_buffer_to_texture(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> RhiResult<()> {
        let src_buffer = dx12_buffer(src_buffer)?;
        let dst_texture = dx12_texture(dst_texture)?;
        let texture_def = dst_texture.texture_def();

        let subresource = super::internal::dx12_subresource_index(
            params.mip_level,
            params.array_layer,
            0,
            texture_def.mip_count,
            texture_def.array_length,
        );

        let desc = unsafe { dst_texture.dx12_resource().GetDesc() };

        let mut num_rows: u32 = 0;
        let mut row_size_in_bytes: u64 = 0;
        let mut total_bytes: u64 = 0;

        let mut placed_footprint = d3d12::D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default();
        unsafe {
            self.device_context.d3d12_device().GetCopyableFootprints(
                &desc as *const _,
                subresource,
                1,
                params.buffer_offset,
                Some(&mut placed_footprint),
                Some(&mut num_rows as *mut _),
                Some(&mut row_size_in_bytes as *mut _),
                Some(&mut total_bytes as *mut _),
            );
        }

        placed_footprint.Offset = params.buffer_offset;

        let mut src = d3d12::D3D12_TEXTURE_COPY_LOCATION::default();
        src.Type = d3d12::D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT;
        src.pResource = windows::core::ManuallyDrop::new(src_buffer.dx12_resource());
        src.Anonymous.PlacedFootprint = placed_footprint;

        let mut dst = d3d12::D3D12_TEXTURE_COPY_LOCATION::default();
        dst.Type = d3d12::D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX;
        dst.pResource = windows::core::ManuallyDrop::new(dst_texture.dx12_resource());
        dst.Anonymous.SubresourceIndex = subresource;

        unsafe {
            self.command_list
                .CopyTextureRegion(&dst, 0, 0, 0, &src, None);
        }

        Ok(())
    }

    pub fn cmd_resource_barrier(
        &mut self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        let mut barriers = Vec::with_capacity(buffer_barriers.len() + texture_barriers.len());

        for barrier in buffer_barriers {
            let buffer = dx12_buffer(barrier.buffer)?;

            // Buffers are never created in COMMON, the first transition starts from wherever
            // creation put them
            let src_state = if barrier.src_state == RhiResourceState::UNDEFINED {
                buffer.initial_state()
            } else {
                barrier.src_state
            };

            if let Some(dx12_barrier) =
                state_barrier(buffer.dx12_resource(), src_state, barrier.dst_state)
            {
                barriers.push(dx12_barrier);
            }
        }

        for barrier in texture_barriers {
            let texture = dx12_texture(barrier.texture)?;
            if let Some(dx12_barrier) =
                state_barrier(texture.dx12_resource(), barrier.src_state, barrier.dst_state)
            {
                log::trace!(
                    "Transition texture {:?} from {:?} to {:?}",
                    texture.dx12_resource(),
                    barrier.src_state,
                    barrier.dst_state
                );
                barriers.push(dx12_barrier);
            }
        }

        if !barriers.is_empty() {
            unsafe {
                self.command_list.ResourceBarrier(&barriers);
            }
        }

        Ok(())
    }
}
