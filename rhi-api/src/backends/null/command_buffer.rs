use super::RhiDeviceContextNull;
use crate::{
    RhiBuffer, RhiBufferBarrier, RhiClearValues, RhiCmdCopyBufferToTextureParams, RhiFramebuffer,
    RhiIndexBufferBinding, RhiIndexType, RhiPipeline, RhiResourceState, RhiResult, RhiTexture,
    RhiTextureBarrier, RhiVertexBufferBinding,
};

/// One buffer or texture transition within a recorded barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RhiNullTransition {
    pub resource_id: u64,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
}

/// A command recorded by `RhiCommandBufferNull`, in recording order
#[derive(Debug, Clone, PartialEq)]
pub enum RhiNullCommand {
    Barrier {
        buffers: Vec<RhiNullTransition>,
        textures: Vec<RhiNullTransition>,
    },
    BeginRenderPass {
        framebuffer_id: u64,
        cleared_color_attachments: Vec<usize>,
        clear_depth: bool,
        clear_stencil: bool,
    },
    EndRenderPass,
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        depth_min: f32,
        depth_max: f32,
    },
    SetScissor {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    BindPipeline {
        pipeline_id: u64,
    },
    BindVertexBuffers {
        first_binding: u32,
        buffers: Vec<(u64, u64)>,
    },
    BindIndexBuffer {
        buffer_id: u64,
        byte_offset: u64,
        index_type: RhiIndexType,
    },
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    DrawIndexed {
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    },
    CopyBufferToBuffer {
        src_buffer_id: u64,
        dst_buffer_id: u64,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        buffer_id: u64,
        texture_id: u64,
        buffer_offset: u64,
        array_layer: u16,
        mip_level: u8,
    },
}

fn null_buffer_id(buffer: &RhiBuffer) -> RhiResult<u64> {
    Ok(buffer
        .null_buffer()
        .ok_or("buffer was not created by the null backend")?
        .buffer_id())
}

fn null_texture_id(texture: &RhiTexture) -> RhiResult<u64> {
    Ok(texture
        .null_texture()
        .ok_or("texture was not created by the null backend")?
        .texture_id())
}

#[derive(Debug)]
pub struct RhiCommandBufferNull {
    device_context: RhiDeviceContextNull,
    commands: Vec<RhiNullCommand>,
}

impl RhiCommandBufferNull {
    pub fn new(device_context: &RhiDeviceContextNull) -> RhiResult<Self> {
        Ok(RhiCommandBufferNull {
            device_context: device_context.clone(),
            commands: Vec::default(),
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.device_context
    }

    pub fn recorded_commands(&self) -> &[RhiNullCommand] {
        &self.commands
    }

    pub fn begin(&mut self) -> RhiResult<()> {
        Ok(())
    }

    pub fn end(&mut self) -> RhiResult<()> {
        Ok(())
    }

    pub fn reset(&mut self) -> RhiResult<()> {
        self.commands.clear();
        Ok(())
    }

    pub fn cmd_begin_render_pass(
        &mut self,
        framebuffer: &RhiFramebuffer,
        _clear_values: &RhiClearValues,
    ) -> RhiResult<()> {
        let null_framebuffer = framebuffer
            .null_framebuffer()
            .ok_or("framebuffer was not created by the null backend")?;
        let render_pass = framebuffer.render_pass();

        let cleared_color_attachments = (0..framebuffer.color_attachment_count())
            .filter(|&i| render_pass.should_clear_color(i))
            .collect();

        self.commands.push(RhiNullCommand::BeginRenderPass {
            framebuffer_id: null_framebuffer.framebuffer_id(),
            cleared_color_attachments,
            clear_depth: render_pass.should_clear_depth_stencil(),
            clear_stencil: render_pass.should_clear_stencil(),
        });
        Ok(())
    }

    pub fn cmd_end_render_pass(&mut self) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::EndRenderPass);
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
        self.commands.push(RhiNullCommand::SetViewport {
            x,
            y,
            width,
            height,
            depth_min,
            depth_max,
        });
        Ok(())
    }

    pub fn cmd_set_scissor(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::SetScissor {
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    pub fn cmd_bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        let pipeline = pipeline
            .null_pipeline()
            .ok_or("pipeline was not created by the null backend")?;
        self.commands.push(RhiNullCommand::BindPipeline {
            pipeline_id: pipeline.pipeline_id(),
        });
        Ok(())
    }

    pub fn cmd_bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        bindings: &[RhiVertexBufferBinding],
    ) -> RhiResult<()> {
        let mut buffers = Vec::with_capacity(bindings.len());
        for binding in bindings {
            buffers.push((null_buffer_id(binding.buffer)?, binding.byte_offset));
        }

        self.commands.push(RhiNullCommand::BindVertexBuffers {
            first_binding,
            buffers,
        });
        Ok(())
    }

    pub fn cmd_bind_index_buffer(
        &mut self,
        binding: &RhiIndexBufferBinding,
    ) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::BindIndexBuffer {
            buffer_id: null_buffer_id(binding.buffer)?,
            byte_offset: binding.byte_offset,
            index_type: binding.index_type,
        });
        Ok(())
    }

    pub fn cmd_draw(
        &mut self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::Draw {
            vertex_count,
            first_vertex,
        });
        Ok(())
    }

    pub fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::DrawIndexed {
            index_count,
            first_index,
            vertex_offset,
        });
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
        self.commands.push(RhiNullCommand::CopyBufferToBuffer {
            src_buffer_id: null_buffer_id(src_buffer)?,
            dst_buffer_id: null_buffer_id(dst_buffer)?,
            src_offset,
            dst_offset,
            size,
        });
        Ok(())
    }

    pub fn cmd_copy_buffer_to_texture(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> RhiResult<()> {
        self.commands.push(RhiNullCommand::CopyBufferToTexture {
            buffer_id: null_buffer_id(src_buffer)?,
            texture_id: null_texture_id(dst_texture)?,
            buffer_offset: params.buffer_offset,
            array_layer: params.array_layer,
            mip_level: params.mip_level,
        });
        Ok(())
    }

    pub fn cmd_resource_barrier(
        &mut self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        let mut buffers = Vec::with_capacity(buffer_barriers.len());
        for barrier in buffer_barriers {
            buffers.push(RhiNullTransition {
                resource_id: null_buffer_id(barrier.buffer)?,
                src_state: barrier.src_state,
                dst_state: barrier.dst_state,
            });
        }

        let mut textures = Vec::with_capacity(texture_barriers.len());
        for barrier in texture_barriers {
            log::trace!(
                "Transition null texture from {:?} to {:?}",
                barrier.src_state,
                barrier.dst_state
            );
            textures.push(RhiNullTransition {
                resource_id: null_texture_id(barrier.texture)?,
                src_state: barrier.src_state,
                dst_state: barrier.dst_state,
            });
        }

        if !buffers.is_empty() || !textures.is_empty() {
            self.commands
                .push(RhiNullCommand::Barrier { buffers, textures });
        }

        Ok(())
    }
}
