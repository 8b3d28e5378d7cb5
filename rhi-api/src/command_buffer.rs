#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::RhiCommandBufferDx12;
use crate::null::{RhiCommandBufferNull, RhiNullCommand};
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::RhiCommandBufferVulkan;
use crate::{
    RhiBuffer, RhiBufferBarrier, RhiClearValues, RhiCmdCopyBufferToTextureParams,
    RhiCommandBufferStatus, RhiError, RhiFramebuffer, RhiIndexBufferBinding, RhiLogSink,
    RhiPipeline, RhiResult, RhiTexture, RhiTextureBarrier, RhiVertexBufferBinding,
};
use std::sync::Arc;

/// Permission to write a resource's tracked state. Only command buffers can create one, so
/// tracked state changes only as a side effect of recording a transition.
pub struct RhiStateWriteToken(());

/// The backend half of a command buffer
#[derive(Debug)]
pub enum RhiCommandBufferBackend {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiCommandBufferVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiCommandBufferDx12),
    Null(RhiCommandBufferNull),
}

macro_rules! dispatch_backend {
    ($self:expr, $inner:ident => $body:expr) => {
        match &mut $self.backend {
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandBufferBackend::Vk($inner) => $body,
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiCommandBufferBackend::Dx12($inner) => $body,
            RhiCommandBufferBackend::Null($inner) => $body,
        }
    };
}

/// A list of commands recorded by the CPU and submitted to the GPU.
///
/// Follows a strict lifecycle: `Initial` --begin--> `Recording` --end--> `Executable`
/// --submit--> `Pending` --reset--> `Initial`. Calling `begin` or `end` in the wrong state is an
/// error. Recording commands outside `Recording` is a programming error: it is reported through
/// the log sink, asserts in debug builds and is ignored in release builds.
///
/// Recording a barrier updates the tracked state of the resources it names immediately, so later
/// commands in this buffer (and later command buffers) see the new state before the GPU runs.
pub struct RhiCommandBuffer {
    backend: RhiCommandBufferBackend,
    status: RhiCommandBufferStatus,
    active_framebuffer: Option<RhiFramebuffer>,
    log_sink: Arc<dyn RhiLogSink>,
}

impl std::fmt::Debug for RhiCommandBuffer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiCommandBuffer")
            .field("backend", &self.backend)
            .field("status", &self.status)
            .field("in_render_pass", &self.active_framebuffer.is_some())
            .finish()
    }
}

impl RhiCommandBuffer {
    pub(crate) fn new(
        backend: RhiCommandBufferBackend,
        log_sink: Arc<dyn RhiLogSink>,
    ) -> Self {
        RhiCommandBuffer {
            backend,
            status: RhiCommandBufferStatus::Initial,
            active_framebuffer: None,
            log_sink,
        }
    }

    pub fn status(&self) -> RhiCommandBufferStatus {
        self.status
    }

    pub fn is_in_render_pass(&self) -> bool {
        self.active_framebuffer.is_some()
    }

    pub fn backend(&self) -> &RhiCommandBufferBackend {
        &self.backend
    }

    fn require_status(
        &self,
        expected: RhiCommandBufferStatus,
    ) -> RhiResult<()> {
        if self.status != expected {
            let error = RhiError::CommandBufferState {
                expected,
                actual: self.status,
            };
            self.log_sink.log(log::Level::Error, &error.to_string());
            return Err(error);
        }

        Ok(())
    }

    fn report_misuse(
        &self,
        message: &str,
    ) {
        self.log_sink.log(log::Level::Error, message);
        debug_assert!(false, "{}", message);
    }

    // False (after reporting) if recording commands is not allowed right now
    fn can_record(
        &self,
        command_name: &str,
    ) -> bool {
        if self.status != RhiCommandBufferStatus::Recording {
            self.report_misuse(&format!(
                "{} called on a command buffer that is {:?}, not Recording",
                command_name, self.status
            ));
            return false;
        }

        true
    }

    fn can_record_outside_render_pass(
        &self,
        command_name: &str,
    ) -> bool {
        if !self.can_record(command_name) {
            return false;
        }

        if self.active_framebuffer.is_some() {
            self.report_misuse(&format!(
                "{} may not be called inside a render pass",
                command_name
            ));
            return false;
        }

        true
    }

    fn can_record_inside_render_pass(
        &self,
        command_name: &str,
    ) -> bool {
        if !self.can_record(command_name) {
            return false;
        }

        if self.active_framebuffer.is_none() {
            self.report_misuse(&format!(
                "{} requires an active render pass",
                command_name
            ));
            return false;
        }

        true
    }

    pub fn begin(&mut self) -> RhiResult<()> {
        self.require_status(RhiCommandBufferStatus::Initial)?;
        dispatch_backend!(self, inner => inner.begin())?;
        self.status = RhiCommandBufferStatus::Recording;
        Ok(())
    }

    pub fn end(&mut self) -> RhiResult<()> {
        self.require_status(RhiCommandBufferStatus::Recording)?;
        if self.active_framebuffer.is_some() {
            let message = "cannot end a command buffer while a render pass is open";
            self.log_sink.log(log::Level::Error, message);
            return Err(message)?;
        }

        dispatch_backend!(self, inner => inner.end())?;
        self.status = RhiCommandBufferStatus::Executable;
        Ok(())
    }

    /// Discards everything recorded and returns to `Initial`, from any state. The caller must
    /// ensure a `Pending` command buffer has finished executing on the GPU.
    pub fn reset(&mut self) -> RhiResult<()> {
        dispatch_backend!(self, inner => inner.reset())?;
        self.active_framebuffer = None;
        self.status = RhiCommandBufferStatus::Initial;
        Ok(())
    }

    pub(crate) fn validate_submit(&self) -> RhiResult<()> {
        self.require_status(RhiCommandBufferStatus::Executable)
    }

    pub(crate) fn mark_submitted(&mut self) {
        debug_assert_eq!(self.status, RhiCommandBufferStatus::Executable);
        self.status = RhiCommandBufferStatus::Pending;
    }

    /// Transitions the framebuffer's attachments into their rendering states and begins the pass.
    /// Attachments whose load op is `Clear` are cleared with the matching entry of `clear_values`.
    pub fn cmd_begin_render_pass(
        &mut self,
        framebuffer: &RhiFramebuffer,
        clear_values: &RhiClearValues,
    ) -> RhiResult<()> {
        profiling::scope!("cmd_begin_render_pass");
        if !self.can_record_outside_render_pass("cmd_begin_render_pass") {
            return Ok(());
        }

        framebuffer.prepare_for_rendering(self)?;
        dispatch_backend!(self, inner => inner.cmd_begin_render_pass(framebuffer, clear_values))?;
        self.active_framebuffer = Some(framebuffer.clone());
        Ok(())
    }

    /// Ends the pass and moves attachments that have a final state into it
    pub fn cmd_end_render_pass(&mut self) -> RhiResult<()> {
        if !self.can_record_inside_render_pass("cmd_end_render_pass") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_end_render_pass())?;

        let framebuffer = match self.active_framebuffer.take() {
            Some(framebuffer) => framebuffer,
            None => return Ok(()),
        };

        let final_barriers = framebuffer.final_state_barriers();
        if self.render_pass_applies_final_states() {
            let token = RhiStateWriteToken(());
            for barrier in &final_barriers {
                barrier
                    .texture
                    .tracked_state()
                    .set(barrier.dst_state, &token);
            }
            Ok(())
        } else {
            self.record_barriers(&[], &final_barriers)
        }
    }

    // Vulkan render passes move attachments to their final layout as part of the pass
    fn render_pass_applies_final_states(&self) -> bool {
        match &self.backend {
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandBufferBackend::Vk(_) => true,
            _ => false,
        }
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
        if !self.can_record("cmd_set_viewport") {
            return Ok(());
        }

        dispatch_backend!(self, inner => {
            inner.cmd_set_viewport(x, y, width, height, depth_min, depth_max)
        })
    }

    pub fn cmd_set_scissor(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        if !self.can_record("cmd_set_scissor") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_set_scissor(x, y, width, height))
    }

    pub fn cmd_bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        if !self.can_record("cmd_bind_pipeline") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_bind_pipeline(pipeline))
    }

    pub fn cmd_bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        bindings: &[RhiVertexBufferBinding],
    ) -> RhiResult<()> {
        if !self.can_record("cmd_bind_vertex_buffers") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_bind_vertex_buffers(first_binding, bindings))
    }

    pub fn cmd_bind_index_buffer(
        &mut self,
        binding: &RhiIndexBufferBinding,
    ) -> RhiResult<()> {
        if !self.can_record("cmd_bind_index_buffer") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_bind_index_buffer(binding))
    }

    pub fn cmd_draw(
        &mut self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        if !self.can_record_inside_render_pass("cmd_draw") {
            return Ok(());
        }

        dispatch_backend!(self, inner => inner.cmd_draw(vertex_count, first_vertex))
    }

    pub fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> RhiResult<()> {
        if !self.can_record_inside_render_pass("cmd_draw_indexed") {
            return Ok(());
        }

        dispatch_backend!(self, inner => {
            inner.cmd_draw_indexed(index_count, first_index, vertex_offset)
        })
    }

    /// The source must be in `COPY_SRC` and the destination in `COPY_DST`
    pub fn cmd_copy_buffer_to_buffer(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_buffer: &RhiBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> RhiResult<()> {
        if !self.can_record_outside_render_pass("cmd_copy_buffer_to_buffer") {
            return Ok(());
        }

        dispatch_backend!(self, inner => {
            inner.cmd_copy_buffer_to_buffer(src_buffer, dst_buffer, src_offset, dst_offset, size)
        })
    }

    /// The texture must be in `COPY_DST`
    pub fn cmd_copy_buffer_to_texture(
        &mut self,
        src_buffer: &RhiBuffer,
        dst_texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> RhiResult<()> {
        if !self.can_record_outside_render_pass("cmd_copy_buffer_to_texture") {
            return Ok(());
        }

        dispatch_backend!(self, inner => {
            inner.cmd_copy_buffer_to_texture(src_buffer, dst_texture, params)
        })
    }

    /// Records the transitions in order and updates the tracked state of every resource named
    pub fn cmd_resource_barrier(
        &mut self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        if !self.can_record_outside_render_pass("cmd_resource_barrier") {
            return Ok(());
        }

        self.record_barriers(buffer_barriers, texture_barriers)
    }

    fn record_barriers(
        &mut self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        dispatch_backend!(self, inner => {
            inner.cmd_resource_barrier(buffer_barriers, texture_barriers)
        })?;

        let token = RhiStateWriteToken(());
        for barrier in buffer_barriers {
            barrier
                .buffer
                .tracked_state()
                .set(barrier.dst_state, &token);
        }

        for barrier in texture_barriers {
            barrier
                .texture
                .tracked_state()
                .set(barrier.dst_state, &token);
        }

        Ok(())
    }

    /// Commands recorded so far, if this command buffer belongs to the null backend
    pub fn recorded_commands(&self) -> Option<&[RhiNullCommand]> {
        match &self.backend {
            RhiCommandBufferBackend::Null(inner) => Some(inner.recorded_commands()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_command_buffer(&self) -> Option<&RhiCommandBufferVulkan> {
        match &self.backend {
            RhiCommandBufferBackend::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_command_buffer(&self) -> Option<&RhiCommandBufferDx12> {
        match &self.backend {
            RhiCommandBufferBackend::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_command_buffer(&self) -> Option<&RhiCommandBufferNull> {
        match &self.backend {
            RhiCommandBufferBackend::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
