use parking_lot::Mutex;
use rhi_api::null::RhiNullCommand;
use rhi_api::*;
use std::sync::Arc;

#[derive(Default)]
struct CapturingLogSink {
    messages: Mutex<Vec<(log::Level, String)>>,
}

impl CapturingLogSink {
    fn error_count(&self) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(level, _)| *level == log::Level::Error)
            .count()
    }
}

impl RhiLogSink for CapturingLogSink {
    fn log(
        &self,
        level: log::Level,
        message: &str,
    ) {
        self.messages.lock().push((level, message.to_string()));
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create_api(heap_sizes: RhiDescriptorHeapSizes) -> (RhiApi, Arc<CapturingLogSink>) {
    init_logging();
    let sink = Arc::new(CapturingLogSink::default());
    let api_def = RhiApiDef {
        descriptor_heap_sizes: heap_sizes,
        log_sink: sink.clone(),
        ..Default::default()
    };

    let api = RhiApi::new_null(&api_def).unwrap();
    (api, sink)
}

fn spirv_module() -> Vec<u8> {
    let mut module = rhi_api::null::SPIRV_MAGIC_NUMBER.to_le_bytes().to_vec();
    module.extend_from_slice(&[0; 16]);
    module
}

fn shader_def(bytecode: Vec<u8>) -> RhiShaderDef {
    RhiShaderDef {
        stages: vec![
            RhiShaderStageDef {
                shader_stage: RhiShaderStageFlags::VERTEX,
                entry_point: "main".to_string(),
                bytecode: bytecode.clone(),
            },
            RhiShaderStageDef {
                shader_stage: RhiShaderStageFlags::FRAGMENT,
                entry_point: "main".to_string(),
                bytecode,
            },
        ],
    }
}

fn color_target_def(
    width: u32,
    height: u32,
    format: RhiFormat,
) -> RhiTextureDef {
    RhiTextureDef {
        extents: RhiExtents3D {
            width,
            height,
            depth: 1,
        },
        format,
        resource_type: RhiResourceType::TEXTURE | RhiResourceType::RENDER_TARGET_COLOR,
        ..Default::default()
    }
}

fn single_color_pass_def(final_state: Option<RhiResourceState>) -> RhiRenderPassDef {
    RhiRenderPassDef {
        color_attachments: vec![RhiColorAttachmentDef {
            format: RhiFormat::R8G8B8A8_UNORM,
            load_op: RhiLoadOp::Clear,
            store_op: RhiStoreOp::Store,
            final_state,
        }],
        depth_stencil_attachment: None,
        sample_count: RhiSampleCount::SampleCount1,
    }
}

struct PipelineStates {
    layout: RhiPipelineLayoutDef,
    vertex_layout: RhiVertexLayout,
    blend_state: RhiBlendState,
    depth_state: RhiDepthState,
    rasterizer_state: RhiRasterizerState,
}

impl Default for PipelineStates {
    fn default() -> Self {
        PipelineStates {
            layout: RhiPipelineLayoutDef {
                bindings: vec![RhiPipelineLayoutBinding {
                    set_index: 0,
                    binding: 0,
                    resource_type: RhiResourceType::UNIFORM_BUFFER,
                    stage_flags: RhiShaderStageFlags::VERTEX,
                    element_count: 1,
                }],
                push_constant_size: 0,
                push_constant_stages: RhiShaderStageFlags::NONE,
            },
            vertex_layout: RhiVertexLayout {
                attributes: vec![RhiVertexLayoutAttribute {
                    format: RhiFormat::R32G32B32_SFLOAT,
                    buffer_index: 0,
                    location: 0,
                    byte_offset: 0,
                    hlsl_semantic: "POSITION".to_string(),
                }],
                buffers: vec![RhiVertexLayoutBuffer {
                    stride: 12,
                    rate: RhiVertexAttributeRate::Vertex,
                }],
            },
            blend_state: Default::default(),
            depth_state: Default::default(),
            rasterizer_state: Default::default(),
        }
    }
}

impl PipelineStates {
    fn pipeline_def<'a>(
        &'a self,
        shader: &'a RhiShader,
        render_pass: &'a RhiRenderPass,
    ) -> RhiGraphicsPipelineDef<'a> {
        RhiGraphicsPipelineDef {
            shader,
            render_pass,
            layout: &self.layout,
            vertex_layout: &self.vertex_layout,
            blend_state: &self.blend_state,
            depth_state: &self.depth_state,
            rasterizer_state: &self.rasterizer_state,
            primitive_topology: RhiPrimitiveTopology::TriangleList,
            sample_count: RhiSampleCount::SampleCount1,
        }
    }
}

#[test]
fn render_pass_transitions_attachments() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let texture = device_context
        .create_texture(&color_target_def(512, 512, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    assert_eq!(texture.current_state(), RhiResourceState::UNDEFINED);

    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(Some(
            RhiResourceState::SHADER_RESOURCE,
        )))
        .unwrap();
    assert!(render_pass.should_clear_color(0));
    assert!(!render_pass.should_clear_color(1));

    let framebuffer = device_context
        .create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments: &[&texture],
            depth_stencil_attachment: None,
        })
        .unwrap();
    assert_eq!(framebuffer.width(), 512);
    assert_eq!(framebuffer.height(), 512);
    assert_eq!(framebuffer.color_attachment_count(), 1);
    assert!(!framebuffer.has_depth_stencil());

    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();

    command_buffer
        .cmd_begin_render_pass(
            &framebuffer,
            &RhiClearValues {
                color: vec![RhiColorClearValue([0.0, 0.0, 0.0, 1.0])],
                ..Default::default()
            },
        )
        .unwrap();
    assert!(command_buffer.is_in_render_pass());
    assert_eq!(texture.current_state(), RhiResourceState::RENDER_TARGET);

    command_buffer.cmd_end_render_pass().unwrap();
    assert_eq!(texture.current_state(), RhiResourceState::SHADER_RESOURCE);

    command_buffer.end().unwrap();

    let commands = command_buffer.recorded_commands().unwrap();
    assert_eq!(commands.len(), 4);
    match &commands[0] {
        RhiNullCommand::Barrier { buffers, textures } => {
            assert!(buffers.is_empty());
            assert_eq!(textures.len(), 1);
            assert_eq!(textures[0].src_state, RhiResourceState::UNDEFINED);
            assert_eq!(textures[0].dst_state, RhiResourceState::RENDER_TARGET);
        }
        other => panic!("expected a barrier, got {:?}", other),
    }
    match &commands[1] {
        RhiNullCommand::BeginRenderPass {
            cleared_color_attachments,
            clear_depth,
            ..
        } => {
            assert_eq!(cleared_color_attachments, &vec![0]);
            assert!(!clear_depth);
        }
        other => panic!("expected a render pass, got {:?}", other),
    }
    assert_eq!(commands[2], RhiNullCommand::EndRenderPass);
    match &commands[3] {
        RhiNullCommand::Barrier { textures, .. } => {
            assert_eq!(textures[0].src_state, RhiResourceState::RENDER_TARGET);
            assert_eq!(textures[0].dst_state, RhiResourceState::SHADER_RESOURCE);
        }
        other => panic!("expected a barrier, got {:?}", other),
    }

    device_context
        .submit(&mut [&mut command_buffer])
        .unwrap();
    assert_eq!(command_buffer.status(), RhiCommandBufferStatus::Pending);
}

#[test]
fn attachments_without_final_state_stay_render_targets() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let texture = device_context
        .create_texture(&color_target_def(64, 64, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(None))
        .unwrap();
    let framebuffer = device_context
        .create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments: &[&texture],
            depth_stencil_attachment: None,
        })
        .unwrap();

    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();
    for _ in 0..2 {
        command_buffer
            .cmd_begin_render_pass(&framebuffer, &Default::default())
            .unwrap();
        command_buffer.cmd_end_render_pass().unwrap();
    }
    command_buffer.end().unwrap();

    // Only the first pass needs a transition
    let barrier_count = command_buffer
        .recorded_commands()
        .unwrap()
        .iter()
        .filter(|x| matches!(x, RhiNullCommand::Barrier { .. }))
        .count();
    assert_eq!(barrier_count, 1);
    assert_eq!(texture.current_state(), RhiResourceState::RENDER_TARGET);
}

#[test]
fn recorded_barrier_updates_tracked_state_before_submit() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let texture = device_context
        .create_texture(&RhiTextureDef {
            extents: RhiExtents3D {
                width: 16,
                height: 16,
                depth: 1,
            },
            format: RhiFormat::R8G8B8A8_SRGB,
            ..Default::default()
        })
        .unwrap();
    let buffer = device_context
        .create_buffer(&RhiBufferDef::for_staging_buffer(
            16 * 16 * 4,
            RhiResourceType::BUFFER,
        ))
        .unwrap();

    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_resource_barrier(
            &[RhiBufferBarrier::to_state(&buffer, RhiResourceState::COPY_SRC)],
            &[RhiTextureBarrier::to_state(
                &texture,
                RhiResourceState::COPY_DST,
            )],
        )
        .unwrap();
    command_buffer
        .cmd_copy_buffer_to_texture(&buffer, &texture, &Default::default())
        .unwrap();
    command_buffer
        .cmd_resource_barrier(
            &[],
            &[RhiTextureBarrier::to_state(
                &texture,
                RhiResourceState::SHADER_RESOURCE,
            )],
        )
        .unwrap();

    assert_eq!(buffer.current_state(), RhiResourceState::COPY_SRC);
    assert_eq!(texture.current_state(), RhiResourceState::SHADER_RESOURCE);
    assert_eq!(command_buffer.status(), RhiCommandBufferStatus::Recording);

    // Reset discards commands but not the state the resources were left in
    command_buffer.reset().unwrap();
    assert!(command_buffer.recorded_commands().unwrap().is_empty());
    assert_eq!(texture.current_state(), RhiResourceState::SHADER_RESOURCE);
}

#[test]
fn command_buffer_lifecycle() {
    let (api, sink) = create_api(Default::default());
    let device_context = api.device_context();
    let mut command_buffer = device_context.create_command_buffer().unwrap();
    assert_eq!(command_buffer.status(), RhiCommandBufferStatus::Initial);

    match command_buffer.end() {
        Err(RhiError::CommandBufferState { expected, actual }) => {
            assert_eq!(expected, RhiCommandBufferStatus::Recording);
            assert_eq!(actual, RhiCommandBufferStatus::Initial);
        }
        other => panic!("unexpected result {:?}", other),
    }

    command_buffer.begin().unwrap();
    assert!(command_buffer.begin().is_err());
    assert_eq!(command_buffer.status(), RhiCommandBufferStatus::Recording);

    // Only executable command buffers can be submitted
    assert!(device_context
        .submit(&mut [&mut command_buffer])
        .is_err());

    command_buffer.end().unwrap();
    device_context
        .submit(&mut [&mut command_buffer])
        .unwrap();
    assert!(command_buffer.begin().is_err());

    command_buffer.reset().unwrap();
    assert_eq!(command_buffer.status(), RhiCommandBufferStatus::Initial);
    command_buffer.begin().unwrap();

    assert_eq!(sink.error_count(), 4);
}

#[test]
fn cannot_end_inside_render_pass() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let texture = device_context
        .create_texture(&color_target_def(32, 32, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(None))
        .unwrap();
    let framebuffer = device_context
        .create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments: &[&texture],
            depth_stencil_attachment: None,
        })
        .unwrap();

    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_begin_render_pass(&framebuffer, &Default::default())
        .unwrap();
    assert!(command_buffer.end().is_err());

    command_buffer.cmd_end_render_pass().unwrap();
    command_buffer.end().unwrap();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic]
fn draw_outside_render_pass_asserts() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();
    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();
    let _ = command_buffer.cmd_draw(3, 0);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic]
fn recording_before_begin_asserts() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();
    let mut command_buffer = device_context.create_command_buffer().unwrap();
    let _ = command_buffer.cmd_set_scissor(0, 0, 16, 16);
}

#[test]
fn draw_records_bound_state() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let texture = device_context
        .create_texture(&color_target_def(128, 128, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(None))
        .unwrap();
    let framebuffer = device_context
        .create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments: &[&texture],
            depth_stencil_attachment: None,
        })
        .unwrap();
    let shader = device_context
        .create_shader(&shader_def(spirv_module()))
        .unwrap();
    let states = PipelineStates::default();
    let pipeline = device_context
        .create_graphics_pipeline(&states.pipeline_def(&shader, &render_pass))
        .unwrap();

    let vertices = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut vertex_buffer = device_context
        .create_buffer(&RhiBufferDef::for_staging_buffer_data(
            &vertices,
            RhiResourceType::VERTEX_BUFFER,
        ))
        .unwrap();
    vertex_buffer.copy_to_host_visible_buffer(&vertices).unwrap();

    let mut command_buffer = device_context.create_command_buffer().unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_resource_barrier(
            &[RhiBufferBarrier::to_state(
                &vertex_buffer,
                RhiResourceState::VERTEX_AND_CONSTANT_BUFFER,
            )],
            &[],
        )
        .unwrap();
    command_buffer
        .cmd_begin_render_pass(&framebuffer, &Default::default())
        .unwrap();
    command_buffer
        .cmd_set_viewport(0.0, 0.0, 128.0, 128.0, 0.0, 1.0)
        .unwrap();
    command_buffer.cmd_set_scissor(0, 0, 128, 128).unwrap();
    command_buffer.cmd_bind_pipeline(&pipeline).unwrap();
    command_buffer
        .cmd_bind_vertex_buffers(
            0,
            &[RhiVertexBufferBinding {
                buffer: &vertex_buffer,
                byte_offset: 0,
            }],
        )
        .unwrap();
    command_buffer.cmd_draw(3, 0).unwrap();
    command_buffer.cmd_end_render_pass().unwrap();
    command_buffer.end().unwrap();

    let commands = command_buffer.recorded_commands().unwrap();
    assert!(commands.contains(&RhiNullCommand::BindPipeline {
        pipeline_id: pipeline.pipeline_id()
    }));
    assert!(commands.contains(&RhiNullCommand::Draw {
        vertex_count: 3,
        first_vertex: 0
    }));
}

#[test]
fn failed_rebuild_keeps_previous_pipeline() {
    let (api, sink) = create_api(Default::default());
    let device_context = api.device_context();

    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(None))
        .unwrap();
    let shader = device_context
        .create_shader(&shader_def(spirv_module()))
        .unwrap();
    let states = PipelineStates::default();
    let mut pipeline = device_context
        .create_graphics_pipeline(&states.pipeline_def(&shader, &render_pass))
        .unwrap();

    let pipeline_id = pipeline.pipeline_id();
    let pipeline_layout_id = pipeline.pipeline_layout_id();

    // Accepted at shader creation, rejected when the pipeline compiles it
    let broken_shader = device_context
        .create_shader(&shader_def(vec![0xDE, 0xAD, 0xBE, 0xEF]))
        .unwrap();
    let result = device_context.rebuild_graphics_pipeline(
        &mut pipeline,
        &states.pipeline_def(&broken_shader, &render_pass),
    );
    match result {
        Err(RhiError::PipelineStageCreation { stage, .. }) => {
            assert_eq!(stage, RhiPipelineStage::ShaderStages)
        }
        other => panic!("unexpected result {:?}", other),
    }

    assert_eq!(pipeline.pipeline_id(), pipeline_id);
    assert_eq!(pipeline.pipeline_layout_id(), pipeline_layout_id);
    assert_eq!(sink.error_count(), 1);

    device_context
        .rebuild_graphics_pipeline(&mut pipeline, &states.pipeline_def(&shader, &render_pass))
        .unwrap();
    assert_ne!(pipeline.pipeline_id(), pipeline_id);
}

#[test]
fn pipeline_reports_failing_stage() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let render_pass = device_context
        .create_render_pass(&single_color_pass_def(None))
        .unwrap();
    let shader = device_context
        .create_shader(&shader_def(spirv_module()))
        .unwrap();

    let mut states = PipelineStates::default();
    states.depth_state.depth_test_enable = true;
    match device_context.create_graphics_pipeline(&states.pipeline_def(&shader, &render_pass)) {
        Err(RhiError::PipelineStageCreation { stage, .. }) => {
            assert_eq!(stage, RhiPipelineStage::DepthStencil)
        }
        other => panic!("unexpected result {:?}", other),
    }

    let mut states = PipelineStates::default();
    states.vertex_layout.buffers[0].stride = 4;
    match device_context.create_graphics_pipeline(&states.pipeline_def(&shader, &render_pass)) {
        Err(RhiError::PipelineStageCreation { stage, .. }) => {
            assert_eq!(stage, RhiPipelineStage::VertexInput)
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Earlier stages fail first
    let mut states = PipelineStates::default();
    states.vertex_layout.buffers[0].stride = 4;
    states.depth_state.depth_test_enable = true;
    let broken_shader = device_context
        .create_shader(&shader_def(vec![0; 8]))
        .unwrap();
    match device_context
        .create_graphics_pipeline(&states.pipeline_def(&broken_shader, &render_pass))
    {
        Err(RhiError::PipelineStageCreation { stage, .. }) => {
            assert_eq!(stage, RhiPipelineStage::ShaderStages)
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn sampler_heap_exhaustion_recovers() {
    let (api, sink) = create_api(RhiDescriptorHeapSizes {
        sampler: 2,
        ..Default::default()
    });
    let device_context = api.device_context();

    let sampler_def = RhiSamplerDef::default();
    let first = device_context.create_sampler(&sampler_def).unwrap();
    let _second = device_context.create_sampler(&sampler_def).unwrap();

    match device_context.create_sampler(&sampler_def) {
        Err(error) => {
            assert!(matches!(
                error,
                RhiError::HeapExhausted {
                    heap: RhiDescriptorHeapType::Sampler
                }
            ));
            assert!(error.is_retryable());
        }
        Ok(_) => panic!("sampler heap should be exhausted"),
    }
    assert_eq!(sink.error_count(), 1);

    drop(first);
    let _third = device_context.create_sampler(&sampler_def).unwrap();

    let heap = device_context
        .null_device_context()
        .unwrap()
        .descriptor_heap(RhiDescriptorHeapType::Sampler);
    assert_eq!(heap.allocated_count(), 2);
}

#[test]
fn failed_texture_creation_releases_descriptor_slots() {
    let (api, _sink) = create_api(RhiDescriptorHeapSizes {
        rtv: 0,
        ..Default::default()
    });
    let device_context = api.device_context();

    // The shader resource view is allocated before the render target view fails
    assert!(device_context
        .create_texture(&color_target_def(8, 8, RhiFormat::R8G8B8A8_UNORM))
        .is_err());

    let heap = device_context
        .null_device_context()
        .unwrap()
        .descriptor_heap(RhiDescriptorHeapType::CbvSrvUav);
    assert_eq!(heap.allocated_count(), 0);
}

#[test]
fn framebuffer_rejects_mismatched_attachments() {
    let (api, sink) = create_api(Default::default());
    let device_context = api.device_context();

    let render_pass = device_context
        .create_render_pass(&RhiRenderPassDef {
            color_attachments: vec![
                RhiColorAttachmentDef {
                    format: RhiFormat::R8G8B8A8_UNORM,
                    load_op: RhiLoadOp::Clear,
                    store_op: RhiStoreOp::Store,
                    final_state: None,
                },
                RhiColorAttachmentDef {
                    format: RhiFormat::R8G8B8A8_UNORM,
                    load_op: RhiLoadOp::Load,
                    store_op: RhiStoreOp::Store,
                    final_state: None,
                },
            ],
            depth_stencil_attachment: None,
            sample_count: RhiSampleCount::SampleCount1,
        })
        .unwrap();

    let full_size = device_context
        .create_texture(&color_target_def(256, 256, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let half_size = device_context
        .create_texture(&color_target_def(128, 128, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let wrong_format = device_context
        .create_texture(&color_target_def(256, 256, RhiFormat::R8G8B8A8_SRGB))
        .unwrap();

    let attempts: [&[&RhiTexture]; 3] = [
        &[&full_size, &half_size],
        &[&full_size, &wrong_format],
        &[&full_size],
    ];
    for &color_attachments in attempts.iter() {
        let result = device_context.create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments,
            depth_stencil_attachment: None,
        });
        assert!(matches!(result, Err(RhiError::FramebufferIncompatible(_))));
    }
    assert_eq!(sink.error_count(), attempts.len());

    let other = device_context
        .create_texture(&color_target_def(256, 256, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    let framebuffer = device_context
        .create_framebuffer(&RhiFramebufferDef {
            render_pass: &render_pass,
            color_attachments: &[&full_size, &other],
            depth_stencil_attachment: None,
        })
        .unwrap();
    assert_eq!(framebuffer.color_attachment_count(), 2);
}

#[test]
fn device_local_buffers_cannot_be_mapped() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let mut buffer = device_context
        .create_buffer(&RhiBufferDef {
            size: 256,
            memory_usage: RhiMemoryUsage::GpuOnly,
            resource_type: RhiResourceType::VERTEX_BUFFER,
            ..Default::default()
        })
        .unwrap();

    assert!(matches!(
        buffer.map(),
        Err(RhiError::ResourceCreation {
            kind: RhiResourceKind::Buffer,
            ..
        })
    ));
    assert!(buffer.copy_to_host_visible_buffer(&[1u32, 2, 3]).is_err());
}

#[test]
fn host_visible_buffer_round_trips_bytes() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let mut buffer = device_context
        .create_buffer(&RhiBufferDef::for_staging_uniform_buffer(16))
        .unwrap();

    buffer
        .copy_to_host_visible_buffer_with_offset(&[0xAABBCCDDu32], 4)
        .unwrap();
    {
        let mapped = buffer.map().unwrap();
        assert_eq!(mapped.len(), 16);
        assert_eq!(&mapped[4..8], &0xAABBCCDDu32.to_ne_bytes());
        assert_eq!(&mapped[0..4], &[0, 0, 0, 0]);
    }

    // Writes past the end are rejected without touching the buffer
    assert!(buffer
        .copy_to_host_visible_buffer_with_offset(&[0u64; 2], 8)
        .is_err());
}

#[test]
fn host_memory_exhaustion_fails_buffer_creation() {
    let (api, sink) = create_api(Default::default());
    let device_context = api.device_context();

    let result = device_context.create_buffer(&RhiBufferDef {
        size: 1 << 60,
        memory_usage: RhiMemoryUsage::CpuToGpu,
        resource_type: RhiResourceType::UNIFORM_BUFFER,
        ..Default::default()
    });

    assert!(matches!(
        result,
        Err(RhiError::ResourceCreation {
            kind: RhiResourceKind::Buffer,
            ..
        })
    ));
    assert_eq!(sink.error_count(), 1);

    // The view slot taken before the allocation is returned
    let heap = device_context
        .null_device_context()
        .unwrap()
        .descriptor_heap(RhiDescriptorHeapType::CbvSrvUav);
    assert_eq!(heap.allocated_count(), 0);

    // Smaller requests still succeed afterwards
    device_context
        .create_buffer(&RhiBufferDef::for_staging_uniform_buffer(16))
        .unwrap();
}

#[test]
fn copies_at_out_of_range_offsets_are_rejected() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let mut buffer = device_context
        .create_buffer(&RhiBufferDef::for_staging_uniform_buffer(16))
        .unwrap();

    assert!(buffer
        .copy_to_host_visible_buffer_with_offset(&[1u8, 2, 3], 16)
        .is_err());
    assert!(buffer
        .copy_to_host_visible_buffer_with_offset(&[1u8, 2, 3], u64::MAX)
        .is_err());
    assert!(buffer
        .copy_to_host_visible_buffer_with_offset(&[1u8], u64::MAX - 1)
        .is_err());

    // Exactly filling the tail is fine
    buffer
        .copy_to_host_visible_buffer_with_offset(&[1u8, 2, 3], 13)
        .unwrap();
    let mapped = buffer.map().unwrap();
    assert_eq!(&mapped[13..16], &[1, 2, 3]);
    assert_eq!(&mapped[0..13], &[0; 13]);
}

#[test]
fn each_failed_creation_is_logged_once() {
    let (api, sink) = create_api(Default::default());
    let device_context = api.device_context();

    assert!(device_context
        .create_buffer(&RhiBufferDef {
            size: 0,
            ..Default::default()
        })
        .is_err());
    assert_eq!(sink.error_count(), 1);

    assert!(device_context
        .create_texture(&color_target_def(64, 64, RhiFormat::D32_SFLOAT))
        .is_err());
    assert_eq!(sink.error_count(), 2);

    assert!(device_context
        .create_shader(&RhiShaderDef { stages: vec![] })
        .is_err());
    assert!(device_context
        .create_render_pass(&RhiRenderPassDef::default())
        .is_err());
    assert!(device_context
        .create_sampler(&RhiSamplerDef {
            max_anisotropy: 0.0,
            ..Default::default()
        })
        .is_err());
    assert_eq!(sink.error_count(), 5);

    device_context
        .create_buffer(&RhiBufferDef::for_staging_vertex_buffer(64))
        .unwrap();
    assert_eq!(sink.error_count(), 5);
}

#[test]
fn stencil_clear_requires_stencil_format() {
    let (api, _sink) = create_api(Default::default());
    let device_context = api.device_context();

    let pass_def = |format| RhiRenderPassDef {
        color_attachments: vec![],
        depth_stencil_attachment: Some(RhiDepthStencilAttachmentDef {
            format,
            load_op: RhiLoadOp::Clear,
            store_op: RhiStoreOp::Store,
            final_state: None,
        }),
        sample_count: RhiSampleCount::SampleCount1,
    };

    let depth_only = device_context
        .create_render_pass(&pass_def(RhiFormat::D32_SFLOAT))
        .unwrap();
    assert!(depth_only.should_clear_depth_stencil());
    assert!(!depth_only.should_clear_stencil());

    let depth_stencil = device_context
        .create_render_pass(&pass_def(RhiFormat::D24_UNORM_S8_UINT))
        .unwrap();
    assert!(depth_stencil.should_clear_stencil());
}

#[test]
fn objects_outlive_destroyed_api() {
    let (mut api, _sink) = create_api(Default::default());
    let device_context = api.device_context();
    let mut buffer = device_context
        .create_buffer(&RhiBufferDef::for_staging_vertex_buffer(32))
        .unwrap();

    api.destroy().unwrap();
    drop(api);

    buffer.copy_to_host_visible_buffer(&[7u8; 32]).unwrap();
    assert_eq!(buffer.map().unwrap()[31], 7);
    assert_eq!(device_context.backend_type(), RhiBackendType::Null);
}
