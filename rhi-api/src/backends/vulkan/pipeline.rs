use super::internal::util;
use super::RhiDeviceContextVulkan;
use crate::{
    RhiError, RhiFillMode, RhiGraphicsPipelineDef, RhiPipelineLayoutDef, RhiPipelineStage,
    RhiResourceKind, RhiResult, RhiShaderDef,
};
use ash::vk;
use ash::vk::Handle;
use std::ffi::CString;

// Native objects made while stepping through the construction stages. Whatever is still owned
// here when it drops is destroyed, so a failing stage leaks nothing.
struct PipelineScratch<'a> {
    device: &'a ash::Device,
    shader_modules: Vec<vk::ShaderModule>,
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    pipeline_layout: vk::PipelineLayout,
}

impl<'a> Drop for PipelineScratch<'a> {
    fn drop(&mut self) {
        unsafe {
            for &shader_module in &self.shader_modules {
                self.device.destroy_shader_module(shader_module, None);
            }

            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.device
                    .destroy_pipeline_layout(self.pipeline_layout, None);
            }

            for &descriptor_set_layout in &self.descriptor_set_layouts {
                self.device
                    .destroy_descriptor_set_layout(descriptor_set_layout, None);
            }
        }
    }
}

fn create_shader_modules(
    device: &ash::Device,
    shader_def: &RhiShaderDef,
    scratch: &mut PipelineScratch,
) -> RhiResult<Vec<CString>> {
    let stage = RhiPipelineStage::ShaderStages;
    let mut entry_point_names = Vec::with_capacity(shader_def.stages.len());

    for stage_def in &shader_def.stages {
        crate::null::validate_spirv(&stage_def.bytecode)
            .map_err(|reason| stage.error(format!("{:?}: {}", stage_def.shader_stage, reason)))?;

        // validate_spirv guarantees whole words
        let code: Vec<u32> = stage_def
            .bytecode
            .chunks_exact(4)
            .map(|x| u32::from_le_bytes([x[0], x[1], x[2], x[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);
        let shader_module = unsafe { device.create_shader_module(&create_info, None) }
            .map_err(|e| stage.error(format!("{:?}: {}", stage_def.shader_stage, e)))?;
        scratch.shader_modules.push(shader_module);

        let entry_point_name = CString::new(stage_def.entry_point.clone()).map_err(|_| {
            stage.error(format!(
                "{:?}: entry point {:?} contains a nul byte",
                stage_def.shader_stage, stage_def.entry_point
            ))
        })?;
        entry_point_names.push(entry_point_name);
    }

    Ok(entry_point_names)
}

fn create_pipeline_layout(
    device: &ash::Device,
    layout_def: &RhiPipelineLayoutDef,
    scratch: &mut PipelineScratch,
) -> RhiResult<()> {
    let stage = RhiPipelineStage::Layout;

    // Sets with no bindings still need an (empty) layout so higher set indices line up
    for set_index in 0..layout_def.set_count() {
        let mut bindings = vec![];
        for binding in &layout_def.bindings {
            if binding.set_index as usize != set_index {
                continue;
            }

            let descriptor_type = util::resource_type_to_descriptor_type(binding.resource_type)
                .ok_or_else(|| {
                    stage.error(format!(
                        "binding {}:{} has unbindable resource type {:?}",
                        binding.set_index, binding.binding, binding.resource_type
                    ))
                })?;

            bindings.push(
                vk::DescriptorSetLayoutBinding::builder()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_type)
                    .descriptor_count(binding.element_count)
                    .stage_flags(binding.stage_flags.into())
                    .build(),
            );
        }

        let create_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        let descriptor_set_layout =
            unsafe { device.create_descriptor_set_layout(&create_info, None) }
                .map_err(|e| stage.error(format!("set {}: {}", set_index, e)))?;
        scratch.descriptor_set_layouts.push(descriptor_set_layout);
    }

    let mut push_constant_ranges = vec![];
    if layout_def.push_constant_size > 0 {
        push_constant_ranges.push(
            vk::PushConstantRange::builder()
                .stage_flags(layout_def.push_constant_stages.into())
                .offset(0)
                .size(layout_def.push_constant_size)
                .build(),
        );
    }

    let create_info = vk::PipelineLayoutCreateInfo::builder()
        .set_layouts(&scratch.descriptor_set_layouts)
        .push_constant_ranges(&push_constant_ranges);

    scratch.pipeline_layout = unsafe { device.create_pipeline_layout(&create_info, None) }
        .map_err(|e| stage.error(e.to_string()))?;

    Ok(())
}

/// A graphics vk::Pipeline with the pipeline layout and descriptor set layouts it was built with
#[derive(Debug)]
pub struct RhiPipelineVulkan {
    device_context: RhiDeviceContextVulkan,
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl Drop for RhiPipelineVulkan {
    fn drop(&mut self) {
        let device = self.device_context.device();
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            for &descriptor_set_layout in &self.descriptor_set_layouts {
                device.destroy_descriptor_set_layout(descriptor_set_layout, None);
            }
        }
    }
}

impl RhiPipelineVulkan {
    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn vk_descriptor_set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.descriptor_set_layouts
    }

    pub fn pipeline_id(&self) -> u64 {
        self.pipeline.as_raw()
    }

    pub fn pipeline_layout_id(&self) -> u64 {
        self.pipeline_layout.as_raw()
    }

    pub fn new(
        device_context: &RhiDeviceContextVulkan,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<Self> {
        let device = device_context.device();
        let limits = device_context.limits();
        let features = device_context.enabled_features();
        let render_pass_def = pipeline_def.render_pass.render_pass_def();

        let mut scratch = PipelineScratch {
            device,
            shader_modules: vec![],
            descriptor_set_layouts: vec![],
            pipeline_layout: vk::PipelineLayout::null(),
        };

        let mut entry_point_names = vec![];
        for &stage in RhiPipelineStage::CONSTRUCTION_ORDER.iter() {
            pipeline_def.validate_stage(stage)?;

            match stage {
                RhiPipelineStage::ShaderStages => {
                    entry_point_names = create_shader_modules(
                        device,
                        pipeline_def.shader.shader_def(),
                        &mut scratch,
                    )?;
                }
                RhiPipelineStage::VertexInput => {
                    let attribute_count = pipeline_def.vertex_layout.attributes.len();
                    if attribute_count > limits.max_vertex_input_attributes as usize {
                        return Err(stage.error(format!(
                            "{} vertex attributes exceeds the device limit of {}",
                            attribute_count, limits.max_vertex_input_attributes
                        )));
                    }
                }
                RhiPipelineStage::Rasterization => {
                    let rasterizer_state = pipeline_def.rasterizer_state;
                    if rasterizer_state.fill_mode == RhiFillMode::Wireframe
                        && features.fill_mode_non_solid != vk::TRUE
                    {
                        return Err(stage.error("device does not support wireframe fill"));
                    }

                    if rasterizer_state.depth_clamp_enable && features.depth_clamp != vk::TRUE {
                        return Err(stage.error("device does not support depth clamp"));
                    }
                }
                RhiPipelineStage::Multisample => {
                    let sample_counts = limits.framebuffer_color_sample_counts;
                    let requested: vk::SampleCountFlags = pipeline_def.sample_count.into();
                    if !sample_counts.contains(requested) {
                        return Err(stage.error(format!(
                            "device does not support {:?}",
                            pipeline_def.sample_count
                        )));
                    }
                }
                RhiPipelineStage::Layout => {
                    create_pipeline_layout(device, pipeline_def.layout, &mut scratch)?;
                }
                _ => {}
            }
        }

        let vk_render_pass = pipeline_def
            .render_pass
            .vk_render_pass()
            .ok_or("render pass is not a vulkan render pass")?
            .vk_render_pass();

        let mut stages = Vec::with_capacity(scratch.shader_modules.len());
        for ((stage_def, &shader_module), entry_point_name) in pipeline_def
            .shader
            .shader_def()
            .stages
            .iter()
            .zip(&scratch.shader_modules)
            .zip(&entry_point_names)
        {
            stages.push(
                vk::PipelineShaderStageCreateInfo::builder()
                    .name(entry_point_name)
                    .module(shader_module)
                    .stage(stage_def.shader_stage.into())
                    .build(),
            );
        }

        let mut bindings = Vec::with_capacity(pipeline_def.vertex_layout.buffers.len());
        for (index, vertex_buffer) in pipeline_def.vertex_layout.buffers.iter().enumerate() {
            bindings.push(
                vk::VertexInputBindingDescription::builder()
                    .binding(index as u32)
                    .input_rate(vertex_buffer.rate.into())
                    .stride(vertex_buffer.stride)
                    .build(),
            );
        }

        let mut attributes = Vec::with_capacity(pipeline_def.vertex_layout.attributes.len());
        for vertex_attribute in &pipeline_def.vertex_layout.attributes {
            attributes.push(
                vk::VertexInputAttributeDescription::builder()
                    .format(vertex_attribute.format.into())
                    .location(vertex_attribute.location)
                    .binding(vertex_attribute.buffer_index)
                    .offset(vertex_attribute.byte_offset)
                    .build(),
            );
        }

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(pipeline_def.primitive_topology.into())
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state =
            util::rasterizer_state_to_create_info(pipeline_def.rasterizer_state);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(pipeline_def.sample_count.into())
            .sample_shading_enable(false)
            .min_sample_shading(0.0)
            .alpha_to_coverage_enable(false)
            .alpha_to_one_enable(false);

        let depth_state = util::depth_state_to_create_info(pipeline_def.depth_state);

        let blend_attachments = util::blend_state_to_attachment_states(
            pipeline_def.blend_state,
            render_pass_def.color_attachment_count(),
        );
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::CLEAR)
            .attachments(&blend_attachments)
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_states_create_info =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_states_create_info)
            .layout(scratch.pipeline_layout)
            .render_pass(vk_render_pass)
            .subpass(0)
            .base_pipeline_handle(vk::Pipeline::null())
            .base_pipeline_index(-1)
            .build();

        let pipelines = unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            )
        }
        .map_err(|e| {
            RhiError::resource_creation(
                RhiResourceKind::Pipeline,
                format!("vkCreateGraphicsPipelines failed: {}", e.1),
            )
        })?;

        let pipeline = pipelines.into_iter().next().ok_or_else(|| {
            RhiError::resource_creation(RhiResourceKind::Pipeline, "no pipeline was returned")
        })?;

        // The pipeline keeps the layouts, the shader modules are released with the scratch
        let pipeline_layout =
            std::mem::replace(&mut scratch.pipeline_layout, vk::PipelineLayout::null());
        let descriptor_set_layouts = std::mem::take(&mut scratch.descriptor_set_layouts);

        log::trace!(
            "Created vulkan pipeline {:?} with layout {:?}",
            pipeline,
            pipeline_layout
        );

        Ok(RhiPipelineVulkan {
            device_context: device_context.clone(),
            pipeline,
            pipeline_layout,
            descriptor_set_layouts,
        })
    }

    /// Replaces this pipeline only if the new one is fully built
    pub(crate) fn rebuild(
        &mut self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<()> {
        let rebuilt = RhiPipelineVulkan::new(&self.device_context, pipeline_def)?;
        *self = rebuilt;
        Ok(())
    }
}
