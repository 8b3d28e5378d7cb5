use crate::{
    RhiBlendState, RhiBlendStateRenderTarget, RhiDepthState, RhiFormat, RhiRasterizerState,
    RhiResourceState, RhiResourceType,
};
use ash::vk;

pub(crate) fn resource_type_buffer_usage_flags(
    resource_type: RhiResourceType
) -> vk::BufferUsageFlags {
    let mut usage_flags = vk::BufferUsageFlags::TRANSFER_SRC;

    if resource_type.intersects(RhiResourceType::UNIFORM_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::BUFFER | RhiResourceType::BUFFER_READ_WRITE) {
        usage_flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::INDEX_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::VERTEX_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::INDIRECT_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }

    usage_flags
}

pub(crate) fn resource_type_image_usage_flags(
    resource_type: RhiResourceType
) -> vk::ImageUsageFlags {
    let mut usage_flags = vk::ImageUsageFlags::empty();

    if resource_type.intersects(RhiResourceType::TEXTURE) {
        usage_flags |= vk::ImageUsageFlags::SAMPLED;
    }

    if resource_type.intersects(RhiResourceType::TEXTURE_READ_WRITE) {
        usage_flags |= vk::ImageUsageFlags::STORAGE;
    }

    if resource_type.intersects(RhiResourceType::RENDER_TARGET_COLOR) {
        usage_flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    } else if resource_type.intersects(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL) {
        usage_flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }

    // Anything readable by shaders may be uploaded to or read back
    if usage_flags.intersects(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::STORAGE) {
        usage_flags |= vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
    }

    usage_flags
}

pub(crate) fn image_format_to_aspect_mask(format: RhiFormat) -> vk::ImageAspectFlags {
    match format {
        RhiFormat::D16_UNORM | RhiFormat::D32_SFLOAT => vk::ImageAspectFlags::DEPTH,
        RhiFormat::D24_UNORM_S8_UINT | RhiFormat::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::COLOR,
    }
}

/// Descriptor type for a single pipeline layout binding. None if the resource type can't be bound.
pub(crate) fn resource_type_to_descriptor_type(
    resource_type: RhiResourceType
) -> Option<vk::DescriptorType> {
    match resource_type {
        RhiResourceType::SAMPLER => Some(vk::DescriptorType::SAMPLER),
        RhiResourceType::TEXTURE | RhiResourceType::TEXTURE_CUBE => {
            Some(vk::DescriptorType::SAMPLED_IMAGE)
        }
        RhiResourceType::UNIFORM_BUFFER => Some(vk::DescriptorType::UNIFORM_BUFFER),
        RhiResourceType::TEXTURE_READ_WRITE => Some(vk::DescriptorType::STORAGE_IMAGE),
        RhiResourceType::BUFFER => Some(vk::DescriptorType::STORAGE_BUFFER),
        RhiResourceType::BUFFER_READ_WRITE => Some(vk::DescriptorType::STORAGE_BUFFER),
        _ => None,
    }
}

pub(crate) fn resource_state_to_access_flags(state: RhiResourceState) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if state.intersects(RhiResourceState::COPY_SRC) {
        flags |= vk::AccessFlags::TRANSFER_READ;
    }

    if state.intersects(RhiResourceState::COPY_DST) {
        flags |= vk::AccessFlags::TRANSFER_WRITE;
    }

    if state.intersects(RhiResourceState::VERTEX_AND_CONSTANT_BUFFER) {
        flags |= vk::AccessFlags::UNIFORM_READ | vk::AccessFlags::VERTEX_ATTRIBUTE_READ;
    }

    if state.intersects(RhiResourceState::INDEX_BUFFER) {
        flags |= vk::AccessFlags::INDEX_READ;
    }

    if state.intersects(RhiResourceState::UNORDERED_ACCESS) {
        flags |= vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE;
    }

    if state.intersects(RhiResourceState::INDIRECT_ARGUMENT) {
        flags |= vk::AccessFlags::INDIRECT_COMMAND_READ;
    }

    if state.intersects(RhiResourceState::RENDER_TARGET) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }

    if state.intersects(RhiResourceState::DEPTH_WRITE) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }

    if state.intersects(RhiResourceState::DEPTH_READ) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }

    if state.intersects(RhiResourceState::SHADER_RESOURCE) {
        flags |= vk::AccessFlags::SHADER_READ;
    }

    if state.intersects(RhiResourceState::PRESENT) {
        flags |= vk::AccessFlags::MEMORY_READ;
    }

    flags
}

/// Image layout for a resource state. When several bits are set the first match in this order
/// wins: copy, attachment, storage, sampled, present, common.
pub(crate) fn resource_state_to_image_layout(state: RhiResourceState) -> vk::ImageLayout {
    if state.intersects(RhiResourceState::COPY_SRC) {
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL
    } else if state.intersects(RhiResourceState::COPY_DST) {
        vk::ImageLayout::TRANSFER_DST_OPTIMAL
    } else if state.intersects(RhiResourceState::RENDER_TARGET) {
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    } else if state.intersects(RhiResourceState::DEPTH_WRITE) {
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    } else if state.intersects(RhiResourceState::DEPTH_READ) {
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    } else if state.intersects(RhiResourceState::UNORDERED_ACCESS) {
        vk::ImageLayout::GENERAL
    } else if state.intersects(RhiResourceState::SHADER_RESOURCE) {
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    } else if state.intersects(RhiResourceState::PRESENT) {
        vk::ImageLayout::PRESENT_SRC_KHR
    } else if state.intersects(RhiResourceState::COMMON) {
        vk::ImageLayout::GENERAL
    } else {
        vk::ImageLayout::UNDEFINED
    }
}

// Based on what is being accessed, determine what stages need to be blocked. Only the graphics
// queue is used.
pub(crate) fn determine_pipeline_stage_flags(
    access_flags: vk::AccessFlags,
) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();

    if access_flags.intersects(vk::AccessFlags::INDEX_READ | vk::AccessFlags::VERTEX_ATTRIBUTE_READ)
    {
        flags |= vk::PipelineStageFlags::VERTEX_INPUT;
    }

    if access_flags.intersects(
        vk::AccessFlags::UNIFORM_READ
            | vk::AccessFlags::SHADER_READ
            | vk::AccessFlags::SHADER_WRITE,
    ) {
        flags |= vk::PipelineStageFlags::VERTEX_SHADER;
        flags |= vk::PipelineStageFlags::FRAGMENT_SHADER;
        flags |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }

    if access_flags.intersects(
        vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
    ) {
        flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
    }

    if access_flags.intersects(
        vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
            | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
    ) {
        flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
            | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }

    if access_flags.intersects(vk::AccessFlags::INDIRECT_COMMAND_READ) {
        flags |= vk::PipelineStageFlags::DRAW_INDIRECT;
    }

    if access_flags.intersects(vk::AccessFlags::TRANSFER_READ | vk::AccessFlags::TRANSFER_WRITE) {
        flags |= vk::PipelineStageFlags::TRANSFER;
    }

    if access_flags.intersects(vk::AccessFlags::HOST_READ | vk::AccessFlags::HOST_WRITE) {
        flags |= vk::PipelineStageFlags::HOST;
    }

    if access_flags.intersects(vk::AccessFlags::MEMORY_READ) {
        flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }

    if flags.is_empty() {
        flags |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }

    flags
}

pub(crate) fn depth_state_to_create_info(
    depth_state: &RhiDepthState
) -> vk::PipelineDepthStencilStateCreateInfo {
    let front = vk::StencilOpState::builder()
        .fail_op(depth_state.front_stencil_fail_op.into())
        .pass_op(depth_state.front_stencil_pass_op.into())
        .depth_fail_op(depth_state.front_depth_fail_op.into())
        .compare_op(depth_state.front_stencil_compare_op.into())
        .compare_mask(depth_state.stencil_read_mask as u32)
        .write_mask(depth_state.stencil_write_mask as u32)
        .reference(0);

    let back = vk::StencilOpState::builder()
        .fail_op(depth_state.back_stencil_fail_op.into())
        .pass_op(depth_state.back_stencil_pass_op.into())
        .depth_fail_op(depth_state.back_depth_fail_op.into())
        .compare_op(depth_state.back_stencil_compare_op.into())
        .compare_mask(depth_state.stencil_read_mask as u32)
        .write_mask(depth_state.stencil_write_mask as u32)
        .reference(0);

    vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(depth_state.depth_test_enable)
        .depth_write_enable(depth_state.depth_write_enable)
        .depth_compare_op(depth_state.depth_compare_op.into())
        .depth_bounds_test_enable(false)
        .stencil_test_enable(depth_state.stencil_test_enable)
        .min_depth_bounds(0.0)
        .max_depth_bounds(1.0)
        .front(*front)
        .back(*back)
        .build()
}

pub(crate) fn rasterizer_state_to_create_info(
    rasterizer_state: &RhiRasterizerState
) -> vk::PipelineRasterizationStateCreateInfo {
    vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(rasterizer_state.depth_clamp_enable)
        .rasterizer_discard_enable(false)
        .polygon_mode(rasterizer_state.fill_mode.into())
        .cull_mode(rasterizer_state.cull_mode.into())
        .front_face(rasterizer_state.front_face.into())
        .depth_bias_enable(rasterizer_state.depth_bias != 0)
        .depth_bias_constant_factor(rasterizer_state.depth_bias as f32)
        .depth_bias_clamp(0.0)
        .depth_bias_slope_factor(rasterizer_state.depth_bias_slope_scaled)
        .line_width(1.0)
        .build()
}

pub(crate) fn blend_state_render_target_to_create_info(
    blend_state_rt: &RhiBlendStateRenderTarget
) -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .blend_enable(blend_state_rt.blend_enabled())
        .color_write_mask(blend_state_rt.masks.into())
        .src_color_blend_factor(blend_state_rt.src_factor.into())
        .src_alpha_blend_factor(blend_state_rt.src_factor_alpha.into())
        .dst_color_blend_factor(blend_state_rt.dst_factor.into())
        .dst_alpha_blend_factor(blend_state_rt.dst_factor_alpha.into())
        .color_blend_op(blend_state_rt.blend_op.into())
        .alpha_blend_op(blend_state_rt.blend_op_alpha.into())
        .build()
}

/// One attachment state per color attachment. Without independent blend every attachment gets
/// the first blend state.
pub(crate) fn blend_state_to_attachment_states(
    blend_state: &RhiBlendState,
    color_attachment_count: usize,
) -> Vec<vk::PipelineColorBlendAttachmentState> {
    (0..color_attachment_count)
        .filter_map(|i| blend_state.render_target_blend_state(i))
        .map(blend_state_render_target_to_create_info)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_states_win_over_shader_states() {
        assert_eq!(
            resource_state_to_image_layout(
                RhiResourceState::COPY_SRC | RhiResourceState::SHADER_RESOURCE
            ),
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL
        );
        assert_eq!(
            resource_state_to_image_layout(RhiResourceState::UNDEFINED),
            vk::ImageLayout::UNDEFINED
        );
        assert_eq!(
            resource_state_to_image_layout(RhiResourceState::COMMON),
            vk::ImageLayout::GENERAL
        );
    }

    #[test]
    fn undefined_state_waits_on_nothing() {
        let access = resource_state_to_access_flags(RhiResourceState::UNDEFINED);
        assert!(access.is_empty());
        assert_eq!(
            determine_pipeline_stage_flags(access),
            vk::PipelineStageFlags::TOP_OF_PIPE
        );

        let access = resource_state_to_access_flags(RhiResourceState::RENDER_TARGET);
        assert_eq!(
            determine_pipeline_stage_flags(access),
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
    }

    #[test]
    fn depth_formats_use_depth_aspect() {
        assert_eq!(
            image_format_to_aspect_mask(RhiFormat::D32_SFLOAT),
            vk::ImageAspectFlags::DEPTH
        );
        assert_eq!(
            image_format_to_aspect_mask(RhiFormat::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(
            image_format_to_aspect_mask(RhiFormat::R8G8B8A8_UNORM),
            vk::ImageAspectFlags::COLOR
        );
    }

    #[test]
    fn sampled_images_can_be_uploaded() {
        let flags = resource_type_image_usage_flags(RhiResourceType::TEXTURE);
        assert!(flags.contains(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST));

        let flags = resource_type_image_usage_flags(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL);
        assert_eq!(flags, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT);
    }
}
