use super::d3d;
use super::d3d12;
use super::dxgi::Common as DxgiCommon;
use crate::{
    RhiAddressMode, RhiBlendFactor, RhiBlendOp, RhiBlendState, RhiCompareOp, RhiCullMode,
    RhiDepthState, RhiFillMode, RhiFilterType, RhiFormat, RhiFrontFace, RhiIndexType,
    RhiMipMapMode, RhiPrimitiveTopology, RhiRasterizerState, RhiResourceState, RhiResourceType,
    RhiSampleCount, RhiSamplerDef, RhiShaderStageFlags, RhiStencilOp, RhiVertexAttributeRate,
    MAX_RENDER_TARGET_ATTACHMENTS,
};

impl From<RhiFormat> for DxgiCommon::DXGI_FORMAT {
    fn from(format: RhiFormat) -> Self {
        match format {
            RhiFormat::UNDEFINED => DxgiCommon::DXGI_FORMAT_UNKNOWN,
            RhiFormat::R8_UNORM => DxgiCommon::DXGI_FORMAT_R8_UNORM,
            RhiFormat::R8G8_UNORM => DxgiCommon::DXGI_FORMAT_R8G8_UNORM,
            RhiFormat::R8G8B8A8_UNORM => DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM,
            RhiFormat::R8G8B8A8_SRGB => DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
            RhiFormat::B8G8R8A8_UNORM => DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM,
            RhiFormat::B8G8R8A8_SRGB => DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM_SRGB,
            RhiFormat::R16_UINT => DxgiCommon::DXGI_FORMAT_R16_UINT,
            RhiFormat::R16G16B16A16_SFLOAT => DxgiCommon::DXGI_FORMAT_R16G16B16A16_FLOAT,
            RhiFormat::R32_UINT => DxgiCommon::DXGI_FORMAT_R32_UINT,
            RhiFormat::R32_SFLOAT => DxgiCommon::DXGI_FORMAT_R32_FLOAT,
            RhiFormat::R32G32_SFLOAT => DxgiCommon::DXGI_FORMAT_R32G32_FLOAT,
            RhiFormat::R32G32B32_SFLOAT => DxgiCommon::DXGI_FORMAT_R32G32B32_FLOAT,
            RhiFormat::R32G32B32A32_SFLOAT => DxgiCommon::DXGI_FORMAT_R32G32B32A32_FLOAT,
            RhiFormat::D16_UNORM => DxgiCommon::DXGI_FORMAT_D16_UNORM,
            RhiFormat::D32_SFLOAT => DxgiCommon::DXGI_FORMAT_D32_FLOAT,
            RhiFormat::D24_UNORM_S8_UINT => DxgiCommon::DXGI_FORMAT_D24_UNORM_S8_UINT,
            RhiFormat::D32_SFLOAT_S8_UINT => DxgiCommon::DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
        }
    }
}

impl From<RhiSampleCount> for DxgiCommon::DXGI_SAMPLE_DESC {
    fn from(sample_count: RhiSampleCount) -> Self {
        let count = match sample_count {
            RhiSampleCount::SampleCount1 => 1,
            RhiSampleCount::SampleCount2 => 2,
            RhiSampleCount::SampleCount4 => 4,
            RhiSampleCount::SampleCount8 => 8,
            RhiSampleCount::SampleCount16 => 16,
        };

        DxgiCommon::DXGI_SAMPLE_DESC {
            Count: count,
            Quality: 0,
        }
    }
}

impl From<RhiIndexType> for DxgiCommon::DXGI_FORMAT {
    fn from(index_type: RhiIndexType) -> Self {
        match index_type {
            RhiIndexType::Uint32 => DxgiCommon::DXGI_FORMAT_R32_UINT,
            RhiIndexType::Uint16 => DxgiCommon::DXGI_FORMAT_R16_UINT,
        }
    }
}

impl From<RhiVertexAttributeRate> for d3d12::D3D12_INPUT_CLASSIFICATION {
    fn from(rate: RhiVertexAttributeRate) -> Self {
        match rate {
            RhiVertexAttributeRate::Vertex => d3d12::D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            RhiVertexAttributeRate::Instance => {
                d3d12::D3D12_INPUT_CLASSIFICATION_PER_INSTANCE_DATA
            }
        }
    }
}

impl From<RhiAddressMode> for d3d12::D3D12_TEXTURE_ADDRESS_MODE {
    fn from(address_mode: RhiAddressMode) -> Self {
        match address_mode {
            RhiAddressMode::Mirror => d3d12::D3D12_TEXTURE_ADDRESS_MODE_MIRROR,
            RhiAddressMode::Repeat => d3d12::D3D12_TEXTURE_ADDRESS_MODE_WRAP,
            RhiAddressMode::ClampToEdge => d3d12::D3D12_TEXTURE_ADDRESS_MODE_CLAMP,
            RhiAddressMode::ClampToBorder => d3d12::D3D12_TEXTURE_ADDRESS_MODE_BORDER,
        }
    }
}

impl From<RhiShaderStageFlags> for d3d12::D3D12_SHADER_VISIBILITY {
    fn from(stage_flags: RhiShaderStageFlags) -> Self {
        if stage_flags.intersects(RhiShaderStageFlags::COMPUTE) {
            return d3d12::D3D12_SHADER_VISIBILITY_ALL;
        }

        // A single graphics stage can be narrowed, anything else is visible everywhere
        if stage_flags == RhiShaderStageFlags::VERTEX {
            d3d12::D3D12_SHADER_VISIBILITY_VERTEX
        } else if stage_flags == RhiShaderStageFlags::FRAGMENT {
            d3d12::D3D12_SHADER_VISIBILITY_PIXEL
        } else {
            d3d12::D3D12_SHADER_VISIBILITY_ALL
        }
    }
}

pub(crate) fn resource_type_descriptor_range_type(
    resource_type: RhiResourceType
) -> Option<d3d12::D3D12_DESCRIPTOR_RANGE_TYPE> {
    if resource_type.intersects(RhiResourceType::UNIFORM_BUFFER) {
        return Some(d3d12::D3D12_DESCRIPTOR_RANGE_TYPE_CBV);
    }

    if resource_type
        .intersects(RhiResourceType::BUFFER_READ_WRITE | RhiResourceType::TEXTURE_READ_WRITE)
    {
        return Some(d3d12::D3D12_DESCRIPTOR_RANGE_TYPE_UAV);
    }

    if resource_type.intersects(RhiResourceType::SAMPLER) {
        return Some(d3d12::D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER);
    }

    if resource_type.intersects(RhiResourceType::BUFFER | RhiResourceType::TEXTURE) {
        return Some(d3d12::D3D12_DESCRIPTOR_RANGE_TYPE_SRV);
    }

    None
}

impl From<RhiResourceState> for d3d12::D3D12_RESOURCE_STATES {
    fn from(resource_state: RhiResourceState) -> Self {
        let mut state = d3d12::D3D12_RESOURCE_STATE_COMMON;

        if resource_state == RhiResourceState::GENERIC_READ {
            return d3d12::D3D12_RESOURCE_STATE_GENERIC_READ;
        }
        if resource_state == RhiResourceState::COMMON {
            return d3d12::D3D12_RESOURCE_STATE_COMMON;
        }
        if resource_state == RhiResourceState::PRESENT {
            return d3d12::D3D12_RESOURCE_STATE_PRESENT;
        }

        if resource_state.intersects(RhiResourceState::VERTEX_AND_CONSTANT_BUFFER) {
            state |= d3d12::D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER;
        }
        if resource_state.intersects(RhiResourceState::INDEX_BUFFER) {
            state |= d3d12::D3D12_RESOURCE_STATE_INDEX_BUFFER;
        }
        if resource_state.intersects(RhiResourceState::RENDER_TARGET) {
            state |= d3d12::D3D12_RESOURCE_STATE_RENDER_TARGET;
        }
        if resource_state.intersects(RhiResourceState::UNORDERED_ACCESS) {
            state |= d3d12::D3D12_RESOURCE_STATE_UNORDERED_ACCESS;
        }
        if resource_state.intersects(RhiResourceState::DEPTH_WRITE) {
            state |= d3d12::D3D12_RESOURCE_STATE_DEPTH_WRITE;
        }
        if resource_state.intersects(RhiResourceState::DEPTH_READ) {
            state |= d3d12::D3D12_RESOURCE_STATE_DEPTH_READ;
        }
        if resource_state.intersects(RhiResourceState::INDIRECT_ARGUMENT) {
            state |= d3d12::D3D12_RESOURCE_STATE_INDIRECT_ARGUMENT;
        }
        if resource_state.intersects(RhiResourceState::COPY_DST) {
            state |= d3d12::D3D12_RESOURCE_STATE_COPY_DEST;
        }
        if resource_state.intersects(RhiResourceState::COPY_SRC) {
            state |= d3d12::D3D12_RESOURCE_STATE_COPY_SOURCE;
        }
        if resource_state.intersects(RhiResourceState::NON_PIXEL_SHADER_RESOURCE) {
            state |= d3d12::D3D12_RESOURCE_STATE_NON_PIXEL_SHADER_RESOURCE;
        }
        if resource_state.intersects(RhiResourceState::PIXEL_SHADER_RESOURCE) {
            state |= d3d12::D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE;
        }

        state
    }
}

pub(crate) fn rasterizer_state_rasterizer_desc(
    rasterizer_state: &RhiRasterizerState
) -> d3d12::D3D12_RASTERIZER_DESC {
    d3d12::D3D12_RASTERIZER_DESC {
        FillMode: rasterizer_state.fill_mode.into(),
        CullMode: rasterizer_state.cull_mode.into(),
        FrontCounterClockwise: (rasterizer_state.front_face == RhiFrontFace::CounterClockwise)
            .into(),
        DepthBias: rasterizer_state.depth_bias,
        DepthBiasClamp: 0.0,
        SlopeScaledDepthBias: rasterizer_state.depth_bias_slope_scaled,
        DepthClipEnable: (!rasterizer_state.depth_clamp_enable).into(),
        MultisampleEnable: rasterizer_state.multisample.into(),
        AntialiasedLineEnable: false.into(),
        ForcedSampleCount: 0,
        ConservativeRaster: d3d12::D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    }
}

pub(crate) fn depth_state_depth_stencil_desc(
    depth_state: &RhiDepthState
) -> d3d12::D3D12_DEPTH_STENCIL_DESC {
    d3d12::D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: depth_state.depth_test_enable.into(),
        DepthWriteMask: if depth_state.depth_write_enable {
            d3d12::D3D12_DEPTH_WRITE_MASK_ALL
        } else {
            d3d12::D3D12_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: depth_state.depth_compare_op.into(),
        StencilEnable: depth_state.stencil_test_enable.into(),
        StencilReadMask: depth_state.stencil_read_mask,
        StencilWriteMask: depth_state.stencil_write_mask,
        FrontFace: d3d12::D3D12_DEPTH_STENCILOP_DESC {
            StencilFailOp: depth_state.front_stencil_fail_op.into(),
            StencilDepthFailOp: depth_state.front_depth_fail_op.into(),
            StencilPassOp: depth_state.front_stencil_pass_op.into(),
            StencilFunc: depth_state.front_stencil_compare_op.into(),
        },
        BackFace: d3d12::D3D12_DEPTH_STENCILOP_DESC {
            StencilFailOp: depth_state.back_stencil_fail_op.into(),
            StencilDepthFailOp: depth_state.back_depth_fail_op.into(),
            StencilPassOp: depth_state.back_stencil_pass_op.into(),
            StencilFunc: depth_state.back_stencil_compare_op.into(),
        },
    }
}

pub(crate) fn blend_state_blend_desc(
    blend_state: &RhiBlendState,
    color_attachment_count: usize,
) -> d3d12::D3D12_BLEND_DESC {
    let mut blend_desc = d3d12::D3D12_BLEND_DESC::default();
    blend_desc.AlphaToCoverageEnable = false.into();
    blend_desc.IndependentBlendEnable = blend_state.independent_blend.into();

    for attachment_index in 0..color_attachment_count.min(MAX_RENDER_TARGET_ATTACHMENTS) {
        let def = match blend_state.render_target_blend_state(attachment_index) {
            Some(def) => def,
            None => continue,
        };

        let desc = &mut blend_desc.RenderTarget[attachment_index];
        desc.BlendEnable = def.blend_enabled().into();
        desc.RenderTargetWriteMask = def.masks.bits();
        desc.BlendOp = def.blend_op.into();
        desc.SrcBlend = def.src_factor.into();
        desc.DestBlend = def.dst_factor.into();
        desc.BlendOpAlpha = def.blend_op_alpha.into();
        desc.SrcBlendAlpha = def.src_factor_alpha.into();
        desc.DestBlendAlpha = def.dst_factor_alpha.into();
    }

    blend_desc
}

pub(crate) fn sampler_def_filter(sampler_def: &RhiSamplerDef) -> d3d12::D3D12_FILTER {
    let mut filter = if sampler_def.max_anisotropy > 0.0 {
        d3d12::D3D12_FILTER_ANISOTROPIC.0
    } else {
        let mut bits = 0;
        if sampler_def.min_filter == RhiFilterType::Linear {
            bits |= 0x10;
        }
        if sampler_def.mag_filter == RhiFilterType::Linear {
            bits |= 0x04;
        }
        if sampler_def.mip_map_mode == RhiMipMapMode::Linear {
            bits |= 0x01;
        }
        bits
    };

    // Comparison variants of every filter set the reduction bit
    if sampler_def.compare_op != RhiCompareOp::Never {
        filter |= 0x80;
    }

    d3d12::D3D12_FILTER(filter)
}

impl From<RhiPrimitiveTopology> for d3d::D3D_PRIMITIVE_TOPOLOGY {
    fn from(primitive_topology: RhiPrimitiveTopology) -> Self {
        match primitive_topology {
            RhiPrimitiveTopology::PointList => d3d::D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
            RhiPrimitiveTopology::LineList => d3d::D3D_PRIMITIVE_TOPOLOGY_LINELIST,
            RhiPrimitiveTopology::LineStrip => d3d::D3D_PRIMITIVE_TOPOLOGY_LINESTRIP,
            RhiPrimitiveTopology::TriangleList => d3d::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
            RhiPrimitiveTopology::TriangleStrip => d3d::D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
            // Rejected when the pipeline def is validated
            RhiPrimitiveTopology::PatchList => d3d::D3D_PRIMITIVE_TOPOLOGY_UNDEFINED,
        }
    }
}

impl From<RhiPrimitiveTopology> for d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE {
    fn from(primitive_topology: RhiPrimitiveTopology) -> Self {
        match primitive_topology {
            RhiPrimitiveTopology::PointList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_POINT,
            RhiPrimitiveTopology::LineList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE,
            RhiPrimitiveTopology::LineStrip => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE,
            RhiPrimitiveTopology::TriangleList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
            RhiPrimitiveTopology::TriangleStrip => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
            RhiPrimitiveTopology::PatchList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_PATCH,
        }
    }
}

impl From<RhiFillMode> for d3d12::D3D12_FILL_MODE {
    fn from(fill_mode: RhiFillMode) -> Self {
        match fill_mode {
            RhiFillMode::Solid => d3d12::D3D12_FILL_MODE_SOLID,
            RhiFillMode::Wireframe => d3d12::D3D12_FILL_MODE_WIREFRAME,
        }
    }
}

impl From<RhiCullMode> for d3d12::D3D12_CULL_MODE {
    fn from(cull_mode: RhiCullMode) -> Self {
        match cull_mode {
            RhiCullMode::None => d3d12::D3D12_CULL_MODE_NONE,
            RhiCullMode::Back => d3d12::D3D12_CULL_MODE_BACK,
            RhiCullMode::Front => d3d12::D3D12_CULL_MODE_FRONT,
        }
    }
}

impl From<RhiStencilOp> for d3d12::D3D12_STENCIL_OP {
    fn from(stencil_op: RhiStencilOp) -> Self {
        match stencil_op {
            RhiStencilOp::Keep => d3d12::D3D12_STENCIL_OP_KEEP,
            RhiStencilOp::Zero => d3d12::D3D12_STENCIL_OP_ZERO,
            RhiStencilOp::Replace => d3d12::D3D12_STENCIL_OP_REPLACE,
            RhiStencilOp::IncrementAndClamp => d3d12::D3D12_STENCIL_OP_INCR_SAT,
            RhiStencilOp::DecrementAndClamp => d3d12::D3D12_STENCIL_OP_DECR_SAT,
            RhiStencilOp::Invert => d3d12::D3D12_STENCIL_OP_INVERT,
            RhiStencilOp::IncrementAndWrap => d3d12::D3D12_STENCIL_OP_INCR,
            RhiStencilOp::DecrementAndWrap => d3d12::D3D12_STENCIL_OP_DECR,
        }
    }
}

impl From<RhiCompareOp> for d3d12::D3D12_COMPARISON_FUNC {
    fn from(compare_op: RhiCompareOp) -> Self {
        match compare_op {
            RhiCompareOp::Never => d3d12::D3D12_COMPARISON_FUNC_NEVER,
            RhiCompareOp::Less => d3d12::D3D12_COMPARISON_FUNC_LESS,
            RhiCompareOp::Equal => d3d12::D3D12_COMPARISON_FUNC_EQUAL,
            RhiCompareOp::LessOrEqual => d3d12::D3D12_COMPARISON_FUNC_LESS_EQUAL,
            RhiCompareOp::Greater => d3d12::D3D12_COMPARISON_FUNC_GREATER,
            RhiCompareOp::NotEqual => d3d12::D3D12_COMPARISON_FUNC_NOT_EQUAL,
            RhiCompareOp::GreaterOrEqual => d3d12::D3D12_COMPARISON_FUNC_GREATER_EQUAL,
            RhiCompareOp::Always => d3d12::D3D12_COMPARISON_FUNC_ALWAYS,
        }
    }
}

impl From<RhiBlendOp> for d3d12::D3D12_BLEND_OP {
    fn from(blend_op: RhiBlendOp) -> Self {
        match blend_op {
            RhiBlendOp::Add => d3d12::D3D12_BLEND_OP_ADD,
            RhiBlendOp::Subtract => d3d12::D3D12_BLEND_OP_SUBTRACT,
            RhiBlendOp::ReverseSubtract => d3d12::D3D12_BLEND_OP_REV_SUBTRACT,
            RhiBlendOp::Min => d3d12::D3D12_BLEND_OP_MIN,
            RhiBlendOp::Max => d3d12::D3D12_BLEND_OP_MAX,
        }
    }
}

impl From<RhiBlendFactor> for d3d12::D3D12_BLEND {
    fn from(blend_factor: RhiBlendFactor) -> Self {
        match blend_factor {
            RhiBlendFactor::Zero => d3d12::D3D12_BLEND_ZERO,
            RhiBlendFactor::One => d3d12::D3D12_BLEND_ONE,
            RhiBlendFactor::SrcColor => d3d12::D3D12_BLEND_SRC_COLOR,
            RhiBlendFactor::OneMinusSrcColor => d3d12::D3D12_BLEND_INV_SRC_COLOR,
            RhiBlendFactor::DstColor => d3d12::D3D12_BLEND_DEST_COLOR,
            RhiBlendFactor::OneMinusDstColor => d3d12::D3D12_BLEND_INV_DEST_COLOR,
            RhiBlendFactor::SrcAlpha => d3d12::D3D12_BLEND_SRC_ALPHA,
            RhiBlendFactor::OneMinusSrcAlpha => d3d12::D3D12_BLEND_INV_SRC_ALPHA,
            RhiBlendFactor::DstAlpha => d3d12::D3D12_BLEND_DEST_ALPHA,
            RhiBlendFactor::OneMinusDstAlpha => d3d12::D3D12_BLEND_INV_DEST_ALPHA,
            RhiBlendFactor::SrcAlphaSaturate => d3d12::D3D12_BLEND_SRC_ALPHA_SAT,
            RhiBlendFactor::ConstantColor => d3d12::D3D12_BLEND_BLEND_FACTOR,
            RhiBlendFactor::OneMinusConstantColor => d3d12::D3D12_BLEND_INV_BLEND_FACTOR,
        }
    }
}

/// Format used to view a (possibly typeless) resource from a shader
pub(crate) fn dxgi_to_srv_format(format: DxgiCommon::DXGI_FORMAT) -> DxgiCommon::DXGI_FORMAT {
    match format {
        DxgiCommon::DXGI_FORMAT_R32G8X24_TYPELESS
        | DxgiCommon::DXGI_FORMAT_D32_FLOAT_S8X24_UINT => {
            DxgiCommon::DXGI_FORMAT_R32_FLOAT_X8X24_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_R32_TYPELESS | DxgiCommon::DXGI_FORMAT_D32_FLOAT => {
            DxgiCommon::DXGI_FORMAT_R32_FLOAT
        }

        DxgiCommon::DXGI_FORMAT_R24G8_TYPELESS | DxgiCommon::DXGI_FORMAT_D24_UNORM_S8_UINT => {
            DxgiCommon::DXGI_FORMAT_R24_UNORM_X8_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_R16_TYPELESS | DxgiCommon::DXGI_FORMAT_D16_UNORM => {
            DxgiCommon::DXGI_FORMAT_R16_UNORM
        }

        DxgiCommon::DXGI_FORMAT_R8G8B8A8_TYPELESS => DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM,

        _ => format,
    }
}

/// UAVs can't be sRGB
pub(crate) fn dxgi_to_uav_format(format: DxgiCommon::DXGI_FORMAT) -> DxgiCommon::DXGI_FORMAT {
    match format {
        DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM_SRGB | DxgiCommon::DXGI_FORMAT_R8G8B8A8_TYPELESS => {
            DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM
        }

        DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM_SRGB | DxgiCommon::DXGI_FORMAT_B8G8R8A8_TYPELESS => {
            DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM
        }

        DxgiCommon::DXGI_FORMAT_R32_TYPELESS => DxgiCommon::DXGI_FORMAT_R32_FLOAT,

        _ => format,
    }
}

/// Textures are created typeless so the SRV, UAV and RTV/DSV can each pick a compatible format
pub(crate) fn dxgi_to_typeless(format: DxgiCommon::DXGI_FORMAT) -> DxgiCommon::DXGI_FORMAT {
    match format {
        DxgiCommon::DXGI_FORMAT_R32G32B32A32_FLOAT => DxgiCommon::DXGI_FORMAT_R32G32B32A32_TYPELESS,
        DxgiCommon::DXGI_FORMAT_R32G32B32_FLOAT => DxgiCommon::DXGI_FORMAT_R32G32B32_TYPELESS,
        DxgiCommon::DXGI_FORMAT_R32G32_FLOAT => DxgiCommon::DXGI_FORMAT_R32G32_TYPELESS,

        DxgiCommon::DXGI_FORMAT_R32_FLOAT
        | DxgiCommon::DXGI_FORMAT_R32_UINT
        | DxgiCommon::DXGI_FORMAT_D32_FLOAT => DxgiCommon::DXGI_FORMAT_R32_TYPELESS,

        DxgiCommon::DXGI_FORMAT_R16G16B16A16_FLOAT => {
            DxgiCommon::DXGI_FORMAT_R16G16B16A16_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_R16_UINT | DxgiCommon::DXGI_FORMAT_D16_UNORM => {
            DxgiCommon::DXGI_FORMAT_R16_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM | DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM_SRGB => {
            DxgiCommon::DXGI_FORMAT_R8G8B8A8_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM | DxgiCommon::DXGI_FORMAT_B8G8R8A8_UNORM_SRGB => {
            DxgiCommon::DXGI_FORMAT_B8G8R8A8_TYPELESS
        }

        DxgiCommon::DXGI_FORMAT_R8G8_UNORM => DxgiCommon::DXGI_FORMAT_R8G8_TYPELESS,
        DxgiCommon::DXGI_FORMAT_R8_UNORM => DxgiCommon::DXGI_FORMAT_R8_TYPELESS,

        DxgiCommon::DXGI_FORMAT_D24_UNORM_S8_UINT => DxgiCommon::DXGI_FORMAT_R24G8_TYPELESS,
        DxgiCommon::DXGI_FORMAT_D32_FLOAT_S8X24_UINT => DxgiCommon::DXGI_FORMAT_R32G8X24_TYPELESS,

        _ => format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_round_trip_through_typeless() {
        let dxgi_format: DxgiCommon::DXGI_FORMAT = RhiFormat::D32_SFLOAT.into();
        let typeless = dxgi_to_typeless(dxgi_format);
        assert_eq!(typeless, DxgiCommon::DXGI_FORMAT_R32_TYPELESS);
        assert_eq!(dxgi_to_srv_format(typeless), DxgiCommon::DXGI_FORMAT_R32_FLOAT);
    }

    #[test]
    fn srgb_is_dropped_for_uavs() {
        let dxgi_format: DxgiCommon::DXGI_FORMAT = RhiFormat::R8G8B8A8_SRGB.into();
        assert_eq!(
            dxgi_to_uav_format(dxgi_format),
            DxgiCommon::DXGI_FORMAT_R8G8B8A8_UNORM
        );
    }

    #[test]
    fn shader_resource_state_sets_both_shader_bits() {
        let state: d3d12::D3D12_RESOURCE_STATES = RhiResourceState::SHADER_RESOURCE.into();
        assert_eq!(
            state,
            d3d12::D3D12_RESOURCE_STATE_NON_PIXEL_SHADER_RESOURCE
                | d3d12::D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE
        );

        let state: d3d12::D3D12_RESOURCE_STATES = RhiResourceState::UNDEFINED.into();
        assert_eq!(state, d3d12::D3D12_RESOURCE_STATE_COMMON);
    }

    #[test]
    fn single_stage_narrows_visibility() {
        let visibility: d3d12::D3D12_SHADER_VISIBILITY = RhiShaderStageFlags::FRAGMENT.into();
        assert_eq!(visibility, d3d12::D3D12_SHADER_VISIBILITY_PIXEL);

        let visibility: d3d12::D3D12_SHADER_VISIBILITY =
            (RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT).into();
        assert_eq!(visibility, d3d12::D3D12_SHADER_VISIBILITY_ALL);
    }

    #[test]
    fn comparison_samplers_set_the_reduction_bit() {
        let mut sampler_def = RhiSamplerDef::default();
        sampler_def.max_anisotropy = 0.0;
        sampler_def.min_filter = RhiFilterType::Linear;
        sampler_def.mag_filter = RhiFilterType::Linear;
        sampler_def.mip_map_mode = RhiMipMapMode::Linear;
        sampler_def.compare_op = RhiCompareOp::Never;
        assert_eq!(
            sampler_def_filter(&sampler_def),
            d3d12::D3D12_FILTER_MIN_MAG_MIP_LINEAR
        );

        sampler_def.compare_op = RhiCompareOp::LessOrEqual;
        assert_eq!(
            sampler_def_filter(&sampler_def),
            d3d12::D3D12_FILTER_COMPARISON_MIN_MAG_MIP_LINEAR
        );
    }
}
