use crate::{
    RhiAddressMode, RhiBlendFactor, RhiBlendOp, RhiColorClearValue, RhiColorFlags, RhiCompareOp,
    RhiCullMode, RhiDepthStencilClearValue, RhiFillMode, RhiFilterType, RhiFormat, RhiFrontFace,
    RhiIndexType, RhiLoadOp, RhiMipMapMode, RhiPrimitiveTopology,
    RhiSampleCount, RhiShaderStageFlags, RhiStencilOp, RhiStoreOp, RhiVertexAttributeRate,
};
use ash::vk;

impl From<RhiFormat> for vk::Format {
    fn from(format: RhiFormat) -> Self {
        match format {
            RhiFormat::UNDEFINED => vk::Format::UNDEFINED,
            RhiFormat::R8_UNORM => vk::Format::R8_UNORM,
            RhiFormat::R8G8_UNORM => vk::Format::R8G8_UNORM,
            RhiFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
            RhiFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
            RhiFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
            RhiFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
            RhiFormat::R16_UINT => vk::Format::R16_UINT,
            RhiFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
            RhiFormat::R32_UINT => vk::Format::R32_UINT,
            RhiFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
            RhiFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
            RhiFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
            RhiFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
            RhiFormat::D16_UNORM => vk::Format::D16_UNORM,
            RhiFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
            RhiFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
            RhiFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }
}

impl From<RhiSampleCount> for vk::SampleCountFlags {
    fn from(sample_count: RhiSampleCount) -> Self {
        match sample_count {
            RhiSampleCount::SampleCount1 => vk::SampleCountFlags::TYPE_1,
            RhiSampleCount::SampleCount2 => vk::SampleCountFlags::TYPE_2,
            RhiSampleCount::SampleCount4 => vk::SampleCountFlags::TYPE_4,
            RhiSampleCount::SampleCount8 => vk::SampleCountFlags::TYPE_8,
            RhiSampleCount::SampleCount16 => vk::SampleCountFlags::TYPE_16,
        }
    }
}

impl From<RhiColorFlags> for vk::ColorComponentFlags {
    fn from(color_flags: RhiColorFlags) -> Self {
        let mut flags = vk::ColorComponentFlags::empty();
        if color_flags.intersects(RhiColorFlags::RED) {
            flags |= vk::ColorComponentFlags::R
        }
        if color_flags.intersects(RhiColorFlags::GREEN) {
            flags |= vk::ColorComponentFlags::G
        }
        if color_flags.intersects(RhiColorFlags::BLUE) {
            flags |= vk::ColorComponentFlags::B
        }
        if color_flags.intersects(RhiColorFlags::ALPHA) {
            flags |= vk::ColorComponentFlags::A
        }
        flags
    }
}

impl From<RhiShaderStageFlags> for vk::ShaderStageFlags {
    fn from(stage_flags: RhiShaderStageFlags) -> Self {
        let mut result = vk::ShaderStageFlags::empty();

        if stage_flags.intersects(RhiShaderStageFlags::VERTEX) {
            result |= vk::ShaderStageFlags::VERTEX;
        }

        if stage_flags.intersects(RhiShaderStageFlags::FRAGMENT) {
            result |= vk::ShaderStageFlags::FRAGMENT;
        }

        if stage_flags.intersects(RhiShaderStageFlags::COMPUTE) {
            result |= vk::ShaderStageFlags::COMPUTE;
        }

        result
    }
}

impl From<RhiVertexAttributeRate> for vk::VertexInputRate {
    fn from(rate: RhiVertexAttributeRate) -> Self {
        match rate {
            RhiVertexAttributeRate::Vertex => vk::VertexInputRate::VERTEX,
            RhiVertexAttributeRate::Instance => vk::VertexInputRate::INSTANCE,
        }
    }
}

impl From<RhiLoadOp> for vk::AttachmentLoadOp {
    fn from(load_op: RhiLoadOp) -> Self {
        match load_op {
            RhiLoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
            RhiLoadOp::Load => vk::AttachmentLoadOp::LOAD,
            RhiLoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        }
    }
}

impl From<RhiStoreOp> for vk::AttachmentStoreOp {
    fn from(store_op: RhiStoreOp) -> Self {
        match store_op {
            RhiStoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
            RhiStoreOp::Store => vk::AttachmentStoreOp::STORE,
        }
    }
}

impl From<RhiPrimitiveTopology> for vk::PrimitiveTopology {
    fn from(primitive_topology: RhiPrimitiveTopology) -> Self {
        match primitive_topology {
            RhiPrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            RhiPrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            RhiPrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            RhiPrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            RhiPrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
            RhiPrimitiveTopology::PatchList => vk::PrimitiveTopology::PATCH_LIST,
        }
    }
}

impl From<RhiIndexType> for vk::IndexType {
    fn from(index_type: RhiIndexType) -> Self {
        match index_type {
            RhiIndexType::Uint32 => vk::IndexType::UINT32,
            RhiIndexType::Uint16 => vk::IndexType::UINT16,
        }
    }
}

impl From<RhiBlendFactor> for vk::BlendFactor {
    fn from(blend_factor: RhiBlendFactor) -> Self {
        match blend_factor {
            RhiBlendFactor::Zero => vk::BlendFactor::ZERO,
            RhiBlendFactor::One => vk::BlendFactor::ONE,
            RhiBlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
            RhiBlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
            RhiBlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
            RhiBlendFactor::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
            RhiBlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
            RhiBlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            RhiBlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
            RhiBlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
            RhiBlendFactor::SrcAlphaSaturate => vk::BlendFactor::SRC_ALPHA_SATURATE,
            RhiBlendFactor::ConstantColor => vk::BlendFactor::CONSTANT_COLOR,
            RhiBlendFactor::OneMinusConstantColor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl From<RhiBlendOp> for vk::BlendOp {
    fn from(blend_op: RhiBlendOp) -> Self {
        match blend_op {
            RhiBlendOp::Add => vk::BlendOp::ADD,
            RhiBlendOp::Subtract => vk::BlendOp::SUBTRACT,
            RhiBlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
            RhiBlendOp::Min => vk::BlendOp::MIN,
            RhiBlendOp::Max => vk::BlendOp::MAX,
        }
    }
}

impl From<RhiCompareOp> for vk::CompareOp {
    fn from(compare_op: RhiCompareOp) -> Self {
        match compare_op {
            RhiCompareOp::Never => vk::CompareOp::NEVER,
            RhiCompareOp::Less => vk::CompareOp::LESS,
            RhiCompareOp::Equal => vk::CompareOp::EQUAL,
            RhiCompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
            RhiCompareOp::Greater => vk::CompareOp::GREATER,
            RhiCompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
            RhiCompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
            RhiCompareOp::Always => vk::CompareOp::ALWAYS,
        }
    }
}

impl From<RhiStencilOp> for vk::StencilOp {
    fn from(stencil_op: RhiStencilOp) -> Self {
        match stencil_op {
            RhiStencilOp::Keep => vk::StencilOp::KEEP,
            RhiStencilOp::Zero => vk::StencilOp::ZERO,
            RhiStencilOp::Replace => vk::StencilOp::REPLACE,
            RhiStencilOp::IncrementAndClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
            RhiStencilOp::DecrementAndClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
            RhiStencilOp::Invert => vk::StencilOp::INVERT,
            RhiStencilOp::IncrementAndWrap => vk::StencilOp::INCREMENT_AND_WRAP,
            RhiStencilOp::DecrementAndWrap => vk::StencilOp::DECREMENT_AND_WRAP,
        }
    }
}

impl From<RhiCullMode> for vk::CullModeFlags {
    fn from(cull_mode: RhiCullMode) -> Self {
        match cull_mode {
            RhiCullMode::None => vk::CullModeFlags::NONE,
            RhiCullMode::Back => vk::CullModeFlags::BACK,
            RhiCullMode::Front => vk::CullModeFlags::FRONT,
        }
    }
}

impl From<RhiFrontFace> for vk::FrontFace {
    fn from(front_face: RhiFrontFace) -> Self {
        match front_face {
            RhiFrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            RhiFrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

impl From<RhiFillMode> for vk::PolygonMode {
    fn from(fill_mode: RhiFillMode) -> Self {
        match fill_mode {
            RhiFillMode::Solid => vk::PolygonMode::FILL,
            RhiFillMode::Wireframe => vk::PolygonMode::LINE,
        }
    }
}

impl From<RhiFilterType> for vk::Filter {
    fn from(filter_type: RhiFilterType) -> Self {
        match filter_type {
            RhiFilterType::Nearest => vk::Filter::NEAREST,
            RhiFilterType::Linear => vk::Filter::LINEAR,
        }
    }
}

impl From<RhiAddressMode> for vk::SamplerAddressMode {
    fn from(address_mode: RhiAddressMode) -> Self {
        match address_mode {
            RhiAddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
            RhiAddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
            RhiAddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            RhiAddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        }
    }
}

impl From<RhiMipMapMode> for vk::SamplerMipmapMode {
    fn from(mip_map_mode: RhiMipMapMode) -> Self {
        match mip_map_mode {
            RhiMipMapMode::Nearest => vk::SamplerMipmapMode::NEAREST,
            RhiMipMapMode::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

impl From<RhiColorClearValue> for vk::ClearValue {
    fn from(clear_value: RhiColorClearValue) -> Self {
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_value.0,
            },
        }
    }
}

impl From<RhiDepthStencilClearValue> for vk::ClearValue {
    fn from(clear_value: RhiDepthStencilClearValue) -> Self {
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: clear_value.depth,
                stencil: clear_value.stencil,
            },
        }
    }
}
