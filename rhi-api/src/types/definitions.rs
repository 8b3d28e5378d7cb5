#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::*;
use crate::{
    RhiError, RhiLogCrateSink, RhiLogSink, RhiRenderPass, RhiResult, RhiShader, RhiTexture,
};
use rhi_base::DecimalF32;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Capacities of the fixed-size view tables a device allocates descriptor slots from. Exceeding
/// one of these makes resource creation fail with `RhiError::HeapExhausted`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiDescriptorHeapSizes {
    pub cbv_srv_uav: u32,
    pub sampler: u32,
    pub rtv: u32,
    pub dsv: u32,
}

impl Default for RhiDescriptorHeapSizes {
    fn default() -> Self {
        RhiDescriptorHeapSizes {
            cbv_srv_uav: 256 * 1024,
            // D3D12 caps shader-visible sampler heaps at 2048
            sampler: 2048,
            rtv: 512,
            dsv: 512,
        }
    }
}

impl RhiDescriptorHeapSizes {
    pub fn capacity(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> u32 {
        match heap_type {
            RhiDescriptorHeapType::CbvSrvUav => self.cbv_srv_uav,
            RhiDescriptorHeapType::Sampler => self.sampler,
            RhiDescriptorHeapType::Rtv => self.rtv,
            RhiDescriptorHeapType::Dsv => self.dsv,
        }
    }
}

/// General configuration that all backends will use when creating a device
#[derive(Clone)]
pub struct RhiApiDef {
    pub validation_mode: RhiValidationMode,
    pub descriptor_heap_sizes: RhiDescriptorHeapSizes,
    /// Receives every creation failure and misuse report
    pub log_sink: Arc<dyn RhiLogSink>,
}

impl Default for RhiApiDef {
    fn default() -> Self {
        RhiApiDef {
            validation_mode: Default::default(),
            descriptor_heap_sizes: Default::default(),
            log_sink: Arc::new(RhiLogCrateSink),
        }
    }
}

impl std::fmt::Debug for RhiApiDef {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiApiDef")
            .field("validation_mode", &self.validation_mode)
            .field("descriptor_heap_sizes", &self.descriptor_heap_sizes)
            .finish()
    }
}

/// Used to create a `RhiBuffer`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiBufferDef {
    pub size: u64,
    /// Zero means the backend picks an alignment based on `resource_type`
    pub alignment: u32,
    pub memory_usage: RhiMemoryUsage,
    pub resource_type: RhiResourceType,
}

impl Default for RhiBufferDef {
    fn default() -> Self {
        RhiBufferDef {
            size: 0,
            alignment: 0,
            memory_usage: RhiMemoryUsage::GpuOnly,
            resource_type: RhiResourceType::UNDEFINED,
        }
    }
}

impl RhiBufferDef {
    pub fn validate(&self) -> RhiResult<()> {
        if self.size == 0 {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Buffer,
                "buffer size must be greater than zero",
            ));
        }

        if self.memory_usage == RhiMemoryUsage::Unknown {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Buffer,
                "buffer memory usage must be specified",
            ));
        }

        if self.resource_type.intersects(
            RhiResourceType::TEXTURE
                | RhiResourceType::TEXTURE_READ_WRITE
                | RhiResourceType::RENDER_TARGET_COLOR
                | RhiResourceType::RENDER_TARGET_DEPTH_STENCIL
                | RhiResourceType::SAMPLER,
        ) {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Buffer,
                format!("{:?} is not a buffer usage", self.resource_type),
            ));
        }

        Ok(())
    }

    pub fn for_staging_buffer(
        size: usize,
        resource_type: RhiResourceType,
    ) -> RhiBufferDef {
        RhiBufferDef {
            size: size as u64,
            alignment: 0,
            memory_usage: RhiMemoryUsage::CpuToGpu,
            resource_type,
        }
    }

    pub fn for_staging_buffer_data<T: Copy>(
        data: &[T],
        resource_type: RhiResourceType,
    ) -> RhiBufferDef {
        Self::for_staging_buffer(rhi_base::memory::slice_size_in_bytes(data), resource_type)
    }

    pub fn for_staging_vertex_buffer(size: usize) -> RhiBufferDef {
        Self::for_staging_buffer(size, RhiResourceType::VERTEX_BUFFER)
    }

    pub fn for_staging_uniform_buffer(size: usize) -> RhiBufferDef {
        Self::for_staging_buffer(size, RhiResourceType::UNIFORM_BUFFER)
    }
}

/// Determines how many dimensions the texture will have.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiTextureDimensions {
    /// Assume 2D if depth = 1, otherwise 3d
    Auto,
    Dim1D,
    Dim2D,
    Dim3D,
}

impl Default for RhiTextureDimensions {
    fn default() -> Self {
        RhiTextureDimensions::Auto
    }
}

impl RhiTextureDimensions {
    /// Resolves `Auto`. Returns None if the extents contradict an explicit dimension.
    pub fn determine_dimensions(
        self,
        extents: RhiExtents3D,
    ) -> Option<RhiTextureDimensions> {
        match self {
            RhiTextureDimensions::Auto => {
                if extents.depth > 1 {
                    Some(RhiTextureDimensions::Dim3D)
                } else {
                    Some(RhiTextureDimensions::Dim2D)
                }
            }
            RhiTextureDimensions::Dim1D => {
                if extents.height == 1 && extents.depth == 1 {
                    Some(RhiTextureDimensions::Dim1D)
                } else {
                    None
                }
            }
            RhiTextureDimensions::Dim2D => {
                if extents.depth == 1 {
                    Some(RhiTextureDimensions::Dim2D)
                } else {
                    None
                }
            }
            RhiTextureDimensions::Dim3D => Some(RhiTextureDimensions::Dim3D),
        }
    }
}

/// Used to create a `RhiTexture`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiTextureDef {
    pub extents: RhiExtents3D,
    // Corresponds to number of vulkan layers and dx12 array size. Generally should be 1, except
    // set to 6 for cubemaps
    pub array_length: u32,
    pub mip_count: u32,
    pub sample_count: RhiSampleCount,
    pub format: RhiFormat,
    pub resource_type: RhiResourceType,
    pub dimensions: RhiTextureDimensions,
}

impl Default for RhiTextureDef {
    fn default() -> Self {
        RhiTextureDef {
            extents: RhiExtents3D {
                width: 0,
                height: 0,
                depth: 1,
            },
            array_length: 1,
            mip_count: 1,
            sample_count: RhiSampleCount::SampleCount1,
            format: RhiFormat::UNDEFINED,
            resource_type: RhiResourceType::TEXTURE,
            dimensions: RhiTextureDimensions::Auto,
        }
    }
}

impl RhiTextureDef {
    /// Checks the def for format/usage combinations no backend can create
    pub fn validate(&self) -> RhiResult<()> {
        let fail = |reason: String| {
            Err(RhiError::resource_creation(
                RhiResourceKind::Texture,
                reason,
            ))
        };

        if self.extents.width == 0 || self.extents.height == 0 || self.extents.depth == 0 {
            return fail(format!("texture extents {:?} must be nonzero", self.extents));
        }

        if self.array_length == 0 || self.mip_count == 0 {
            return fail("array_length and mip_count must be at least 1".to_string());
        }

        if self.format == RhiFormat::UNDEFINED {
            return fail("texture format must not be UNDEFINED".to_string());
        }

        if self.mip_count > 1 && self.sample_count != RhiSampleCount::SampleCount1 {
            return fail("multisampled textures cannot have mip chains".to_string());
        }

        let dimensions = match self.dimensions.determine_dimensions(self.extents) {
            Some(dimensions) => dimensions,
            None => {
                return fail(format!(
                    "extents {:?} do not fit dimensions {:?}",
                    self.extents, self.dimensions
                ))
            }
        };

        if dimensions == RhiTextureDimensions::Dim3D && self.array_length > 1 {
            return fail("3D textures cannot be arrays".to_string());
        }

        if self.resource_type.contains(RhiResourceType::TEXTURE_CUBE) {
            if self.array_length % 6 != 0 {
                return fail(format!(
                    "cube textures need a multiple of 6 array layers, got {}",
                    self.array_length
                ));
            }

            if self.extents.width != self.extents.height {
                return fail("cube texture faces must be square".to_string());
            }
        }

        let has_depth = self.format.has_depth_or_stencil();
        if has_depth
            && self
                .resource_type
                .intersects(RhiResourceType::RENDER_TARGET_COLOR)
        {
            return fail(format!(
                "{:?} cannot be used as a color render target",
                self.format
            ));
        }

        if has_depth
            && self
                .resource_type
                .intersects(RhiResourceType::TEXTURE_READ_WRITE)
        {
            return fail("depth/stencil formats cannot be used for storage".to_string());
        }

        if !has_depth
            && self
                .resource_type
                .intersects(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL)
        {
            return fail(format!(
                "{:?} cannot be used as a depth/stencil render target",
                self.format
            ));
        }

        if self
            .resource_type
            .intersects(RhiResourceType::RENDER_TARGET_COLOR)
            && !self.format.supports_color_attachment()
        {
            return fail(format!(
                "{:?} cannot be used as a color render target",
                self.format
            ));
        }

        if self.resource_type.intersects(
            RhiResourceType::VERTEX_BUFFER
                | RhiResourceType::INDEX_BUFFER
                | RhiResourceType::UNIFORM_BUFFER
                | RhiResourceType::INDIRECT_BUFFER,
        ) {
            return fail(format!(
                "{:?} is not a texture usage",
                self.resource_type
            ));
        }

        Ok(())
    }
}

/// Used to create a `RhiSampler`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiSamplerDef {
    pub min_filter: RhiFilterType,
    pub mag_filter: RhiFilterType,
    pub mip_map_mode: RhiMipMapMode,
    pub address_mode_u: RhiAddressMode,
    pub address_mode_v: RhiAddressMode,
    pub address_mode_w: RhiAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub compare_op: RhiCompareOp,
    // NOTE: Custom hash impl, don't forget to add changes there too!
}

impl Eq for RhiSamplerDef {}

impl Hash for RhiSamplerDef {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        self.min_filter.hash(&mut state);
        self.mag_filter.hash(&mut state);
        self.mip_map_mode.hash(&mut state);
        self.address_mode_u.hash(&mut state);
        self.address_mode_v.hash(&mut state);
        self.address_mode_w.hash(&mut state);
        DecimalF32(self.mip_lod_bias).hash(&mut state);
        DecimalF32(self.max_anisotropy).hash(&mut state);
        self.compare_op.hash(&mut state);
    }
}

impl Default for RhiSamplerDef {
    fn default() -> Self {
        RhiSamplerDef {
            min_filter: RhiFilterType::Linear,
            mag_filter: RhiFilterType::Linear,
            mip_map_mode: RhiMipMapMode::Linear,
            address_mode_u: RhiAddressMode::Repeat,
            address_mode_v: RhiAddressMode::Repeat,
            address_mode_w: RhiAddressMode::Repeat,
            mip_lod_bias: 0.0,
            max_anisotropy: 1.0,
            compare_op: RhiCompareOp::Never,
        }
    }
}

impl RhiSamplerDef {
    pub fn validate(&self) -> RhiResult<()> {
        if !self.mip_lod_bias.is_finite() {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Sampler,
                "mip_lod_bias must be finite",
            ));
        }

        if !(self.max_anisotropy >= 1.0 && self.max_anisotropy <= 16.0) {
            return Err(RhiError::resource_creation(
                RhiResourceKind::Sampler,
                format!(
                    "max_anisotropy must be in [1, 16], got {}",
                    self.max_anisotropy
                ),
            ));
        }

        Ok(())
    }
}

/// One stage of a shader. The bytecode is opaque here: SPIR-V for vulkan (and the null backend),
/// DXIL for dx12. It is compiled when a pipeline is built from the shader.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiShaderStageDef {
    pub shader_stage: RhiShaderStageFlags,
    pub entry_point: String,
    pub bytecode: Vec<u8>,
}

/// Used to create a `RhiShader`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiShaderDef {
    pub stages: Vec<RhiShaderStageDef>,
}

impl RhiShaderDef {
    pub fn validate(&self) -> RhiResult<()> {
        let fail =
            |reason: String| Err(RhiError::resource_creation(RhiResourceKind::Shader, reason));

        if self.stages.is_empty() {
            return fail("a shader needs at least one stage".to_string());
        }

        let mut seen_stages = RhiShaderStageFlags::empty();
        for stage in &self.stages {
            if stage.shader_stage.bits().count_ones() != 1 {
                return fail(format!(
                    "each shader stage must name exactly one stage, got {:?}",
                    stage.shader_stage
                ));
            }

            if seen_stages.intersects(stage.shader_stage) {
                return fail(format!("stage {:?} specified twice", stage.shader_stage));
            }
            seen_stages |= stage.shader_stage;

            if stage.entry_point.is_empty() {
                return fail("shader entry point must not be empty".to_string());
            }

            if stage.bytecode.is_empty() {
                return fail(format!("stage {:?} has no bytecode", stage.shader_stage));
            }
        }

        Ok(())
    }

    pub fn stage_flags(&self) -> RhiShaderStageFlags {
        let mut flags = RhiShaderStageFlags::empty();
        for stage in &self.stages {
            flags |= stage.shader_stage;
        }
        flags
    }
}

/// Describes an attribute within a RhiVertexLayout
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiVertexLayoutAttribute {
    /// Format of the attribute
    pub format: RhiFormat,
    /// Which buffer the attribute is contained in
    pub buffer_index: u32,
    /// Affects what input variable within the shader the attribute is assigned
    pub location: u32,
    /// The byte offset of the attribute within the buffer
    pub byte_offset: u32,
    /// Name of the attribute in the shader, only used by dx12 (e.g. "POSITION", "TEXCOORD1")
    pub hlsl_semantic: String,
}

/// Describes a buffer that provides vertex attribute data (See RhiVertexLayout)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiVertexLayoutBuffer {
    pub stride: u32,
    pub rate: RhiVertexAttributeRate,
}

/// Describes how vertex attributes are laid out within one or more buffers
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiVertexLayout {
    pub attributes: Vec<RhiVertexLayoutAttribute>,
    pub buffers: Vec<RhiVertexLayoutBuffer>,
}

impl RhiVertexLayout {
    pub fn validate(&self) -> Result<(), String> {
        if self.buffers.len() > MAX_VERTEX_INPUT_BINDINGS {
            return Err(format!(
                "{} vertex buffers exceeds the limit of {}",
                self.buffers.len(),
                MAX_VERTEX_INPUT_BINDINGS
            ));
        }

        for (i, buffer) in self.buffers.iter().enumerate() {
            if buffer.stride == 0 {
                return Err(format!("vertex buffer {} has a zero stride", i));
            }
        }

        let mut locations = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            let buffer = self
                .buffers
                .get(attribute.buffer_index as usize)
                .ok_or_else(|| {
                    format!(
                        "attribute at location {} references missing buffer {}",
                        attribute.location, attribute.buffer_index
                    )
                })?;

            let size = attribute.format.block_or_pixel_size_in_bytes().ok_or_else(|| {
                format!(
                    "attribute at location {} has format {:?}",
                    attribute.location, attribute.format
                )
            })?;

            if attribute.byte_offset + size > buffer.stride {
                return Err(format!(
                    "attribute at location {} overruns the buffer stride {}",
                    attribute.location, buffer.stride
                ));
            }

            if locations.contains(&attribute.location) {
                return Err(format!("location {} used twice", attribute.location));
            }
            locations.push(attribute.location);
        }

        Ok(())
    }
}

/// Affects depth testing and stencil usage. Commonly used to enable "Z-buffering".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiDepthState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: RhiCompareOp,
    pub stencil_test_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_depth_fail_op: RhiStencilOp,
    pub front_stencil_compare_op: RhiCompareOp,
    pub front_stencil_fail_op: RhiStencilOp,
    pub front_stencil_pass_op: RhiStencilOp,
    pub back_depth_fail_op: RhiStencilOp,
    pub back_stencil_compare_op: RhiCompareOp,
    pub back_stencil_fail_op: RhiStencilOp,
    pub back_stencil_pass_op: RhiStencilOp,
}

impl Default for RhiDepthState {
    fn default() -> Self {
        RhiDepthState {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: RhiCompareOp::LessOrEqual,
            stencil_test_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front_depth_fail_op: Default::default(),
            front_stencil_compare_op: RhiCompareOp::Always,
            front_stencil_fail_op: Default::default(),
            front_stencil_pass_op: Default::default(),
            back_depth_fail_op: Default::default(),
            back_stencil_compare_op: RhiCompareOp::Always,
            back_stencil_fail_op: Default::default(),
            back_stencil_pass_op: Default::default(),
        }
    }
}

impl RhiDepthState {
    pub fn validate(
        &self,
        depth_format: Option<RhiFormat>,
    ) -> Result<(), String> {
        let uses_depth = self.depth_test_enable || self.depth_write_enable;
        match depth_format {
            None if uses_depth || self.stencil_test_enable => {
                Err("depth/stencil testing requires a depth attachment".to_string())
            }
            Some(format) if self.stencil_test_enable && !format.has_stencil() => Err(format!(
                "stencil testing requires a stencil format, attachment is {:?}",
                format
            )),
            _ => Ok(()),
        }
    }
}

/// Affects rasterization, commonly used to enable backface culling or wireframe rendering
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiRasterizerState {
    pub cull_mode: RhiCullMode,
    pub front_face: RhiFrontFace,
    pub fill_mode: RhiFillMode,
    pub depth_bias: i32,
    pub depth_bias_slope_scaled: f32,
    pub depth_clamp_enable: bool,
    pub multisample: bool,
    // Hash implemented manually below, don't forget to update it!
}

impl Eq for RhiRasterizerState {}

impl Hash for RhiRasterizerState {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        self.cull_mode.hash(&mut state);
        self.front_face.hash(&mut state);
        self.fill_mode.hash(&mut state);
        self.depth_bias.hash(&mut state);
        DecimalF32(self.depth_bias_slope_scaled).hash(&mut state);
        self.depth_clamp_enable.hash(&mut state);
        self.multisample.hash(&mut state);
    }
}

impl Default for RhiRasterizerState {
    fn default() -> Self {
        RhiRasterizerState {
            cull_mode: RhiCullMode::None,
            front_face: RhiFrontFace::CounterClockwise,
            fill_mode: RhiFillMode::Solid,
            depth_bias: 0,
            depth_bias_slope_scaled: 0.0,
            depth_clamp_enable: false,
            multisample: false,
        }
    }
}

impl RhiRasterizerState {
    pub fn validate(&self) -> Result<(), String> {
        if !self.depth_bias_slope_scaled.is_finite() {
            return Err("depth_bias_slope_scaled must be finite".to_string());
        }

        Ok(())
    }
}

/// Configures blend state for a particular render target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiBlendStateRenderTarget {
    pub src_factor: RhiBlendFactor,
    pub dst_factor: RhiBlendFactor,
    pub src_factor_alpha: RhiBlendFactor,
    pub dst_factor_alpha: RhiBlendFactor,
    pub blend_op: RhiBlendOp,
    pub blend_op_alpha: RhiBlendOp,
    pub masks: RhiColorFlags,
}

impl Default for RhiBlendStateRenderTarget {
    fn default() -> Self {
        RhiBlendStateRenderTarget::default_alpha_disabled()
    }
}

impl RhiBlendStateRenderTarget {
    pub fn default_alpha_disabled() -> Self {
        RhiBlendStateRenderTarget {
            src_factor: RhiBlendFactor::One,
            dst_factor: RhiBlendFactor::Zero,
            src_factor_alpha: RhiBlendFactor::One,
            dst_factor_alpha: RhiBlendFactor::Zero,
            blend_op: RhiBlendOp::Add,
            blend_op_alpha: RhiBlendOp::Add,
            masks: RhiColorFlags::ALL,
        }
    }

    pub fn default_alpha_enabled() -> Self {
        RhiBlendStateRenderTarget {
            src_factor: RhiBlendFactor::SrcAlpha,
            dst_factor: RhiBlendFactor::OneMinusSrcAlpha,
            src_factor_alpha: RhiBlendFactor::One,
            dst_factor_alpha: RhiBlendFactor::Zero,
            blend_op: RhiBlendOp::Add,
            blend_op_alpha: RhiBlendOp::Add,
            masks: RhiColorFlags::ALL,
        }
    }

    pub fn blend_enabled(&self) -> bool {
        self.src_factor != RhiBlendFactor::One
            || self.src_factor_alpha != RhiBlendFactor::One
            || self.dst_factor != RhiBlendFactor::Zero
            || self.dst_factor_alpha != RhiBlendFactor::Zero
    }
}

/// Affects the way the result of a pixel shader is blended with a value it will overwrite.
/// Commonly used to enable "alpha-blending".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiBlendState {
    /// Individual blend states for blend targets. If `independent_blend` is false, exactly one
    /// entry is used for every color attachment.
    pub render_target_blend_states: Vec<RhiBlendStateRenderTarget>,
    pub independent_blend: bool,
}

impl Default for RhiBlendState {
    fn default() -> Self {
        RhiBlendState::default_alpha_disabled()
    }
}

impl RhiBlendState {
    pub fn default_alpha_disabled() -> Self {
        RhiBlendState {
            render_target_blend_states: vec![RhiBlendStateRenderTarget::default_alpha_disabled()],
            independent_blend: false,
        }
    }

    pub fn default_alpha_enabled() -> Self {
        RhiBlendState {
            render_target_blend_states: vec![RhiBlendStateRenderTarget::default_alpha_enabled()],
            independent_blend: false,
        }
    }

    /// Blend state that applies to the color attachment at `index`
    pub fn render_target_blend_state(
        &self,
        index: usize,
    ) -> Option<&RhiBlendStateRenderTarget> {
        if self.independent_blend {
            self.render_target_blend_states.get(index)
        } else {
            self.render_target_blend_states.first()
        }
    }

    pub fn validate(
        &self,
        color_attachment_count: usize,
    ) -> Result<(), String> {
        if !self.independent_blend {
            if self.render_target_blend_states.len() != 1 {
                return Err(format!(
                    "without independent blend exactly one blend state is required, got {}",
                    self.render_target_blend_states.len()
                ));
            }
        } else if self.render_target_blend_states.len() != color_attachment_count {
            return Err(format!(
                "independent blend needs one blend state per color attachment ({}), got {}",
                color_attachment_count,
                self.render_target_blend_states.len()
            ));
        }

        Ok(())
    }
}

/// A color attachment slot of a render pass
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiColorAttachmentDef {
    pub format: RhiFormat,
    pub load_op: RhiLoadOp,
    pub store_op: RhiStoreOp,
    /// State the attachment is left in when the pass ends. None leaves it as a render target.
    pub final_state: Option<RhiResourceState>,
}

/// The depth/stencil attachment slot of a render pass. Depth and stencil share one load/store op.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiDepthStencilAttachmentDef {
    pub format: RhiFormat,
    pub load_op: RhiLoadOp,
    pub store_op: RhiStoreOp,
    /// State the attachment is left in when the pass ends. None leaves it depth-writable.
    pub final_state: Option<RhiResourceState>,
}

/// Used to create a `RhiRenderPass`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiRenderPassDef {
    pub color_attachments: Vec<RhiColorAttachmentDef>,
    pub depth_stencil_attachment: Option<RhiDepthStencilAttachmentDef>,
    pub sample_count: RhiSampleCount,
}

impl RhiRenderPassDef {
    pub fn validate(&self) -> RhiResult<()> {
        let fail = |reason: String| {
            Err(RhiError::resource_creation(
                RhiResourceKind::RenderPass,
                reason,
            ))
        };

        if self.color_attachments.is_empty() && self.depth_stencil_attachment.is_none() {
            return fail("a render pass needs at least one attachment".to_string());
        }

        if self.color_attachments.len() > MAX_RENDER_TARGET_ATTACHMENTS {
            return fail(format!(
                "{} color attachments exceeds the limit of {}",
                self.color_attachments.len(),
                MAX_RENDER_TARGET_ATTACHMENTS
            ));
        }

        for (i, attachment) in self.color_attachments.iter().enumerate() {
            if !attachment.format.supports_color_attachment() {
                return fail(format!(
                    "color attachment {} has non-color format {:?}",
                    i, attachment.format
                ));
            }

            if attachment.final_state == Some(RhiResourceState::UNDEFINED) {
                return fail(format!(
                    "color attachment {} cannot end the pass in UNDEFINED",
                    i
                ));
            }
        }

        if let Some(depth_attachment) = &self.depth_stencil_attachment {
            if !depth_attachment.format.has_depth_or_stencil() {
                return fail(format!(
                    "depth attachment has non-depth format {:?}",
                    depth_attachment.format
                ));
            }

            if depth_attachment.final_state == Some(RhiResourceState::UNDEFINED) {
                return fail("depth attachment cannot end the pass in UNDEFINED".to_string());
            }
        }

        Ok(())
    }
}

/// Used to create a `RhiFramebuffer`. Attachments are listed in the same order as the render
/// pass's attachment slots.
pub struct RhiFramebufferDef<'a> {
    pub render_pass: &'a RhiRenderPass,
    pub color_attachments: &'a [&'a RhiTexture],
    pub depth_stencil_attachment: Option<&'a RhiTexture>,
}

/// One resource binding in a pipeline layout
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiPipelineLayoutBinding {
    pub set_index: u32,
    pub binding: u32,
    /// Exactly one of SAMPLER, TEXTURE, TEXTURE_READ_WRITE, UNIFORM_BUFFER, BUFFER or
    /// BUFFER_READ_WRITE
    pub resource_type: RhiResourceType,
    pub stage_flags: RhiShaderStageFlags,
    pub element_count: u32,
}

/// Describes the resource bindings a pipeline's shaders can access (a vulkan pipeline layout or
/// a dx12 root signature)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiPipelineLayoutDef {
    pub bindings: Vec<RhiPipelineLayoutBinding>,
    /// Size in bytes, zero for no push constants
    pub push_constant_size: u32,
    pub push_constant_stages: RhiShaderStageFlags,
}

impl RhiPipelineLayoutDef {
    pub fn validate(&self) -> Result<(), String> {
        let bindable_types = [
            RhiResourceType::SAMPLER,
            RhiResourceType::TEXTURE,
            RhiResourceType::TEXTURE_READ_WRITE,
            RhiResourceType::UNIFORM_BUFFER,
            RhiResourceType::BUFFER,
            RhiResourceType::BUFFER_READ_WRITE,
        ];

        let mut seen = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if binding.set_index as usize >= MAX_DESCRIPTOR_SETS {
                return Err(format!(
                    "set index {} exceeds the limit of {}",
                    binding.set_index, MAX_DESCRIPTOR_SETS
                ));
            }

            if !bindable_types.contains(&binding.resource_type) {
                return Err(format!(
                    "binding {}:{} has unbindable resource type {:?}",
                    binding.set_index, binding.binding, binding.resource_type
                ));
            }

            if binding.element_count == 0 {
                return Err(format!(
                    "binding {}:{} has zero elements",
                    binding.set_index, binding.binding
                ));
            }

            if binding.stage_flags.is_empty() {
                return Err(format!(
                    "binding {}:{} is not visible to any stage",
                    binding.set_index, binding.binding
                ));
            }

            let key = (binding.set_index, binding.binding);
            if seen.contains(&key) {
                return Err(format!(
                    "binding {}:{} declared twice",
                    binding.set_index, binding.binding
                ));
            }
            seen.push(key);
        }

        if self.push_constant_size % 4 != 0 || self.push_constant_size > MAX_PUSH_CONSTANT_SIZE {
            return Err(format!(
                "push constant size {} must be a multiple of 4 and at most {}",
                self.push_constant_size, MAX_PUSH_CONSTANT_SIZE
            ));
        }

        Ok(())
    }

    /// Number of descriptor sets the layout spans (highest set index + 1)
    pub fn set_count(&self) -> usize {
        self.bindings
            .iter()
            .map(|x| x.set_index as usize + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Used to create a `RhiPipeline` for graphics operations
pub struct RhiGraphicsPipelineDef<'a> {
    pub shader: &'a RhiShader,
    pub render_pass: &'a RhiRenderPass,
    pub layout: &'a RhiPipelineLayoutDef,
    pub vertex_layout: &'a RhiVertexLayout,
    pub blend_state: &'a RhiBlendState,
    pub depth_state: &'a RhiDepthState,
    pub rasterizer_state: &'a RhiRasterizerState,
    pub primitive_topology: RhiPrimitiveTopology,
    pub sample_count: RhiSampleCount,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_target_def(format: RhiFormat) -> RhiTextureDef {
        RhiTextureDef {
            extents: RhiExtents3D {
                width: 64,
                height: 64,
                depth: 1,
            },
            format,
            resource_type: RhiResourceType::TEXTURE | RhiResourceType::RENDER_TARGET_COLOR,
            ..Default::default()
        }
    }

    #[test]
    fn zero_sized_buffer_is_rejected() {
        let def = RhiBufferDef {
            size: 0,
            memory_usage: RhiMemoryUsage::CpuToGpu,
            resource_type: RhiResourceType::VERTEX_BUFFER,
            ..Default::default()
        };

        match def.validate() {
            Err(RhiError::ResourceCreation { kind, .. }) => {
                assert_eq!(kind, RhiResourceKind::Buffer)
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn depth_format_cannot_be_color_target() {
        assert!(render_target_def(RhiFormat::R8G8B8A8_UNORM).validate().is_ok());
        assert!(render_target_def(RhiFormat::D32_SFLOAT).validate().is_err());
    }

    #[test]
    fn cube_needs_six_layers() {
        let mut def = render_target_def(RhiFormat::R8G8B8A8_UNORM);
        def.resource_type = RhiResourceType::TEXTURE_CUBE;
        def.array_length = 4;
        assert!(def.validate().is_err());
        def.array_length = 6;
        assert!(def.validate().is_ok());
    }

    #[test]
    fn explicit_2d_rejects_depth() {
        let mut def = render_target_def(RhiFormat::R8G8B8A8_UNORM);
        def.dimensions = RhiTextureDimensions::Dim2D;
        def.extents.depth = 4;
        assert!(def.validate().is_err());
    }

    #[test]
    fn vertex_layout_catches_bad_references() {
        let mut layout = RhiVertexLayout {
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
        };
        assert!(layout.validate().is_ok());

        layout.attributes[0].buffer_index = 1;
        assert!(layout.validate().is_err());

        layout.attributes[0].buffer_index = 0;
        layout.attributes[0].byte_offset = 4;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn blend_state_count_must_match() {
        let mut blend_state = RhiBlendState::default_alpha_enabled();
        assert!(blend_state.validate(3).is_ok());

        blend_state.independent_blend = true;
        assert!(blend_state.validate(3).is_err());
        assert!(blend_state.validate(1).is_ok());
    }

    #[test]
    fn layout_rejects_duplicate_bindings() {
        let binding = RhiPipelineLayoutBinding {
            set_index: 0,
            binding: 0,
            resource_type: RhiResourceType::UNIFORM_BUFFER,
            stage_flags: RhiShaderStageFlags::VERTEX,
            element_count: 1,
        };

        let layout = RhiPipelineLayoutDef {
            bindings: vec![binding.clone(), binding],
            ..Default::default()
        };

        assert!(layout.validate().is_err());
    }

    #[test]
    fn depth_state_needs_depth_attachment() {
        let depth_state = RhiDepthState {
            depth_test_enable: true,
            ..Default::default()
        };

        assert!(depth_state.validate(None).is_err());
        assert!(depth_state.validate(Some(RhiFormat::D32_SFLOAT)).is_ok());

        let stencil_state = RhiDepthState {
            stencil_test_enable: true,
            ..Default::default()
        };
        assert!(stencil_state
            .validate(Some(RhiFormat::D32_SFLOAT))
            .is_err());
    }
}
