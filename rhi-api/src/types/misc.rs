#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::{RhiBuffer, RhiTexture};
use rhi_base::DecimalF32;
use std::hash::{Hash, Hasher};

/// Controls if validation is enabled or not. The requirements/behaviors of validation is
/// API-specific.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiValidationMode {
    /// Do not enable validation. Even if validation is turned on through external means, do not
    /// intentionally fail initialization
    Disabled,

    /// Enable validation if possible. (Details on requirements to enable at runtime are
    /// API-specific)
    EnabledIfAvailable,

    /// Enable validation, and fail if we cannot enable it or detect that it is not enabled through
    /// external means. (Details on this are API-specific)
    Enabled,
}

impl Default for RhiValidationMode {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        let validation_mode = RhiValidationMode::EnabledIfAvailable;
        #[cfg(not(debug_assertions))]
        let validation_mode = RhiValidationMode::Disabled;

        validation_mode
    }
}

/// The backend a device was created with
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiBackendType {
    Vulkan,
    Dx12,
    Null,
}

/// Information about the device, mostly limits and requirements (like memory alignment)
#[derive(Clone, Debug)]
pub struct RhiDeviceInfo {
    pub backend_type: RhiBackendType,
    pub device_name: String,

    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
    pub upload_buffer_texture_alignment: u32,
    pub upload_buffer_texture_row_alignment: u32,

    pub max_vertex_attribute_count: u32,
    pub max_color_attachments: u32,
    pub max_texture_dimension_2d: u32,
}

bitflags::bitflags! {
    /// The current state of a resource. When an operation is performed that references a resource,
    /// it must be in the correct state. Resources are moved between state using barriers recorded
    /// in a command buffer.
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RhiResourceState: u32 {
        const UNDEFINED = 0;
        const VERTEX_AND_CONSTANT_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        /// Similar to vulkan's COLOR_ATTACHMENT_OPTIMAL image layout
        const RENDER_TARGET = 0x4;
        const UNORDERED_ACCESS = 0x8;
        /// Similar to vulkan's DEPTH_STENCIL_ATTACHMENT_OPTIMAL image layout
        const DEPTH_WRITE = 0x10;
        const DEPTH_READ = 0x20;
        const NON_PIXEL_SHADER_RESOURCE = 0x40;
        const PIXEL_SHADER_RESOURCE = 0x80;
        /// Similar to vulkan's SHADER_READ_ONLY_OPTIMAL image layout
        const SHADER_RESOURCE = 0x40 | 0x80;
        const INDIRECT_ARGUMENT = 0x200;
        /// Similar to vulkan's TRANSFER_DST_OPTIMAL image layout
        const COPY_DST = 0x400;
        /// Similar to vulkan's TRANSFER_SRC_OPTIMAL image layout
        const COPY_SRC = 0x800;
        const GENERIC_READ = 0x1 | 0x2 | 0x40 | 0x80 | 0x200 | 0x800;
        /// Similar to vulkan's PRESENT_SRC_KHR image layout
        const PRESENT = 0x1000;
        /// Similar to vulkan's GENERAL image layout
        const COMMON = 0x2000;
    }
}

impl Default for RhiResourceState {
    fn default() -> Self {
        RhiResourceState::UNDEFINED
    }
}

/// A 2d size for windows, textures, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiExtents2D {
    pub width: u32,
    pub height: u32,
}

/// A 3d size for windows, textures, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiExtents3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl RhiExtents3D {
    pub fn to_2d(self) -> RhiExtents2D {
        RhiExtents2D {
            width: self.width,
            height: self.height,
        }
    }
}

/// Number of MSAA samples to use. 1xMSAA and 4xMSAA are most broadly supported
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiSampleCount {
    SampleCount1,
    SampleCount2,
    SampleCount4,
    SampleCount8,
    SampleCount16,
}

impl Default for RhiSampleCount {
    fn default() -> Self {
        RhiSampleCount::SampleCount1
    }
}

impl RhiSampleCount {
    pub fn as_u32(self) -> u32 {
        match self {
            RhiSampleCount::SampleCount1 => 1,
            RhiSampleCount::SampleCount2 => 2,
            RhiSampleCount::SampleCount4 => 4,
            RhiSampleCount::SampleCount8 => 8,
            RhiSampleCount::SampleCount16 => 16,
        }
    }
}

bitflags::bitflags! {
    /// Indicates how a resource will be used. In some cases, multiple flags are allowed.
    #[derive(Default)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RhiResourceType: u32 {
        const UNDEFINED = 0;
        const SAMPLER = 1<<0;
        /// Similar to DX12 SRV and vulkan SAMPLED image usage flag
        const TEXTURE = 1<<1;
        /// Similar to DX12 UAV and vulkan STORAGE image usage flag
        const TEXTURE_READ_WRITE = 1<<2;
        /// Similar to DX12 SRV and vulkan STORAGE_BUFFER descriptor type
        const BUFFER = 1<<3;
        /// Similar to DX12 UAV and vulkan STORAGE_BUFFER descriptor type
        const BUFFER_READ_WRITE = 1<<5;
        /// Similar to vulkan UNIFORM_BUFFER descriptor type, a CBV in DX12
        const UNIFORM_BUFFER = 1<<7;
        /// Similar to vulkan VERTEX_BUFFER buffer usage flag
        const VERTEX_BUFFER = 1<<9;
        /// Similar to vulkan INDEX_BUFFER buffer usage flag
        const INDEX_BUFFER = 1<<10;
        /// Similar to vulkan INDIRECT_BUFFER buffer usage flag
        const INDIRECT_BUFFER = 1<<11;
        /// Similar to vulkan's CUBE_COMPATIBLE image create flag
        const TEXTURE_CUBE = 1<<12 | RhiResourceType::TEXTURE.bits();
        /// A color attachment in a renderpass
        const RENDER_TARGET_COLOR = 1<<23;
        /// A depth/stencil attachment in a renderpass
        const RENDER_TARGET_DEPTH_STENCIL = 1<<24;
    }
}

impl RhiResourceType {
    pub fn is_uniform_buffer(self) -> bool {
        self.intersects(RhiResourceType::UNIFORM_BUFFER)
    }

    pub fn is_storage_buffer(self) -> bool {
        self.intersects(RhiResourceType::BUFFER | RhiResourceType::BUFFER_READ_WRITE)
    }

    pub fn is_render_target(self) -> bool {
        self.intersects(
            RhiResourceType::RENDER_TARGET_COLOR | RhiResourceType::RENDER_TARGET_DEPTH_STENCIL,
        )
    }

    pub fn is_texture(self) -> bool {
        self.intersects(RhiResourceType::TEXTURE | RhiResourceType::TEXTURE_READ_WRITE)
    }
}

bitflags::bitflags! {
    /// Flags for enabling/disabling color channels, used with `RhiBlendState`
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RhiColorFlags: u8 {
        const RED = 1;
        const GREEN = 2;
        const BLUE = 4;
        const ALPHA = 8;
        const ALL = 0x0F;
    }
}

impl Default for RhiColorFlags {
    fn default() -> Self {
        RhiColorFlags::ALL
    }
}

/// Indicates how the memory will be accessed and affects where in memory it needs to be allocated.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiMemoryUsage {
    Unknown,

    /// The memory is only accessed by the GPU
    GpuOnly,

    /// The memory is only accessed by the CPU
    CpuOnly,

    /// The memory is written by the CPU and read by the GPU
    CpuToGpu,

    /// The memory is written by the GPU and read by the CPU
    GpuToCpu,
}

impl Default for RhiMemoryUsage {
    fn default() -> Self {
        RhiMemoryUsage::GpuOnly
    }
}

#[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
impl From<RhiMemoryUsage> for gpu_allocator::MemoryLocation {
    fn from(memory_usage: RhiMemoryUsage) -> Self {
        use gpu_allocator::MemoryLocation;
        match memory_usage {
            RhiMemoryUsage::Unknown => MemoryLocation::Unknown,
            RhiMemoryUsage::GpuOnly => MemoryLocation::GpuOnly,
            RhiMemoryUsage::CpuOnly => MemoryLocation::CpuToGpu,
            RhiMemoryUsage::CpuToGpu => MemoryLocation::CpuToGpu,
            RhiMemoryUsage::GpuToCpu => MemoryLocation::GpuToCpu,
        }
    }
}

impl RhiMemoryUsage {
    /// True if the CPU may map memory with this usage
    pub fn is_host_visible(self) -> bool {
        match self {
            RhiMemoryUsage::CpuOnly | RhiMemoryUsage::CpuToGpu | RhiMemoryUsage::GpuToCpu => true,
            RhiMemoryUsage::Unknown | RhiMemoryUsage::GpuOnly => false,
        }
    }
}

bitflags::bitflags! {
    /// Indicates a particular stage of a shader, or set of stages in a shader. Similar to
    /// VkShaderStageFlagBits
    #[derive(Default)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RhiShaderStageFlags : u32 {
        const NONE = 0;
        const VERTEX = 1;
        const FRAGMENT = 16;
        const COMPUTE = 32;
        const ALL_GRAPHICS = 1 | 16;
        const ALL = 0x7FFF_FFFF;
    }
}

/// Affects how quickly vertex attributes are consumed from buffers, similar to VkVertexInputRate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiVertexAttributeRate {
    Vertex,
    Instance,
}

impl Default for RhiVertexAttributeRate {
    fn default() -> Self {
        RhiVertexAttributeRate::Vertex
    }
}

/// Determines if the contents of an image attachment in a renderpass begins with its previous
/// contents, a clear value, or undefined data. Similar to VkAttachmentLoadOp
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiLoadOp {
    DontCare,
    Load,
    Clear,
}

impl Default for RhiLoadOp {
    fn default() -> Self {
        RhiLoadOp::DontCare
    }
}

/// Determines if the contents of an image attachment in a render pass will store the resulting
/// state for use after the render pass
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiStoreOp {
    /// Do not store the image, leaving the contents of it undefined
    DontCare,

    /// Persist the image's content after a render pass completes
    Store,
}

impl Default for RhiStoreOp {
    fn default() -> Self {
        RhiStoreOp::Store
    }
}

/// How to intepret vertex data into a form of geometry. Similar to VkPrimitiveTopology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiPrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    PatchList,
}

impl Default for RhiPrimitiveTopology {
    fn default() -> Self {
        RhiPrimitiveTopology::TriangleList
    }
}

/// The size of index buffer elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiIndexType {
    Uint32,
    Uint16,
}

impl Default for RhiIndexType {
    fn default() -> Self {
        RhiIndexType::Uint32
    }
}

impl RhiIndexType {
    pub fn size_in_bytes(self) -> u32 {
        match self {
            RhiIndexType::Uint32 => 4,
            RhiIndexType::Uint16 => 2,
        }
    }
}

/// Affects blending. Similar to VkBlendFactor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiBlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
    ConstantColor,
    OneMinusConstantColor,
}

impl Default for RhiBlendFactor {
    fn default() -> Self {
        RhiBlendFactor::Zero
    }
}

/// Affects blending. Similar to VkBlendOp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiBlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl Default for RhiBlendOp {
    fn default() -> Self {
        RhiBlendOp::Add
    }
}

/// Affects depth testing and sampling. Similar to VkCompareOp
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiCompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl Default for RhiCompareOp {
    fn default() -> Self {
        RhiCompareOp::Never
    }
}

/// Similar to VkStencilOp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiStencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

impl Default for RhiStencilOp {
    fn default() -> Self {
        RhiStencilOp::Keep
    }
}

/// Determines if we cull polygons that are front-facing or back-facing. Similar to
/// VkCullModeFlags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiCullMode {
    None,
    Back,
    Front,
}

impl Default for RhiCullMode {
    fn default() -> Self {
        RhiCullMode::None
    }
}

/// Determines what winding order is considerered the front face of a polygon. Similar to
/// VkFrontFace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiFrontFace {
    CounterClockwise,
    Clockwise,
}

impl Default for RhiFrontFace {
    fn default() -> Self {
        RhiFrontFace::CounterClockwise
    }
}

/// Whether to fill in polygons or not. Similar to VkPolygonMode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiFillMode {
    Solid,
    Wireframe,
}

impl Default for RhiFillMode {
    fn default() -> Self {
        RhiFillMode::Solid
    }
}

/// Filtering method when sampling. Similar to VkFilter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiFilterType {
    /// Finds the closest value in the texture and uses it
    Nearest,

    /// "Averages" color values of the texture
    Linear,
}

impl Default for RhiFilterType {
    fn default() -> Self {
        RhiFilterType::Nearest
    }
}

/// Affects image sampling, particularly for UV coordinates outside the [0, 1] range. Similar to
/// VkSamplerAddressMode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiAddressMode {
    Mirror,
    Repeat,
    ClampToEdge,
    ClampToBorder,
}

impl Default for RhiAddressMode {
    fn default() -> Self {
        RhiAddressMode::Mirror
    }
}

/// Similar to VkSamplerMipmapMode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RhiMipMapMode {
    Nearest,
    Linear,
}

impl Default for RhiMipMapMode {
    fn default() -> Self {
        RhiMipMapMode::Nearest
    }
}

/// A clear value for color attachments
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RhiColorClearValue(pub [f32; 4]);

impl Hash for RhiColorClearValue {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        for &value in &self.0 {
            DecimalF32(value).hash(&mut state);
        }
    }
}

/// A clear values for depth/stencil attachments. One or both values may be used depending on the
/// format of the attached image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RhiDepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

impl Default for RhiDepthStencilClearValue {
    fn default() -> Self {
        RhiDepthStencilClearValue {
            depth: 1.0,
            stencil: 0,
        }
    }
}

impl Hash for RhiDepthStencilClearValue {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        DecimalF32(self.depth).hash(&mut state);
        self.stencil.hash(&mut state);
    }
}

/// Clear values used when a render pass begins. Entries for attachments that don't clear are
/// ignored, missing entries default to zero/one.
#[derive(Clone, Debug, Default)]
pub struct RhiClearValues {
    pub color: Vec<RhiColorClearValue>,
    pub depth_stencil: RhiDepthStencilClearValue,
}

impl RhiClearValues {
    pub fn color_or_default(
        &self,
        index: usize,
    ) -> RhiColorClearValue {
        self.color.get(index).copied().unwrap_or_default()
    }
}

/// A memory barrier for buffers. This is used to transition buffers between resource states
pub struct RhiBufferBarrier<'a> {
    pub buffer: &'a RhiBuffer,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
}

impl<'a> RhiBufferBarrier<'a> {
    /// Transition from whatever state the buffer is currently tracked in
    pub fn to_state(
        buffer: &'a RhiBuffer,
        dst_state: RhiResourceState,
    ) -> RhiBufferBarrier<'a> {
        RhiBufferBarrier {
            buffer,
            src_state: buffer.current_state(),
            dst_state,
        }
    }
}

/// A memory barrier for textures. This is used to transition textures between resource states.
pub struct RhiTextureBarrier<'a> {
    pub texture: &'a RhiTexture,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
}

impl<'a> RhiTextureBarrier<'a> {
    /// Creates a simple state transition
    pub fn state_transition(
        texture: &'a RhiTexture,
        src_state: RhiResourceState,
        dst_state: RhiResourceState,
    ) -> RhiTextureBarrier<'a> {
        RhiTextureBarrier {
            texture,
            src_state,
            dst_state,
        }
    }

    /// Transition from whatever state the texture is currently tracked in
    pub fn to_state(
        texture: &'a RhiTexture,
        dst_state: RhiResourceState,
    ) -> RhiTextureBarrier<'a> {
        Self::state_transition(texture, texture.current_state(), dst_state)
    }
}

/// A vertex buffer bound for draw calls
pub struct RhiVertexBufferBinding<'a> {
    pub buffer: &'a RhiBuffer,
    pub byte_offset: u64,
}

/// An index buffer bound for draw calls
pub struct RhiIndexBufferBinding<'a> {
    pub buffer: &'a RhiBuffer,
    pub byte_offset: u64,
    pub index_type: RhiIndexType,
}

/// Parameters for copying a buffer into a texture. The buffer holds tightly packed rows for a
/// single mip level of a single array layer.
#[derive(Default, Clone, Debug)]
pub struct RhiCmdCopyBufferToTextureParams {
    pub buffer_offset: u64,
    pub array_layer: u16,
    pub mip_level: u8,
}

/// The recording state of a command buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiCommandBufferStatus {
    /// Freshly created or reset, `begin` may be called
    Initial,
    /// Between `begin` and `end`, commands may be recorded
    Recording,
    /// Recording is finished, the command buffer may be submitted
    Executable,
    /// Submitted to the GPU, must be reset before it is recorded again
    Pending,
}

/// The step of graphics pipeline construction that failed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiPipelineStage {
    ShaderStages,
    VertexInput,
    InputAssembly,
    Rasterization,
    Multisample,
    DepthStencil,
    ColorBlend,
    Layout,
}

impl RhiPipelineStage {
    pub fn name(self) -> &'static str {
        match self {
            RhiPipelineStage::ShaderStages => "shader stages",
            RhiPipelineStage::VertexInput => "vertex input",
            RhiPipelineStage::InputAssembly => "input assembly",
            RhiPipelineStage::Rasterization => "rasterization",
            RhiPipelineStage::Multisample => "multisample",
            RhiPipelineStage::DepthStencil => "depth/stencil",
            RhiPipelineStage::ColorBlend => "color blend",
            RhiPipelineStage::Layout => "pipeline layout",
        }
    }
}

/// Kind of object whose creation failed, carried by `RhiError::ResourceCreation`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiResourceKind {
    Buffer,
    Texture,
    Sampler,
    Shader,
    RenderPass,
    Framebuffer,
    Pipeline,
    CommandBuffer,
}

/// The view tables a descriptor slot can be allocated from
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiDescriptorHeapType {
    /// Constant buffer, shader resource and unordered access views
    CbvSrvUav,
    Sampler,
    /// Render target views
    Rtv,
    /// Depth stencil views
    Dsv,
}
