mod format;
pub use format::*;

mod definitions;
pub use definitions::*;

mod misc;
pub use misc::*;

/// Upper bound on color attachments in a render pass (matches D3D12's simultaneous RTV count)
pub const MAX_RENDER_TARGET_ATTACHMENTS: usize = 8;

pub const MAX_VERTEX_INPUT_BINDINGS: usize = 16;

/// Number of descriptor sets (or root tables) a pipeline layout may span
pub const MAX_DESCRIPTOR_SETS: usize = 4;

/// Vulkan guarantees at least 128 bytes of push constants, dx12 root constants fit the same
pub const MAX_PUSH_CONSTANT_SIZE: u32 = 128;
