//! Headless backend. Owns no GPU objects but enforces the same slot accounting, validation and
//! state tracking as the GPU backends, and records commands into an inspectable list.

mod api;
pub use api::*;

mod device_context;
pub use device_context::*;

mod buffer;
pub use buffer::*;

mod texture;
pub use texture::*;

mod sampler;
pub use sampler::*;

mod shader;
pub use shader::*;

mod render_pass;
pub use render_pass::*;

mod framebuffer;
pub use framebuffer::*;

mod pipeline;
pub use pipeline::*;

mod command_buffer;
pub use command_buffer::*;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NULL_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

// Stands in for a native handle so objects can be told apart in recorded commands
pub(crate) fn next_null_object_id() -> u64 {
    NEXT_NULL_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// First word of every SPIR-V module
pub const SPIRV_MAGIC_NUMBER: u32 = 0x0723_0203;
