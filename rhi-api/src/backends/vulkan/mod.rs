//! Vulkan backend built on `ash`, with memory from `gpu-allocator`. Views are native image views,
//! so this backend takes no slots from the descriptor heaps.

mod internal;

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
