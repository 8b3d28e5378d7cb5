//! Direct3D 12 backend built on the `windows` crate, with memory from `gpu-allocator`. Views are
//! written into CPU descriptor heaps at slots taken from the device's descriptor heaps.

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
