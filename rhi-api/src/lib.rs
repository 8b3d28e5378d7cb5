//! Render hardware interface. A thin, strongly-typed layer over Vulkan and Direct3D 12 with a
//! headless null backend that runs anywhere.
//!
//! # Backends
//!
//! * `rhi-vulkan`: Vulkan through `ash`, memory through `gpu-allocator`
//! * `rhi-dx12`: Direct3D 12 through `windows` (windows targets only)
//! * The null backend is always compiled. It performs the same validation, descriptor slot
//!   accounting and resource state tracking as the GPU backends, and records commands into a list
//!   that can be inspected. It is what the tests in this crate run against.
//!
//! # Overview
//!
//! Create an `RhiApi` with one of the `new_*` functions and obtain an `RhiDeviceContext` from it.
//! The device context creates every other object:
//!
//! * `RhiBuffer`, `RhiTexture`, `RhiSampler` and `RhiShader` are the basic resources
//! * `RhiRenderPass` describes attachment formats and load/store behavior
//! * `RhiFramebuffer` binds concrete textures to a render pass
//! * `RhiPipeline` is a graphics pipeline that can be rebuilt in place
//! * `RhiCommandBuffer` records work for submission
//!
//! Every buffer and texture carries a tracked resource state. The only way to change it is to
//! record a barrier (directly, or implicitly when a render pass begins or ends) on a command
//! buffer.
//!
//! Errors are returned as `RhiError`. Creation failures are additionally reported once through the
//! `RhiLogSink` given in `RhiApiDef`, which by default forwards to the `log` crate.

#[cfg(feature = "rhi-vulkan")]
pub use ash;
#[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
pub use gpu_allocator;
#[cfg(all(windows, feature = "rhi-dx12"))]
pub use windows;

pub use api::*;
pub use buffer::*;
pub use command_buffer::*;
pub use descriptor_allocator::*;
pub use device_context::*;
pub use error::*;
pub use framebuffer::*;
pub use log_sink::*;
pub use pipeline::*;
pub use render_pass::*;
pub use resource_state::*;
pub use sampler::*;
pub use shader::*;
pub use texture::*;
pub use types::*;

pub use backends::*;

mod backends;
mod types;

mod api;
mod buffer;
mod command_buffer;
mod descriptor_allocator;
mod device_context;
mod error;
mod framebuffer;
mod log_sink;
mod pipeline;
mod render_pass;
mod resource_state;
mod sampler;
mod shader;
mod texture;
