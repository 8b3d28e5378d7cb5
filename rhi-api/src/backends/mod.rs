pub mod null;

#[cfg(feature = "rhi-vulkan")]
pub mod vulkan;

#[cfg(all(windows, feature = "rhi-dx12"))]
pub mod dx12;
