#[cfg(all(windows, feature = "rhi-dx12"))]
use crate::dx12::{RhiApiDefDx12, RhiApiDx12};
use crate::null::RhiApiNull;
#[cfg(feature = "rhi-vulkan")]
use crate::vulkan::{RhiApiDefVulkan, RhiApiVulkan};
use crate::*;

/// Primary entry point to using the API. Use the `new_*` functions to initialize the desired
/// backend.
///
/// Once the API object is created, use `device_context()` to obtain a cloneable handle to the
/// device. Objects created through the device context keep the device alive, so the native device
/// is released when both the `RhiApi` has been destroyed and the last such object is dropped.
pub enum RhiApi {
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiApiVulkan),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    Dx12(RhiApiDx12),
    Null(RhiApiNull),
}

impl RhiApi {
    /// Initialize the headless backend. Always available.
    pub fn new_null(api_def: &RhiApiDef) -> RhiResult<Self> {
        Ok(RhiApi::Null(RhiApiNull::new(api_def)?))
    }

    /// Initialize a device using vulkan
    ///
    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe, so all APIs that interact with the GPU should be
    /// considered unsafe. However, APIs are only gated by unsafe if they can cause undefined
    /// behavior on the CPU for reasons other than interacting with the GPU.
    #[cfg(feature = "rhi-vulkan")]
    pub unsafe fn new_vulkan(
        api_def: &RhiApiDef,
        vk_api_def: &RhiApiDefVulkan,
    ) -> RhiResult<Self> {
        Ok(RhiApi::Vk(RhiApiVulkan::new(api_def, vk_api_def)?))
    }

    /// Initialize a device using Direct3D 12
    ///
    /// # Safety
    ///
    /// See `new_vulkan`.
    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub unsafe fn new_dx12(
        api_def: &RhiApiDef,
        dx12_api_def: &RhiApiDefDx12,
    ) -> RhiResult<Self> {
        Ok(RhiApi::Dx12(RhiApiDx12::new(api_def, dx12_api_def)?))
    }

    /// Create a cloneable handle to the device. Most of the interaction with the graphics backend
    /// is done through this handle.
    ///
    /// This context is intended to be safely shared across threads. This function is thread-safe,
    /// and generally all APIs on the device context itself are thread-safe.
    pub fn device_context(&self) -> RhiDeviceContext {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(inner) => RhiDeviceContext::Vk(inner.device_context().clone()),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiApi::Dx12(inner) => RhiDeviceContext::Dx12(inner.device_context().clone()),
            RhiApi::Null(inner) => RhiDeviceContext::Null(inner.device_context().clone()),
        }
    }

    /// Releases the API's reference to the device. Objects still alive keep the device until they
    /// are dropped.
    ///
    /// `destroy()` is automatically called if RhiApi is dropped and it has not yet been called, so
    /// it is not necessary to call this function explicitly.
    pub fn destroy(&mut self) -> RhiResult<()> {
        match self {
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(inner) => inner.destroy(),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiApi::Dx12(inner) => inner.destroy(),
            RhiApi::Null(inner) => inner.destroy(),
        }
    }

    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_api(&self) -> Option<&RhiApiVulkan> {
        match self {
            RhiApi::Vk(inner) => Some(inner),
            _ => None,
        }
    }

    #[cfg(all(windows, feature = "rhi-dx12"))]
    pub fn dx12_api(&self) -> Option<&RhiApiDx12> {
        match self {
            RhiApi::Dx12(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn null_api(&self) -> Option<&RhiApiNull> {
        match self {
            RhiApi::Null(inner) => Some(inner),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
