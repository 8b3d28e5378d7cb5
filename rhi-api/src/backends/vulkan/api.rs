use super::internal::VkInstance;
use super::RhiDeviceContextVulkan;
use crate::{RhiApiDef, RhiResult};
use ash::vk;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::sync::Arc;

/// Vulkan-specific configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiApiDefVulkan {
    /// Used as a hint for drivers for what is being run. There are no special requirements for
    /// this. It is not visible to end-users.
    pub app_name: String,

    /// Requested instance version, as built by `vk::make_api_version`. Raised to 1.1 if lower.
    pub api_version: u32,
}

impl Default for RhiApiDefVulkan {
    fn default() -> Self {
        RhiApiDefVulkan {
            app_name: "rhi".to_string(),
            api_version: vk::make_api_version(0, 1, 1, 0),
        }
    }
}

pub struct RhiApiVulkan {
    device_context: Option<RhiDeviceContextVulkan>,
}

impl Drop for RhiApiVulkan {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Failed to destroy vulkan device: {}", e);
        }
    }
}

impl RhiApiVulkan {
    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        // Only None after destroy(), which requires &mut self
        self.device_context.as_ref().unwrap()
    }

    pub fn vk_instance(&self) -> &ash::Instance {
        self.device_context().instance()
    }

    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe, so all APIs that interact with the GPU should be
    /// considered unsafe. However, APIs are only gated by unsafe if they can cause undefined
    /// behavior on the CPU for reasons other than interacting with the GPU.
    pub unsafe fn new(
        api_def: &RhiApiDef,
        vk_api_def: &RhiApiDefVulkan,
    ) -> RhiResult<Self> {
        let app_name = CString::new(vk_api_def.app_name.clone())
            .map_err(|_| "app_name must not contain nul bytes")?;

        log::info!("Validation mode: {:?}", api_def.validation_mode);
        let entry = ash::Entry::load()?;

        let instance = VkInstance::new(
            entry,
            &app_name,
            vk_api_def.api_version,
            api_def.validation_mode,
        )?;

        let device_context =
            RhiDeviceContextVulkan::new(Arc::new(instance), api_def.log_sink.clone())?;

        Ok(RhiApiVulkan {
            device_context: Some(device_context),
        })
    }

    pub fn destroy(&mut self) -> RhiResult<()> {
        if let Some(device_context) = self.device_context.take() {
            // Child objects keep the device alive until they are dropped
            let outstanding = device_context.reference_count() - 1;
            if outstanding > 0 {
                log::warn!(
                    "Vulkan device released by the api, {} objects still reference it",
                    outstanding
                );
            } else {
                device_context.wait_for_device_idle()?;
            }
        }

        Ok(())
    }
}
