use super::RhiDeviceContextDx12;
use crate::{RhiApiDef, RhiResult};
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Dx12-specific configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RhiApiDefDx12 {
    /// Also enables GPU-based validation when the debug layer is on. Very slow.
    pub enable_gpu_based_validation: bool,

    /// Create the device on the WARP software rasterizer instead of a hardware adapter
    pub use_warp_device: bool,
}

impl Default for RhiApiDefDx12 {
    fn default() -> Self {
        RhiApiDefDx12 {
            enable_gpu_based_validation: false,
            use_warp_device: false,
        }
    }
}

pub struct RhiApiDx12 {
    device_context: Option<RhiDeviceContextDx12>,
}

impl Drop for RhiApiDx12 {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Failed to destroy dx12 device: {}", e);
        }
    }
}

impl RhiApiDx12 {
    pub fn device_context(&self) -> &RhiDeviceContextDx12 {
        // Only None after destroy(), which requires &mut self
        self.device_context.as_ref().unwrap()
    }

    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe, so all APIs that interact with the GPU should be
    /// considered unsafe. However, APIs are only gated by unsafe if they can cause undefined
    /// behavior on the CPU for reasons other than interacting with the GPU.
    pub unsafe fn new(
        api_def: &RhiApiDef,
        dx12_api_def: &RhiApiDefDx12,
    ) -> RhiResult<Self> {
        log::info!("Validation mode: {:?}", api_def.validation_mode);
        let device_context = RhiDeviceContextDx12::new(api_def, dx12_api_def)?;

        Ok(RhiApiDx12 {
            device_context: Some(device_context),
        })
    }

    pub fn destroy(&mut self) -> RhiResult<()> {
        if let Some(device_context) = self.device_context.take() {
            // Child objects keep the device alive until they are dropped
            let outstanding = device_context.reference_count() - 1;
            if outstanding > 0 {
                log::warn!(
                    "Dx12 device released by the api, {} objects still reference it",
                    outstanding
                );
            } else {
                device_context.wait_for_device_idle()?;
            }
        }

        Ok(())
    }
}
