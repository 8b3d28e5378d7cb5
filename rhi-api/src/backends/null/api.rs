use super::RhiDeviceContextNull;
use crate::{RhiApiDef, RhiResult};

pub struct RhiApiNull {
    device_context: Option<RhiDeviceContextNull>,
}

impl Drop for RhiApiNull {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Failed to destroy null device: {}", e);
        }
    }
}

impl RhiApiNull {
    pub fn device_context(&self) -> &RhiDeviceContextNull {
        // Only None after destroy(), which requires &mut self
        self.device_context.as_ref().unwrap()
    }

    pub fn new(api_def: &RhiApiDef) -> RhiResult<Self> {
        log::info!("Creating null device");
        let device_context = RhiDeviceContextNull::new(api_def)?;

        Ok(RhiApiNull {
            device_context: Some(device_context),
        })
    }

    pub fn destroy(&mut self) -> RhiResult<()> {
        if let Some(device_context) = self.device_context.take() {
            // Child objects keep the device alive until they are dropped
            let outstanding = device_context.reference_count() - 1;
            if outstanding > 0 {
                log::debug!(
                    "Null device released by the api, {} objects still reference it",
                    outstanding
                );
            }
        }

        Ok(())
    }
}
