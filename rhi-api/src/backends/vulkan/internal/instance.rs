use super::debug_reporter::VkDebugReporter;
use crate::{RhiError, RhiResult, RhiValidationMode};
use ash::extensions::ext::DebugUtils;
use ash::vk;
use std::ffi::{CStr, CString};

const KHRONOS_VALIDATION_LAYER_NAME: &[u8] = b"VK_LAYER_KHRONOS_validation\0";
const LUNARG_VALIDATION_LAYER_NAME: &[u8] = b"VK_LAYER_LUNARG_standard_validation\0";

/// Owns the loader, the instance and, when validation is on, the debug messenger
pub(crate) struct VkInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_reporter: Option<VkDebugReporter>,
}

impl VkInstance {
    pub(crate) fn new(
        entry: ash::Entry,
        app_name: &CString,
        api_version: u32,
        validation_mode: RhiValidationMode,
    ) -> RhiResult<VkInstance> {
        // Determine the supported version of vulkan that's available
        let vulkan_version = match entry.try_enumerate_instance_version()? {
            // Vulkan 1.1+
            Some(version) => version,
            // Vulkan 1.0
            None => vk::make_api_version(0, 1, 0, 0),
        };

        let vulkan_version_tuple = (
            vk::api_version_major(vulkan_version),
            vk::api_version_minor(vulkan_version),
            vk::api_version_patch(vulkan_version),
        );

        log::info!("Found Vulkan version: {:?}", vulkan_version_tuple);

        // 1.1 is needed for negative viewport heights
        let minimum_version = vk::make_api_version(0, 1, 1, 0);
        let api_version = api_version.max(minimum_version);
        if vulkan_version < api_version {
            log::error!(
                "Vulkan {}.{} was requested but the loader only supports {:?}",
                vk::api_version_major(api_version),
                vk::api_version_minor(api_version),
                vulkan_version_tuple
            );
            return Err(vk::Result::ERROR_INCOMPATIBLE_DRIVER.into());
        }

        let layers = entry.enumerate_instance_layer_properties()?;
        log::debug!("Available Layers: {:#?}", layers);
        let extensions = entry.enumerate_instance_extension_properties(None)?;
        log::debug!("Available Extensions: {:#?}", extensions);

        let has_extension = |name: &CStr| {
            extensions.iter().any(|extension| unsafe {
                name == CStr::from_ptr(extension.extension_name.as_ptr())
            })
        };

        let appinfo = vk::ApplicationInfo::builder()
            .application_name(app_name)
            .application_version(0)
            .engine_name(app_name)
            .engine_version(0)
            .api_version(api_version);

        let mut layer_names = vec![];
        let mut extension_names = vec![];
        let mut create_flags = vk::InstanceCreateFlags::empty();

        let portability_enumeration = vk::KhrPortabilityEnumerationFn::name();
        if has_extension(portability_enumeration) {
            extension_names.push(portability_enumeration);
            create_flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        let mut use_debug_utils = false;
        if validation_mode != RhiValidationMode::Disabled {
            let require_validation = validation_mode == RhiValidationMode::Enabled;
            let best_validation_layer = find_best_validation_layer(&layers);
            if best_validation_layer.is_none() {
                if require_validation {
                    log::error!("Could not find an appropriate validation layer. Check that the vulkan SDK has been installed or disable validation.");
                    return Err(RhiError::ValidationRequiredButUnavailable);
                } else {
                    log::warn!("Could not find an appropriate validation layer. Check that the vulkan SDK has been installed or disable validation.");
                }
            }

            let has_debug_extension = has_extension(DebugUtils::name());
            if !has_debug_extension {
                if require_validation {
                    log::error!("Could not find the debug extension. Check that the vulkan SDK has been installed or disable validation.");
                    return Err(RhiError::ValidationRequiredButUnavailable);
                } else {
                    log::warn!("Could not find the debug extension. Check that the vulkan SDK has been installed or disable validation.");
                }
            }

            if let Some(best_validation_layer) = best_validation_layer {
                if has_debug_extension {
                    layer_names.push(best_validation_layer);
                    extension_names.push(DebugUtils::name());
                    use_debug_utils = true;
                }
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Using layers: {:?}", layer_names);
            log::debug!("Using extensions: {:?}", extension_names);
        }

        let layer_names: Vec<_> = layer_names.iter().map(|x| x.as_ptr()).collect();
        let extension_names: Vec<_> = extension_names.iter().map(|x| x.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .flags(create_flags)
            .application_info(&appinfo)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        log::info!("Creating vulkan instance");
        let instance: ash::Instance = unsafe { entry.create_instance(&create_info, None)? };

        let debug_reporter = if use_debug_utils {
            match VkDebugReporter::new(&entry, &instance) {
                Ok(debug_reporter) => Some(debug_reporter),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        Ok(VkInstance {
            entry,
            instance,
            debug_reporter,
        })
    }

    pub(crate) fn validation_enabled(&self) -> bool {
        self.debug_reporter.is_some()
    }
}

fn find_best_validation_layer(layers: &[vk::LayerProperties]) -> Option<&'static CStr> {
    let khronos_validation_layer_name =
        CStr::from_bytes_with_nul(KHRONOS_VALIDATION_LAYER_NAME).ok()?;
    let lunarg_validation_layer_name =
        CStr::from_bytes_with_nul(LUNARG_VALIDATION_LAYER_NAME).ok()?;

    let mut best_available_layer = None;
    for layer in layers {
        let layer_name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };

        if layer_name == khronos_validation_layer_name {
            best_available_layer = Some(khronos_validation_layer_name);
            break;
        }

        if layer_name == lunarg_validation_layer_name {
            best_available_layer = Some(lunarg_validation_layer_name);
        }
    }

    best_available_layer
}

impl Drop for VkInstance {
    fn drop(&mut self) {
        log::trace!("destroying VkInstance");
        std::mem::drop(self.debug_reporter.take());

        unsafe {
            self.instance.destroy_instance(None);
        }

        log::trace!("destroyed VkInstance");
    }
}
