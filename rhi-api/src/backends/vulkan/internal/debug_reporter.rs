use ash::extensions::ext::DebugUtils;
use ash::vk;
use std::ffi::CStr;
use std::os::raw::c_void;

/// Callback for vulkan validation layer logging
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let msg = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();
    if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!(target: "rhi::vulkan", "{}", msg);
    } else if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!(target: "rhi::vulkan", "{}", msg);
    } else if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::info!(target: "rhi::vulkan", "{}", msg);
    } else {
        log::debug!(target: "rhi::vulkan", "{}", msg);
    }

    vk::FALSE
}

/// Handles dropping vulkan debug reporting
pub(crate) struct VkDebugReporter {
    pub debug_utils_loader: DebugUtils,
    pub debug_messenger: vk::DebugUtilsMessengerEXT,
}

impl VkDebugReporter {
    pub(crate) fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> ash::prelude::VkResult<Self> {
        log::info!("Setting up vulkan debug callback");
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let debug_utils_loader = DebugUtils::new(entry, instance);
        let debug_messenger =
            unsafe { debug_utils_loader.create_debug_utils_messenger(&debug_info, None)? };

        Ok(VkDebugReporter {
            debug_utils_loader,
            debug_messenger,
        })
    }
}

impl Drop for VkDebugReporter {
    fn drop(&mut self) {
        unsafe {
            log::trace!("destroying VkDebugReporter");
            self.debug_utils_loader
                .destroy_debug_utils_messenger(self.debug_messenger, None);
            log::trace!("destroyed VkDebugReporter");
        }
    }
}
