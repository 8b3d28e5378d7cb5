use super::internal::VkInstance;
use super::*;
use crate::{
    RhiBackendType, RhiBufferDef, RhiDeviceInfo, RhiError, RhiFramebufferDef,
    RhiGraphicsPipelineDef, RhiLogSink, RhiRenderPassDef, RhiResult, RhiSamplerDef, RhiShaderDef,
    RhiTextureDef,
};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use parking_lot::Mutex;
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Used to specify which type of physical device is preferred. Values match
/// VkPhysicalDeviceType.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RhiPhysicalDeviceType {
    Other = 0,
    IntegratedGpu = 1,
    DiscreteGpu = 2,
    VirtualGpu = 3,
    Cpu = 4,
}

impl RhiPhysicalDeviceType {
    pub fn to_vk(self) -> vk::PhysicalDeviceType {
        match self {
            RhiPhysicalDeviceType::Other => vk::PhysicalDeviceType::OTHER,
            RhiPhysicalDeviceType::IntegratedGpu => vk::PhysicalDeviceType::INTEGRATED_GPU,
            RhiPhysicalDeviceType::DiscreteGpu => vk::PhysicalDeviceType::DISCRETE_GPU,
            RhiPhysicalDeviceType::VirtualGpu => vk::PhysicalDeviceType::VIRTUAL_GPU,
            RhiPhysicalDeviceType::Cpu => vk::PhysicalDeviceType::CPU,
        }
    }
}

const PHYSICAL_DEVICE_TYPE_PRIORITY: [RhiPhysicalDeviceType; 4] = [
    RhiPhysicalDeviceType::DiscreteGpu,
    RhiPhysicalDeviceType::IntegratedGpu,
    RhiPhysicalDeviceType::VirtualGpu,
    RhiPhysicalDeviceType::Cpu,
];

#[derive(Clone)]
struct PhysicalDeviceInfo {
    score: i32,
    device_name: String,
    graphics_queue_family_index: u32,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    extension_properties: Vec<vk::ExtensionProperties>,
}

struct RhiDeviceContextVulkanInner {
    device_info: RhiDeviceInfo,
    log_sink: Arc<dyn RhiLogSink>,
    limits: vk::PhysicalDeviceLimits,
    enabled_features: vk::PhysicalDeviceFeatures,
    graphics_queue_family_index: u32,
    // vkQueueSubmit requires external synchronization
    graphics_queue: Mutex<vk::Queue>,

    allocator: ManuallyDrop<Mutex<Allocator>>,
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    destroyed: AtomicBool,

    // Dropped after the device
    instance: Arc<VkInstance>,
}

impl Drop for RhiDeviceContextVulkanInner {
    fn drop(&mut self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            unsafe {
                log::trace!("destroying device");
                if let Err(e) = self.device.device_wait_idle() {
                    log::error!("Error waiting for device idle before destroy: {:?}", e);
                }

                // The allocator frees its memory blocks through the device
                ManuallyDrop::drop(&mut self.allocator);
                self.device.destroy_device(None);
                log::trace!("destroyed device");
            }
        }
    }
}

#[derive(Clone)]
pub struct RhiDeviceContextVulkan {
    inner: Arc<RhiDeviceContextVulkanInner>,
}

impl std::fmt::Debug for RhiDeviceContextVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContextVulkan")
            .field("device_name", &self.inner.device_info.device_name)
            .field("handle", &self.device().handle())
            .finish()
    }
}

impl RhiDeviceContextVulkan {
    pub(crate) fn new(
        instance: Arc<VkInstance>,
        log_sink: Arc<dyn RhiLogSink>,
    ) -> RhiResult<Self> {
        let (physical_device, physical_device_info) =
            choose_physical_device(&instance.instance, &PHYSICAL_DEVICE_TYPE_PRIORITY)?;

        let (device, enabled_features) =
            create_logical_device(&instance.instance, physical_device, &physical_device_info)?;

        let graphics_queue = unsafe {
            device.get_device_queue(physical_device_info.graphics_queue_family_index, 0)
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
        });

        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                return Err(e.into());
            }
        };

        let limits = physical_device_info.properties.limits;
        let device_info = RhiDeviceInfo {
            backend_type: RhiBackendType::Vulkan,
            device_name: physical_device_info.device_name.clone(),
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment as u32,
            min_storage_buffer_offset_alignment: limits.min_storage_buffer_offset_alignment as u32,
            upload_buffer_texture_alignment: limits.optimal_buffer_copy_offset_alignment as u32,
            upload_buffer_texture_row_alignment: limits.optimal_buffer_copy_row_pitch_alignment
                as u32,
            max_vertex_attribute_count: limits.max_vertex_input_attributes,
            max_color_attachments: limits
                .max_color_attachments
                .min(crate::MAX_RENDER_TARGET_ATTACHMENTS as u32),
            max_texture_dimension_2d: limits.max_image_dimension2_d,
        };

        log::info!("Created vulkan device '{}'", device_info.device_name);

        let inner = RhiDeviceContextVulkanInner {
            device_info,
            log_sink,
            limits,
            enabled_features,
            graphics_queue_family_index: physical_device_info.graphics_queue_family_index,
            graphics_queue: Mutex::new(graphics_queue),
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            device,
            physical_device,
            destroyed: AtomicBool::new(false),
            instance,
        };

        Ok(RhiDeviceContextVulkan {
            inner: Arc::new(inner),
        })
    }

    pub fn device_info(&self) -> &RhiDeviceInfo {
        &self.inner.device_info
    }

    pub fn log_sink(&self) -> &Arc<dyn RhiLogSink> {
        &self.inner.log_sink
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.inner.instance.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.inner.instance.instance
    }

    pub fn device(&self) -> &ash::Device {
        &self.inner.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.inner.physical_device
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.inner.limits
    }

    pub fn enabled_features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.inner.enabled_features
    }

    pub fn graphics_queue_family_index(&self) -> u32 {
        self.inner.graphics_queue_family_index
    }

    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.inner.allocator
    }

    pub fn validation_enabled(&self) -> bool {
        self.inner.instance.validation_enabled()
    }

    pub(crate) fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBufferVulkan> {
        RhiBufferVulkan::new(self, buffer_def)
    }

    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureVulkan> {
        RhiTextureVulkan::new(self, texture_def)
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerVulkan> {
        RhiSamplerVulkan::new(self, sampler_def)
    }

    pub fn create_shader(
        &self,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<RhiShaderVulkan> {
        RhiShaderVulkan::new(self, shader_def)
    }

    pub fn create_render_pass(
        &self,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<RhiRenderPassVulkan> {
        RhiRenderPassVulkan::new(self, render_pass_def)
    }

    pub fn create_framebuffer(
        &self,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<RhiFramebufferVulkan> {
        RhiFramebufferVulkan::new(self, framebuffer_def)
    }

    pub fn create_graphics_pipeline(
        &self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipelineVulkan> {
        RhiPipelineVulkan::new(self, pipeline_def)
    }

    pub fn create_command_buffer(&self) -> RhiResult<RhiCommandBufferVulkan> {
        RhiCommandBufferVulkan::new(self)
    }

    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBufferVulkan],
    ) -> RhiResult<()> {
        let vk_command_buffers: Vec<_> = command_buffers
            .iter()
            .map(|x| x.vk_command_buffer())
            .collect();

        let submit_info = vk::SubmitInfo::builder().command_buffers(&vk_command_buffers);

        let queue = self.inner.graphics_queue.lock();
        unsafe {
            self.device()
                .queue_submit(*queue, &[*submit_info], vk::Fence::null())?;
        }

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        // Holding the queue lock keeps other threads from submitting while we wait
        let _queue = self.inner.graphics_queue.lock();
        unsafe {
            self.device().device_wait_idle()?;
        }

        Ok(())
    }
}

fn vk_version_to_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    )
}

fn choose_physical_device(
    instance: &ash::Instance,
    physical_device_type_priority: &[RhiPhysicalDeviceType],
) -> RhiResult<(vk::PhysicalDevice, PhysicalDeviceInfo)> {
    let physical_devices = unsafe { instance.enumerate_physical_devices()? };

    if physical_devices.is_empty() {
        return Err("Could not find a physical device".into());
    }

    log::info!(
        "Preferred device types: {:?}",
        physical_device_type_priority
    );

    let mut best_physical_device: Option<(vk::PhysicalDevice, PhysicalDeviceInfo)> = None;
    for physical_device in physical_devices {
        let result =
            query_physical_device_info(instance, physical_device, physical_device_type_priority)?;

        if let Some(physical_device_info) = result {
            let is_better = best_physical_device
                .as_ref()
                .map(|(_, best)| physical_device_info.score > best.score)
                .unwrap_or(true);

            if is_better {
                best_physical_device = Some((physical_device, physical_device_info));
            }
        }
    }

    best_physical_device.ok_or_else(|| {
        RhiError::StringError("Could not find a physical device with a graphics queue".to_string())
    })
}

fn query_physical_device_info(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    physical_device_type_priority: &[RhiPhysicalDeviceType],
) -> RhiResult<Option<PhysicalDeviceInfo>> {
    let properties: vk::PhysicalDeviceProperties =
        unsafe { instance.get_physical_device_properties(device) };
    let device_name = unsafe {
        CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned()
    };

    let extension_properties: Vec<vk::ExtensionProperties> =
        unsafe { instance.enumerate_device_extension_properties(device)? };
    let features: vk::PhysicalDeviceFeatures =
        unsafe { instance.get_physical_device_features(device) };
    let all_queue_families: Vec<vk::QueueFamilyProperties> =
        unsafe { instance.get_physical_device_queue_family_properties(device) };

    let graphics_queue_family_index = all_queue_families
        .iter()
        .position(|x| x.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|x| x as u32);

    let graphics_queue_family_index = match graphics_queue_family_index {
        Some(index) => index,
        None => {
            log::info!(
                "Found unsuitable device '{}' API: {} DriverVersion: {} could not find a graphics queue family",
                device_name,
                vk_version_to_string(properties.api_version),
                vk_version_to_string(properties.driver_version)
            );
            return Ok(None);
        }
    };

    if properties.api_version < vk::make_api_version(0, 1, 1, 0) {
        log::info!(
            "Found unsuitable device '{}' API: {} is below 1.1",
            device_name,
            vk_version_to_string(properties.api_version)
        );
        return Ok(None);
    }

    // Position in the priority list, earlier is better. Types not in the list score zero.
    let rank = physical_device_type_priority
        .iter()
        .map(|x| x.to_vk())
        .position(|x| x == properties.device_type)
        .map(|index| physical_device_type_priority.len() - index)
        .unwrap_or(0) as i32;

    let score = rank * 100;

    log::info!(
        "Found suitable device '{}' API: {} DriverVersion: {} Score = {}",
        device_name,
        vk_version_to_string(properties.api_version),
        vk_version_to_string(properties.driver_version),
        score
    );

    log::trace!("{:#?}", properties);

    Ok(Some(PhysicalDeviceInfo {
        score,
        device_name,
        graphics_queue_family_index,
        properties,
        features,
        extension_properties,
    }))
}

fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    physical_device_info: &PhysicalDeviceInfo,
) -> RhiResult<(ash::Device, vk::PhysicalDeviceFeatures)> {
    let mut device_extension_names = vec![];

    // VK_KHR_portability_subset must be enabled wherever the device exposes it
    let portability_subset_extension_name = vk::KhrPortabilitySubsetFn::name();
    let has_portability_subset = physical_device_info
        .extension_properties
        .iter()
        .any(|extension| unsafe {
            CStr::from_ptr(extension.extension_name.as_ptr()) == portability_subset_extension_name
        });
    if has_portability_subset {
        device_extension_names.push(portability_subset_extension_name.as_ptr());
    }

    // Only request what the device has, wireframe and anisotropy degrade gracefully
    let supported = &physical_device_info.features;
    let features = vk::PhysicalDeviceFeatures::builder()
        .sampler_anisotropy(supported.sampler_anisotropy == vk::TRUE)
        .sample_rate_shading(supported.sample_rate_shading == vk::TRUE)
        .fill_mode_non_solid(supported.fill_mode_non_solid == vk::TRUE)
        .depth_clamp(supported.depth_clamp == vk::TRUE)
        .build();

    let queue_priorities = [1.0];
    let queue_infos = [vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(physical_device_info.graphics_queue_family_index)
        .queue_priorities(&queue_priorities)
        .build()];

    let device_create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&device_extension_names)
        .enabled_features(&features);

    let device: ash::Device =
        unsafe { instance.create_device(physical_device, &device_create_info, None)? };

    Ok((device, features))
}
