use super::internal::descriptor_heap::CpuDescriptorHeapSet;
use super::internal::{d3d, d3d12, dxgi};
use super::*;
use crate::{
    RhiApiDef, RhiBackendType, RhiBufferDef, RhiDescriptorAllocator, RhiDescriptorHeapType,
    RhiDescriptorHeaps, RhiDescriptorIndex, RhiDeviceInfo, RhiError, RhiFramebufferDef,
    RhiGraphicsPipelineDef, RhiLogSink, RhiRenderPassDef, RhiResult, RhiSamplerDef, RhiShaderDef,
    RhiTextureDef, RhiValidationMode,
};
use gpu_allocator::d3d12::{Allocator, AllocatorCreateDesc};
use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{CreateEventW, WaitForSingleObject};
use windows::Win32::System::WindowsProgramming::INFINITE;

fn wchar_to_string(s: &[u16]) -> String {
    let len = s.iter().position(|&c| c == 0).unwrap_or(s.len());
    String::from_utf16_lossy(&s[..len])
}

fn get_hardware_adapter(factory: &dxgi::IDXGIFactory4) -> RhiResult<dxgi::IDXGIAdapter1> {
    for i in 0.. {
        // Fails with DXGI_ERROR_NOT_FOUND once we run out of adapters
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(adapter) => adapter,
            Err(_) => break,
        };

        let mut desc = Default::default();
        unsafe { adapter.GetDesc1(&mut desc)? };

        log::info!("Found device {:?}", wchar_to_string(&desc.Description));
        log::info!(
            "  Vendor Id:{} Device Id: {} Dedicated VMem: {}",
            desc.VendorId,
            desc.DeviceId,
            desc.DedicatedVideoMemory
        );

        if (dxgi::DXGI_ADAPTER_FLAG(desc.Flags) & dxgi::DXGI_ADAPTER_FLAG_SOFTWARE)
            != dxgi::DXGI_ADAPTER_FLAG_NONE
        {
            // The Basic Render Driver is only used when asked for with use_warp_device
            continue;
        }

        // Check the adapter supports Direct3D 12 without creating the device yet
        let supported = unsafe {
            d3d12::D3D12CreateDevice(
                &adapter,
                d3d::D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<d3d12::ID3D12Device>>(),
            )
        }
        .is_ok();

        if supported {
            return Ok(adapter);
        }
    }

    Err("Could not find a hardware adapter that supports Direct3D 12".into())
}

fn enable_debug_layer(
    validation_mode: RhiValidationMode,
    enable_gpu_based_validation: bool,
) -> RhiResult<bool> {
    if validation_mode == RhiValidationMode::Disabled {
        return Ok(false);
    }

    unsafe {
        let mut debug: Option<d3d12::ID3D12Debug> = None;
        if let Some(debug) = d3d12::D3D12GetDebugInterface(&mut debug).ok().and(debug) {
            debug.EnableDebugLayer();
            match debug.cast::<d3d12::ID3D12Debug1>() {
                Ok(debug1) => debug1.SetEnableGPUBasedValidation(enable_gpu_based_validation),
                Err(e) if enable_gpu_based_validation => {
                    log::warn!("GPU-based validation is unavailable: {}", e);
                }
                Err(_) => {}
            }

            Ok(true)
        } else if validation_mode == RhiValidationMode::EnabledIfAvailable {
            log::warn!("Could not acquire D3D12GetDebugInterface, validation is disabled");
            Ok(false)
        } else {
            log::error!("Could not acquire D3D12GetDebugInterface");
            Err(RhiError::ValidationRequiredButUnavailable)
        }
    }
}

fn create_device(
    api_def: &RhiApiDef,
    dx12_api_def: &RhiApiDefDx12,
) -> RhiResult<(dxgi::IDXGIFactory4, dxgi::IDXGIAdapter1, d3d12::ID3D12Device)> {
    let validation_enabled =
        enable_debug_layer(api_def.validation_mode, dx12_api_def.enable_gpu_based_validation)?;

    let dxgi_factory_flags = if validation_enabled {
        dxgi::DXGI_CREATE_FACTORY_DEBUG
    } else {
        0
    };

    let dxgi_factory: dxgi::IDXGIFactory4 =
        unsafe { dxgi::CreateDXGIFactory2(dxgi_factory_flags) }?;

    let dxgi_adapter = if dx12_api_def.use_warp_device {
        log::info!("Creating warp adapter");
        unsafe { dxgi_factory.EnumWarpAdapter() }?
    } else {
        get_hardware_adapter(&dxgi_factory)?
    };

    let mut device: Option<d3d12::ID3D12Device> = None;
    unsafe { d3d12::D3D12CreateDevice(&dxgi_adapter, d3d::D3D_FEATURE_LEVEL_11_0, &mut device) }?;

    let d3d12_device =
        device.ok_or_else(|| RhiError::StringError("Could not create D3D device".to_string()))?;

    if validation_enabled {
        if let Ok(info_queue) = d3d12_device.cast::<d3d12::ID3D12InfoQueue>() {
            unsafe {
                info_queue.SetBreakOnSeverity(d3d12::D3D12_MESSAGE_SEVERITY_ERROR, true)?;
                info_queue.SetBreakOnSeverity(d3d12::D3D12_MESSAGE_SEVERITY_CORRUPTION, true)?;
            }
        }
    }

    Ok((dxgi_factory, dxgi_adapter, d3d12_device))
}

// Graphics queue with a fence signalled after every submit, so the CPU can wait for idle
struct Dx12GraphicsQueue {
    queue: d3d12::ID3D12CommandQueue,
    fence: d3d12::ID3D12Fence,
    fence_event: HANDLE,
    last_signalled_value: u64,
}

impl Dx12GraphicsQueue {
    fn new(device: &d3d12::ID3D12Device) -> RhiResult<Self> {
        let queue_desc = d3d12::D3D12_COMMAND_QUEUE_DESC {
            Type: d3d12::D3D12_COMMAND_LIST_TYPE_DIRECT,
            ..Default::default()
        };

        unsafe {
            let queue: d3d12::ID3D12CommandQueue = device.CreateCommandQueue(&queue_desc)?;
            let fence: d3d12::ID3D12Fence =
                device.CreateFence(0, d3d12::D3D12_FENCE_FLAG_NONE)?;
            let fence_event = CreateEventW(None, false, false, None)?;

            Ok(Dx12GraphicsQueue {
                queue,
                fence,
                fence_event,
                last_signalled_value: 0,
            })
        }
    }

    fn signal(&mut self) -> RhiResult<u64> {
        self.last_signalled_value += 1;
        unsafe {
            self.queue.Signal(&self.fence, self.last_signalled_value)?;
        }

        Ok(self.last_signalled_value)
    }

    fn wait_for_value(
        &self,
        value: u64,
    ) -> RhiResult<()> {
        unsafe {
            if self.fence.GetCompletedValue() < value {
                self.fence.SetEventOnCompletion(value, self.fence_event)?;
                WaitForSingleObject(self.fence_event, INFINITE);
            }
        }

        Ok(())
    }
}

impl Drop for Dx12GraphicsQueue {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.fence_event);
        }
    }
}

struct RhiDeviceContextDx12Inner {
    device_info: RhiDeviceInfo,
    log_sink: Arc<dyn RhiLogSink>,
    descriptor_heaps: Arc<RhiDescriptorHeaps>,
    cpu_descriptor_heaps: CpuDescriptorHeapSet,

    // ExecuteCommandLists and the fence value must advance together
    graphics_queue: Mutex<Dx12GraphicsQueue>,

    allocator: ManuallyDrop<Mutex<Allocator>>,
    d3d12_device: d3d12::ID3D12Device,
    dxgi_adapter: dxgi::IDXGIAdapter1,
    dxgi_factory: dxgi::IDXGIFactory4,
    destroyed: AtomicBool,
}

// The COM objects here are free-threaded, the queue is behind a mutex
unsafe impl Send for RhiDeviceContextDx12Inner {}
unsafe impl Sync for RhiDeviceContextDx12Inner {}

impl Drop for RhiDeviceContextDx12Inner {
    fn drop(&mut self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            log::trace!("destroying device");
            {
                let mut graphics_queue = self.graphics_queue.lock();
                let idle = graphics_queue
                    .signal()
                    .and_then(|value| graphics_queue.wait_for_value(value));
                if let Err(e) = idle {
                    log::error!("Error waiting for device idle before destroy: {}", e);
                }
            }

            self.allocator.lock().report_memory_leaks(log::Level::Warn);
            unsafe {
                ManuallyDrop::drop(&mut self.allocator);
            }
            log::trace!("destroyed device");
        }
    }
}

#[derive(Clone)]
pub struct RhiDeviceContextDx12 {
    inner: Arc<RhiDeviceContextDx12Inner>,
}

impl std::fmt::Debug for RhiDeviceContextDx12 {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContextDx12")
            .field("device_name", &self.inner.device_info.device_name)
            .finish()
    }
}

impl RhiDeviceContextDx12 {
    pub(crate) fn new(
        api_def: &RhiApiDef,
        dx12_api_def: &RhiApiDefDx12,
    ) -> RhiResult<Self> {
        let (dxgi_factory, dxgi_adapter, d3d12_device) = create_device(api_def, dx12_api_def)?;

        let mut desc = Default::default();
        unsafe { dxgi_adapter.GetDesc1(&mut desc)? };

        let cpu_descriptor_heaps =
            CpuDescriptorHeapSet::new(&d3d12_device, &api_def.descriptor_heap_sizes)?;
        let graphics_queue = Dx12GraphicsQueue::new(&d3d12_device)?;

        let allocator = Allocator::new(&AllocatorCreateDesc {
            device: d3d12_device.clone(),
            debug_settings: Default::default(),
        })?;

        let device_info = RhiDeviceInfo {
            backend_type: RhiBackendType::Dx12,
            device_name: wchar_to_string(&desc.Description),
            min_uniform_buffer_offset_alignment:
                d3d12::D3D12_CONSTANT_BUFFER_DATA_PLACEMENT_ALIGNMENT,
            // No official value, matches one of the loosest vulkan limits
            min_storage_buffer_offset_alignment: 64,
            upload_buffer_texture_alignment: d3d12::D3D12_TEXTURE_DATA_PLACEMENT_ALIGNMENT,
            upload_buffer_texture_row_alignment: d3d12::D3D12_TEXTURE_DATA_PITCH_ALIGNMENT,
            max_vertex_attribute_count: d3d12::D3D12_IA_VERTEX_INPUT_STRUCTURE_ELEMENT_COUNT,
            max_color_attachments: crate::MAX_RENDER_TARGET_ATTACHMENTS as u32,
            max_texture_dimension_2d: d3d12::D3D12_REQ_TEXTURE2D_U_OR_V_DIMENSION,
        };

        log::info!("Created dx12 device '{}'", device_info.device_name);

        let inner = RhiDeviceContextDx12Inner {
            device_info,
            log_sink: api_def.log_sink.clone(),
            descriptor_heaps: Arc::new(RhiDescriptorHeaps::new(&api_def.descriptor_heap_sizes)),
            cpu_descriptor_heaps,
            graphics_queue: Mutex::new(graphics_queue),
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            d3d12_device,
            dxgi_adapter,
            dxgi_factory,
            destroyed: AtomicBool::new(false),
        };

        Ok(RhiDeviceContextDx12 {
            inner: Arc::new(inner),
        })
    }

    pub fn device_info(&self) -> &RhiDeviceInfo {
        &self.inner.device_info
    }

    pub fn log_sink(&self) -> &Arc<dyn RhiLogSink> {
        &self.inner.log_sink
    }

    pub fn dxgi_factory(&self) -> &dxgi::IDXGIFactory4 {
        &self.inner.dxgi_factory
    }

    pub fn dxgi_adapter(&self) -> &dxgi::IDXGIAdapter1 {
        &self.inner.dxgi_adapter
    }

    pub fn d3d12_device(&self) -> &d3d12::ID3D12Device {
        &self.inner.d3d12_device
    }

    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.inner.allocator
    }

    pub(crate) fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn descriptor_heap(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> &RhiDescriptorAllocator {
        self.inner.descriptor_heaps.heap(heap_type)
    }

    pub(crate) fn descriptor_heaps(&self) -> &Arc<RhiDescriptorHeaps> {
        &self.inner.descriptor_heaps
    }

    pub fn cpu_descriptor_handle(
        &self,
        heap_type: RhiDescriptorHeapType,
        index: RhiDescriptorIndex,
    ) -> d3d12::D3D12_CPU_DESCRIPTOR_HANDLE {
        self.inner
            .cpu_descriptor_heaps
            .cpu_handle(heap_type, index)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBufferDx12> {
        RhiBufferDx12::new(self, buffer_def)
    }

    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureDx12> {
        RhiTextureDx12::new(self, texture_def)
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerDx12> {
        RhiSamplerDx12::new(self, sampler_def)
    }

    pub fn create_shader(
        &self,
        shader_def: &RhiShaderDef,
    ) -> RhiResult<RhiShaderDx12> {
        RhiShaderDx12::new(self, shader_def)
    }

    pub fn create_render_pass(
        &self,
        render_pass_def: &RhiRenderPassDef,
    ) -> RhiResult<RhiRenderPassDx12> {
        RhiRenderPassDx12::new(self, render_pass_def)
    }

    pub fn create_framebuffer(
        &self,
        framebuffer_def: &RhiFramebufferDef,
    ) -> RhiResult<RhiFramebufferDx12> {
        RhiFramebufferDx12::new(self, framebuffer_def)
    }

    pub fn create_graphics_pipeline(
        &self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipelineDx12> {
        RhiPipelineDx12::new(self, pipeline_def)
    }

    pub fn create_command_buffer(&self) -> RhiResult<RhiCommandBufferDx12> {
        RhiCommandBufferDx12::new(self)
    }

    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBufferDx12],
    ) -> RhiResult<()> {
        let mut command_lists = Vec::with_capacity(command_buffers.len());
        for command_buffer in command_buffers {
            command_lists.push(Some(
                command_buffer
                    .dx12_graphics_command_list()
                    .cast::<d3d12::ID3D12CommandList>()?,
            ));
        }

        let mut graphics_queue = self.inner.graphics_queue.lock();
        unsafe {
            graphics_queue.queue.ExecuteCommandLists(&command_lists);
        }
        graphics_queue.signal()?;

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        // Holding the queue lock keeps other threads from submitting while we wait
        let mut graphics_queue = self.inner.graphics_queue.lock();
        let value = graphics_queue.signal()?;
        graphics_queue.wait_for_value(value)
    }
}
