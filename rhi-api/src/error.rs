use crate::{RhiCommandBufferStatus, RhiDescriptorHeapType, RhiPipelineStage, RhiResourceKind};
#[cfg(feature = "rhi-vulkan")]
use ash::vk;
#[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
use std::sync::Arc;

pub type RhiResult<T> = Result<T, RhiError>;

/// Generic error that contains all the different kinds of errors that may occur when using the API
#[derive(Debug, Clone)]
pub enum RhiError {
    StringError(String),
    /// The def was rejected or the backend failed to create the native object
    ResourceCreation {
        kind: RhiResourceKind,
        reason: String,
    },
    /// No free slot in the given view table. Retry after releasing resources.
    HeapExhausted {
        heap: RhiDescriptorHeapType,
    },
    /// The framebuffer's textures don't match the render pass's attachment slots
    FramebufferIncompatible(String),
    PipelineStageCreation {
        stage: RhiPipelineStage,
        reason: String,
    },
    CommandBufferState {
        expected: RhiCommandBufferStatus,
        actual: RhiCommandBufferStatus,
    },
    /// `RhiValidationMode::Enabled` was requested but validation layers could not be loaded
    ValidationRequiredButUnavailable,
    #[cfg(feature = "rhi-vulkan")]
    VkError(vk::Result),
    #[cfg(feature = "rhi-vulkan")]
    VkLoadingError(Arc<ash::LoadingError>),
    #[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
    GpuAllocatorError(Arc<gpu_allocator::AllocationError>),
    #[cfg(all(windows, feature = "rhi-dx12"))]
    WindowsApiError(windows::core::Error),
}

impl RhiError {
    pub fn resource_creation(
        kind: RhiResourceKind,
        reason: impl Into<String>,
    ) -> Self {
        RhiError::ResourceCreation {
            kind,
            reason: reason.into(),
        }
    }

    /// True for failures that may succeed if retried after freeing resources
    pub fn is_retryable(&self) -> bool {
        match self {
            RhiError::HeapExhausted { .. } => true,
            #[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
            RhiError::GpuAllocatorError(e) => match **e {
                gpu_allocator::AllocationError::OutOfMemory => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl std::error::Error for RhiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            RhiError::StringError(_)
            | RhiError::ResourceCreation { .. }
            | RhiError::HeapExhausted { .. }
            | RhiError::FramebufferIncompatible(_)
            | RhiError::PipelineStageCreation { .. }
            | RhiError::CommandBufferState { .. }
            | RhiError::ValidationRequiredButUnavailable => None,
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkError(ref e) => Some(e),
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkLoadingError(ref e) => Some(&**e),
            #[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
            RhiError::GpuAllocatorError(ref e) => Some(&**e),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiError::WindowsApiError(ref e) => Some(e),
        }
    }
}

impl core::fmt::Display for RhiError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            RhiError::StringError(ref e) => e.fmt(fmt),
            RhiError::ResourceCreation {
                kind,
                ref reason,
            } => write!(fmt, "failed to create {:?}: {}", kind, reason),
            RhiError::HeapExhausted { heap } => {
                write!(fmt, "no free slots in the {:?} descriptor heap", heap)
            }
            RhiError::FramebufferIncompatible(ref reason) => {
                write!(fmt, "framebuffer incompatible with render pass: {}", reason)
            }
            RhiError::PipelineStageCreation {
                stage,
                ref reason,
            } => write!(fmt, "pipeline {} stage failed: {}", stage.name(), reason),
            RhiError::CommandBufferState { expected, actual } => write!(
                fmt,
                "command buffer is {:?}, expected {:?}",
                actual, expected
            ),
            RhiError::ValidationRequiredButUnavailable => {
                "validation was required but is not available".fmt(fmt)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkError(ref e) => e.fmt(fmt),
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkLoadingError(ref e) => e.fmt(fmt),
            #[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
            RhiError::GpuAllocatorError(ref e) => e.fmt(fmt),
            #[cfg(all(windows, feature = "rhi-dx12"))]
            RhiError::WindowsApiError(ref e) => e.fmt(fmt),
        }
    }
}

impl From<&str> for RhiError {
    fn from(str: &str) -> Self {
        RhiError::StringError(str.to_string())
    }
}

impl From<String> for RhiError {
    fn from(string: String) -> Self {
        RhiError::StringError(string)
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<vk::Result> for RhiError {
    fn from(result: vk::Result) -> Self {
        RhiError::VkError(result)
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<ash::LoadingError> for RhiError {
    fn from(result: ash::LoadingError) -> Self {
        RhiError::VkLoadingError(Arc::new(result))
    }
}

#[cfg(any(feature = "rhi-vulkan", all(windows, feature = "rhi-dx12")))]
impl From<gpu_allocator::AllocationError> for RhiError {
    fn from(error: gpu_allocator::AllocationError) -> Self {
        RhiError::GpuAllocatorError(Arc::new(error))
    }
}

#[cfg(all(windows, feature = "rhi-dx12"))]
impl From<windows::core::Error> for RhiError {
    fn from(error: windows::core::Error) -> Self {
        RhiError::WindowsApiError(error)
    }
}
