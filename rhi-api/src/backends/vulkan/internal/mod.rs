mod conversions;

mod debug_reporter;

mod instance;
pub(crate) use instance::VkInstance;

pub(crate) mod util;
