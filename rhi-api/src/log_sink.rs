/// Receives failure and misuse reports from the RHI. Injected through `RhiApiDef::log_sink` and
/// shared by every object created from the device.
pub trait RhiLogSink: Send + Sync {
    fn log(
        &self,
        level: log::Level,
        message: &str,
    );
}

/// Default sink, forwards everything to the `log` crate
#[derive(Default, Debug, Copy, Clone)]
pub struct RhiLogCrateSink;

impl RhiLogSink for RhiLogCrateSink {
    fn log(
        &self,
        level: log::Level,
        message: &str,
    ) {
        log::log!(target: "rhi", level, "{}", message);
    }
}
