use crate::{RhiResourceState, RhiStateWriteToken};
use std::sync::atomic::{AtomicU32, Ordering};

/// The last state a command buffer transitioned a resource to. Advisory: it reflects recording
/// order, not GPU completion. Readable by anyone, writable only with a `RhiStateWriteToken`.
#[derive(Debug, Default)]
pub struct RhiTrackedState(AtomicU32);

impl RhiTrackedState {
    pub fn new(initial_state: RhiResourceState) -> Self {
        RhiTrackedState(AtomicU32::new(initial_state.bits()))
    }

    pub fn get(&self) -> RhiResourceState {
        RhiResourceState::from_bits_truncate(self.0.load(Ordering::Relaxed))
    }

    pub fn set(
        &self,
        state: RhiResourceState,
        _token: &RhiStateWriteToken,
    ) {
        self.0.store(state.bits(), Ordering::Relaxed);
    }
}
