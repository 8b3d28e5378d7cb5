use crate::{RhiDescriptorHeapSizes, RhiDescriptorHeapType, RhiError, RhiResult};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Stable index into a fixed-size view table
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RhiDescriptorIndex(pub u32);

struct RhiDescriptorAllocatorInner {
    // Indices at or above this have never been handed out
    next_unused: u32,
    // Freed indices below next_unused, ordered so the lowest is reused first
    freed: BTreeSet<u32>,
    allocated: Vec<bool>,
}

/// Fixed-capacity slot pool. Hands out the lowest free index and returns `None` when full.
pub struct RhiDescriptorAllocator {
    heap_type: RhiDescriptorHeapType,
    capacity: u32,
    inner: Mutex<RhiDescriptorAllocatorInner>,
}

impl std::fmt::Debug for RhiDescriptorAllocator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDescriptorAllocator")
            .field("heap_type", &self.heap_type)
            .field("capacity", &self.capacity)
            .field("allocated_count", &self.allocated_count())
            .finish()
    }
}

impl RhiDescriptorAllocator {
    pub fn new(
        heap_type: RhiDescriptorHeapType,
        capacity: u32,
    ) -> Self {
        let inner = RhiDescriptorAllocatorInner {
            next_unused: 0,
            freed: Default::default(),
            allocated: vec![false; capacity as usize],
        };

        RhiDescriptorAllocator {
            heap_type,
            capacity,
            inner: Mutex::new(inner),
        }
    }

    pub fn heap_type(&self) -> RhiDescriptorHeapType {
        self.heap_type
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn allocated_count(&self) -> u32 {
        let inner = self.inner.lock();
        inner.next_unused - inner.freed.len() as u32
    }

    pub fn allocate(&self) -> Option<RhiDescriptorIndex> {
        let mut inner = self.inner.lock();

        let index = if let Some(&lowest_freed) = inner.freed.iter().next() {
            inner.freed.remove(&lowest_freed);
            lowest_freed
        } else if inner.next_unused < self.capacity {
            let index = inner.next_unused;
            inner.next_unused += 1;
            index
        } else {
            log::trace!("{:?} descriptor heap exhausted", self.heap_type);
            return None;
        };

        debug_assert!(!inner.allocated[index as usize]);
        inner.allocated[index as usize] = true;
        Some(RhiDescriptorIndex(index))
    }

    pub fn free(
        &self,
        index: RhiDescriptorIndex,
    ) {
        let mut inner = self.inner.lock();
        let i = index.0;

        debug_assert!(
            i < inner.next_unused,
            "freed {:?} index {} that was never allocated",
            self.heap_type,
            i
        );
        debug_assert!(
            inner.allocated.get(i as usize).copied().unwrap_or(false),
            "double free of {:?} index {}",
            self.heap_type,
            i
        );

        if i >= inner.next_unused || !inner.allocated[i as usize] {
            return;
        }

        inner.allocated[i as usize] = false;

        // Fold trailing frees back into the never-used range to keep the free set small
        if i + 1 == inner.next_unused {
            inner.next_unused -= 1;
            while inner.next_unused > 0 {
                let last = inner.next_unused - 1;
                if !inner.freed.remove(&last) {
                    break;
                }
                inner.next_unused = last;
            }
        } else {
            inner.freed.insert(i);
        }
    }
}

/// The four view tables of a device, sized by `RhiApiDef::descriptor_heap_sizes`
#[derive(Debug)]
pub struct RhiDescriptorHeaps {
    cbv_srv_uav: RhiDescriptorAllocator,
    sampler: RhiDescriptorAllocator,
    rtv: RhiDescriptorAllocator,
    dsv: RhiDescriptorAllocator,
}

impl RhiDescriptorHeaps {
    pub fn new(heap_sizes: &RhiDescriptorHeapSizes) -> Self {
        RhiDescriptorHeaps {
            cbv_srv_uav: RhiDescriptorAllocator::new(
                RhiDescriptorHeapType::CbvSrvUav,
                heap_sizes.cbv_srv_uav,
            ),
            sampler: RhiDescriptorAllocator::new(
                RhiDescriptorHeapType::Sampler,
                heap_sizes.sampler,
            ),
            rtv: RhiDescriptorAllocator::new(RhiDescriptorHeapType::Rtv, heap_sizes.rtv),
            dsv: RhiDescriptorAllocator::new(RhiDescriptorHeapType::Dsv, heap_sizes.dsv),
        }
    }

    pub fn heap(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> &RhiDescriptorAllocator {
        match heap_type {
            RhiDescriptorHeapType::CbvSrvUav => &self.cbv_srv_uav,
            RhiDescriptorHeapType::Sampler => &self.sampler,
            RhiDescriptorHeapType::Rtv => &self.rtv,
            RhiDescriptorHeapType::Dsv => &self.dsv,
        }
    }

    pub fn allocate(
        &self,
        heap_type: RhiDescriptorHeapType,
    ) -> RhiResult<RhiDescriptorIndex> {
        self.heap(heap_type)
            .allocate()
            .ok_or(RhiError::HeapExhausted { heap: heap_type })
    }

    pub fn free(
        &self,
        heap_type: RhiDescriptorHeapType,
        index: RhiDescriptorIndex,
    ) {
        self.heap(heap_type).free(index);
    }
}

/// Descriptor slots owned by one object, returned to the device heaps on drop. Dropping a
/// partially filled set during a failed creation releases whatever was allocated so far.
pub(crate) struct RhiDescriptorSlots {
    heaps: Arc<RhiDescriptorHeaps>,
    slots: Vec<(RhiDescriptorHeapType, RhiDescriptorIndex)>,
}

impl RhiDescriptorSlots {
    pub(crate) fn new(heaps: &Arc<RhiDescriptorHeaps>) -> Self {
        RhiDescriptorSlots {
            heaps: heaps.clone(),
            slots: Vec::default(),
        }
    }

    pub(crate) fn allocate(
        &mut self,
        heap_type: RhiDescriptorHeapType,
    ) -> RhiResult<RhiDescriptorIndex> {
        let index = self.heaps.allocate(heap_type)?;
        self.slots.push((heap_type, index));
        Ok(index)
    }

    /// Allocates only when `required`, so optional views read as `Option`s
    pub(crate) fn allocate_if(
        &mut self,
        required: bool,
        heap_type: RhiDescriptorHeapType,
    ) -> RhiResult<Option<RhiDescriptorIndex>> {
        if required {
            self.allocate(heap_type).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl Drop for RhiDescriptorSlots {
    fn drop(&mut self) {
        for (heap_type, index) in self.slots.drain(..) {
            self.heaps.free(heap_type, index);
        }
    }
}

impl std::fmt::Debug for RhiDescriptorSlots {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_and_recovers_same_indices() {
        let allocator = RhiDescriptorAllocator::new(RhiDescriptorHeapType::Sampler, 4);

        let first: Vec<_> = (0..4).map(|_| allocator.allocate().unwrap()).collect();
        assert_eq!(allocator.allocate(), None);
        assert_eq!(allocator.allocated_count(), 4);

        for index in &first {
            allocator.free(*index);
        }
        assert_eq!(allocator.allocated_count(), 0);

        let mut second: Vec<_> = (0..4).map(|_| allocator.allocate().unwrap()).collect();
        second.sort();
        assert_eq!(first, second);
    }

    #[test]
    fn lowest_freed_index_is_reused_first() {
        let allocator = RhiDescriptorAllocator::new(RhiDescriptorHeapType::Rtv, 8);
        let indices: Vec<_> = (0..5).map(|_| allocator.allocate().unwrap()).collect();

        allocator.free(indices[3]);
        allocator.free(indices[1]);
        assert_eq!(allocator.allocate(), Some(RhiDescriptorIndex(1)));
        assert_eq!(allocator.allocate(), Some(RhiDescriptorIndex(3)));
        assert_eq!(allocator.allocate(), Some(RhiDescriptorIndex(5)));
    }

    #[test]
    fn freeing_the_tail_shrinks_the_used_range() {
        let allocator = RhiDescriptorAllocator::new(RhiDescriptorHeapType::Dsv, 4);
        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();
        let c = allocator.allocate().unwrap();

        allocator.free(b);
        allocator.free(c);
        assert_eq!(allocator.allocated_count(), 1);
        assert_eq!(allocator.allocate(), Some(RhiDescriptorIndex(1)));

        allocator.free(a);
        assert_eq!(allocator.allocate(), Some(RhiDescriptorIndex(0)));
    }

    #[test]
    fn dropped_slots_return_to_their_heaps() {
        let heaps = Arc::new(RhiDescriptorHeaps::new(&RhiDescriptorHeapSizes {
            cbv_srv_uav: 2,
            sampler: 1,
            rtv: 1,
            dsv: 1,
        }));

        {
            let mut slots = RhiDescriptorSlots::new(&heaps);
            slots.allocate(RhiDescriptorHeapType::CbvSrvUav).unwrap();
            slots.allocate(RhiDescriptorHeapType::Sampler).unwrap();
            assert_eq!(slots.allocate_if(false, RhiDescriptorHeapType::Rtv).unwrap(), None);
            assert!(matches!(
                slots.allocate(RhiDescriptorHeapType::Sampler),
                Err(RhiError::HeapExhausted {
                    heap: RhiDescriptorHeapType::Sampler
                })
            ));
        }

        assert_eq!(heaps.heap(RhiDescriptorHeapType::CbvSrvUav).allocated_count(), 0);
        assert_eq!(heaps.heap(RhiDescriptorHeapType::Sampler).allocated_count(), 0);
    }

    #[test]
    fn concurrent_allocation_hands_out_unique_indices() {
        let allocator = std::sync::Arc::new(RhiDescriptorAllocator::new(
            RhiDescriptorHeapType::CbvSrvUav,
            1024,
        ));

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let allocator = allocator.clone();
                std::thread::spawn(move || {
                    (0..256)
                        .map(|_| allocator.allocate().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = BTreeSet::new();
        for thread in threads {
            for index in thread.join().unwrap() {
                assert!(all.insert(index));
            }
        }

        assert_eq!(all.len(), 1024);
        assert_eq!(allocator.allocate(), None);
    }
}
