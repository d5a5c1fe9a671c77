/*
 * The number of filled slots, shared by the entry, exit and reset workers.
 *
 * Every mutation is a single compare-and-set on an atomic, so an increment
 * racing a decrement or a reset can never lose an update or push the count
 * outside `0..=capacity`. The check ("is there room?") and the update happen in
 * the same atomic step.
 */

use core::sync::atomic::{AtomicU8, Ordering};

use crate::error::OccupancyError;

pub struct Occupancy {
    count: AtomicU8,
    capacity: u8,
}

impl Occupancy {
    pub const fn new(capacity: u8) -> Self {
        Occupancy {
            count: AtomicU8::new(0),
            capacity,
        }
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    /// Take one slot. Returns the new count, or `Full` without touching the
    /// counter when every slot is already taken.
    pub fn fill(&self) -> Result<u8, OccupancyError> {
        let capacity = self.capacity;
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < capacity).then(|| count + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| OccupancyError::Full { capacity })
    }

    /// Free one slot. Returns the new count, or `Empty` when there is nothing
    /// to free.
    pub fn vacate(&self) -> Result<u8, OccupancyError> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .map(|previous| previous - 1)
            .map_err(|_| OccupancyError::Empty)
    }

    /// Forget every occupied slot, whatever the current count. Returns the count
    /// that was cleared.
    pub fn reset(&self) -> u8 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Relaxed snapshot for readers that tolerate a stale value, like the
    /// indicator light.
    pub fn snapshot(&self) -> u8 {
        self.count.load(Ordering::Relaxed)
    }
}
