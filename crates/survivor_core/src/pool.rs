//! Fixed-capacity entity pools with generation-validated handles.
//!
//! Pools preallocate every slot at construction and never grow. Acquiring
//! returns a [`Handle`] that embeds the slot's generation; releasing a slot
//! bumps the generation, so stale handles held across a release fail
//! validation instead of touching the slot's new occupant.
//!
//! Iteration order is ascending slot index. Targeting relies on this for
//! its first-seen tie-break, so the order is part of the contract.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Generation-validated reference to a pooled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index within the pool.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Fixed-capacity arena with a free list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    name: String,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Pool<T> {
    /// Create a pool with a fixed number of slots, all initially free.
    #[must_use]
    pub fn new(name: &str, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        // Free list is popped from the back; reverse so low indices go first.
        let free = (0..capacity as u32).rev().collect();
        Self {
            name: name.to_string(),
            slots,
            free,
        }
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active entities.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Acquire a free slot and place `value` in it.
    ///
    /// The value carries the entity's full initial state, so stale fields
    /// from the slot's previous occupant cannot leak through.
    pub fn acquire(&mut self, value: T) -> Result<Handle> {
        let Some(index) = self.free.pop() else {
            return Err(CoreError::PoolExhausted {
                pool: self.name.clone(),
                capacity: self.slots.len(),
            });
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    /// Release a slot back to the free list, bumping its generation.
    ///
    /// Returns the entity, or `None` if the handle was already stale.
    pub fn release(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        slot.value.take()
    }

    /// True if the handle still refers to a live entity.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Get a reference to the entity, if the handle is still live.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Get a mutable reference to the entity, if the handle is still live.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Iterate active entities in ascending slot-index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    /// Iterate active entities mutably in ascending slot-index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(move |v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    /// Handles of all active entities, in ascending slot-index order.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }
}
