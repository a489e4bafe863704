//! Fixed-capacity entity storage addressed by generational handles.

use slotmap::{SlotMap, new_key_type};

use crate::error::{SimError, SimResult};

new_key_type! {
    /// Stable reference into a [`Pool`]. Goes stale once its entry is removed.
    pub struct Handle;
}

/// Bounded slot map that iterates in insertion order.
#[derive(Clone, Debug)]
pub struct Pool<T> {
    name: &'static str,
    capacity: usize,
    slots: SlotMap<Handle, T>,
    order: Vec<Handle>,
}

impl<T> Pool<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            slots: SlotMap::with_capacity_and_key(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store `value`. A full pool rejects it and is left as it was.
    pub fn insert(&mut self, value: T) -> SimResult<Handle> {
        if self.slots.len() >= self.capacity {
            log::debug!("{} pool full, rejecting insert", self.name);
            return Err(SimError::CapacityExceeded { what: self.name, capacity: self.capacity });
        }
        let h = self.slots.insert(value);
        self.order.push(h);
        Ok(h)
    }

    pub fn remove(&mut self, handle: Handle) -> SimResult<T> {
        let value = self.slots.remove(handle).ok_or(SimError::StaleHandle)?;
        self.order.retain(|h| *h != handle);
        Ok(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle)
    }

    /// Drop every entry, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.order.iter().filter_map(|h| self.slots.get(*h).map(|v| (*h, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> + '_ {
        let order = &self.order;
        let mut items: Vec<(Handle, &mut T)> = self.slots.iter_mut().collect();
        items.sort_by_key(|(h, _)| order.iter().position(|o| o == h));
        items.into_iter()
    }
}
