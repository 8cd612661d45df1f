//! Generation-counted slot table backing every host-owned object.

use crate::error::HostError;

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A vector of reusable slots. Removing a value advances the slot's
/// generation so handles issued before the removal stop resolving.
#[derive(Debug, Clone)]
pub(crate) struct Slots<T> {
    entries: Vec<Slot<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Store `value` in the first free slot. Returns `(index, generation)`.
    pub(crate) fn insert(&mut self, value: T) -> Result<(u32, u32), HostError> {
        if let Some((index, slot)) = self
            .entries
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.value.is_none())
        {
            slot.value = Some(value);
            let index = u32::try_from(index)
                .map_err(|_| HostError::Failed("slot table exhausted".to_owned()))?;
            return Ok((index, slot.generation));
        }

        let index = u32::try_from(self.entries.len())
            .map_err(|_| HostError::Failed("slot table exhausted".to_owned()))?;
        self.entries.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Ok((index, 0))
    }

    pub(crate) fn get(&self, index: u32, generation: u32) -> Option<&T> {
        let slot = self.entries.get(usize::try_from(index).ok()?)?;
        if slot.generation == generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        let slot = self.entries.get_mut(usize::try_from(index).ok()?)?;
        if slot.generation == generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    pub(crate) fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.entries.get_mut(usize::try_from(index).ok()?)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(value)
    }

    /// Live values with their `(index, generation)`, in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, slot)| {
            let index = u32::try_from(index).ok()?;
            slot.value.as_ref().map(|v| (index, slot.generation, v))
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let index = u32::try_from(index).ok()?;
                let generation = slot.generation;
                slot.value.as_mut().map(|v| (index, generation, v))
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().filter(|s| s.value.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn removed_slot_is_reused_with_new_generation() {
        let mut slots = Slots::default();
        let (a, gen_a) = slots.insert("a").unwrap();
        assert_eq!(slots.remove(a, gen_a), Some("a"));

        let (b, gen_b) = slots.insert("b").unwrap();
        assert_eq!(a, b);
        assert_ne!(gen_a, gen_b);
        assert!(slots.get(a, gen_a).is_none());
        assert_eq!(slots.get(b, gen_b), Some(&"b"));
    }

    #[test]
    fn stale_remove_is_ignored() {
        let mut slots = Slots::default();
        let (i, g) = slots.insert(1).unwrap();
        assert_eq!(slots.remove(i, g.wrapping_add(1)), None);
        assert_eq!(slots.len(), 1);
    }
}
