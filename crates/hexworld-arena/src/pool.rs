//! The recycling path pool.

use crate::config::PoolConfig;
use crate::error::ArenaError;
use crate::handle::PathToken;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    live: bool,
    data: Vec<T>,
}

/// Bounded ring of reusable buffers addressed by [`PathToken`].
///
/// Storing never fails: when every slot is in flight the slot at the
/// cursor is overwritten, which invalidates its previous token. Slot
/// buffers keep their allocation across reuse.
#[derive(Debug)]
pub struct PathPool<T> {
    slots: Vec<Slot<T>>,
    capacity: u32,
    cursor: u32,
}

impl<T> PathPool<T> {
    /// Create an empty pool.
    ///
    /// Returns `Err(ArenaError::ZeroCapacity)` for a zero-slot config.
    pub fn new(config: PoolConfig) -> Result<Self, ArenaError> {
        if config.capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        Ok(Self {
            slots: Vec::new(),
            capacity: config.capacity,
            cursor: 0,
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots currently holding an unreleased path.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    /// Store a path in the next slot, recycling the oldest if necessary.
    pub fn store(&mut self, items: impl IntoIterator<Item = T>) -> PathToken {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.capacity;

        if index as usize == self.slots.len() {
            self.slots.push(Slot {
                generation: 0,
                live: false,
                data: Vec::new(),
            });
        }
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.live = true;
        slot.data.clear();
        slot.data.extend(items);
        PathToken::new(index, slot.generation)
    }

    fn slot(&self, token: PathToken) -> Result<&Slot<T>, ArenaError> {
        let slot = self
            .slots
            .get(token.index as usize)
            .ok_or(ArenaError::InvalidIndex {
                index: token.index,
                capacity: self.capacity,
            })?;
        if !slot.live || slot.generation != token.generation {
            return Err(ArenaError::StaleHandle {
                index: token.index,
                handle_generation: token.generation,
                current_generation: slot.generation,
            });
        }
        Ok(slot)
    }

    fn slot_mut(&mut self, token: PathToken) -> Result<&mut Slot<T>, ArenaError> {
        self.slot(token)?;
        Ok(&mut self.slots[token.index as usize])
    }

    /// Read a stored path.
    pub fn get(&self, token: PathToken) -> Result<&[T], ArenaError> {
        self.slot(token).map(|s| s.data.as_slice())
    }

    /// Mutable access to a stored path (e.g. to rewrite movement params).
    pub fn get_mut(&mut self, token: PathToken) -> Result<&mut [T], ArenaError> {
        self.slot_mut(token).map(|s| s.data.as_mut_slice())
    }

    /// Whether `token` still resolves.
    pub fn is_live(&self, token: PathToken) -> bool {
        self.slot(token).is_ok()
    }

    /// Mark a path consumed. Its buffer stays allocated for reuse and the
    /// token (and any copy of it) becomes stale.
    pub fn release(&mut self, token: PathToken) -> Result<(), ArenaError> {
        let slot = self.slot_mut(token)?;
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.data.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool(cap: u32) -> PathPool<u32> {
        PathPool::new(PoolConfig::new(cap)).unwrap()
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            PathPool::<u8>::new(PoolConfig::new(0)),
            Err(ArenaError::ZeroCapacity)
        ));
    }

    #[test]
    fn store_and_read_back() {
        let mut p = pool(4);
        let t = p.store([1, 2, 3]);
        assert_eq!(p.get(t).unwrap(), &[1, 2, 3]);
        assert_eq!(p.in_flight(), 1);
    }

    #[test]
    fn wraparound_invalidates_oldest_token() {
        let mut p = pool(2);
        let a = p.store([1]);
        let b = p.store([2]);
        let c = p.store([3]);
        assert_eq!(c.index(), a.index());
        assert!(matches!(p.get(a), Err(ArenaError::StaleHandle { .. })));
        assert_eq!(p.get(b).unwrap(), &[2]);
        assert_eq!(p.get(c).unwrap(), &[3]);
    }

    #[test]
    fn release_makes_token_stale() {
        let mut p = pool(3);
        let t = p.store([7, 8]);
        p.release(t).unwrap();
        assert!(!p.is_live(t));
        assert!(p.release(t).is_err());
        assert_eq!(p.in_flight(), 0);
    }

    #[test]
    fn get_mut_rewrites_in_place() {
        let mut p = pool(3);
        let t = p.store([1, 1]);
        for v in p.get_mut(t).unwrap() {
            *v = 9;
        }
        assert_eq!(p.get(t).unwrap(), &[9, 9]);
    }

    #[test]
    fn foreign_index_is_invalid() {
        let mut small = pool(1);
        let mut big = pool(8);
        let _ = big.store([0]);
        let far = big.store([0]);
        let _ = small.store([0]);
        assert!(matches!(small.get(far), Err(ArenaError::InvalidIndex { .. })));
    }

    proptest! {
        #[test]
        fn only_last_capacity_tokens_are_live(cap in 1u32..16, stores in 1usize..64) {
            let mut p = pool(cap);
            let tokens: Vec<_> = (0..stores).map(|i| p.store([i as u32])).collect();
            for (i, t) in tokens.iter().enumerate() {
                let live = i + cap as usize >= stores;
                prop_assert_eq!(p.is_live(*t), live);
                if live {
                    prop_assert_eq!(p.get(*t).unwrap(), &[i as u32]);
                }
            }
        }
    }
}
