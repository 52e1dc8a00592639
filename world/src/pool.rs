//! Generation-checked slot pool for short-lived actors.
//!
//! Instances cycle between an active and a free state instead of being
//! reallocated. Every slot carries a generation counter that is bumped on both
//! activation and release, so a key handed out by [`Pool::acquire`] stops
//! resolving the moment its instance is released, even if the slot is later
//! reused for a different actor.

use std::marker::PhantomData;

use thiserror::Error;
use wavebreak_core::{EnemyId, ProjectileId};

/// Uniform lifecycle contract implemented by pooled actors.
pub trait Poolable {
    /// Configuration that fully describes an activated instance.
    type Config;

    /// Constructs an inactive instance used to pre-warm the pool.
    fn dormant() -> Self;

    /// Overwrites every field from `config`, leaving no state from a previous use.
    fn enable(&mut self, config: Self::Config);

    /// Clears transient state before the instance returns to the free list.
    fn disable(&mut self);
}

/// Handle type addressing a pooled instance.
pub trait PoolKey: Copy {
    /// Builds a key from a slot index and its generation.
    fn from_parts(slot: u32, generation: u32) -> Self;

    /// Slot index addressed by the key.
    fn slot(&self) -> u32;

    /// Generation the key was issued for.
    fn generation(&self) -> u32;
}

impl PoolKey for EnemyId {
    fn from_parts(slot: u32, generation: u32) -> Self {
        EnemyId::new(slot, generation)
    }

    fn slot(&self) -> u32 {
        EnemyId::slot(self)
    }

    fn generation(&self) -> u32 {
        EnemyId::generation(self)
    }
}

impl PoolKey for ProjectileId {
    fn from_parts(slot: u32, generation: u32) -> Self {
        ProjectileId::new(slot, generation)
    }

    fn slot(&self) -> u32 {
        ProjectileId::slot(self)
    }

    fn generation(&self) -> u32 {
        ProjectileId::generation(self)
    }
}

/// Failures reported by [`Pool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The configured live limit was reached.
    #[error("pool exhausted: {limit} instances already live")]
    Exhausted {
        /// Live limit that was hit.
        limit: usize,
    },
    /// The slot table cannot address another slot.
    #[error("pool slot table is full")]
    SlotOverflow,
}

#[derive(Debug)]
enum SlotState<T> {
    Active(T),
    Free(T),
    Vacant,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    state: SlotState<T>,
}

/// Bounded pool of reusable instances addressed by generation-checked keys.
#[derive(Debug)]
pub struct Pool<T, K> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    vacant: Vec<u32>,
    max_size: usize,
    live_limit: Option<usize>,
    live: usize,
    _key: PhantomData<fn() -> K>,
}

impl<T: Poolable, K: PoolKey> Pool<T, K> {
    /// Creates a pool pre-warmed with `initial_size` dormant instances.
    ///
    /// At most `max_size` released instances are retained for reuse; any
    /// further releases drop their instance.
    #[must_use]
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        let mut slots = Vec::with_capacity(initial_size);
        let mut free = Vec::with_capacity(initial_size);
        for index in 0..initial_size {
            let Ok(slot) = u32::try_from(index) else {
                break;
            };
            slots.push(Slot {
                generation: 0,
                state: SlotState::Free(T::dormant()),
            });
            free.push(slot);
        }
        free.reverse();

        Self {
            slots,
            free,
            vacant: Vec::new(),
            max_size,
            live_limit: None,
            live: 0,
            _key: PhantomData,
        }
    }

    /// Caps the number of simultaneously active instances.
    #[must_use]
    pub fn with_live_limit(mut self, limit: usize) -> Self {
        self.live_limit = Some(limit);
        self
    }

    /// Activates an instance configured from `config`.
    ///
    /// Reuses a free instance when one exists and otherwise constructs a new
    /// one. The returned key is unique among all keys ever issued for the slot.
    pub fn acquire(&mut self, config: T::Config) -> Result<K, PoolError> {
        if let Some(limit) = self.live_limit {
            if self.live >= limit {
                return Err(PoolError::Exhausted { limit });
            }
        }

        let (index, mut instance) = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                match std::mem::replace(&mut slot.state, SlotState::Vacant) {
                    SlotState::Free(instance) => (index, instance),
                    // The free list only ever records free slots.
                    other => {
                        slot.state = other;
                        return Err(PoolError::SlotOverflow);
                    }
                }
            }
            None => {
                let index = match self.vacant.pop() {
                    Some(index) => index,
                    None => {
                        let index =
                            u32::try_from(self.slots.len()).map_err(|_| PoolError::SlotOverflow)?;
                        self.slots.push(Slot {
                            generation: 0,
                            state: SlotState::Vacant,
                        });
                        index
                    }
                };
                (index, T::dormant())
            }
        };

        instance.enable(config);
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.state = SlotState::Active(instance);
        self.live += 1;
        Ok(K::from_parts(index, slot.generation))
    }

    /// Deactivates the instance addressed by `key`.
    ///
    /// Returns `false` when the key is stale or was never issued.
    pub fn release(&mut self, key: K) -> bool {
        let index = key.slot();
        let keep = self.free.len() < self.max_size;
        let Some(slot) = self.slots.get_mut(index as usize) else {
            return false;
        };
        if slot.generation != key.generation() || !matches!(slot.state, SlotState::Active(_)) {
            return false;
        }

        let SlotState::Active(mut instance) = std::mem::replace(&mut slot.state, SlotState::Vacant)
        else {
            return false;
        };
        instance.disable();
        slot.generation = slot.generation.wrapping_add(1);
        if keep {
            slot.state = SlotState::Free(instance);
            self.free.push(index);
        } else {
            self.vacant.push(index);
        }
        self.live -= 1;
        true
    }

    /// Releases every active instance.
    pub fn release_all(&mut self) {
        let keys: Vec<K> = self.iter().map(|(key, _)| key).collect();
        for key in keys {
            let _ = self.release(key);
        }
    }

    /// Returns the active instance addressed by `key`.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&T> {
        let slot = self.slots.get(key.slot() as usize)?;
        match &slot.state {
            SlotState::Active(instance) if slot.generation == key.generation() => Some(instance),
            _ => None,
        }
    }

    /// Returns the active instance addressed by `key` for mutation.
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.slot() as usize)?;
        match &mut slot.state {
            SlotState::Active(instance) if slot.generation == key.generation() => Some(instance),
            _ => None,
        }
    }

    /// Reports whether `key` addresses an active instance.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Iterates active instances together with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match &slot.state {
                SlotState::Active(instance) => Some((
                    K::from_parts(index as u32, slot.generation),
                    instance,
                )),
                _ => None,
            })
    }

    /// Iterates active instances mutably together with their keys.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let generation = slot.generation;
                match &mut slot.state {
                    SlotState::Active(instance) => {
                        Some((K::from_parts(index as u32, generation), instance))
                    }
                    _ => None,
                }
            })
    }

    /// Number of active instances.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Number of dormant instances waiting on the free list.
    #[must_use]
    pub fn free(&self) -> usize {
        self.free.len()
    }
}
