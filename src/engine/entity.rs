//! Entity Handles with Generational Indices
//!
//! An entity is just an identifier; everything it "is" lives in the
//! component storages of the registry. Slots are recycled, and every reuse
//! bumps the slot's generation so a handle kept by a listener (a projectile's
//! owner, a pending removal) can never alias the entity that took its slot.

use std::fmt;

/// A unique identifier for a simulated entity.
///
/// Two handles with the same index but different generations refer to
/// different entities. The textual id (`e12v3`) is what logs print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    /// Slot in the component arrays
    index: u32,
    /// Bumped every time the slot is recycled
    generation: u32,
}

impl Entity {
    /// Only the allocator (and tests) mint handles.
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// A handle that is never alive. Useful for "no owner".
    pub const NULL: Entity = Entity { index: u32::MAX, generation: 0 };

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "e-null")
        } else {
            write!(f, "e{}v{}", self.index, self.generation)
        }
    }
}

/// Hands out entity handles and tracks which ones are alive.
pub struct EntityAllocator {
    /// Current generation of each slot
    generations: Vec<u32>,
    /// Liveness per slot, so the registry can enumerate entities
    alive: Vec<bool>,
    /// Freed slots, reused LIFO
    free_indices: Vec<u32>,
    alive_count: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate a handle, reusing a freed slot when one exists.
    pub fn allocate(&mut self) -> Entity {
        self.alive_count += 1;

        if let Some(index) = self.free_indices.pop() {
            // Generation was already bumped when the slot was freed
            self.alive[index as usize] = true;
            Entity::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        }
    }

    /// Free a handle. Returns false if it was already dead (or stale).
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let idx = entity.index as usize;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.alive[idx] = false;
        self.free_indices.push(entity.index);
        self.alive_count -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        let idx = entity.index as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == entity.generation
    }

    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// All live handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32, self.generations[idx]))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
