//! Component Storage
//!
//! Components are plain data attached to entities. Each component kind gets
//! its own `ComponentStorage<T>`, a sparse array indexed by entity slot. A
//! slot remembers which handle owns it, so a stale handle whose slot was
//! recycled reads as "no component" instead of someone else's data.
//!
//! The set of kinds is closed and known at compile time (see
//! `ComponentKind`); the registry holds one typed field per kind. The set is
//! per crate: the engine kinds come first, then the kinds of the one game
//! this crate ships. A second game adds its kinds here and a storage field
//! on `Registry`.

use std::fmt;

use super::entity::Entity;
use super::registry::Registry;

/// Tag for every component kind the registry stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Transform,
    Physics,
    Collider,
    Render,
    ParticleEmitter,
    Ship,
    Asteroid,
    Projectile,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Transform,
        ComponentKind::Physics,
        ComponentKind::Collider,
        ComponentKind::Render,
        ComponentKind::ParticleEmitter,
        ComponentKind::Ship,
        ComponentKind::Asteroid,
        ComponentKind::Projectile,
    ];

    /// Stable string tag, as printed in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Transform => "transform",
            ComponentKind::Physics => "physics",
            ComponentKind::Collider => "collider",
            ComponentKind::Render => "render",
            ComponentKind::ParticleEmitter => "particleEmitter",
            ComponentKind::Ship => "ship",
            ComponentKind::Asteroid => "asteroid",
            ComponentKind::Projectile => "projectile",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data type that can be attached to an entity.
///
/// `storage`/`storage_mut` route the type to its registry field. The hooks
/// run when the component enters or leaves an entity, including when it is
/// replaced by another instance of the same kind.
pub trait Component: Sized + 'static {
    const KIND: ComponentKind;

    fn storage(registry: &Registry) -> &ComponentStorage<Self>;

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self>;

    fn on_attach(&mut self, _entity: Entity) {}

    fn on_detach(&mut self, _entity: Entity) {}
}

/// Sparse storage for a single component type.
pub struct ComponentStorage<T> {
    /// Indexed by entity slot; the stored handle is the owner
    data: Vec<Option<(Entity, T)>>,
}

impl<T> ComponentStorage<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn ensure_capacity(&mut self, index: usize) {
        if index >= self.data.len() {
            self.data.resize_with(index + 1, || None);
        }
    }

    /// Insert a component for an entity, returning whatever was there.
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        let idx = entity.index() as usize;
        self.ensure_capacity(idx);
        let previous = self.data[idx].take();
        self.data[idx] = Some((entity, component));
        previous.and_then(|(owner, c)| (owner == entity).then_some(c))
    }

    /// Remove an entity's component, if it has one.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.data.get_mut(entity.index() as usize)?;
        match slot {
            Some((owner, _)) if *owner == entity => slot.take().map(|(_, c)| c),
            _ => None,
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        match self.data.get(entity.index() as usize) {
            Some(Some((owner, c))) if *owner == entity => Some(c),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.data.get_mut(entity.index() as usize) {
            Some(Some((owner, c))) if *owner == entity => Some(c),
            _ => None,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Iterate over all (owner, component) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.data
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(owner, c)| (*owner, c)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.data
            .iter_mut()
            .filter_map(|slot| slot.as_mut().map(|(owner, c)| (*owner, c)))
    }

    /// Drop every component without running any hooks.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut storage: ComponentStorage<i32> = ComponentStorage::new();
        let entity = Entity::new(5, 0);

        assert_eq!(storage.insert(entity, 42), None);
        assert_eq!(storage.get(entity), Some(&42));
        assert!(storage.contains(entity));
        assert_eq!(storage.count(), 1);
    }

    #[test]
    fn test_insert_replaces_and_returns_previous() {
        let mut storage: ComponentStorage<&str> = ComponentStorage::new();
        let entity = Entity::new(0, 0);

        storage.insert(entity, "first");
        assert_eq!(storage.insert(entity, "second"), Some("first"));
        assert_eq!(storage.get(entity), Some(&"second"));
    }

    #[test]
    fn test_stale_handle_reads_nothing() {
        let mut storage: ComponentStorage<i32> = ComponentStorage::new();
        let old = Entity::new(2, 0);
        let new = Entity::new(2, 1);

        storage.insert(new, 7);
        assert_eq!(storage.get(old), None);
        assert_eq!(storage.remove(old), None);
        assert_eq!(storage.get(new), Some(&7));
    }

    #[test]
    fn test_remove() {
        let mut storage: ComponentStorage<i32> = ComponentStorage::new();
        let entity = Entity::new(3, 0);

        storage.insert(entity, 100);
        assert_eq!(storage.remove(entity), Some(100));
        assert!(!storage.contains(entity));
        assert_eq!(storage.remove(entity), None);
    }

    #[test]
    fn test_iter_reports_owners() {
        let mut storage: ComponentStorage<i32> = ComponentStorage::new();
        let a = Entity::new(0, 0);
        let b = Entity::new(10, 4);
        storage.insert(a, 1);
        storage.insert(b, 2);

        let pairs: Vec<(Entity, i32)> = storage.iter().map(|(e, v)| (e, *v)).collect();
        assert_eq!(pairs, vec![(a, 1), (b, 2)]);
    }

    #[test]
    fn test_engine_kinds_precede_game_kinds() {
        let tags: Vec<&str> = ComponentKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            tags,
            vec!["transform", "physics", "collider", "render", "particleEmitter", "ship", "asteroid", "projectile"]
        );
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ComponentKind::ParticleEmitter.as_str(), "particleEmitter");
        assert_eq!(ComponentKind::Transform.to_string(), "transform");
    }
}
