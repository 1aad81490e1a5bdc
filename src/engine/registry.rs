//! Entity Registry
//!
//! Owns entity lifetimes and one typed `ComponentStorage` per component
//! kind. Storages are plain public fields so systems can borrow two of them
//! mutably at once (`registry.transforms` and `registry.physics`, say).
//!
//! Entities are assembled off-registry with an `EntityBuilder` (what the
//! game's factory functions return) and handed over with `spawn`.

use std::collections::HashMap;

use log::debug;

use super::component::{Component, ComponentKind, ComponentStorage};
use super::components::{Collider, Physics, Render, Transform};
use super::entity::{Entity, EntityAllocator};
use super::message::Subscription;
use super::particles::ParticleEmitter;
// Game kinds live beside the engine ones; see `ComponentKind`
use crate::games::asteroids::components::{Asteroid, Projectile, Ship};

type Attach = Box<dyn FnOnce(&mut Registry, Entity)>;

/// A not-yet-spawned entity: a name plus the components to attach.
#[derive(Default)]
pub struct EntityBuilder {
    name: Option<String>,
    kinds: Vec<ComponentKind>,
    attach: Vec<Attach>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a component. A second component of the same kind replaces the
    /// first when the entity is spawned.
    pub fn with<C: Component>(mut self, component: C) -> Self {
        self.kinds.push(C::KIND);
        self.attach.push(Box::new(move |registry: &mut Registry, entity: Entity| {
            registry.insert(entity, component);
        }));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.kinds.contains(&kind)
    }
}

pub struct Registry {
    entities: EntityAllocator,
    names: ComponentStorage<String>,
    /// Message subscriptions owned by entities, disposed on removal
    subscriptions: HashMap<Entity, Vec<Subscription>>,

    // =========================================================================
    // Engine components
    // =========================================================================
    pub transforms: ComponentStorage<Transform>,
    pub physics: ComponentStorage<Physics>,
    pub colliders: ComponentStorage<Collider>,
    pub renders: ComponentStorage<Render>,
    pub emitters: ComponentStorage<ParticleEmitter>,

    // =========================================================================
    // Asteroids components
    // =========================================================================
    pub ships: ComponentStorage<Ship>,
    pub asteroids: ComponentStorage<Asteroid>,
    pub projectiles: ComponentStorage<Projectile>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            names: ComponentStorage::new(),
            subscriptions: HashMap::new(),
            transforms: ComponentStorage::new(),
            physics: ComponentStorage::new(),
            colliders: ComponentStorage::new(),
            renders: ComponentStorage::new(),
            emitters: ComponentStorage::new(),
            ships: ComponentStorage::new(),
            asteroids: ComponentStorage::new(),
            projectiles: ComponentStorage::new(),
        }
    }

    // =========================================================================
    // Entity lifetime
    // =========================================================================

    /// Allocate an empty entity.
    pub fn create(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Take ownership of a built entity and attach its components.
    pub fn spawn(&mut self, builder: EntityBuilder) -> Entity {
        let entity = self.entities.allocate();
        if let Some(name) = builder.name {
            self.names.insert(entity, name);
        }
        for attach in builder.attach {
            attach(self, entity);
        }
        debug!("spawned {} ({})", entity, self.name(entity).unwrap_or("unnamed"));
        entity
    }

    /// Remove an entity: detach every component (running hooks), dispose
    /// its subscriptions, free the handle. False if it was not alive.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }

        for kind in ComponentKind::ALL {
            self.remove_kind(entity, kind);
        }
        if let Some(subscriptions) = self.subscriptions.remove(&entity) {
            for subscription in subscriptions {
                subscription.dispose();
            }
        }
        self.names.remove(entity);
        self.entities.free(entity);
        debug!("despawned {}", entity);
        true
    }

    /// Despawn everything.
    pub fn clear(&mut self) {
        for entity in self.entities() {
            self.despawn(entity);
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn len(&self) -> usize {
        self.entities.alive_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live entities, in slot order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter().collect()
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.names.get(entity).map(String::as_str)
    }

    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) {
        if self.is_alive(entity) {
            self.names.insert(entity, name.into());
        }
    }

    /// Tie a subscription to an entity's lifetime.
    pub fn own_subscription(&mut self, entity: Entity, subscription: Subscription) {
        if self.is_alive(entity) {
            self.subscriptions.entry(entity).or_default().push(subscription);
        } else {
            subscription.dispose();
        }
    }

    pub fn subscription_count(&self, entity: Entity) -> usize {
        self.subscriptions.get(&entity).map_or(0, Vec::len)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attach a component. An existing component of the same kind is
    /// detached first and handed back.
    pub fn insert<C: Component>(&mut self, entity: Entity, mut component: C) -> Option<C> {
        if !self.is_alive(entity) {
            return None;
        }
        let storage = C::storage_mut(self);
        let previous = storage.remove(entity).map(|mut old| {
            old.on_detach(entity);
            old
        });
        component.on_attach(entity);
        storage.insert(entity, component);
        previous
    }

    /// Detach and return a component.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        let mut component = C::storage_mut(self).remove(entity)?;
        component.on_detach(entity);
        Some(component)
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::storage(self).get(entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        C::storage_mut(self).get_mut(entity)
    }

    pub fn has(&self, entity: Entity, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Transform => self.transforms.contains(entity),
            ComponentKind::Physics => self.physics.contains(entity),
            ComponentKind::Collider => self.colliders.contains(entity),
            ComponentKind::Render => self.renders.contains(entity),
            ComponentKind::ParticleEmitter => self.emitters.contains(entity),
            ComponentKind::Ship => self.ships.contains(entity),
            ComponentKind::Asteroid => self.asteroids.contains(entity),
            ComponentKind::Projectile => self.projectiles.contains(entity),
        }
    }

    pub fn has_all(&self, entity: Entity, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.has(entity, *kind))
    }

    /// Entities carrying every listed kind. An empty list matches nothing.
    pub fn entities_with(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        if kinds.is_empty() {
            return Vec::new();
        }
        self.entities
            .iter()
            .filter(|entity| self.has_all(*entity, kinds))
            .collect()
    }

    /// Kind-erased removal, used when tearing an entity down.
    pub fn remove_kind(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Transform => self.remove::<Transform>(entity).is_some(),
            ComponentKind::Physics => self.remove::<Physics>(entity).is_some(),
            ComponentKind::Collider => self.remove::<Collider>(entity).is_some(),
            ComponentKind::Render => self.remove::<Render>(entity).is_some(),
            ComponentKind::ParticleEmitter => self.remove::<ParticleEmitter>(entity).is_some(),
            ComponentKind::Ship => self.remove::<Ship>(entity).is_some(),
            ComponentKind::Asteroid => self.remove::<Asteroid>(entity).is_some(),
            ComponentKind::Projectile => self.remove::<Projectile>(entity).is_some(),
        }
    }

    /// Number of components attached to an entity.
    pub fn component_count(&self, entity: Entity) -> usize {
        ComponentKind::ALL
            .iter()
            .filter(|kind| self.has(entity, **kind))
            .count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
