//! Simulation World
//!
//! The world owns the entity registry, the ordered system list and the
//! message bus, and drives one simulation step per `update` call:
//!
//! 1. `preUpdate`
//! 2. every enabled system, ascending priority, on its eligible entities
//! 3. `postUpdate` (deferred removals flush here)
//!
//! Lifecycle changes are mirrored onto the bus. One live simulation per
//! process: `destroy` wipes every listener on the bus, so worlds that share
//! a bus must not outlive each other's destruction.

use log::{debug, info};

use super::entity::Entity;
use super::error::EngineError;
use super::component::ComponentKind;
use super::message::{Context, Message, MessageBus, Subscription, WorldMessage};
use super::registry::{EntityBuilder, Registry};
use super::system::System;

struct SystemEntry {
    system: Box<dyn System>,
    enabled: bool,
    /// Registration order
    seq: u64,
}

pub struct World {
    registry: Registry,
    /// Sorted by priority; ties keep insertion order
    systems: Vec<SystemEntry>,
    next_seq: u64,
    bus: MessageBus,
    /// Handlers registered through `Context::on` by systems and games
    subscriptions: Vec<Subscription>,
    elapsed: f32,
    running: bool,
}

impl World {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            registry: Registry::new(),
            systems: Vec::new(),
            next_seq: 0,
            bus,
            subscriptions: Vec::new(),
            elapsed: 0.0,
            running: false,
        }
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Borrow the registry and bus as a handler would see them.
    pub fn context(&mut self) -> Context<'_> {
        Context::new(&mut self.registry, &self.bus, &mut self.subscriptions)
    }

    pub fn emit(&mut self, message: Message) {
        self.context().emit(message);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulated seconds since the last clear.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // =========================================================================
    // Entities
    // =========================================================================

    pub fn add_entity(&mut self, builder: EntityBuilder) -> Entity {
        self.context().spawn(builder)
    }

    /// No-op (false) for entities that are not alive.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        self.context().despawn(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.registry.entities()
    }

    pub fn entities_with(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.registry.entities_with(kinds)
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Register a system, re-sort by priority, then run its `init`.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> Result<(), EngineError> {
        debug!("adding system {} (priority {})", system.name(), system.priority());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.systems.push(SystemEntry {
            system: Box::new(system),
            enabled: true,
            seq,
        });
        // sort_by_key is stable: equal priorities keep insertion order
        self.systems.sort_by_key(|entry| entry.system.priority());
        let Some(position) = self.systems.iter().position(|entry| entry.seq == seq) else {
            return Ok(());
        };

        let mut ctx = Context::new(&mut self.registry, &self.bus, &mut self.subscriptions);
        self.systems[position].system.init(&mut ctx)
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|entry| entry.system.name()).collect()
    }

    /// Disabled systems are skipped entirely. False if no such system.
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for entry in self.systems.iter_mut().filter(|e| e.system.name() == name) {
            entry.enabled = enabled;
            found = true;
        }
        found
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!("world started");
        self.emit(Message::World(WorldMessage::Started));
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!("world stopped");
        self.emit(Message::World(WorldMessage::Stopped));
    }

    /// Advance one step. Does nothing while stopped.
    pub fn update(&mut self, dt: f32) -> Result<(), EngineError> {
        if !self.running {
            return Ok(());
        }
        self.elapsed += dt;

        let mut ctx = Context::new(&mut self.registry, &self.bus, &mut self.subscriptions);
        ctx.emit(Message::World(WorldMessage::PreUpdate { dt }));

        for entry in self.systems.iter_mut().filter(|entry| entry.enabled) {
            let registry: &Registry = &*ctx.registry;
            let eligible: Vec<Entity> = registry
                .entities()
                .into_iter()
                .filter(|entity| entry.system.should_process(registry, *entity))
                .collect();
            entry.system.update(&eligible, dt, &mut ctx)?;
        }

        ctx.emit(Message::World(WorldMessage::PostUpdate { dt }));
        Ok(())
    }

    /// Rerun the drawing systems on the current state, running or not.
    /// No time passes and no update messages go out.
    pub fn redraw(&mut self) -> Result<(), EngineError> {
        let mut ctx = Context::new(&mut self.registry, &self.bus, &mut self.subscriptions);
        for entry in self.systems.iter_mut().filter(|e| e.enabled && e.system.draws()) {
            let registry: &Registry = &*ctx.registry;
            let eligible: Vec<Entity> = registry
                .entities()
                .into_iter()
                .filter(|entity| entry.system.should_process(registry, *entity))
                .collect();
            entry.system.update(&eligible, 0.0, &mut ctx)?;
        }
        Ok(())
    }

    /// Drop every entity and system, release this world's subscriptions
    /// and reset the clock.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.systems.clear();
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        self.elapsed = 0.0;
        info!("world cleared");
        self.emit(Message::World(WorldMessage::Cleared));
    }

    /// Stop, clear, announce, then wipe every listener on the bus.
    pub fn destroy(&mut self) {
        self.stop();
        self.clear();
        self.emit(Message::World(WorldMessage::Destroyed));
        self.bus.clear_all_listeners();
        info!("world destroyed");
    }
}
