//! Message Bus
//!
//! Systems never call each other. They publish typed messages on a
//! `MessageBus` and whoever cares subscribes:
//!
//! 1. Ship control reads input and publishes `playerFire`
//! 2. The projectile system hears it and spawns a bullet
//! 3. Collision publishes `collision.detect` when the bullet hits
//! 4. Cleanup removes both and publishes `projectileHit`
//! 5. The explosion system spawns particles at the hit position
//!
//! Dispatch is synchronous: `emit` runs every handler registered for the
//! kind, in registration order, before returning. Handlers may emit in
//! turn (resolved depth-first). The handler list is snapshotted per emit,
//! so subscribing or disposing during dispatch affects the next emit only.
//!
//! A bus is an explicitly constructed handle (cloning shares it). The world
//! owns one and passes it down through `Context`; there is no global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use macroquad::math::Vec2;

use super::components::Collider;
use super::entity::Entity;
use super::registry::{EntityBuilder, Registry};

// =============================================================================
// Message catalog
// =============================================================================

/// Topic a handler subscribes to. `as_str` gives the wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    // World lifecycle
    WorldStarted,
    WorldStopped,
    WorldCleared,
    WorldDestroyed,
    PreUpdate,
    PostUpdate,
    EntityAdded,
    EntityRemoved,
    // Player
    PlayerFire,
    PlayerDie,
    PlayerRespawn,
    // Collision
    CollisionDetect,
    CollisionResolve,
    // Game
    ScoreChanged,
    LevelChanged,
    GameOver,
    GameInitialized,
    GameStarted,
    GamePaused,
    GameResumed,
    GameStopped,
    GameRestarted,
    // Projectile
    ProjectileFire,
    ProjectileHit,
    ProjectileExpire,
    // Entity
    EntityCreated,
    EntityDestroyed,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::WorldStarted => "worldStarted",
            MessageKind::WorldStopped => "worldStopped",
            MessageKind::WorldCleared => "worldCleared",
            MessageKind::WorldDestroyed => "worldDestroyed",
            MessageKind::PreUpdate => "preUpdate",
            MessageKind::PostUpdate => "postUpdate",
            MessageKind::EntityAdded => "entityAdded",
            MessageKind::EntityRemoved => "entityRemoved",
            MessageKind::PlayerFire => "playerFire",
            MessageKind::PlayerDie => "playerDie",
            MessageKind::PlayerRespawn => "playerRespawn",
            MessageKind::CollisionDetect => "collision.detect",
            MessageKind::CollisionResolve => "collision.resolve",
            MessageKind::ScoreChanged => "scoreChanged",
            MessageKind::LevelChanged => "levelChanged",
            MessageKind::GameOver => "gameOver",
            MessageKind::GameInitialized => "gameInitialized",
            MessageKind::GameStarted => "gameStarted",
            MessageKind::GamePaused => "gamePaused",
            MessageKind::GameResumed => "gameResumed",
            MessageKind::GameStopped => "gameStopped",
            MessageKind::GameRestarted => "gameRestarted",
            MessageKind::ProjectileFire => "projectileFire",
            MessageKind::ProjectileHit => "projectileHit",
            MessageKind::ProjectileExpire => "projectileExpire",
            MessageKind::EntityCreated => "entityCreated",
            MessageKind::EntityDestroyed => "entityDestroyed",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `playerFire` payload
#[derive(Debug, Clone, PartialEq)]
pub struct FireEvent {
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub source_entity: Option<Entity>,
}

/// `collision.detect` / `collision.resolve` payload
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub entity_a: Entity,
    pub entity_b: Entity,
    pub collider_a: Collider,
    pub collider_b: Collider,
}

impl CollisionEvent {
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }
}

/// `projectileHit` payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub position: Vec2,
    pub projectile: Entity,
    pub asteroid: Entity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldMessage {
    Started,
    Stopped,
    Cleared,
    Destroyed,
    PreUpdate { dt: f32 },
    PostUpdate { dt: f32 },
    EntityAdded { entity: Entity },
    EntityRemoved { entity: Entity },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerMessage {
    Fire(FireEvent),
    Die { position: Vec2 },
    Respawn { entity: Entity },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionMessage {
    Detect(CollisionEvent),
    Resolve(CollisionEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    ScoreChanged { score: u32, delta: u32 },
    LevelChanged { wave: u32, asteroids: u32 },
    GameOver { score: u32 },
    Initialized { name: String },
    Started,
    Paused,
    Resumed,
    Stopped,
    Restarted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileMessage {
    Fire { projectile: Entity, owner: Option<Entity> },
    Hit(HitEvent),
    Expire { projectile: Entity },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityMessage {
    Created { entity: Entity },
    Destroyed { entity: Entity },
}

/// Everything that can travel over the bus, grouped by category.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    World(WorldMessage),
    Player(PlayerMessage),
    Collision(CollisionMessage),
    Game(GameMessage),
    Projectile(ProjectileMessage),
    Entity(EntityMessage),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::World(m) => match m {
                WorldMessage::Started => MessageKind::WorldStarted,
                WorldMessage::Stopped => MessageKind::WorldStopped,
                WorldMessage::Cleared => MessageKind::WorldCleared,
                WorldMessage::Destroyed => MessageKind::WorldDestroyed,
                WorldMessage::PreUpdate { .. } => MessageKind::PreUpdate,
                WorldMessage::PostUpdate { .. } => MessageKind::PostUpdate,
                WorldMessage::EntityAdded { .. } => MessageKind::EntityAdded,
                WorldMessage::EntityRemoved { .. } => MessageKind::EntityRemoved,
            },
            Message::Player(m) => match m {
                PlayerMessage::Fire(_) => MessageKind::PlayerFire,
                PlayerMessage::Die { .. } => MessageKind::PlayerDie,
                PlayerMessage::Respawn { .. } => MessageKind::PlayerRespawn,
            },
            Message::Collision(m) => match m {
                CollisionMessage::Detect(_) => MessageKind::CollisionDetect,
                CollisionMessage::Resolve(_) => MessageKind::CollisionResolve,
            },
            Message::Game(m) => match m {
                GameMessage::ScoreChanged { .. } => MessageKind::ScoreChanged,
                GameMessage::LevelChanged { .. } => MessageKind::LevelChanged,
                GameMessage::GameOver { .. } => MessageKind::GameOver,
                GameMessage::Initialized { .. } => MessageKind::GameInitialized,
                GameMessage::Started => MessageKind::GameStarted,
                GameMessage::Paused => MessageKind::GamePaused,
                GameMessage::Resumed => MessageKind::GameResumed,
                GameMessage::Stopped => MessageKind::GameStopped,
                GameMessage::Restarted => MessageKind::GameRestarted,
            },
            Message::Projectile(m) => match m {
                ProjectileMessage::Fire { .. } => MessageKind::ProjectileFire,
                ProjectileMessage::Hit(_) => MessageKind::ProjectileHit,
                ProjectileMessage::Expire { .. } => MessageKind::ProjectileExpire,
            },
            Message::Entity(m) => match m {
                EntityMessage::Created { .. } => MessageKind::EntityCreated,
                EntityMessage::Destroyed { .. } => MessageKind::EntityDestroyed,
            },
        }
    }
}

/// The entity a message was published from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub entity: Entity,
    pub name: Option<String>,
}

/// A message as handlers see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: Message,
    pub origin: Option<Origin>,
}

impl Envelope {
    pub fn new(message: Message) -> Self {
        Self { message, origin: None }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    pub fn origin_entity(&self) -> Option<Entity> {
        self.origin.as_ref().map(|o| o.entity)
    }
}

// =============================================================================
// Bus
// =============================================================================

/// Handlers are shared, not exclusive: a handler may be re-entered while it
/// is still running (a nested emit of its own kind), so any state it
/// mutates lives behind a `Cell` or `RefCell`.
pub type Handler = dyn Fn(&Envelope, &mut Context<'_>);

type HandlerRef = Rc<Handler>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_kind: HashMap<MessageKind, Vec<(u64, HandlerRef)>>,
}

/// Shared publish/subscribe hub. Clones refer to the same listener table.
#[derive(Clone, Default)]
pub struct MessageBus {
    listeners: Rc<RefCell<Listeners>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Keep the returned subscription to unsubscribe.
    pub fn on<F>(&self, kind: MessageKind, handler: F) -> Subscription
    where
        F: Fn(&Envelope, &mut Context<'_>) + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        let handler: HandlerRef = Rc::new(handler);
        listeners.by_kind.entry(kind).or_default().push((id, handler));

        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            kind,
            id,
        }
    }

    /// Deliver an envelope to every handler registered for its kind.
    pub fn publish(&self, envelope: &Envelope, ctx: &mut Context<'_>) {
        let kind = envelope.kind();
        let snapshot: Vec<HandlerRef> = {
            let listeners = self.listeners.borrow();
            match listeners.by_kind.get(&kind) {
                Some(list) => list.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            handler(envelope, ctx);
        }
    }

    pub fn clear_listeners(&self, kind: MessageKind) {
        self.listeners.borrow_mut().by_kind.remove(&kind);
    }

    pub fn clear_all_listeners(&self) {
        self.listeners.borrow_mut().by_kind.clear();
    }

    pub fn has_listeners(&self, kind: MessageKind) -> bool {
        self.listener_count(kind) > 0
    }

    pub fn listener_count(&self, kind: MessageKind) -> usize {
        self.listeners.borrow().by_kind.get(&kind).map_or(0, Vec::len)
    }
}

/// Handle to one registered handler.
///
/// Dropping it leaves the handler registered; call `dispose`.
pub struct Subscription {
    listeners: Weak<RefCell<Listeners>>,
    kind: MessageKind,
    id: u64,
}

impl Subscription {
    /// Unregister. Safe to call more than once, and after the bus is gone.
    pub fn dispose(&self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = listeners.borrow_mut();
        if let Some(list) = listeners.by_kind.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
            if list.is_empty() {
                listeners.by_kind.remove(&self.kind);
            }
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

// =============================================================================
// Context
// =============================================================================

/// What a system or handler gets to work with during a step: the entity
/// registry, the bus, and the owner's subscription list.
pub struct Context<'a> {
    pub registry: &'a mut Registry,
    bus: MessageBus,
    subscriptions: &'a mut Vec<Subscription>,
}

impl<'a> Context<'a> {
    pub fn new(
        registry: &'a mut Registry,
        bus: &MessageBus,
        subscriptions: &'a mut Vec<Subscription>,
    ) -> Self {
        Self {
            registry,
            bus: bus.clone(),
            subscriptions,
        }
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn emit(&mut self, message: Message) {
        self.publish(Envelope::new(message));
    }

    /// Emit on behalf of an entity. The envelope carries its handle and
    /// debug name.
    pub fn emit_from(&mut self, entity: Entity, message: Message) {
        let origin = Origin {
            entity,
            name: self.registry.name(entity).map(str::to_string),
        };
        self.publish(Envelope {
            message,
            origin: Some(origin),
        });
    }

    pub fn publish(&mut self, envelope: Envelope) {
        let bus = self.bus.clone();
        bus.publish(&envelope, self);
    }

    /// Subscribe for as long as the owner (usually the world) lives.
    pub fn on<F>(&mut self, kind: MessageKind, handler: F)
    where
        F: Fn(&Envelope, &mut Context<'_>) + 'static,
    {
        let subscription = self.bus.on(kind, handler);
        self.subscriptions.push(subscription);
    }

    /// Subscribe for as long as `entity` lives.
    pub fn on_entity<F>(&mut self, entity: Entity, kind: MessageKind, handler: F)
    where
        F: Fn(&Envelope, &mut Context<'_>) + 'static,
    {
        let subscription = self.bus.on(kind, handler);
        self.registry.own_subscription(entity, subscription);
    }

    /// Spawn an entity and announce it with `entityAdded`.
    pub fn spawn(&mut self, builder: EntityBuilder) -> Entity {
        let entity = self.registry.spawn(builder);
        self.emit(Message::World(WorldMessage::EntityAdded { entity }));
        entity
    }

    /// Despawn an entity, announcing `entityRemoved` if it was alive.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let removed = self.registry.despawn(entity);
        if removed {
            self.emit(Message::World(WorldMessage::EntityRemoved { entity }));
        }
        removed
    }
}

// =============================================================================
// Test support
// =============================================================================

/// Collects every envelope published for a set of kinds.
#[cfg(test)]
pub(crate) struct Recorder {
    seen: Rc<RefCell<Vec<Envelope>>>,
    subscriptions: Vec<Subscription>,
}

#[cfg(test)]
impl Recorder {
    pub fn new(bus: &MessageBus, kinds: &[MessageKind]) -> Self {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let subscriptions = kinds
            .iter()
            .map(|kind| {
                let seen = Rc::clone(&seen);
                bus.on(*kind, move |envelope, _| seen.borrow_mut().push(envelope.clone()))
            })
            .collect();
        Self { seen, subscriptions }
    }

    pub fn count(&self, kind: MessageKind) -> usize {
        self.seen.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn envelopes(&self, kind: MessageKind) -> Vec<Envelope> {
        self.seen
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn kinds(&self) -> Vec<MessageKind> {
        self.seen.borrow().iter().map(Envelope::kind).collect()
    }

    pub fn stop(&self) {
        for subscription in &self.subscriptions {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Message {
        Message::World(WorldMessage::Started)
    }

    struct Harness {
        registry: Registry,
        subscriptions: Vec<Subscription>,
        bus: MessageBus,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registry: Registry::new(),
                subscriptions: Vec::new(),
                bus: MessageBus::new(),
            }
        }

        fn ctx(&mut self) -> Context<'_> {
            Context::new(&mut self.registry, &self.bus, &mut self.subscriptions)
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut h = Harness::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            h.bus.on(MessageKind::WorldStarted, move |_, _| order.borrow_mut().push(tag));
        }

        h.ctx().emit(started());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let mut h = Harness::new();
        h.ctx().emit(started());
        assert!(!h.bus.has_listeners(MessageKind::WorldStarted));
    }

    #[test]
    fn test_dispose_twice_is_noop() {
        let h = Harness::new();
        let sub = h.bus.on(MessageKind::PlayerFire, |_, _| {});
        let other = h.bus.on(MessageKind::PlayerFire, |_, _| {});
        assert_eq!(h.bus.listener_count(MessageKind::PlayerFire), 2);

        sub.dispose();
        sub.dispose();
        assert_eq!(h.bus.listener_count(MessageKind::PlayerFire), 1);
        other.dispose();
        assert!(!h.bus.has_listeners(MessageKind::PlayerFire));
    }

    #[test]
    fn test_dispose_after_bus_dropped() {
        let bus = MessageBus::new();
        let sub = bus.on(MessageKind::GameOver, |_, _| {});
        drop(bus);
        sub.dispose();
    }

    #[test]
    fn test_subscribe_during_dispatch_waits_for_next_emit() {
        let mut h = Harness::new();
        let late_calls = Rc::new(RefCell::new(0));
        let late = Rc::clone(&late_calls);
        h.bus.on(MessageKind::WorldStarted, move |_, ctx| {
            let late = Rc::clone(&late);
            ctx.on(MessageKind::WorldStarted, move |_, _| *late.borrow_mut() += 1);
        });

        h.ctx().emit(started());
        assert_eq!(*late_calls.borrow(), 0);
        h.ctx().emit(started());
        assert_eq!(*late_calls.borrow(), 1);
    }

    #[test]
    fn test_dispose_during_dispatch_still_runs_snapshot() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let v = Rc::clone(&victim);
        h.bus.on(MessageKind::WorldStarted, move |_, _| {
            if let Some(sub) = v.borrow_mut().take() {
                sub.dispose();
            }
        });
        let c = Rc::clone(&calls);
        *victim.borrow_mut() = Some(h.bus.on(MessageKind::WorldStarted, move |_, _| *c.borrow_mut() += 1));

        h.ctx().emit(started());
        assert_eq!(*calls.borrow(), 1);
        h.ctx().emit(started());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_reentrant_emit_resolves_depth_first() {
        let mut h = Harness::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        h.bus.on(MessageKind::WorldStarted, move |_, ctx| {
            l.borrow_mut().push("outer-1 start");
            ctx.emit(Message::World(WorldMessage::Stopped));
            l.borrow_mut().push("outer-1 end");
        });
        let l = Rc::clone(&log);
        h.bus.on(MessageKind::WorldStarted, move |_, _| l.borrow_mut().push("outer-2"));
        let l = Rc::clone(&log);
        h.bus.on(MessageKind::WorldStopped, move |_, _| l.borrow_mut().push("inner"));

        h.ctx().emit(started());
        assert_eq!(
            *log.borrow(),
            vec!["outer-1 start", "inner", "outer-1 end", "outer-2"]
        );
    }

    #[test]
    fn test_self_reentry_delivers_depth_first() {
        let mut h = Harness::new();
        let parent = h.registry.create();
        let child = h.registry.create();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        h.bus.on(MessageKind::EntityDestroyed, move |envelope, ctx| {
            let Message::Entity(EntityMessage::Destroyed { entity }) = &envelope.message else {
                return;
            };
            s.borrow_mut().push(*entity);
            // Cascade exactly one level
            if *entity == parent {
                ctx.emit(Message::Entity(EntityMessage::Destroyed { entity: child }));
            }
        });
        let l = Rc::clone(&log);
        h.bus.on(MessageKind::EntityDestroyed, move |envelope, _| {
            if let Message::Entity(EntityMessage::Destroyed { entity }) = &envelope.message {
                l.borrow_mut().push(*entity);
            }
        });

        h.ctx().emit(Message::Entity(EntityMessage::Destroyed { entity: parent }));

        assert_eq!(*seen.borrow(), vec![parent, child]);
        // The nested emit reaches every handler before the outer one moves on
        assert_eq!(*log.borrow(), vec![child, parent]);
    }

    #[test]
    fn test_clear_listeners() {
        let h = Harness::new();
        h.bus.on(MessageKind::GameStarted, |_, _| {});
        h.bus.on(MessageKind::GamePaused, |_, _| {});

        h.bus.clear_listeners(MessageKind::GameStarted);
        assert!(!h.bus.has_listeners(MessageKind::GameStarted));
        assert!(h.bus.has_listeners(MessageKind::GamePaused));

        h.bus.clear_all_listeners();
        assert!(!h.bus.has_listeners(MessageKind::GamePaused));
    }

    #[test]
    fn test_emit_from_carries_origin() {
        let mut h = Harness::new();
        let ship = h.registry.spawn(EntityBuilder::named("Player Ship"));
        let recorder = Recorder::new(&h.bus, &[MessageKind::PlayerDie]);

        h.ctx().emit_from(
            ship,
            Message::Player(PlayerMessage::Die { position: Vec2::new(1.0, 2.0) }),
        );

        let seen = recorder.envelopes(MessageKind::PlayerDie);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].origin_entity(), Some(ship));
        assert_eq!(
            seen[0].origin.as_ref().and_then(|o| o.name.as_deref()),
            Some("Player Ship")
        );
    }

    #[test]
    fn test_entity_subscriptions_die_with_entity() {
        let mut h = Harness::new();
        let e = h.registry.spawn(EntityBuilder::new());
        h.ctx().on_entity(e, MessageKind::LevelChanged, |_, _| {});
        assert!(h.bus.has_listeners(MessageKind::LevelChanged));

        assert!(h.ctx().despawn(e));
        assert!(!h.bus.has_listeners(MessageKind::LevelChanged));
    }

    #[test]
    fn test_spawn_and_despawn_announce() {
        let mut h = Harness::new();
        let recorder = Recorder::new(&h.bus, &[MessageKind::EntityAdded, MessageKind::EntityRemoved]);

        let e = h.ctx().spawn(EntityBuilder::new());
        assert!(h.ctx().despawn(e));
        assert!(!h.ctx().despawn(e));

        assert_eq!(
            recorder.kinds(),
            vec![MessageKind::EntityAdded, MessageKind::EntityRemoved]
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(MessageKind::CollisionDetect.as_str(), "collision.detect");
        assert_eq!(MessageKind::PlayerFire.to_string(), "playerFire");
        let msg = Message::Game(GameMessage::LevelChanged { wave: 1, asteroids: 4 });
        assert_eq!(msg.kind(), MessageKind::LevelChanged);
    }
}
