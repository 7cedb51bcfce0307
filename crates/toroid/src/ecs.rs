//! Minimal entity/component store whose systems can reach the interaction
//! manager, plus the component that mirrors entities into hitboxes.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::color::HitboxColor;
use crate::hitbox::{BoundsFn, EventCallbacks, HitTestFn, HitboxData, HitboxId, HitboxPatch};
use crate::interaction::InteractionManager;
use crate::sprite::SpriteImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u64);

#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next = self.next.saturating_add(1);
        entity
    }
}

#[derive(Default)]
struct ComponentContainer {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl ComponentContainer {
    fn insert<T: 'static>(&mut self, component: T) {
        self.map.insert(TypeId::of::<T>(), Box::new(component));
    }

    fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>())?.downcast_ref()
    }

    fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    fn remove<T: 'static>(&mut self) -> Option<T> {
        let boxed = self.map.remove(&TypeId::of::<T>())?;
        boxed.downcast::<T>().ok().map(|component| *component)
    }

    fn has<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}

pub trait System {
    fn name(&self) -> &'static str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    fn update(&mut self, ecs: &mut Ecs, interaction: &mut InteractionManager);
}

#[derive(Default)]
pub struct Ecs {
    allocator: EntityAllocator,
    entities: BTreeMap<Entity, ComponentContainer>,
    pending_removals: Vec<Entity>,
    systems: Vec<Box<dyn System>>,
}

impl Ecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, ComponentContainer::default());
        entity
    }

    /// Marks `entity` for removal at the end of the next [`Ecs::update`], so
    /// every system in a tick sees the same entity set.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.contains_key(&entity) {
            warn!(entity = entity.0, "entity_remove_missing");
            return false;
        }
        self.pending_removals.push(entity);
        true
    }

    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn is_pending_removal(&self, entity: Entity) -> bool {
        self.pending_removals.contains(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn add_component<T: 'static>(&mut self, entity: Entity, component: T) -> bool {
        let Some(container) = self.entities.get_mut(&entity) else {
            warn!(entity = entity.0, "component_add_missing_entity");
            return false;
        };
        container.insert(component);
        true
    }

    pub fn get_component<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.entities.get(&entity)?.get()
    }

    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.entities.get_mut(&entity)?.get_mut()
    }

    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        self.entities.get_mut(&entity)?.remove()
    }

    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(ComponentContainer::has::<T>)
    }

    /// Entities carrying a `T`, in creation order.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|(_, container)| container.has::<T>())
            .map(|(entity, _)| *entity)
            .collect()
    }

    pub fn find_entity_by<T: 'static>(&self, predicate: impl Fn(&T) -> bool) -> Option<Entity> {
        self.entities
            .iter()
            .find(|(_, container)| container.get::<T>().is_some_and(&predicate))
            .map(|(entity, _)| *entity)
    }

    pub fn add_system(&mut self, system: impl System + 'static) {
        debug!(system = system.name(), priority = system.priority(), "system_added");
        self.systems.push(Box::new(system));
        self.systems.sort_by_key(|system| system.priority());
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs every system in ascending priority, then destroys entities
    /// marked for removal.
    pub fn update(&mut self, interaction: &mut InteractionManager) {
        let mut systems = std::mem::take(&mut self.systems);
        for system in &mut systems {
            system.update(self, interaction);
        }
        let added_during_update = std::mem::replace(&mut self.systems, systems);
        if !added_during_update.is_empty() {
            self.systems.extend(added_during_update);
            self.systems.sort_by_key(|system| system.priority());
        }
        self.apply_pending_removals();
    }

    fn apply_pending_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        self.pending_removals.sort();
        self.pending_removals.dedup();
        for entity in self.pending_removals.drain(..) {
            self.entities.remove(&entity);
        }
    }
}

/// Hitbox definition attached to an entity; the entity is the hitbox id.
#[derive(Clone, Default)]
pub struct HitboxComponent {
    pub layer: i32,
    pub bounding_box: Option<BoundsFn>,
    pub hit_test: Option<HitTestFn>,
    pub color: Option<HitboxColor>,
    pub image: Option<SpriteImage>,
    pub callbacks: EventCallbacks,
    pub data: HitboxData,
    /// Bumped by [`HitboxComponent::mark_changed`]; the sync system only
    /// re-upserts a record when this differs from what it last mirrored.
    pub revision: u64,
}

impl HitboxComponent {
    pub fn mark_changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn to_patch(&self) -> HitboxPatch {
        HitboxPatch {
            layer: Some(self.layer),
            bounding_box: self.bounding_box.clone(),
            hit_test: self.hit_test.clone(),
            color: self.color,
            image: self.image.clone(),
            callbacks: Some(self.callbacks.clone()),
            data: Some(self.data.clone()),
        }
    }
}

pub const HITBOX_SYNC_PRIORITY: i32 = 90;

/// Mirrors every [`HitboxComponent`] into the interaction manager and drops
/// records whose entity or component went away.
#[derive(Debug, Default)]
pub struct HitboxSyncSystem {
    synced: BTreeMap<Entity, u64>,
}

impl HitboxSyncSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for HitboxSyncSystem {
    fn name(&self) -> &'static str {
        "hitbox_sync"
    }

    fn priority(&self) -> i32 {
        HITBOX_SYNC_PRIORITY
    }

    fn update(&mut self, ecs: &mut Ecs, interaction: &mut InteractionManager) {
        let mut live = BTreeMap::new();
        for entity in ecs.entities_with::<HitboxComponent>() {
            if ecs.is_pending_removal(entity) {
                continue;
            }
            let Some(component) = ecs.get_component::<HitboxComponent>(entity) else {
                continue;
            };
            let id = HitboxId::Entity(entity);
            let unchanged = self.synced.get(&entity) == Some(&component.revision)
                && interaction.has_hitbox(&id);
            if !unchanged {
                interaction.upsert_hitbox(id, component.to_patch());
            }
            live.insert(entity, component.revision);
        }
        for stale in self.synced.keys().filter(|entity| !live.contains_key(entity)) {
            interaction.remove_hitbox(&HitboxId::Entity(*stale));
        }
        self.synced = live;
    }
}
