use hashlink::LinkedHashMap;
use tracing::{debug, warn};

use crate::color::HitboxColor;
use crate::hitbox::{Hitbox, HitboxId, HitboxPatch};

/// Insertion-ordered hitbox storage with a lazily rebuilt, layer-sorted view.
#[derive(Debug, Default)]
pub struct HitboxRegistry {
    records: LinkedHashMap<HitboxId, Hitbox>,
    flattened: Vec<Hitbox>,
    dirty: bool,
}

impl HitboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `patch` onto the record for `id`, creating it if needed.
    /// Existing records keep their insertion position.
    pub fn upsert(&mut self, id: HitboxId, patch: HitboxPatch) {
        match self.records.get_mut(&id) {
            Some(existing) => {
                existing.apply(patch);
                debug!(hitbox = %id, layer = existing.layer, "hitbox_updated");
            }
            None => {
                let mut hitbox = Hitbox::new(id.clone());
                hitbox.apply(patch);
                debug!(hitbox = %id, layer = hitbox.layer, "hitbox_registered");
                self.records.insert(id, hitbox);
            }
        }
        self.dirty = true;
    }

    pub fn remove(&mut self, id: &HitboxId) -> Option<Hitbox> {
        let Some(removed) = self.records.remove(id) else {
            warn!(hitbox = %id, "hitbox_remove_missing");
            return None;
        };
        self.dirty = true;
        Some(removed)
    }

    pub fn contains(&self, id: &HitboxId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &HitboxId) -> Option<&Hitbox> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn uses_color(&self, color: HitboxColor) -> bool {
        self.records
            .values()
            .any(|hitbox| hitbox.color == Some(color))
    }

    pub fn ids(&self) -> impl Iterator<Item = &HitboxId> {
        self.records.keys()
    }

    /// Removes every record and returns them in insertion order.
    pub fn clear(&mut self) -> Vec<Hitbox> {
        let drained = std::mem::take(&mut self.records)
            .into_iter()
            .map(|(_, hitbox)| hitbox)
            .collect();
        self.flattened.clear();
        self.dirty = false;
        drained
    }

    /// All records sorted ascending by layer; equal layers keep insertion order.
    pub fn flattened(&mut self) -> &[Hitbox] {
        if self.dirty {
            self.flattened.clear();
            self.flattened.extend(self.records.values().cloned());
            // `sort_by_key` is stable.
            self.flattened.sort_by_key(|hitbox| hitbox.layer);
            self.dirty = false;
        }
        &self.flattened
    }
}
