use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::color::HitboxColor;
use crate::ecs::Entity;
use crate::events::{EventKind, InputEvent, EVENT_KIND_COUNT};
use crate::geometry::{BoundingBox, Vec2};
use crate::sprite::SpriteImage;
use crate::surface::HitSurface;

pub const DEFAULT_LAYER: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HitboxId {
    Key(String),
    Entity(Entity),
}

impl From<&str> for HitboxId {
    fn from(key: &str) -> Self {
        HitboxId::Key(key.to_string())
    }
}

impl From<String> for HitboxId {
    fn from(key: String) -> Self {
        HitboxId::Key(key)
    }
}

impl From<Entity> for HitboxId {
    fn from(entity: Entity) -> Self {
        HitboxId::Entity(entity)
    }
}

impl fmt::Display for HitboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitboxId::Key(key) => f.write_str(key),
            HitboxId::Entity(entity) => write!(f, "entity#{}", entity.0),
        }
    }
}

pub type Callback = Rc<dyn Fn(&InputEvent)>;
pub type BoundsFn = Rc<dyn Fn() -> Option<BoundingBox>>;
pub type HitTestFn = Rc<dyn Fn(Vec2, &HitSurface) -> bool>;

/// Handler table indexed by [`EventKind::index`].
#[derive(Clone, Default)]
pub struct EventCallbacks {
    table: [Option<Callback>; EVENT_KIND_COUNT],
}

impl EventCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, kind: EventKind, callback: impl Fn(&InputEvent) + 'static) -> Self {
        self.set(kind, Rc::new(callback));
        self
    }

    pub fn set(&mut self, kind: EventKind, callback: Callback) {
        self.table[kind.index()] = Some(callback);
    }

    /// Runs `callback` after whatever handler `kind` already has.
    pub fn append(&mut self, kind: EventKind, callback: Callback) {
        let slot = &mut self.table[kind.index()];
        *slot = Some(match slot.take() {
            Some(existing) => {
                let chained: Callback = Rc::new(move |event: &InputEvent| {
                    existing(event);
                    callback(event);
                });
                chained
            }
            None => callback,
        });
    }

    pub fn clear(&mut self, kind: EventKind) {
        self.table[kind.index()] = None;
    }

    pub fn get(&self, kind: EventKind) -> Option<&Callback> {
        self.table[kind.index()].as_ref()
    }

    pub fn has(&self, kind: EventKind) -> bool {
        self.table[kind.index()].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.table.iter().all(Option::is_none)
    }
}

impl fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(
                EventKind::ALL
                    .into_iter()
                    .filter(|kind| self.has(*kind))
                    .map(EventKind::name),
            )
            .finish()
    }
}

/// Metadata shared between a hitbox record and the behavior that owns it.
/// Clones observe the same flags.
#[derive(Debug, Clone, Default)]
pub struct HitboxData {
    is_dragging: Rc<Cell<bool>>,
}

impl HitboxData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging.get()
    }

    pub fn set_dragging(&self, is_dragging: bool) {
        self.is_dragging.set(is_dragging);
    }
}

#[derive(Clone)]
pub struct Hitbox {
    pub id: HitboxId,
    /// Higher layers render later and win overlaps. 0-100 recommended.
    pub layer: i32,
    pub bounding_box: Option<BoundsFn>,
    pub hit_test: Option<HitTestFn>,
    pub color: Option<HitboxColor>,
    pub image: Option<SpriteImage>,
    pub callbacks: EventCallbacks,
    pub data: HitboxData,
}

impl Hitbox {
    pub fn new(id: HitboxId) -> Self {
        Self {
            id,
            layer: DEFAULT_LAYER,
            bounding_box: None,
            hit_test: None,
            color: None,
            image: None,
            callbacks: EventCallbacks::default(),
            data: HitboxData::default(),
        }
    }

    pub fn apply(&mut self, patch: HitboxPatch) {
        let HitboxPatch {
            layer,
            bounding_box,
            hit_test,
            color,
            image,
            callbacks,
            data,
        } = patch;
        if let Some(layer) = layer {
            self.layer = layer;
        }
        if bounding_box.is_some() {
            self.bounding_box = bounding_box;
        }
        if hit_test.is_some() {
            self.hit_test = hit_test;
        }
        if color.is_some() {
            self.color = color;
        }
        if image.is_some() {
            self.image = image;
        }
        if let Some(callbacks) = callbacks {
            self.callbacks = callbacks;
        }
        if let Some(data) = data {
            self.data = data;
        }
    }

    pub fn current_bounds(&self) -> Option<BoundingBox> {
        self.bounding_box.as_ref().and_then(|bounds| bounds())
    }

    /// A record with no spatial definition listens to the whole surface and
    /// only receives events no spatial record claimed.
    pub fn is_global(&self) -> bool {
        self.bounding_box.is_none()
            && self.hit_test.is_none()
            && self.color.is_none()
            && self.image.is_none()
    }

    pub fn callback(&self, kind: EventKind) -> Option<Callback> {
        self.callbacks.get(kind).cloned()
    }
}

impl fmt::Debug for Hitbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hitbox")
            .field("id", &self.id)
            .field("layer", &self.layer)
            .field("has_bounding_box", &self.bounding_box.is_some())
            .field("has_hit_test", &self.hit_test.is_some())
            .field("color", &self.color)
            .field("image", &self.image.as_ref().map(SpriteImage::source))
            .field("callbacks", &self.callbacks)
            .field("is_dragging", &self.data.is_dragging())
            .finish()
    }
}

/// Partial update for [`Hitbox::apply`]. Unset fields keep their value.
#[derive(Clone, Default)]
pub struct HitboxPatch {
    pub layer: Option<i32>,
    pub bounding_box: Option<BoundsFn>,
    pub hit_test: Option<HitTestFn>,
    pub color: Option<HitboxColor>,
    pub image: Option<SpriteImage>,
    pub callbacks: Option<EventCallbacks>,
    pub data: Option<HitboxData>,
}

impl HitboxPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn bounding_box(mut self, bounds: impl Fn() -> Option<BoundingBox> + 'static) -> Self {
        self.bounding_box = Some(Rc::new(bounds));
        self
    }

    pub fn fixed_box(self, bbox: BoundingBox) -> Self {
        self.bounding_box(move || Some(bbox))
    }

    pub fn hit_test(mut self, test: impl Fn(Vec2, &HitSurface) -> bool + 'static) -> Self {
        self.hit_test = Some(Rc::new(test));
        self
    }

    pub fn color(mut self, color: HitboxColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn image(mut self, image: SpriteImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn callbacks(mut self, callbacks: EventCallbacks) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Adds one handler to this patch's table. The table still replaces the
    /// record's table as a whole when applied.
    pub fn on(mut self, kind: EventKind, callback: impl Fn(&InputEvent) + 'static) -> Self {
        self.callbacks
            .get_or_insert_with(EventCallbacks::default)
            .set(kind, Rc::new(callback));
        self
    }

    pub fn data(mut self, data: HitboxData) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Debug for HitboxPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitboxPatch")
            .field("layer", &self.layer)
            .field("bounding_box", &self.bounding_box.is_some())
            .field("hit_test", &self.hit_test.is_some())
            .field("color", &self.color)
            .field("image", &self.image.as_ref().map(SpriteImage::source))
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn apply_merges_only_provided_fields() {
        let mut hitbox = Hitbox::new("panel".into());
        hitbox.apply(HitboxPatch::new().layer(5));
        hitbox.apply(HitboxPatch::new().color(HitboxColor::rgb(1, 2, 3)));

        assert_eq!(hitbox.layer, 5);
        assert_eq!(hitbox.color, Some(HitboxColor::rgb(1, 2, 3)));
        assert!(hitbox.bounding_box.is_none());
    }

    #[test]
    fn provided_callbacks_replace_the_whole_table() {
        let mut hitbox = Hitbox::new("panel".into());
        hitbox.apply(HitboxPatch::new().on(EventKind::MouseDown, |_| {}));
        hitbox.apply(HitboxPatch::new().on(EventKind::MouseUp, |_| {}));

        assert!(!hitbox.callbacks.has(EventKind::MouseDown));
        assert!(hitbox.callbacks.has(EventKind::MouseUp));
    }

    #[test]
    fn append_chains_handlers_in_order() {
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut callbacks = EventCallbacks::new();
        for label in ["first", "second"] {
            let log = Rc::clone(&log);
            callbacks.append(
                EventKind::MouseMove,
                Rc::new(move |_: &InputEvent| log.borrow_mut().push(label)),
            );
        }
        if let Some(callback) = callbacks.get(EventKind::MouseMove) {
            callback(&InputEvent::pointer(EventKind::MouseMove, 0.0, 0.0));
        }
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn global_classification_considers_every_spatial_field() {
        let mut hitbox = Hitbox::new("canvas".into());
        assert!(hitbox.is_global());
        hitbox.apply(HitboxPatch::new().hit_test(|_, _| true));
        assert!(!hitbox.is_global());

        let mut colored = Hitbox::new("colored".into());
        colored.apply(HitboxPatch::new().color(HitboxColor::rgb(0, 0, 1)));
        assert!(!colored.is_global());
    }

    #[test]
    fn bounds_accessor_is_evaluated_lazily() {
        let visible = Rc::new(Cell::new(false));
        let visible_in_accessor = Rc::clone(&visible);
        let mut hitbox = Hitbox::new("popup".into());
        hitbox.apply(HitboxPatch::new().bounding_box(move || {
            visible_in_accessor
                .get()
                .then(|| BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0))
        }));

        assert!(hitbox.current_bounds().is_none());
        visible.set(true);
        assert!(hitbox.current_bounds().is_some());
    }

    #[test]
    fn data_clones_share_drag_flag() {
        let data = HitboxData::new();
        let shared = data.clone();
        shared.set_dragging(true);
        assert!(data.is_dragging());
    }

    #[test]
    fn entity_ids_display_distinctly_from_keys() {
        assert_eq!(HitboxId::from("btn").to_string(), "btn");
        assert_eq!(HitboxId::from(Entity(7)).to_string(), "entity#7");
        assert_ne!(HitboxId::from("entity#7"), HitboxId::from(Entity(7)));
    }
}
