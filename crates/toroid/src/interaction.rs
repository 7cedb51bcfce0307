//! Spatial event dispatch over a registry of layered hitboxes.
//!
//! Color-identified hitboxes are painted into an offscreen [`HitSurface`] in
//! ascending layer order, so a single pixel read tells which one is on top at
//! any point. Pointer events are resolved to at most one hitbox; cross-event
//! gesture tracking then keeps press/release, drag and hover-exit callbacks
//! firing on the record that started the gesture.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info};

use crate::color::HitboxColor;
use crate::color_heap::{ColorHeap, ColorHeapError};
use crate::events::{EventKind, EventKindSet, InputEvent};
use crate::geometry::{BoundingBox, Vec2};
use crate::hitbox::{Callback, Hitbox, HitboxId, HitboxPatch};
use crate::raster::{self, ScreenRectPx};
use crate::registry::HitboxRegistry;
use crate::sprite::{self, SpriteImage};
use crate::surface::{HitSurface, SurfaceError};

type ColorizedCache = HashMap<(Arc<str>, HitboxColor), RgbaImage>;

/// What a single [`InteractionManager::dispatch`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Record the event resolved to, spatially or as a global listener.
    pub target: Option<HitboxId>,
    /// Whether `target` had a callback for the event kind.
    pub delivered: bool,
    /// Record that additionally received the event through gesture tracking
    /// (release outside, drag redirect).
    pub redirected_to: Option<HitboxId>,
}

pub struct InteractionManager {
    registry: HitboxRegistry,
    surface: HitSurface,
    color_heap: ColorHeap,
    colorized: ColorizedCache,
    listeners: EventKindSet,
    keyboard_focus: Option<HitboxId>,
    mouse_down_target: Option<HitboxId>,
    mouse_up_callback: Option<Callback>,
    mouse_move_target: Option<HitboxId>,
    mouse_out_callback: Option<Callback>,
    dispatched_events: u64,
}

impl InteractionManager {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            registry: HitboxRegistry::new(),
            surface: HitSurface::new(width, height)?,
            color_heap: ColorHeap::new(),
            colorized: HashMap::new(),
            listeners: EventKindSet::empty(),
            keyboard_focus: None,
            mouse_down_target: None,
            mouse_up_callback: None,
            mouse_move_target: None,
            mouse_out_callback: None,
            dispatched_events: 0,
        })
    }

    pub fn register_event_listener(&mut self, kind: EventKind) {
        self.listeners.insert(kind);
        debug!(kind = kind.name(), "event_listener_registered");
    }

    pub fn deregister_event_listener(&mut self, kind: EventKind) {
        self.listeners.remove(kind);
        debug!(kind = kind.name(), "event_listener_deregistered");
    }

    pub fn listens_to(&self, kind: EventKind) -> bool {
        self.listeners.contains(kind)
    }

    /// Entry point for host events: only kinds with a registered listener are dispatched.
    pub fn handle_host_event(&mut self, event: &InputEvent) -> Option<DispatchOutcome> {
        self.listeners
            .contains(event.kind)
            .then(|| self.dispatch(event))
    }

    pub fn dispatch(&mut self, event: &InputEvent) -> DispatchOutcome {
        self.dispatched_events = self.dispatched_events.saturating_add(1);
        if event.kind.is_keyboard() {
            return self.dispatch_keyboard(event);
        }

        let kind = event.kind;
        let spatial = match event.offset {
            Some(point) => self
                .hitbox_at(point)
                .map(|hitbox| (hitbox.id.clone(), hitbox.callback(kind))),
            None => None,
        };
        let resolved = spatial.or_else(|| {
            self.global_listener(kind)
                .map(|(id, callback)| (id, Some(callback)))
        });

        let (target, callback) = match resolved {
            Some((id, callback)) => (Some(id), callback),
            None => (None, None),
        };
        let delivered = invoke(callback.as_ref(), event);

        let redirected_to = match kind {
            EventKind::MouseDown => {
                self.track_press(target.as_ref());
                None
            }
            EventKind::MouseUp => self.track_release(target.as_ref(), event),
            EventKind::MouseMove => self.track_move(target.as_ref(), event),
            EventKind::MouseOut => self.track_leave(target.as_ref(), delivered, event),
            _ => None,
        };

        DispatchOutcome {
            target,
            delivered,
            redirected_to,
        }
    }

    /// Highest-layer record whose hit test passes at `point`. Equal layers
    /// resolve to the most recently registered record, matching paint order.
    pub fn hitbox_at(&mut self, point: Vec2) -> Option<&Hitbox> {
        let surface = &self.surface;
        self.registry
            .flattened()
            .iter()
            .rev()
            .find(|hitbox| passes_hit_test(hitbox, point, surface))
    }

    pub fn upsert_hitbox(&mut self, id: impl Into<HitboxId>, patch: HitboxPatch) {
        let id = id.into();
        let replaced_color = match (self.registry.get(&id), patch.color) {
            (Some(existing), Some(next)) => existing.color.filter(|current| *current != next),
            _ => None,
        };
        self.registry.upsert(id, patch);
        if let Some(color) = replaced_color {
            self.release_color(color);
        }
    }

    /// Removes the record, forgets any gesture it was part of and releases
    /// its color once no other record paints with it.
    pub fn remove_hitbox(&mut self, id: &HitboxId) -> Option<Hitbox> {
        let removed = self.registry.remove(id)?;
        if self.mouse_down_target.as_ref() == Some(id) {
            self.mouse_down_target = None;
            self.mouse_up_callback = None;
        }
        if self.mouse_move_target.as_ref() == Some(id) {
            self.mouse_move_target = None;
            self.mouse_out_callback = None;
        }
        if let Some(color) = removed.color {
            self.release_color(color);
        }
        Some(removed)
    }

    pub fn has_hitbox(&self, id: &HitboxId) -> bool {
        self.registry.contains(id)
    }

    pub fn hitbox(&self, id: &HitboxId) -> Option<&Hitbox> {
        self.registry.get(id)
    }

    pub fn hitbox_count(&self) -> usize {
        self.registry.len()
    }

    /// Takes the next identity color from the heap.
    pub fn allocate_color(&mut self) -> Result<HitboxColor, ColorHeapError> {
        self.color_heap.get_next()
    }

    pub fn color_heap_mut(&mut self) -> &mut ColorHeap {
        &mut self.color_heap
    }

    /// Repaints the hit surface from scratch.
    pub fn render(&mut self) {
        self.surface.clear();
        paint_index(
            self.registry.flattened(),
            &mut self.colorized,
            &mut self.surface,
        );
    }

    /// Paints the same index image over an arbitrary RGBA frame.
    pub fn render_into(&mut self, frame: &mut [u8], width: u32, height: u32) {
        let mut target = FrameTarget {
            frame,
            width,
            height,
        };
        paint_index(self.registry.flattened(), &mut self.colorized, &mut target);
    }

    pub fn surface(&self) -> &HitSurface {
        &self.surface
    }

    pub fn update_canvas_size(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.surface.resize(width, height)?;
        info!(width, height, "hit_surface_resized");
        Ok(())
    }

    pub fn register_keyboard_focus(&mut self, id: impl Into<HitboxId>) {
        let id = id.into();
        debug!(hitbox = %id, "keyboard_focus_registered");
        self.keyboard_focus = Some(id);
    }

    pub fn deregister_keyboard_focus(&mut self) {
        self.keyboard_focus = None;
    }

    pub fn keyboard_focus(&self) -> Option<&HitboxId> {
        self.keyboard_focus.as_ref()
    }

    pub fn mouse_down_target(&self) -> Option<&HitboxId> {
        self.mouse_down_target.as_ref()
    }

    pub fn mouse_move_target(&self) -> Option<&HitboxId> {
        self.mouse_move_target.as_ref()
    }

    pub fn dispatched_events(&self) -> u64 {
        self.dispatched_events
    }

    /// Drops every listener, record and cached sprite, releasing identity colors.
    pub fn clean(&mut self) {
        self.listeners = EventKindSet::empty();
        for hitbox in self.registry.clear() {
            if let Some(color) = hitbox.color {
                self.color_heap.release(color);
            }
        }
        self.colorized.clear();
        self.keyboard_focus = None;
        self.mouse_down_target = None;
        self.mouse_up_callback = None;
        self.mouse_move_target = None;
        self.mouse_out_callback = None;
        info!("interaction_manager_cleaned");
    }

    fn release_color(&mut self, color: HitboxColor) {
        if self.registry.uses_color(color) {
            debug!(color = %color, "color_release_deferred_shared");
            return;
        }
        self.color_heap.release(color);
        self.colorized.retain(|(_, cached), _| *cached != color);
    }

    fn dispatch_keyboard(&mut self, event: &InputEvent) -> DispatchOutcome {
        let kind = event.kind;
        if let Some(focus) = self.keyboard_focus.clone() {
            let callback = self
                .registry
                .get(&focus)
                .and_then(|hitbox| hitbox.callback(kind));
            let delivered = invoke(callback.as_ref(), event);
            return DispatchOutcome {
                target: Some(focus),
                delivered,
                redirected_to: None,
            };
        }

        match self.global_listener(kind) {
            Some((id, callback)) => {
                callback(event);
                DispatchOutcome {
                    target: Some(id),
                    delivered: true,
                    redirected_to: None,
                }
            }
            None => DispatchOutcome::default(),
        }
    }

    fn global_listener(&mut self, kind: EventKind) -> Option<(HitboxId, Callback)> {
        self.registry
            .flattened()
            .iter()
            .filter(|hitbox| hitbox.is_global())
            .find_map(|hitbox| hitbox.callback(kind).map(|cb| (hitbox.id.clone(), cb)))
    }

    fn track_press(&mut self, target: Option<&HitboxId>) {
        if self.mouse_up_callback.is_some() {
            return;
        }
        self.mouse_down_target = target.cloned();
        self.mouse_up_callback = target
            .and_then(|id| self.registry.get(id))
            .and_then(|hitbox| hitbox.callback(EventKind::MouseUp));
    }

    fn track_release(
        &mut self,
        target: Option<&HitboxId>,
        event: &InputEvent,
    ) -> Option<HitboxId> {
        let pressed = self.mouse_down_target.take();
        let callback = self.mouse_up_callback.take()?;
        if pressed.as_ref() == target {
            return None;
        }
        debug!(
            pressed = ?pressed.as_ref().map(ToString::to_string),
            "mouseup_released_outside"
        );
        callback(event);
        pressed
    }

    /// Pointer left the canvas: the hovered record gets its `mouseout` unless
    /// spatial dispatch already delivered one to it.
    fn track_leave(
        &mut self,
        target: Option<&HitboxId>,
        delivered: bool,
        event: &InputEvent,
    ) -> Option<HitboxId> {
        let hovered = self.mouse_move_target.take()?;
        let mouse_out = self.mouse_out_callback.take()?;
        if delivered && target == Some(&hovered) {
            return None;
        }
        mouse_out(event);
        Some(hovered)
    }

    fn track_move(&mut self, target: Option<&HitboxId>, event: &InputEvent) -> Option<HitboxId> {
        if let Some(pressed) = self.mouse_down_target.clone() {
            if Some(&pressed) != target {
                let drag_callback = self
                    .registry
                    .get(&pressed)
                    .filter(|hitbox| hitbox.data.is_dragging())
                    .and_then(|hitbox| hitbox.callback(EventKind::MouseMove));
                if let Some(callback) = drag_callback {
                    callback(event);
                    return Some(pressed);
                }
            }
        }

        if self.mouse_move_target.as_ref() != target {
            if let Some(mouse_out) = self.mouse_out_callback.take() {
                mouse_out(&event.retarget(EventKind::MouseOut));
            }
        }
        self.mouse_move_target = target.cloned();
        self.mouse_out_callback = target
            .and_then(|id| self.registry.get(id))
            .and_then(|hitbox| hitbox.callback(EventKind::MouseOut));
        None
    }
}

fn invoke(callback: Option<&Callback>, event: &InputEvent) -> bool {
    match callback {
        Some(callback) => {
            callback(event);
            true
        }
        None => false,
    }
}

fn passes_hit_test(hitbox: &Hitbox, point: Vec2, surface: &HitSurface) -> bool {
    if let Some(bounds) = &hitbox.bounding_box {
        match bounds() {
            Some(bbox) if bbox.contains(point) => {}
            _ => return false,
        }
    }
    if let Some(hit_test) = &hitbox.hit_test {
        return hit_test(point, surface);
    }
    if let Some(color) = hitbox.color {
        return color.matches(surface.pixel(point));
    }
    hitbox.bounding_box.is_some()
}

trait IndexTarget {
    fn paint_box(&mut self, bbox: &BoundingBox, color: HitboxColor);
    fn paint_image(&mut self, top_left: Vec2, image: &RgbaImage);
}

impl IndexTarget for HitSurface {
    fn paint_box(&mut self, bbox: &BoundingBox, color: HitboxColor) {
        self.fill_box(bbox, color);
    }

    fn paint_image(&mut self, top_left: Vec2, image: &RgbaImage) {
        self.draw_image(top_left, image);
    }
}

struct FrameTarget<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl IndexTarget for FrameTarget<'_> {
    fn paint_box(&mut self, bbox: &BoundingBox, color: HitboxColor) {
        raster::fill_rect(
            self.frame,
            self.width,
            self.height,
            ScreenRectPx::covering(bbox),
            color.to_rgba(),
        );
    }

    fn paint_image(&mut self, top_left: Vec2, image: &RgbaImage) {
        raster::blit_masked(
            self.frame,
            self.width,
            self.height,
            top_left.x.floor() as i32,
            top_left.y.floor() as i32,
            image,
        );
    }
}

fn paint_index(hitboxes: &[Hitbox], colorized: &mut ColorizedCache, target: &mut impl IndexTarget) {
    for hitbox in hitboxes {
        let (Some(bbox), Some(color)) = (hitbox.current_bounds(), hitbox.color) else {
            continue;
        };
        match &hitbox.image {
            Some(image) => {
                let stamp = colorized_cached(colorized, image, color);
                target.paint_image(bbox.nw, stamp);
            }
            None => target.paint_box(&bbox, color),
        }
    }
}

fn colorized_cached<'a>(
    cache: &'a mut ColorizedCache,
    image: &SpriteImage,
    color: HitboxColor,
) -> &'a RgbaImage {
    cache
        .entry((image.source_key(), color))
        .or_insert_with(|| sprite::colorize(image, color))
}
