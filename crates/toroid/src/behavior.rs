//! Reusable pointer behaviors. Each one owns shared state and installs its
//! handlers into an [`EventCallbacks`] table, so several behaviors can drive
//! the same hitbox.

use std::cell::Cell;
use std::rc::Rc;

use crate::color::HitboxColor;
use crate::ecs::HitboxComponent;
use crate::events::{buttons, EventKind, InputEvent};
use crate::geometry::{BoundingBox, Vec2};
use crate::hitbox::{BoundsFn, EventCallbacks, HitboxData, HitboxPatch};

pub trait Behavior {
    fn install(&self, callbacks: &mut EventCallbacks);
}

#[derive(Debug, Clone, Copy)]
struct DragOrigin {
    pointer: Vec2,
    position: Vec2,
}

/// Moves a rectangle with the pointer while the primary button is held.
#[derive(Debug, Clone)]
pub struct Draggable {
    position: Rc<Cell<Vec2>>,
    size: Vec2,
    grab_height: Option<f32>,
    drag: Rc<Cell<Option<DragOrigin>>>,
    data: HitboxData,
}

impl Draggable {
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position: Rc::new(Cell::new(position)),
            size: Vec2::new(width, height),
            grab_height: None,
            drag: Rc::new(Cell::new(None)),
            data: HitboxData::new(),
        }
    }

    /// Restricts the grab area to the top `height` pixels (a title bar).
    pub fn with_grab_height(mut self, height: f32) -> Self {
        self.grab_height = Some(height);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    pub fn bounds(&self) -> BoundingBox {
        let Vec2 { x, y } = self.position.get();
        BoundingBox::from_rect(x, y, self.size.x, self.size.y)
    }

    pub fn grab_bounds(&self) -> BoundingBox {
        let Vec2 { x, y } = self.position.get();
        let height = self.grab_height.unwrap_or(self.size.y).min(self.size.y);
        BoundingBox::from_rect(x, y, self.size.x, height)
    }

    pub fn is_dragging(&self) -> bool {
        self.data.is_dragging()
    }

    pub fn data(&self) -> &HitboxData {
        &self.data
    }

    /// Point at a fixed offset from the draggable's origin; follows drags.
    pub fn anchor(&self, offset: Vec2) -> Anchor {
        Anchor {
            origin: Rc::clone(&self.position),
            offset,
        }
    }

    pub fn grab_bounds_fn(&self) -> BoundsFn {
        let this = self.clone();
        Rc::new(move || Some(this.grab_bounds()))
    }

    pub fn hitbox_patch(&self, layer: i32, color: HitboxColor) -> HitboxPatch {
        let mut callbacks = EventCallbacks::new();
        self.install(&mut callbacks);
        HitboxPatch {
            layer: Some(layer),
            bounding_box: Some(self.grab_bounds_fn()),
            color: Some(color),
            callbacks: Some(callbacks),
            data: Some(self.data.clone()),
            ..HitboxPatch::default()
        }
    }

    pub fn hitbox_component(&self, layer: i32, color: HitboxColor) -> HitboxComponent {
        let mut callbacks = EventCallbacks::new();
        self.install(&mut callbacks);
        HitboxComponent {
            layer,
            bounding_box: Some(self.grab_bounds_fn()),
            color: Some(color),
            callbacks,
            data: self.data.clone(),
            ..HitboxComponent::default()
        }
    }

    fn begin(&self, event: &InputEvent) {
        if event.buttons != buttons::PRIMARY || self.data.is_dragging() {
            return;
        }
        let Some(pointer) = event.offset else {
            return;
        };
        self.drag.set(Some(DragOrigin {
            pointer,
            position: self.position.get(),
        }));
        self.data.set_dragging(true);
    }

    fn follow(&self, event: &InputEvent) {
        let (Some(origin), Some(pointer)) = (self.drag.get(), event.offset) else {
            return;
        };
        self.position.set(Vec2::new(
            origin.position.x + pointer.x - origin.pointer.x,
            origin.position.y + pointer.y - origin.pointer.y,
        ));
    }

    fn end(&self) {
        self.drag.set(None);
        self.data.set_dragging(false);
    }
}

impl Behavior for Draggable {
    fn install(&self, callbacks: &mut EventCallbacks) {
        let this = self.clone();
        callbacks.append(
            EventKind::MouseDown,
            Rc::new(move |event: &InputEvent| this.begin(event)),
        );
        let this = self.clone();
        callbacks.append(
            EventKind::MouseMove,
            Rc::new(move |event: &InputEvent| this.follow(event)),
        );
        let this = self.clone();
        callbacks.append(EventKind::MouseUp, Rc::new(move |_: &InputEvent| this.end()));
    }
}

/// Position tied to a [`Draggable`]'s origin.
#[derive(Debug, Clone)]
pub struct Anchor {
    origin: Rc<Cell<Vec2>>,
    offset: Vec2,
}

impl Anchor {
    pub fn position(&self) -> Vec2 {
        let origin = self.origin.get();
        Vec2::new(origin.x + self.offset.x, origin.y + self.offset.y)
    }

    pub fn rect(&self, width: f32, height: f32) -> BoundingBox {
        let Vec2 { x, y } = self.position();
        BoundingBox::from_rect(x, y, width, height)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Hoverable {
    hovered: Rc<Cell<bool>>,
}

impl Hoverable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered.get()
    }
}

impl Behavior for Hoverable {
    fn install(&self, callbacks: &mut EventCallbacks) {
        let hovered = Rc::clone(&self.hovered);
        callbacks.append(
            EventKind::MouseMove,
            Rc::new(move |event: &InputEvent| {
                if event.offset.is_some() {
                    hovered.set(true);
                }
            }),
        );
        let hovered = Rc::clone(&self.hovered);
        callbacks.append(
            EventKind::MouseOut,
            Rc::new(move |_: &InputEvent| hovered.set(false)),
        );
    }
}

/// Tracks the pressed state and counts presses released over the same bounds.
#[derive(Clone)]
pub struct Pressable {
    bounds: BoundsFn,
    pressed: Rc<Cell<bool>>,
    presses: Rc<Cell<u32>>,
}

impl Pressable {
    pub fn new(bounds: BoundsFn) -> Self {
        Self {
            bounds,
            pressed: Rc::new(Cell::new(false)),
            presses: Rc::new(Cell::new(0)),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    pub fn presses(&self) -> u32 {
        self.presses.get()
    }

    fn release(&self, event: &InputEvent) {
        if !self.pressed.replace(false) {
            return;
        }
        let inside = match (event.offset, (self.bounds)()) {
            (Some(point), Some(bbox)) => bbox.contains(point),
            _ => false,
        };
        if inside {
            self.presses.set(self.presses.get().saturating_add(1));
        }
    }
}

impl Behavior for Pressable {
    fn install(&self, callbacks: &mut EventCallbacks) {
        let pressed = Rc::clone(&self.pressed);
        callbacks.append(
            EventKind::MouseDown,
            Rc::new(move |event: &InputEvent| {
                if event.buttons & buttons::PRIMARY != 0 {
                    pressed.set(true);
                }
            }),
        );
        let this = self.clone();
        callbacks.append(
            EventKind::MouseUp,
            Rc::new(move |event: &InputEvent| this.release(event)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(x: f32, y: f32) -> InputEvent {
        InputEvent::pointer(EventKind::MouseDown, x, y).with_buttons(buttons::PRIMARY)
    }

    fn fire(callbacks: &EventCallbacks, event: &InputEvent) {
        if let Some(callback) = callbacks.get(event.kind) {
            callback(event);
        }
    }

    #[test]
    fn drag_moves_by_pointer_delta() {
        let draggable = Draggable::new(Vec2::new(10.0, 10.0), 100.0, 80.0);
        let mut callbacks = EventCallbacks::new();
        draggable.install(&mut callbacks);

        fire(&callbacks, &press(15.0, 12.0));
        assert!(draggable.is_dragging());
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseMove, 45.0, 2.0));
        assert_eq!(draggable.position(), Vec2::new(40.0, 0.0));

        fire(&callbacks, &InputEvent::pointer(EventKind::MouseUp, 45.0, 2.0));
        assert!(!draggable.is_dragging());
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseMove, 90.0, 90.0));
        assert_eq!(draggable.position(), Vec2::new(40.0, 0.0));
    }

    #[test]
    fn drag_ignores_non_primary_presses() {
        let draggable = Draggable::new(Vec2::new(0.0, 0.0), 10.0, 10.0);
        let mut callbacks = EventCallbacks::new();
        draggable.install(&mut callbacks);
        fire(
            &callbacks,
            &InputEvent::pointer(EventKind::MouseDown, 1.0, 1.0).with_buttons(buttons::SECONDARY),
        );
        assert!(!draggable.is_dragging());
    }

    #[test]
    fn anchors_follow_the_drag() {
        let draggable = Draggable::new(Vec2::new(0.0, 0.0), 50.0, 50.0).with_grab_height(10.0);
        let close_button = draggable.anchor(Vec2::new(40.0, 2.0));
        let mut callbacks = EventCallbacks::new();
        draggable.install(&mut callbacks);

        fire(&callbacks, &press(5.0, 5.0));
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseMove, 25.0, 15.0));

        assert_eq!(close_button.position(), Vec2::new(60.0, 12.0));
        assert_eq!(draggable.grab_bounds(), BoundingBox::from_rect(20.0, 10.0, 50.0, 10.0));
    }

    #[test]
    fn hover_and_press_compose_on_one_table() {
        let hoverable = Hoverable::new();
        let pressable = Pressable::new(Rc::new(|| {
            Some(BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0))
        }));
        let mut callbacks = EventCallbacks::new();
        hoverable.install(&mut callbacks);
        pressable.install(&mut callbacks);

        fire(&callbacks, &InputEvent::pointer(EventKind::MouseMove, 5.0, 5.0));
        assert!(hoverable.is_hovered());
        fire(&callbacks, &press(5.0, 5.0));
        assert!(pressable.is_pressed());
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseUp, 5.0, 5.0));
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseOut, 30.0, 5.0));

        assert!(!hoverable.is_hovered());
        assert!(!pressable.is_pressed());
        assert_eq!(pressable.presses(), 1);
    }

    #[test]
    fn release_outside_does_not_count_as_press() {
        let pressable = Pressable::new(Rc::new(|| {
            Some(BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0))
        }));
        let mut callbacks = EventCallbacks::new();
        pressable.install(&mut callbacks);

        fire(&callbacks, &press(5.0, 5.0));
        fire(&callbacks, &InputEvent::pointer(EventKind::MouseUp, 50.0, 50.0));

        assert_eq!(pressable.presses(), 0);
        assert!(!pressable.is_pressed());
    }
}
