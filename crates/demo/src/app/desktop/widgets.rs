use std::cell::{Cell, RefCell};
use std::rc::Rc;

use toroid::color::{self, Color};
use toroid::{
    Behavior, BoundingBox, ColorHeapError, Draggable, Ecs, Entity, EventCallbacks, EventKind,
    Frame, HitboxColor, HitboxComponent, HitboxId, HitboxPatch, Hoverable, InputEvent,
    InteractionManager, Pressable, SpriteError, SpriteImage, Vec2,
};

use crate::app::config::{ButtonLayout, WindowLayout};

pub(crate) const HEADER_HEIGHT: f32 = 30.0;
/// Window `i` uses `base + 2i` for its body and the next layer for its header.
pub(crate) const WINDOW_LAYER_BASE: i32 = 60;
pub(crate) const BUTTON_LAYER: i32 = 50;
pub(crate) const RING_LAYER: i32 = 40;
pub(crate) const FIELD_LAYER: i32 = 30;
pub(crate) const FIELD_MAX_CHARS: usize = 24;

const HEADER_SHADE: Color = Color::rgba(36, 40, 52, 255);
const HEADER_HOVER_SHADE: Color = Color::rgba(58, 64, 84, 255);
const DRAG_OUTLINE: Color = color::YELLOW;
const BUTTON_IDLE: Color = Color::rgba(64, 120, 90, 255);
const BUTTON_HOVER: Color = Color::rgba(84, 156, 118, 255);
const BUTTON_PRESSED: Color = Color::rgba(40, 80, 60, 255);
const PIP_COLOR: Color = color::WHITE;
const RING_IDLE: [u8; 4] = [200, 140, 60, 255];
const RING_ACTIVE: [u8; 4] = [90, 180, 230, 255];
const FIELD_BACKGROUND: Color = Color::rgba(24, 24, 30, 255);
const FIELD_BORDER: Color = Color::rgba(90, 90, 100, 255);
const FIELD_FOCUS_BORDER: Color = color::GREEN;
const FIELD_GLYPH: Color = Color::rgba(220, 220, 230, 255);

pub(crate) struct DesktopWindow {
    drag: Draggable,
    header_hover: Hoverable,
    layer: i32,
    fill: Color,
    body_id: HitboxId,
    header_id: HitboxId,
    was_dragging: bool,
}

impl DesktopWindow {
    pub(crate) fn new(index: usize, layout: &WindowLayout) -> Self {
        let [r, g, b] = layout.rgb;
        Self {
            drag: Draggable::new(Vec2::new(layout.x, layout.y), layout.width, layout.height)
                .with_grab_height(HEADER_HEIGHT),
            header_hover: Hoverable::new(),
            layer: WINDOW_LAYER_BASE + 2 * index as i32,
            fill: Color::rgba(r, g, b, 255),
            body_id: HitboxId::from(format!("window:{index}:body")),
            header_id: HitboxId::from(format!("window:{index}:header")),
            was_dragging: false,
        }
    }

    pub(crate) fn register(
        &self,
        interaction: &mut InteractionManager,
    ) -> Result<(), ColorHeapError> {
        let body_color = interaction.allocate_color()?;
        let drag = self.drag.clone();
        interaction.upsert_hitbox(
            self.body_id.clone(),
            HitboxPatch::new()
                .layer(self.layer)
                .bounding_box(move || Some(drag.bounds()))
                .color(body_color),
        );

        let header_color = interaction.allocate_color()?;
        let mut header = self.drag.hitbox_patch(self.layer + 1, header_color);
        if let Some(callbacks) = header.callbacks.as_mut() {
            self.header_hover.install(callbacks);
        }
        interaction.upsert_hitbox(self.header_id.clone(), header);
        Ok(())
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.drag.position()
    }

    pub(crate) fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub(crate) fn header_id(&self) -> &HitboxId {
        &self.header_id
    }

    /// Position where a drag ended since the last poll.
    pub(crate) fn poll_drop(&mut self) -> Option<Vec2> {
        let dragging = self.is_dragging();
        let dropped = self.was_dragging && !dragging;
        self.was_dragging = dragging;
        dropped.then(|| self.position())
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let bounds = self.drag.bounds();
        frame.fill_box(&bounds, self.fill);
        let header_shade = if self.header_hover.is_hovered() {
            HEADER_HOVER_SHADE
        } else {
            HEADER_SHADE
        };
        frame.fill_box(&self.drag.grab_bounds(), header_shade);
        if self.drag.is_dragging() {
            frame.stroke_box(&bounds, DRAG_OUTLINE);
        }
    }
}

pub(crate) struct Button {
    id: HitboxId,
    bounds: BoundingBox,
    hover: Hoverable,
    press: Pressable,
}

impl Button {
    pub(crate) fn new(index: usize, layout: &ButtonLayout) -> Self {
        let bounds = BoundingBox::from_rect(layout.x, layout.y, layout.width, layout.height);
        Self {
            id: HitboxId::from(format!("button:{index}")),
            bounds,
            hover: Hoverable::new(),
            press: Pressable::new(Rc::new(move || Some(bounds))),
        }
    }

    pub(crate) fn register(
        &self,
        interaction: &mut InteractionManager,
    ) -> Result<(), ColorHeapError> {
        let mut callbacks = EventCallbacks::new();
        self.hover.install(&mut callbacks);
        self.press.install(&mut callbacks);
        let color = interaction.allocate_color()?;
        interaction.upsert_hitbox(
            self.id.clone(),
            HitboxPatch::new()
                .layer(BUTTON_LAYER)
                .fixed_box(self.bounds)
                .color(color)
                .callbacks(callbacks),
        );
        Ok(())
    }

    pub(crate) fn presses(&self) -> u32 {
        self.press.presses()
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let fill = if self.press.is_pressed() {
            BUTTON_PRESSED
        } else if self.hover.is_hovered() {
            BUTTON_HOVER
        } else {
            BUTTON_IDLE
        };
        frame.fill_box(&self.bounds, fill);

        // One pip per completed press, wrapping back after a full row.
        let pip_slots = ((self.bounds.width() - 8.0) / 6.0).max(1.0) as u32;
        let pips = self.press.presses() % (pip_slots + 1);
        for pip in 0..pips {
            let x = self.bounds.nw.x + 4.0 + pip as f32 * 6.0;
            let pip_box = BoundingBox::from_rect(x, self.bounds.se.y - 8.0, 3.0, 3.0);
            frame.fill_box(&pip_box, PIP_COLOR);
        }
    }
}

/// Ring-shaped sprite whose transparent middle lets clicks through.
pub(crate) struct RingSprite {
    top_left: Vec2,
    idle: SpriteImage,
    active: SpriteImage,
    toggled: Rc<Cell<bool>>,
}

impl RingSprite {
    pub(crate) const ID: &'static str = "ring";

    pub(crate) fn new(top_left: Vec2, diameter: u32) -> Result<Self, SpriteError> {
        Ok(Self {
            top_left,
            idle: ring_sprite("procedural:ring", diameter, RING_IDLE)?,
            active: ring_sprite("procedural:ring-active", diameter, RING_ACTIVE)?,
            toggled: Rc::new(Cell::new(false)),
        })
    }

    pub(crate) fn register(
        &self,
        interaction: &mut InteractionManager,
    ) -> Result<(), ColorHeapError> {
        let color = interaction.allocate_color()?;
        let toggled = Rc::clone(&self.toggled);
        interaction.upsert_hitbox(
            Self::ID,
            HitboxPatch::new()
                .layer(RING_LAYER)
                .fixed_box(self.bounds())
                .image(self.idle.clone())
                .color(color)
                .on(EventKind::Click, move |_| toggled.set(!toggled.get())),
        );
        Ok(())
    }

    pub(crate) fn bounds(&self) -> BoundingBox {
        BoundingBox::from_rect(
            self.top_left.x,
            self.top_left.y,
            self.idle.width() as f32,
            self.idle.height() as f32,
        )
    }

    pub(crate) fn is_toggled(&self) -> bool {
        self.toggled.get()
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let sprite = if self.toggled.get() {
            &self.active
        } else {
            &self.idle
        };
        frame.draw_sprite(sprite, self.top_left);
    }
}

fn ring_sprite(source: &str, diameter: u32, rgba: [u8; 4]) -> Result<SpriteImage, SpriteError> {
    let center = diameter as f32 / 2.0;
    let outer = center;
    let inner = center * 0.45;
    let mut pixels = Vec::with_capacity(diameter as usize * diameter as usize * 4);
    for y in 0..diameter {
        for x in 0..diameter {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance >= inner && distance <= outer {
                pixels.extend_from_slice(&rgba);
            } else {
                pixels.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    SpriteImage::from_rgba(source, diameter, diameter, pixels)
}

/// Single-line input backed by an ECS entity; keyboard events reach it once
/// it holds keyboard focus.
pub(crate) struct TextField {
    entity: Entity,
    bounds: BoundingBox,
    text: Rc<RefCell<String>>,
    focus_requested: Rc<Cell<bool>>,
}

impl TextField {
    pub(crate) fn spawn(ecs: &mut Ecs, bounds: BoundingBox, color: HitboxColor) -> Self {
        let text = Rc::new(RefCell::new(String::new()));
        let focus_requested = Rc::new(Cell::new(false));

        let requested = Rc::clone(&focus_requested);
        let edited = Rc::clone(&text);
        let callbacks = EventCallbacks::new()
            .on(EventKind::MouseDown, move |_| requested.set(true))
            .on(EventKind::KeyDown, move |event: &InputEvent| {
                if let Some(key) = event.key.as_deref() {
                    apply_key(&mut edited.borrow_mut(), key);
                }
            });

        let entity = ecs.add_entity();
        ecs.add_component(
            entity,
            HitboxComponent {
                layer: FIELD_LAYER,
                bounding_box: Some(Rc::new(move || Some(bounds))),
                color: Some(color),
                callbacks,
                ..HitboxComponent::default()
            },
        );

        Self {
            entity,
            bounds,
            text,
            focus_requested,
        }
    }

    pub(crate) fn hitbox_id(&self) -> HitboxId {
        HitboxId::Entity(self.entity)
    }

    pub(crate) fn take_focus_request(&self) -> bool {
        self.focus_requested.replace(false)
    }

    pub(crate) fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, focused: bool) {
        frame.fill_box(&self.bounds, FIELD_BACKGROUND);
        let border = if focused { FIELD_FOCUS_BORDER } else { FIELD_BORDER };
        frame.stroke_box(&self.bounds, border);

        let glyph_height = (self.bounds.height() - 12.0).max(2.0);
        let char_count = self.text.borrow().chars().count();
        for index in 0..char_count {
            let x = self.bounds.nw.x + 6.0 + index as f32 * 10.0;
            let glyph = BoundingBox::from_rect(x, self.bounds.nw.y + 6.0, 6.0, glyph_height);
            frame.fill_box(&glyph, FIELD_GLYPH);
        }
    }
}

pub(crate) fn apply_key(text: &mut String, key: &str) {
    if key == "Backspace" {
        text.pop();
        return;
    }
    let mut chars = key.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if !ch.is_control() && text.chars().count() < FIELD_MAX_CHARS {
            text.push(ch);
        }
    }
}
