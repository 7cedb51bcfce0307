use std::time::{Duration, Instant};

use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, KeyCode, PhysicalKey};

use crate::events::{buttons, EventKind, InputEvent};
use crate::geometry::Vec2;
use crate::hitbox::HitboxId;

pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
/// Pixels scrolled per wheel line.
pub const WHEEL_LINE_PX: f32 = 40.0;

#[derive(Debug, Clone)]
struct ClickRecord {
    target: Option<HitboxId>,
    at: Instant,
}

/// Turns raw window events into pointer and keyboard [`InputEvent`]s and
/// synthesizes clicks from press/release pairs.
#[derive(Debug, Default)]
pub struct HostInput {
    cursor: Option<Vec2>,
    buttons: u16,
    press_target: Option<Option<HitboxId>>,
    last_click: Option<ClickRecord>,
    quit_requested: bool,
    overlay_toggle_is_down: bool,
    overlay_toggle_pressed_edge: bool,
}

impl HostInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn buttons(&self) -> u16 {
        self.buttons
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                Some(self.cursor_moved(position.x as f32, position.y as f32))
            }
            WindowEvent::CursorLeft { .. } => Some(self.cursor_left()),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(*button, *state),
            WindowEvent::MouseWheel { delta, .. } => Some(self.mouse_wheel(*delta)),
            WindowEvent::KeyboardInput { event, .. } => self.keyboard_input(event),
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) -> InputEvent {
        self.cursor = Some(Vec2::new(x, y));
        self.pointer_event(EventKind::MouseMove)
    }

    pub fn cursor_left(&mut self) -> InputEvent {
        self.cursor = None;
        self.pointer_event(EventKind::MouseOut)
    }

    pub fn mouse_input(&mut self, button: MouseButton, state: ElementState) -> Option<InputEvent> {
        let bit = button_bit(button)?;
        let kind = match state {
            ElementState::Pressed => {
                self.buttons |= bit;
                EventKind::MouseDown
            }
            ElementState::Released => {
                self.buttons &= !bit;
                EventKind::MouseUp
            }
        };
        Some(self.pointer_event(kind))
    }

    pub fn mouse_wheel(&mut self, delta: MouseScrollDelta) -> InputEvent {
        self.pointer_event(EventKind::Wheel)
            .with_wheel_delta(wheel_delta_px(delta))
    }

    pub fn key_input(&mut self, key: impl Into<String>, state: ElementState) -> InputEvent {
        let kind = match state {
            ElementState::Pressed => EventKind::KeyDown,
            ElementState::Released => EventKind::KeyUp,
        };
        InputEvent::key(kind, key).with_buttons(self.buttons)
    }

    fn keyboard_input(&mut self, key_event: &KeyEvent) -> Option<InputEvent> {
        self.handle_overlay_toggle_key_state(is_overlay_toggle_key(key_event), key_event.state);
        if is_quit_key(key_event) {
            if key_event.state == ElementState::Pressed {
                self.quit_requested = true;
            }
            return None;
        }
        if is_overlay_toggle_key(key_event) {
            return None;
        }
        let name = key_name(&key_event.logical_key, key_event.physical_key);
        Some(self.key_input(name, key_event.state))
    }

    fn handle_overlay_toggle_key_state(&mut self, is_toggle_key: bool, state: ElementState) {
        if !is_toggle_key {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.overlay_toggle_is_down {
                    self.overlay_toggle_pressed_edge = true;
                }
                self.overlay_toggle_is_down = true;
            }
            ElementState::Released => self.overlay_toggle_is_down = false,
        }
    }

    pub fn take_overlay_toggle_pressed(&mut self) -> bool {
        let was_pressed = self.overlay_toggle_pressed_edge;
        self.overlay_toggle_pressed_edge = false;
        was_pressed
    }

    /// Events synthesized after `event` was dispatched. `target` is the record
    /// under the pointer when `event` happened (`None` for bare surface).
    /// Only the primary button produces clicks.
    pub fn follow_ups(
        &mut self,
        event: &InputEvent,
        target: Option<HitboxId>,
        now: Instant,
    ) -> Vec<InputEvent> {
        match event.kind {
            EventKind::MouseDown if event.buttons & buttons::PRIMARY != 0 => {
                if self.press_target.is_none() {
                    self.press_target = Some(target);
                }
                Vec::new()
            }
            EventKind::MouseUp if event.buttons & buttons::PRIMARY == 0 => {
                let Some(pressed_on) = self.press_target.take() else {
                    return Vec::new();
                };
                if pressed_on != target {
                    return Vec::new();
                }
                let mut synthesized = vec![event.retarget(EventKind::Click)];
                let is_double = self.last_click.as_ref().is_some_and(|last| {
                    last.target == target
                        && now.saturating_duration_since(last.at) <= DOUBLE_CLICK_WINDOW
                });
                if is_double {
                    synthesized.push(event.retarget(EventKind::DoubleClick));
                    self.last_click = None;
                } else {
                    self.last_click = Some(ClickRecord { target, at: now });
                }
                synthesized
            }
            _ => Vec::new(),
        }
    }

    fn pointer_event(&self, kind: EventKind) -> InputEvent {
        let event = match self.cursor {
            Some(Vec2 { x, y }) => InputEvent::pointer(kind, x, y),
            None => InputEvent::pointer_without_offset(kind),
        };
        event.with_buttons(self.buttons)
    }
}

fn button_bit(button: MouseButton) -> Option<u16> {
    match button {
        MouseButton::Left => Some(buttons::PRIMARY),
        MouseButton::Right => Some(buttons::SECONDARY),
        MouseButton::Middle => Some(buttons::AUXILIARY),
        _ => None,
    }
}

/// Positive y scrolls content down, matching DOM `deltaY`.
fn wheel_delta_px(delta: MouseScrollDelta) -> Vec2 {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => Vec2::new(-x * WHEEL_LINE_PX, -y * WHEEL_LINE_PX),
        MouseScrollDelta::PixelDelta(position) => {
            Vec2::new(-position.x as f32, -position.y as f32)
        }
    }
}

fn key_name(logical: &Key, physical: PhysicalKey) -> String {
    match logical {
        Key::Character(text) => text.to_string(),
        Key::Named(named) => format!("{named:?}"),
        _ => match physical {
            PhysicalKey::Code(code) => format!("{code:?}"),
            PhysicalKey::Unidentified(_) => "Unidentified".to_string(),
        },
    }
}

fn is_overlay_toggle_key(key_event: &KeyEvent) -> bool {
    matches!(key_event.physical_key, PhysicalKey::Code(KeyCode::F3))
}

fn is_quit_key(key_event: &KeyEvent) -> bool {
    matches!(key_event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}
