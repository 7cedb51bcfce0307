mod widgets;

#[cfg(test)]
mod tests;

use std::cell::Cell;
use std::rc::Rc;

use toroid::{
    BoundingBox, EventCallbacks, EventKind, Frame, HitboxPatch, HitboxSyncSystem, InputEvent,
    Scene, SceneError, UiContext, Vec2,
};
use tracing::{debug, info};

use crate::app::config::DemoConfig;

use widgets::{Button, DesktopWindow, RingSprite, TextField};

const DESKTOP_ID: &str = "desktop";
const BACKGROUND: toroid::Color = toroid::Color::rgba(18, 20, 26, 255);
const RING_TOP_LEFT: Vec2 = Vec2::new(640.0, 260.0);
const RING_DIAMETER: u32 = 96;
const FIELD_BOUNDS: (f32, f32, f32, f32) = (80.0, 470.0, 300.0, 36.0);

/// Counters fed by the desktop's global listener.
#[derive(Debug, Default)]
struct DesktopState {
    clicks: Cell<u32>,
    double_clicks: Cell<u32>,
    wheel_total: Cell<f32>,
    unfocus_requested: Cell<bool>,
}

pub(crate) struct DesktopScene {
    config: DemoConfig,
    state: Rc<DesktopState>,
    windows: Vec<DesktopWindow>,
    buttons: Vec<Button>,
    ring: Option<RingSprite>,
    field: Option<TextField>,
}

impl DesktopScene {
    pub(crate) fn new(config: DemoConfig) -> Self {
        Self {
            config,
            state: Rc::new(DesktopState::default()),
            windows: Vec::new(),
            buttons: Vec::new(),
            ring: None,
            field: None,
        }
    }

    fn desktop_callbacks(&self) -> EventCallbacks {
        let clicked = Rc::clone(&self.state);
        let double_clicked = Rc::clone(&self.state);
        let scrolled = Rc::clone(&self.state);
        EventCallbacks::new()
            .on(EventKind::Click, move |_| {
                clicked.clicks.set(clicked.clicks.get() + 1);
                clicked.unfocus_requested.set(true);
            })
            .on(EventKind::DoubleClick, move |_| {
                double_clicked
                    .double_clicks
                    .set(double_clicked.double_clicks.get() + 1);
            })
            .on(EventKind::Wheel, move |event: &InputEvent| {
                scrolled
                    .wheel_total
                    .set(scrolled.wheel_total.get() + event.wheel_delta.y);
            })
    }
}

impl Scene for DesktopScene {
    fn load(&mut self, ctx: &mut UiContext) -> Result<(), SceneError> {
        for kind in EventKind::ALL {
            ctx.interaction.register_event_listener(kind);
        }
        ctx.ecs.add_system(HitboxSyncSystem::new());

        ctx.interaction.upsert_hitbox(
            DESKTOP_ID,
            HitboxPatch::new().callbacks(self.desktop_callbacks()),
        );

        let (x, y, width, height) = FIELD_BOUNDS;
        let field_color = ctx.interaction.allocate_color()?;
        self.field = Some(TextField::spawn(
            &mut ctx.ecs,
            BoundingBox::from_rect(x, y, width, height),
            field_color,
        ));

        let ring = RingSprite::new(RING_TOP_LEFT, RING_DIAMETER)?;
        ring.register(&mut ctx.interaction)?;
        self.ring = Some(ring);

        for (index, layout) in self.config.buttons.iter().enumerate() {
            let button = Button::new(index, layout);
            button.register(&mut ctx.interaction)?;
            self.buttons.push(button);
        }
        for (index, layout) in self.config.windows.iter().enumerate() {
            let window = DesktopWindow::new(index, layout);
            window.register(&mut ctx.interaction)?;
            self.windows.push(window);
        }

        info!(
            windows = self.windows.len(),
            buttons = self.buttons.len(),
            hitbox_count = ctx.interaction.hitbox_count(),
            "desktop_loaded"
        );
        Ok(())
    }

    fn update(&mut self, _dt_seconds: f32, ctx: &mut UiContext) {
        for window in &mut self.windows {
            if let Some(position) = window.poll_drop() {
                debug!(
                    window = %window.header_id(),
                    x = position.x,
                    y = position.y,
                    "window_dropped"
                );
            }
        }

        let focus_requested = self
            .field
            .as_ref()
            .is_some_and(|field| field.take_focus_request());
        let unfocus_requested = self.state.unfocus_requested.replace(false);
        if let (true, Some(field)) = (focus_requested, self.field.as_ref()) {
            ctx.interaction.register_keyboard_focus(field.hitbox_id());
            info!(hitbox = %field.hitbox_id(), "keyboard_focus_gained");
        } else if unfocus_requested && ctx.interaction.keyboard_focus().is_some() {
            ctx.interaction.deregister_keyboard_focus();
            info!("keyboard_focus_released");
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>, ctx: &UiContext) {
        frame.clear(BACKGROUND);
        if let Some(field) = &self.field {
            let focused = ctx.interaction.keyboard_focus() == Some(&field.hitbox_id());
            field.render(frame, focused);
        }
        if let Some(ring) = &self.ring {
            ring.render(frame);
        }
        for button in &self.buttons {
            button.render(frame);
        }
        for window in &self.windows {
            window.render(frame);
        }
    }

    fn unload(&mut self, ctx: &mut UiContext) {
        info!(
            desktop_clicks = self.state.clicks.get(),
            desktop_double_clicks = self.state.double_clicks.get(),
            wheel_total = self.state.wheel_total.get(),
            dispatched_events = ctx.interaction.dispatched_events(),
            "desktop_unloaded"
        );
        self.windows.clear();
        self.buttons.clear();
        self.ring = None;
        self.field = None;
    }

    fn debug_title(&self, ctx: &UiContext) -> Option<String> {
        let focus = ctx
            .interaction
            .keyboard_focus()
            .map_or_else(|| "none".to_string(), ToString::to_string);
        let presses: u32 = self.buttons.iter().map(Button::presses).sum();
        let ring = match &self.ring {
            Some(ring) if ring.is_toggled() => "on",
            _ => "off",
        };
        let text = self.field.as_ref().map(TextField::text).unwrap_or_default();
        Some(format!(
            "{} | {:.0} fps | hitboxes {} | focus {} | presses {} | ring {} | text '{}'",
            self.config.window_title,
            ctx.metrics.fps,
            ctx.interaction.hitbox_count(),
            focus,
            presses,
            ring,
            text
        ))
    }
}
