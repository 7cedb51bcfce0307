use toroid::{buttons, HitboxId, InputEvent};

use super::widgets::{HEADER_HEIGHT, RING_LAYER};
use super::*;

fn loaded_scene() -> (DesktopScene, UiContext) {
    let config = DemoConfig::default();
    let mut ctx = UiContext::new(config.window_width, config.window_height).expect("context");
    let mut scene = DesktopScene::new(config);
    scene.load(&mut ctx).expect("load");
    ctx.tick();
    ctx.interaction.render();
    (scene, ctx)
}

fn frame_step(scene: &mut DesktopScene, ctx: &mut UiContext) {
    scene.update(1.0 / 60.0, ctx);
    ctx.tick();
    ctx.interaction.render();
}

fn primary(kind: EventKind, x: f32, y: f32) -> InputEvent {
    InputEvent::pointer(kind, x, y).with_buttons(buttons::PRIMARY)
}

#[test]
fn load_registers_every_widget() {
    let (scene, ctx) = loaded_scene();
    let config = DemoConfig::default();
    // desktop + field + ring + buttons + a body and header per window
    let expected = 3 + config.buttons.len() + 2 * config.windows.len();
    assert_eq!(ctx.interaction.hitbox_count(), expected);
    assert!(ctx.interaction.has_hitbox(&HitboxId::from(DESKTOP_ID)));
    let field = scene.field.as_ref().expect("field");
    assert!(ctx.interaction.has_hitbox(&field.hitbox_id()));
}

#[test]
fn dragging_a_header_moves_the_window_even_off_the_header() {
    let (mut scene, mut ctx) = loaded_scene();
    let layout = DemoConfig::default().windows[0].clone();
    let grab = (layout.x + 20.0, layout.y + HEADER_HEIGHT / 2.0);

    let outcome = ctx
        .interaction
        .dispatch(&primary(EventKind::MouseDown, grab.0, grab.1));
    assert_eq!(outcome.target.as_ref(), Some(scene.windows[0].header_id()));

    // Far below the header: only the drag redirect can move the window.
    ctx.interaction
        .dispatch(&primary(EventKind::MouseMove, grab.0 + 10.0, grab.1 + 300.0));
    let moved_to = Vec2::new(layout.x + 10.0, layout.y + 300.0);
    assert_eq!(scene.windows[0].position(), moved_to);
    assert!(scene.windows[0].poll_drop().is_none());

    ctx.interaction.dispatch(&InputEvent::pointer(
        EventKind::MouseUp,
        grab.0 + 10.0,
        grab.1 + 300.0,
    ));
    assert!(!scene.windows[0].is_dragging());
    assert_eq!(scene.windows[0].poll_drop(), Some(moved_to));
    frame_step(&mut scene, &mut ctx);
    let header_bounds = ctx
        .interaction
        .hitbox(&HitboxId::from("window:0:header"))
        .and_then(|hitbox| hitbox.current_bounds());
    assert_eq!(
        header_bounds,
        Some(BoundingBox::from_rect(moved_to.x, moved_to.y, layout.width, HEADER_HEIGHT))
    );
}

#[test]
fn later_window_covers_earlier_one_where_they_overlap() {
    let (_scene, mut ctx) = loaded_scene();
    // Inside both default windows; the second is painted on top.
    let hit = ctx
        .interaction
        .hitbox_at(Vec2::new(300.0, 195.0))
        .map(|hitbox| hitbox.id.clone());
    assert_eq!(hit, Some(HitboxId::from("window:1:header")));

    let lower = ctx
        .interaction
        .hitbox_at(Vec2::new(300.0, 260.0))
        .map(|hitbox| hitbox.id.clone());
    assert_eq!(lower, Some(HitboxId::from("window:1:body")));
}

#[test]
fn ring_center_falls_through_to_the_desktop() {
    let (scene, mut ctx) = loaded_scene();
    let ring = scene.ring.as_ref().expect("ring");
    let bounds = ring.bounds();
    let center = Vec2::new(
        (bounds.nw.x + bounds.se.x) / 2.0,
        (bounds.nw.y + bounds.se.y) / 2.0,
    );

    let outcome = ctx
        .interaction
        .dispatch(&InputEvent::pointer(EventKind::Click, center.x, center.y));
    assert_eq!(outcome.target, Some(HitboxId::from(DESKTOP_ID)));
    assert_eq!(scene.state.clicks.get(), 1);
    assert!(!ring.is_toggled());

    let band = Vec2::new(center.x, bounds.nw.y + 5.0);
    let outcome = ctx
        .interaction
        .dispatch(&InputEvent::pointer(EventKind::Click, band.x, band.y));
    assert_eq!(outcome.target, Some(HitboxId::from(RingSprite::ID)));
    assert!(ring.is_toggled());
    assert_eq!(
        ctx.interaction
            .hitbox(&HitboxId::from(RingSprite::ID))
            .map(|hitbox| hitbox.layer),
        Some(RING_LAYER)
    );
}

#[test]
fn clicking_the_field_focuses_it_for_typing() {
    let (mut scene, mut ctx) = loaded_scene();
    let (x, y, _, _) = FIELD_BOUNDS;

    ctx.interaction
        .dispatch(&primary(EventKind::MouseDown, x + 10.0, y + 10.0));
    frame_step(&mut scene, &mut ctx);
    let field_id = scene.field.as_ref().expect("field").hitbox_id();
    assert_eq!(ctx.interaction.keyboard_focus(), Some(&field_id));

    for key in ["o", "k", "x", "Backspace"] {
        ctx.interaction
            .dispatch(&InputEvent::key(EventKind::KeyDown, key));
    }
    assert_eq!(scene.field.as_ref().expect("field").text(), "ok");

    // Clicking bare desktop releases focus; keys then go nowhere.
    ctx.interaction
        .dispatch(&InputEvent::pointer(EventKind::Click, 5.0, 5.0));
    frame_step(&mut scene, &mut ctx);
    assert_eq!(ctx.interaction.keyboard_focus(), None);
    ctx.interaction
        .dispatch(&InputEvent::key(EventKind::KeyDown, "z"));
    assert_eq!(scene.field.as_ref().expect("field").text(), "ok");
}

#[test]
fn wheel_and_double_click_reach_the_desktop_listener() {
    let (scene, mut ctx) = loaded_scene();
    ctx.interaction.dispatch(
        &InputEvent::pointer(EventKind::Wheel, 5.0, 5.0).with_wheel_delta(Vec2::new(0.0, 40.0)),
    );
    ctx.interaction
        .dispatch(&InputEvent::pointer(EventKind::DoubleClick, 5.0, 5.0));
    assert_eq!(scene.state.wheel_total.get(), 40.0);
    assert_eq!(scene.state.double_clicks.get(), 1);
}

#[test]
fn button_presses_are_counted_in_the_title() {
    let (mut scene, mut ctx) = loaded_scene();
    let layout = DemoConfig::default().buttons[0].clone();
    let (x, y) = (layout.x + 5.0, layout.y + 5.0);

    ctx.interaction
        .dispatch(&primary(EventKind::MouseDown, x, y));
    ctx.interaction
        .dispatch(&InputEvent::pointer(EventKind::MouseUp, x, y));
    frame_step(&mut scene, &mut ctx);

    ctx.metrics.fps = 59.6;
    let title = scene.debug_title(&ctx).expect("title");
    assert!(title.contains("presses 1"), "title={title}");
    assert!(title.contains("60 fps"), "title={title}");
}

#[test]
fn render_fills_background_and_widgets() {
    let (mut scene, ctx) = loaded_scene();
    let (width, height) = (ctx.interaction.surface().width(), ctx.interaction.surface().height());
    let mut buffer = vec![0; width as usize * height as usize * 4];
    let mut frame = Frame::new(&mut buffer, width, height);
    scene.render(&mut frame, &ctx);

    assert_eq!(frame.pixel(2, 2), Some(BACKGROUND));
    let layout = DemoConfig::default().windows[0].clone();
    assert_ne!(
        frame.pixel(layout.x as u32 + 5, layout.y as u32 + 5),
        Some(BACKGROUND)
    );
}

#[test]
fn unload_drops_widgets() {
    let (mut scene, mut ctx) = loaded_scene();
    scene.unload(&mut ctx);
    assert!(scene.windows.is_empty());
    assert!(scene.field.is_none());
}
