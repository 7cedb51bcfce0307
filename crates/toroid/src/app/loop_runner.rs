use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::events::{EventKind, InputEvent};
use crate::hitbox::HitboxId;
use crate::surface::SurfaceError;

use super::metrics::MetricsAccumulator;
use super::presenter::Presenter;
use super::scene::SceneError;
use super::{HostInput, Scene, UiContext};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub hit_overlay_visible: bool,
    /// Blend strength of the F3 hit-surface overlay.
    pub hit_overlay_alpha: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "toroid".to_string(),
            window_width: 1280,
            window_height: 720,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            hit_overlay_visible: false,
            hit_overlay_alpha: 160,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize frame presenter: {0}")]
    CreatePresenter(#[source] PixelsError),
    #[error("failed to create hit surface: {0}")]
    HitSurface(#[from] SurfaceError),
    #[error("failed to load scene: {0}")]
    SceneLoad(#[from] SceneError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut presenter = Presenter::new(Arc::clone(&window)).map_err(AppError::CreatePresenter)?;
    let size = window.inner_size();
    let mut ctx = UiContext::new(size.width, size.height)?;
    scene.load(&mut ctx)?;
    info!(
        hitbox_count = ctx.interaction.hitbox_count(),
        entity_count = ctx.ecs.entity_count(),
        "scene_loaded"
    );

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    info!(
        width = size.width,
        height = size.height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut host = HostInput::new();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut overlay_visible = config.hit_overlay_visible;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    let (width, height) = (new_size.width, new_size.height);
                    if let Err(error) = resize(&mut presenter, &mut ctx, width, height) {
                        warn!(error = %error, "resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = resize(&mut presenter, &mut ctx, size.width, size.height) {
                        warn!(error = %error, "resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if host.take_overlay_toggle_pressed() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    scene.update(frame_dt.as_secs_f32(), &mut ctx);
                    ctx.tick();

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    {
                        let mut frame = presenter.frame();
                        scene.render(&mut frame, &ctx);
                    }
                    ctx.interaction.render();
                    if overlay_visible {
                        presenter.draw_hit_overlay(&mut ctx.interaction, config.hit_overlay_alpha);
                    }
                    if let Err(error) = presenter.present() {
                        warn!(error = %error, "present_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = scene.debug_title(&ctx);
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    let hitbox_count = ctx.interaction.hitbox_count();
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now, hitbox_count) {
                        ctx.metrics = snapshot;
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            events_per_second = snapshot.events_per_second,
                            delivered_ratio = snapshot.delivered_ratio,
                            redirected = snapshot.redirected,
                            hitbox_count,
                            entity_count = ctx.ecs.entity_count(),
                            "loop_metrics"
                        );
                    }
                }
                other => {
                    if let Some(input) = host.handle_window_event(&other) {
                        dispatch_host_event(&mut ctx, &mut host, &input, &mut metrics_accumulator);
                    }
                    if host.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scene.unload(&mut ctx);
                ctx.interaction.clean();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Dispatches one host event plus any clicks it completes.
fn dispatch_host_event(
    ctx: &mut UiContext,
    host: &mut HostInput,
    event: &InputEvent,
    metrics: &mut MetricsAccumulator,
) {
    let target = click_target(ctx, event);
    if let Some(outcome) = ctx.interaction.handle_host_event(event) {
        metrics.record_dispatch(&outcome);
    }
    for synthesized in host.follow_ups(event, target, Instant::now()) {
        if let Some(outcome) = ctx.interaction.handle_host_event(&synthesized) {
            metrics.record_dispatch(&outcome);
        }
    }
}

fn click_target(ctx: &mut UiContext, event: &InputEvent) -> Option<HitboxId> {
    if !matches!(event.kind, EventKind::MouseDown | EventKind::MouseUp) {
        return None;
    }
    let point = event.offset?;
    ctx.interaction.hitbox_at(point).map(|hitbox| hitbox.id.clone())
}

fn resize(
    presenter: &mut Presenter,
    ctx: &mut UiContext,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    presenter.resize(width, height).map_err(AppError::CreatePresenter)?;
    ctx.interaction.update_canvas_size(width, height)?;
    Ok(())
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use winit::event::{ElementState, MouseButton};

    use crate::geometry::BoundingBox;
    use crate::hitbox::HitboxPatch;

    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_secs(2), max_frame_delta),
            max_frame_delta
        );
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(16), max_frame_delta),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn zero_durations_fall_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
        assert_eq!(format_render_cap(None), "off");
    }

    #[test]
    fn host_dispatch_delivers_synthesized_click() {
        let mut ctx = UiContext::new(40, 40).expect("context");
        let color = ctx.interaction.allocate_color().expect("color");
        let clicks = Rc::new(Cell::new(0));
        let clicks_in_handler = Rc::clone(&clicks);
        ctx.interaction.upsert_hitbox(
            "btn",
            HitboxPatch::new()
                .fixed_box(BoundingBox::from_rect(0.0, 0.0, 20.0, 20.0))
                .color(color)
                .on(EventKind::Click, move |_| {
                    clicks_in_handler.set(clicks_in_handler.get() + 1)
                }),
        );
        ctx.interaction.register_event_listener(EventKind::Click);
        ctx.interaction.render();

        let mut host = HostInput::new();
        let mut metrics = MetricsAccumulator::new(Duration::from_secs(1));
        for input in [
            host.cursor_moved(5.0, 5.0),
            host.mouse_input(MouseButton::Left, ElementState::Pressed)
                .expect("press"),
            host.mouse_input(MouseButton::Left, ElementState::Released)
                .expect("release"),
        ] {
            dispatch_host_event(&mut ctx, &mut host, &input, &mut metrics);
        }

        assert_eq!(clicks.get(), 1);
        let snapshot = metrics
            .maybe_snapshot(Instant::now() + Duration::from_secs(2), 1)
            .expect("snapshot");
        // Only the synthesized click is listened to, and it was delivered.
        assert_eq!(snapshot.delivered_ratio, 1.0);
    }
}
