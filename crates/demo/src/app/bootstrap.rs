use toroid::{LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{resolve_demo_config, resolve_render_fps, DemoConfig};
use super::desktop::DesktopScene;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== toroid desktop startup ===");

    let demo_config = resolve_demo_config();
    let config = loop_config_from(&demo_config);
    AppWiring {
        config,
        scene: Box::new(DesktopScene::new(demo_config)),
    }
}

fn loop_config_from(demo_config: &DemoConfig) -> LoopConfig {
    LoopConfig {
        window_title: demo_config.window_title.clone(),
        window_width: demo_config.window_width,
        window_height: demo_config.window_height,
        max_render_fps: resolve_render_fps(demo_config.max_render_fps),
        hit_overlay_visible: demo_config.show_hit_overlay,
        ..LoopConfig::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_config_carries_window_and_overlay_settings() {
        let demo_config = DemoConfig {
            window_title: "t".to_string(),
            window_width: 320,
            window_height: 240,
            show_hit_overlay: true,
            ..DemoConfig::default()
        };
        let config = loop_config_from(&demo_config);
        assert_eq!(config.window_title, "t");
        assert_eq!((config.window_width, config.window_height), (320, 240));
        assert!(config.hit_overlay_visible);
    }
}
