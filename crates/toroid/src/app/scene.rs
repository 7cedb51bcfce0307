use thiserror::Error;

use crate::color_heap::ColorHeapError;
use crate::ecs::Ecs;
use crate::interaction::InteractionManager;
use crate::sprite::SpriteError;
use crate::surface::SurfaceError;

use super::{Frame, LoopMetricsSnapshot};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Color(#[from] ColorHeapError),
    #[error(transparent)]
    Sprite(#[from] SpriteError),
}

/// Everything a scene may touch, handed to it explicitly on every call.
pub struct UiContext {
    pub interaction: InteractionManager,
    pub ecs: Ecs,
    /// Most recent loop metrics; default until the first interval elapses.
    pub metrics: LoopMetricsSnapshot,
}

impl UiContext {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            interaction: InteractionManager::new(width, height)?,
            ecs: Ecs::new(),
            metrics: LoopMetricsSnapshot::default(),
        })
    }

    /// Runs the ECS systems against the interaction manager.
    pub fn tick(&mut self) {
        self.ecs.update(&mut self.interaction);
    }
}

pub trait Scene {
    fn load(&mut self, ctx: &mut UiContext) -> Result<(), SceneError>;
    fn update(&mut self, dt_seconds: f32, ctx: &mut UiContext);
    fn render(&mut self, frame: &mut Frame<'_>, ctx: &UiContext);
    fn unload(&mut self, ctx: &mut UiContext);
    fn debug_title(&self, _ctx: &UiContext) -> Option<String> {
        None
    }
}
