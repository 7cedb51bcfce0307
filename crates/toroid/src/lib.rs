pub mod app;
pub mod behavior;
pub mod color;
pub mod color_heap;
pub mod ecs;
pub mod events;
pub mod geometry;
pub mod hitbox;
pub mod interaction;
pub mod raster;
pub mod registry;
pub mod sprite;
pub mod surface;

pub use app::{
    run_app, AppError, Frame, HostInput, LoopConfig, LoopMetricsSnapshot, Scene, SceneError,
    UiContext,
};
pub use behavior::{Anchor, Behavior, Draggable, Hoverable, Pressable};
pub use color::{Color, ColorError, HitboxColor};
pub use color_heap::{ColorHeap, ColorHeapError};
pub use ecs::{Ecs, Entity, HitboxComponent, HitboxSyncSystem, System};
pub use events::{buttons, EventKind, EventKindSet, InputEvent};
pub use geometry::{BoundingBox, Vec2};
pub use hitbox::{
    Callback, EventCallbacks, Hitbox, HitboxData, HitboxId, HitboxPatch, DEFAULT_LAYER,
};
pub use interaction::{DispatchOutcome, InteractionManager};
pub use registry::HitboxRegistry;
pub use sprite::{colorize, SpriteError, SpriteImage};
pub use surface::{HitSurface, SurfaceError};
