mod host;
mod loop_runner;
mod metrics;
mod presenter;
mod scene;

pub use host::{HostInput, DOUBLE_CLICK_WINDOW, WHEEL_LINE_PX};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use presenter::Frame;
pub use scene::{Scene, SceneError, UiContext};
