mod app;

use tracing::error;

fn main() {
    let wiring = app::build_app();
    if let Err(err) = toroid::run_app(wiring.config, wiring.scene) {
        error!(error = %err, "app_failed");
        std::process::exit(1);
    }
}
