mod bootstrap;
mod config;
mod desktop;

pub(crate) use bootstrap::build_app;
