pub mod app_config;
pub mod model;

pub use app_config::{AppConfig, load_config, setup_resolver};
pub use model::StressConfig;
