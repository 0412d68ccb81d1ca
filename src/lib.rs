pub mod cli;
pub mod config;
pub mod error;
pub mod http_probe;
pub mod logging;
pub mod report;
pub mod runner;
pub mod stats;
pub mod targets;

pub use error::{Error, Result};
pub use runner::{RunSettings, Runner};
pub use stats::{RunStatistics, StatsAggregator};
pub use targets::{Category, ExpectedClass, Target, TargetSet};
