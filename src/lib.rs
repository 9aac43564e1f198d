pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod platform;
pub mod ui;
pub mod usecase;

#[cfg(test)]
mod tests;

pub const APP_TITLE: &str = "RuleXcel";

pub use config::EngineConfig;
pub use domain::entities::cell::{Cell, Dataset, Row};
pub use domain::entities::rule::{DataSource, Rule, RuleDescriptor};
pub use domain::rules::{CancelToken, RunOutcome};
pub use error::RuleError;
pub use usecase::services::dispatcher::{ApplyOutcome, Route, RuleDispatcher};
