pub mod engine;
pub mod sheet;
