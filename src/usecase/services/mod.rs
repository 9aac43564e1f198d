pub mod dispatcher;
pub mod export_service;
pub mod import_service;
pub mod rule_processor;
