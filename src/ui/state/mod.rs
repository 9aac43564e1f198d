pub mod app_state;
pub mod rule_form;
