pub mod cell;
pub mod column_map;
pub mod lineage;
pub mod rule;
pub mod upload;
