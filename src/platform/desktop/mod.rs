pub mod blocking;
pub mod dirs;
