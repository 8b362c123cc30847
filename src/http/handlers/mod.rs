pub mod attendance;
pub mod core;
pub mod demo_mode;
