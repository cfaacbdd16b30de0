pub mod attendance;
pub mod calendar;
pub mod core;
pub mod roster;
pub mod session;
