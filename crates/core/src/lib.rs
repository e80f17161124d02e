#![forbid(unsafe_code)]

pub mod classify;
pub mod drill;
pub mod model;
pub mod prompt;
pub mod time;

pub use time::Clock;
