//! Bike share traffic by station, filtered to a time of day and drawn as markers over a map.

pub mod config;
pub mod coordinator;
pub mod data;
pub mod draw;
pub mod error;
pub mod events;
pub mod time;
pub mod traffic;

pub use coordinator::Coordinator;
pub use events::{Event, EventBus};
