//! Demo application module
//!
//! Handles windowing and feeds window input through the handler manager.

mod host;
mod runner;
mod window;

pub use host::{WindowHost, center_location};
pub use runner::App;
pub use window::window_attributes_from_config;
