//! Map Gestures
//!
//! Turns raw pointer, touch, wheel and keyboard input into one camera update
//! per frame while independent gesture handlers compete for the same input.

/// Demo host - windowing and the winit event loop
pub mod app;

/// Camera transform contract and the planar camera
pub mod camera;

/// Configuration profiles
pub mod config;

/// Easing curves for animated camera transitions
pub mod easing;

/// Error types
pub mod error;

/// Screen-space point math
pub mod geometry;

/// Gesture handlers and the shared handler contract
pub mod handler;

/// Momentum tracking contract
pub mod inertia;

/// Raw input events and their collection from winit
pub mod input;

/// Handler manager - arbitration, batching and camera application
pub mod manager;

/// Map host contract and map notifications
pub mod map;

pub use error::GestureError;
pub use manager::HandlerManager;
