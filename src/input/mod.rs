//! Raw input events
//!
//! The handler manager consumes [`InputEvent`]s in arrival order. Hosts can
//! build them directly or let an [`InputCollector`] translate winit events.
//!
//! # Architecture
//!
//! ```text
//! Raw Input (winit) → InputCollector → InputEvent
//!                                          ↓
//!                                   HandlerManager::dispatch
//!                                   (handlers in registration order)
//! ```

mod collector;
mod events;
mod state;

// Re-export public API
pub use collector::InputCollector;
pub use events::{
    DeltaMode, EventKind, InputEvent, KeyCode, KeyEvent, MouseEvent, Touch, TouchEvent, TouchId,
    WheelEvent,
};
pub use state::{Modifiers, MouseButton};
