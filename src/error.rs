//! Error types

use thiserror::Error;

use crate::handler::HandlerKind;
use crate::input::EventKind;

/// Errors surfaced by the gesture pipeline
///
/// A handler declining to interpret an event is not an error; callbacks
/// return `None` for that.
#[derive(Debug, Error)]
pub enum GestureError {
    /// A handler with this kind is already registered
    #[error("handler `{kind}` is already registered")]
    DuplicateHandler { kind: HandlerKind },

    /// No handler of this kind (or of the requested type) is registered
    #[error("no handler `{kind}` of the requested type is registered")]
    UnknownHandler { kind: HandlerKind },

    /// The input event carries no usable timestamp
    #[error("`{event}` event has no valid timestamp (got {time_stamp})")]
    InvalidTimestamp { event: EventKind, time_stamp: f64 },

    /// Configuration could not be loaded
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}
