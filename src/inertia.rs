//! Momentum tracking contract
//!
//! The physics of post-gesture momentum live outside this crate. The manager
//! only records applied deltas, clears the history, and asks for an easing
//! once motion ends.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::handler::GestureResult;
use crate::input::InputEvent;
use crate::map::EaseOptions;

/// Momentum parameters, forwarded untouched to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaOptions {
    /// Factor applied to the release velocity
    pub linearity: f64,
    pub easing: Easing,
    /// Deceleration in pixels per second squared
    pub deceleration: f64,
    /// Speed cap in pixels per second
    pub max_speed: f64,
}

impl Default for InertiaOptions {
    fn default() -> Self {
        Self {
            linearity: 0.3,
            easing: Easing::INERTIA,
            deceleration: 2500.0,
            max_speed: 1400.0,
        }
    }
}

/// Records recent gesture deltas and resolves momentum on release
pub trait Inertia {
    /// Records a combined result applied to the camera at `time_stamp`
    fn record(&mut self, result: &GestureResult, time_stamp: f64);

    /// Drops the recorded history; `result` is the animated change that
    /// replaced it, if any
    fn clear(&mut self, result: Option<&GestureResult>);

    /// Momentum easing to run now that motion stopped, if any
    fn on_move_end(
        &mut self,
        original_event: Option<&InputEvent>,
        bearing_changed: bool,
        options: &InertiaOptions,
    ) -> Option<EaseOptions>;
}

/// Tracker that never produces momentum
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInertia;

impl Inertia for NoInertia {
    fn record(&mut self, _result: &GestureResult, _time_stamp: f64) {}

    fn clear(&mut self, _result: Option<&GestureResult>) {}

    fn on_move_end(
        &mut self,
        _original_event: Option<&InputEvent>,
        _bearing_changed: bool,
        _options: &InertiaOptions,
    ) -> Option<EaseOptions> {
        None
    }
}
