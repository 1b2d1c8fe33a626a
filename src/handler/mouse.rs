//! Single-pointer mouse drags: pan, rotate and pitch
//!
//! All three share one state machine, idle → armed (button pressed) →
//! active (first delta reported) → idle on release. What differs is which
//! presses they accept and how a movement turns into a camera delta; that is
//! the [`DragStrategy`].

use std::any::Any;

use super::{GestureResult, Handler, HandlerContext};
use crate::geometry::Point;
use crate::input::{MouseButton, MouseEvent};

/// Degrees of bearing per horizontal pixel dragged
const ROTATE_DEGREES_PER_PIXEL: f64 = -0.8;

/// Degrees of pitch per vertical pixel dragged
const PITCH_DEGREES_PER_PIXEL: f64 = 0.5;

/// Per-variant behaviour of a mouse drag
#[derive(Debug, Clone, Copy)]
pub struct DragStrategy {
    /// Decides whether a press starts this drag
    pub accepts: fn(&MouseEvent) -> bool,
    /// Turns a movement from `last` to `point` into a camera delta
    pub delta: fn(last: Point, point: Point) -> Option<GestureResult>,
    /// Suppress the platform context menu while enabled
    pub blocks_context_menu: bool,
}

fn primary_without_ctrl(event: &MouseEvent) -> bool {
    event.button.is_primary() && !event.modifiers.ctrl
}

fn ctrl_primary_or_secondary(event: &MouseEvent) -> bool {
    (event.button.is_primary() && event.modifiers.ctrl) || event.button.is_secondary()
}

fn pan_delta(last: Point, point: Point) -> Option<GestureResult> {
    Some(GestureResult::pan(point - last, point))
}

fn rotate_delta(last: Point, point: Point) -> Option<GestureResult> {
    let bearing_delta = (last.x - point.x) * ROTATE_DEGREES_PER_PIXEL;
    (bearing_delta != 0.0).then(|| GestureResult::bearing(bearing_delta))
}

fn pitch_delta(last: Point, point: Point) -> Option<GestureResult> {
    let pitch_delta = (last.y - point.y) * PITCH_DEGREES_PER_PIXEL;
    (pitch_delta != 0.0).then(|| GestureResult::pitch(pitch_delta))
}

impl DragStrategy {
    /// Primary button without control pans
    pub const PAN: Self = Self {
        accepts: primary_without_ctrl,
        delta: pan_delta,
        blocks_context_menu: false,
    };

    /// Control + primary, or secondary, rotates with horizontal movement
    ///
    /// The context menu is suppressed because on some platforms a secondary
    /// press cannot be told apart from a context-menu request.
    pub const ROTATE: Self = Self {
        accepts: ctrl_primary_or_secondary,
        delta: rotate_delta,
        blocks_context_menu: true,
    };

    /// Control + primary, or secondary, pitches with vertical movement
    pub const PITCH: Self = Self {
        accepts: ctrl_primary_or_secondary,
        delta: pitch_delta,
        blocks_context_menu: true,
    };
}

/// Mouse drag handler parameterized by a [`DragStrategy`]
#[derive(Debug, Clone)]
pub struct MouseDragHandler {
    strategy: DragStrategy,
    click_tolerance: f64,
    enabled: bool,
    active: bool,
    moved: bool,
    last_point: Option<Point>,
    event_button: Option<MouseButton>,
}

impl MouseDragHandler {
    /// Creates a disabled drag handler
    pub fn new(strategy: DragStrategy, click_tolerance: f64) -> Self {
        Self {
            strategy,
            click_tolerance,
            enabled: false,
            active: false,
            moved: false,
            last_point: None,
            event_button: None,
        }
    }

    /// Drag to pan
    pub fn pan(click_tolerance: f64) -> Self {
        Self::new(DragStrategy::PAN, click_tolerance)
    }

    /// Drag to rotate
    pub fn rotate(click_tolerance: f64) -> Self {
        Self::new(DragStrategy::ROTATE, click_tolerance)
    }

    /// Drag to pitch
    pub fn pitch(click_tolerance: f64) -> Self {
        Self::new(DragStrategy::PITCH, click_tolerance)
    }
}

impl Handler for MouseDragHandler {
    fn reset(&mut self) {
        self.active = false;
        self.moved = false;
        self.last_point = None;
        self.event_button = None;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.reset();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn mousedown(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        point: Point,
    ) -> Option<GestureResult> {
        // A second button pressed mid-drag does not restart the drag
        if self.last_point.is_some() || !(self.strategy.accepts)(event) {
            return None;
        }
        self.last_point = Some(point);
        self.event_button = Some(event.button);
        None
    }

    fn mousemove(
        &mut self,
        cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        point: Point,
    ) -> Option<GestureResult> {
        let last_point = self.last_point?;
        cx.prevent_default();

        self.last_point = Some(point);
        if !self.moved && point.dist(last_point) < self.click_tolerance {
            return None;
        }
        self.moved = true;

        let result = (self.strategy.delta)(last_point, point);
        if result.is_some() {
            self.active = true;
        }
        result
    }

    fn mouseup(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        if self.last_point.is_none() || self.event_button != Some(event.button) {
            return None;
        }
        self.reset();
        None
    }

    fn contextmenu(
        &mut self,
        cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        if self.strategy.blocks_context_menu {
            cx.prevent_default();
        }
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
