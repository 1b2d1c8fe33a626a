//! Gesture handlers and the shared handler contract
//!
//! A handler interprets raw input for one gesture (pan, rotate, pinch...)
//! and optionally returns a [`GestureResult`] describing how the camera
//! should move. Handlers never touch the camera themselves; the
//! [`HandlerManager`](crate::HandlerManager) arbitrates between them and
//! applies the merged result once per frame.

use std::any::Any;
use std::fmt;

use crate::easing::Easing;
use crate::geometry::Point;
use crate::input::{KeyEvent, MouseEvent, TouchEvent, WheelEvent};
use crate::map::{MapEvent, MapEventKind, Publisher};

mod map_event;
mod mouse;
mod touch_pan;
mod two_touch;

pub use map_event::{BlockableMapEventHandler, MapEventHandler};
pub use mouse::{DragStrategy, MouseDragHandler};
pub use touch_pan::TouchPanHandler;
pub use two_touch::{
    PinchZoom, TouchPitch, TouchPitchHandler, TouchRotate, TouchRotateHandler, TouchZoomHandler,
    TwoFingerGesture, TwoTouchHandler,
};

/// Identity of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    MapEvent,
    BoxZoom,
    TapZoom,
    ClickZoom,
    TapDragZoom,
    TouchPitch,
    MouseRotate,
    MousePitch,
    MousePan,
    TouchPan,
    TouchRotate,
    TouchZoom,
    ScrollZoom,
    Keyboard,
    DoubleClickZoom,
    BlockableMapEvent,
    /// Application-defined handler
    Custom(&'static str),
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MapEvent => "map_event",
            Self::BoxZoom => "box_zoom",
            Self::TapZoom => "tap_zoom",
            Self::ClickZoom => "click_zoom",
            Self::TapDragZoom => "tap_drag_zoom",
            Self::TouchPitch => "touch_pitch",
            Self::MouseRotate => "mouse_rotate",
            Self::MousePitch => "mouse_pitch",
            Self::MousePan => "mouse_pan",
            Self::TouchPan => "touch_pan",
            Self::TouchRotate => "touch_rotate",
            Self::TouchZoom => "touch_zoom",
            Self::ScrollZoom => "scroll_zoom",
            Self::Keyboard => "keyboard",
            Self::DoubleClickZoom => "double_click_zoom",
            Self::BlockableMapEvent => "blockable_map_event",
            Self::Custom(name) => *name,
        };
        f.write_str(name)
    }
}

/// Screen point kept fixed while the camera changes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Around {
    /// The viewport center
    #[default]
    Center,
    Point(Point),
}

/// What a handler wants done to the camera for one event
///
/// A result without any delta still claims the event: it marks the handler
/// active for this dispatch pass, which blocks handlers registered after it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureResult {
    pub pan_delta: Option<Point>,
    pub zoom_delta: Option<f64>,
    /// Degrees
    pub bearing_delta: Option<f64>,
    /// Degrees
    pub pitch_delta: Option<f64>,
    pub around: Option<Around>,
    /// Anchor for two-finger gestures; wins over `around`
    pub pinch_around: Option<Around>,
    /// Animate the change over this many milliseconds instead of jumping
    pub duration: Option<f64>,
    pub easing: Option<Easing>,
    pub delay_end_events: Option<f64>,
    /// Ask for another render frame even without a change
    pub needs_render_frame: bool,
    /// Keep this change out of the momentum history
    pub no_inertia: bool,
}

impl GestureResult {
    /// Result that claims the event without moving the camera
    pub fn claim() -> Self {
        Self::default()
    }

    /// Pan by `delta`, keeping the world point under `around` fixed
    pub fn pan(delta: Point, around: Point) -> Self {
        Self {
            pan_delta: Some(delta),
            around: Some(Around::Point(around)),
            ..Self::default()
        }
    }

    /// Zoom by `delta` levels around a two-finger anchor
    pub fn zoom(delta: f64, pinch_around: Around) -> Self {
        Self {
            zoom_delta: Some(delta),
            pinch_around: Some(pinch_around),
            ..Self::default()
        }
    }

    /// Rotate by `delta` degrees
    pub fn bearing(delta: f64) -> Self {
        Self {
            bearing_delta: Some(delta),
            ..Self::default()
        }
    }

    /// Pitch by `delta` degrees
    pub fn pitch(delta: f64) -> Self {
        Self {
            pitch_delta: Some(delta),
            ..Self::default()
        }
    }

    /// Returns true when any delta would move the camera
    pub fn has_change(&self) -> bool {
        self.pan_delta.is_some_and(|d| d.mag() != 0.0)
            || self.zoom_delta.is_some_and(|d| d != 0.0)
            || self.bearing_delta.is_some_and(|d| d != 0.0)
            || self.pitch_delta.is_some_and(|d| d != 0.0)
    }

    /// Overwrites every field `other` sets; used within one dispatch pass
    pub fn merge(&mut self, other: &GestureResult) {
        fn overwrite<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overwrite(&mut self.pan_delta, other.pan_delta);
        overwrite(&mut self.zoom_delta, other.zoom_delta);
        overwrite(&mut self.bearing_delta, other.bearing_delta);
        overwrite(&mut self.pitch_delta, other.pitch_delta);
        overwrite(&mut self.around, other.around);
        overwrite(&mut self.pinch_around, other.pinch_around);
        overwrite(&mut self.duration, other.duration);
        overwrite(&mut self.easing, other.easing);
        overwrite(&mut self.delay_end_events, other.delay_end_events);
        self.needs_render_frame |= other.needs_render_frame;
        self.no_inertia |= other.no_inertia;
    }

    /// Sums deltas and keeps the latest anchor and timing; used across
    /// the changes queued within one frame
    pub fn accumulate(&mut self, other: &GestureResult) {
        fn sum<T: Copy + std::ops::Add<Output = T>>(slot: &mut Option<T>, value: Option<T>) {
            if let Some(value) = value {
                *slot = Some(match *slot {
                    Some(current) => current + value,
                    None => value,
                });
            }
        }

        sum(&mut self.pan_delta, other.pan_delta);
        sum(&mut self.zoom_delta, other.zoom_delta);
        sum(&mut self.bearing_delta, other.bearing_delta);
        sum(&mut self.pitch_delta, other.pitch_delta);
        if other.around.is_some() {
            self.around = other.around;
        }
        if other.pinch_around.is_some() {
            self.pinch_around = other.pinch_around;
        }
        if other.duration.is_some() {
            self.duration = other.duration;
        }
        if other.easing.is_some() {
            self.easing = other.easing;
        }
        if other.delay_end_events.is_some() {
            self.delay_end_events = other.delay_end_events;
        }
        self.no_inertia |= other.no_inertia;
    }
}

/// What a handler may do to the outside world while handling an event
///
/// Handlers can publish notifications and ask the host to suppress the
/// platform default action of the input. They never see the camera.
pub struct HandlerContext<'a> {
    publisher: &'a mut dyn Publisher,
    default_prevented: bool,
}

impl<'a> HandlerContext<'a> {
    /// Creates a context publishing through `publisher`
    pub fn new(publisher: &'a mut dyn Publisher) -> Self {
        Self {
            publisher,
            default_prevented: false,
        }
    }

    /// Publishes `event` and returns it as listeners left it
    pub fn fire(&mut self, mut event: MapEvent) -> MapEvent {
        self.publisher.fire(&mut event);
        event
    }

    /// Returns true when some listener is attached for `kind`
    pub fn listens(&self, kind: MapEventKind) -> bool {
        self.publisher.listens(kind)
    }

    /// Asks the host to suppress the platform default for this input
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns true once any handler called [`Self::prevent_default`]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Contract shared by every gesture handler
///
/// The manager calls at most one event callback per input event, matching the
/// event kind. Callbacks a handler does not override decline the event.
pub trait Handler {
    /// Returns transient gesture state to idle
    fn reset(&mut self);

    fn enable(&mut self);

    /// Disables the handler and resets it
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// Returns true while the handler is driving a gesture
    fn is_active(&self) -> bool;

    fn mousedown(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn mouseup(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn mousemove(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn mouseover(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn mouseout(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn click(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn dblclick(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn contextmenu(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn wheel(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &WheelEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        None
    }

    fn touchstart(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &TouchEvent,
    ) -> Option<GestureResult> {
        None
    }

    fn touchmove(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &TouchEvent,
    ) -> Option<GestureResult> {
        None
    }

    fn touchend(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &TouchEvent,
    ) -> Option<GestureResult> {
        None
    }

    fn touchcancel(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &TouchEvent,
    ) -> Option<GestureResult> {
        None
    }

    fn keydown(&mut self, _cx: &mut HandlerContext<'_>, _event: &KeyEvent) -> Option<GestureResult> {
        None
    }

    fn keyup(&mut self, _cx: &mut HandlerContext<'_>, _event: &KeyEvent) -> Option<GestureResult> {
        None
    }

    /// Called once per render frame before queued changes are applied
    fn render_frame(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _time_stamp: f64,
    ) -> Option<GestureResult> {
        None
    }

    /// Allows downcasting to concrete types for handler-specific options
    fn as_any(&self) -> &dyn Any;

    /// Mutable version of as_any
    fn as_any_mut(&mut self) -> &mut dyn Any;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_has_no_change() {
        assert!(!GestureResult::claim().has_change());
        assert!(!GestureResult::pan(Point::ZERO, Point::ZERO).has_change());
        assert!(!GestureResult::bearing(0.0).has_change());
        assert!(GestureResult::pitch(0.5).has_change());
    }

    #[test]
    fn test_merge_last_writer_wins_per_field() {
        let mut merged = GestureResult::pan(Point::new(1.0, 0.0), Point::new(5.0, 5.0));
        merged.merge(&GestureResult::zoom(0.5, Around::Center));
        merged.merge(&GestureResult::pan(Point::new(0.0, 2.0), Point::new(7.0, 7.0)));

        assert_eq!(merged.pan_delta, Some(Point::new(0.0, 2.0)));
        assert_eq!(merged.around, Some(Around::Point(Point::new(7.0, 7.0))));
        assert_eq!(merged.zoom_delta, Some(0.5));
        assert_eq!(merged.pinch_around, Some(Around::Center));
    }

    #[test]
    fn test_accumulate_sums_deltas() {
        let mut combined = GestureResult::default();
        combined.accumulate(&GestureResult::pan(Point::new(1.0, 0.0), Point::new(1.0, 1.0)));
        combined.accumulate(&GestureResult::pan(Point::new(0.0, 1.0), Point::new(2.0, 2.0)));
        combined.accumulate(&GestureResult::bearing(3.0));
        combined.accumulate(&GestureResult::bearing(-1.0));

        assert_eq!(combined.pan_delta, Some(Point::new(1.0, 1.0)));
        assert_eq!(combined.around, Some(Around::Point(Point::new(2.0, 2.0))));
        assert_eq!(combined.bearing_delta, Some(2.0));
        assert_eq!(combined.zoom_delta, None);
    }

    #[test]
    fn test_handler_kind_names() {
        assert_eq!(HandlerKind::MousePan.to_string(), "mouse_pan");
        assert_eq!(HandlerKind::Custom("lasso").to_string(), "lasso");
    }
}
