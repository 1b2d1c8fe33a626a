//! Two-finger gestures: pinch-zoom, rotate and pitch
//!
//! All three share the same tracking rules through [`TwoTouchHandler`]; only
//! the interpretation of the finger movement differs, supplied by a
//! [`TwoFingerGesture`].

use std::any::Any;
use std::f64::consts::PI;

use tracing::trace;

use super::{Around, GestureResult, Handler, HandlerContext};
use crate::geometry::Point;
use crate::input::{TouchEvent, TouchId};

/// Arc length in pixels fingers must travel before a rotation is recognized
const ROTATION_THRESHOLD_PX: f64 = 20.0;

/// Time a single moving finger may wait for the other before pitch gives up
const PITCH_SINGLE_TOUCH_MS: f64 = 100.0;

const PITCH_DEGREES_PER_PIXEL: f64 = -0.5;

/// Interpretation of the movement of two tracked fingers
///
/// `Default` is the idle state; the handler resets a gesture by replacing it.
pub trait TwoFingerGesture: Default {
    /// Called once when two fingers first touch down
    fn start(&mut self, points: [Point; 2]);

    /// Called for every move of the tracked fingers
    fn touch_move(
        &mut self,
        points: [Point; 2],
        pinch_around: Around,
        time_stamp: f64,
    ) -> Option<GestureResult>;

    fn is_active(&self) -> bool;
}

/// Tracks the first two fingers placed on the map and feeds them to `G`
///
/// Further fingers joining the gesture are ignored. The gesture ends as soon
/// as either tracked finger lifts.
#[derive(Debug, Clone, Default)]
pub struct TwoTouchHandler<G> {
    enabled: bool,
    around_center: bool,
    first_two_touches: Option<[TouchId; 2]>,
    gesture: G,
}

/// Pinch to zoom
pub type TouchZoomHandler = TwoTouchHandler<PinchZoom>;
/// Twist two fingers to rotate
pub type TouchRotateHandler = TwoTouchHandler<TouchRotate>;
/// Drag two fingers vertically to pitch
pub type TouchPitchHandler = TwoTouchHandler<TouchPitch>;

impl<G: TwoFingerGesture> TwoTouchHandler<G> {
    /// Creates a disabled handler
    pub fn new() -> Self {
        Self {
            enabled: false,
            around_center: false,
            first_two_touches: None,
            gesture: G::default(),
        }
    }

    /// Anchors the gesture at the viewport center instead of between the fingers
    pub fn set_around_center(&mut self, around_center: bool) {
        self.around_center = around_center;
    }

    pub fn around_center(&self) -> bool {
        self.around_center
    }

    /// The gesture interpretation, for inspection
    pub fn gesture(&self) -> &G {
        &self.gesture
    }

    fn tracked_points(&self, event: &TouchEvent) -> Option<[Point; 2]> {
        let [a, b] = self.first_two_touches?;
        Some([event.point_of(a)?, event.point_of(b)?])
    }
}

impl<G: TwoFingerGesture + 'static> Handler for TwoTouchHandler<G> {
    fn reset(&mut self) {
        self.first_two_touches = None;
        self.gesture = G::default();
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
        self.gesture.is_active()
    }

    fn touchstart(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        if self.first_two_touches.is_some() {
            return None;
        }
        let [a, b, ..] = event.touches.as_slice() else {
            return None;
        };
        self.first_two_touches = Some([a.id, b.id]);
        self.gesture.start([a.point, b.point]);
        None
    }

    fn touchmove(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        self.first_two_touches?;
        cx.prevent_default();

        let [a, b] = self.tracked_points(event)?;
        let pinch_around = if self.around_center {
            Around::Center
        } else {
            Around::Point(a.midpoint(b))
        };
        self.gesture.touch_move([a, b], pinch_around, event.time_stamp)
    }

    fn touchend(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        if self.first_two_touches.is_none() || self.tracked_points(event).is_some() {
            return None;
        }
        self.reset();
        None
    }

    fn touchcancel(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &TouchEvent,
    ) -> Option<GestureResult> {
        self.reset();
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Zoom by the change of distance between the fingers
#[derive(Debug, Clone, Default)]
pub struct PinchZoom {
    active: bool,
    distance: f64,
}

impl TwoFingerGesture for PinchZoom {
    fn start(&mut self, [a, b]: [Point; 2]) {
        self.distance = a.dist(b);
    }

    fn touch_move(
        &mut self,
        [a, b]: [Point; 2],
        pinch_around: Around,
        _time_stamp: f64,
    ) -> Option<GestureResult> {
        let last_distance = self.distance;
        self.distance = a.dist(b);
        if last_distance == 0.0 || self.distance == 0.0 {
            return None;
        }
        self.active = true;
        Some(GestureResult::zoom(
            (self.distance / last_distance).log2(),
            pinch_around,
        ))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Rotate by the change of angle of the line between the fingers
///
/// Nothing is reported until the rotation since the gesture started exceeds
/// an angle equivalent to a fixed arc length on the smallest circle the
/// fingers have described so far.
#[derive(Debug, Clone, Default)]
pub struct TouchRotate {
    active: bool,
    start_vector: Point,
    vector: Point,
    min_diameter: f64,
}

impl TouchRotate {
    /// Rotation in degrees that must be exceeded before the gesture starts
    pub fn threshold_degrees(&self) -> f64 {
        ROTATION_THRESHOLD_PX / (PI * self.min_diameter) * 360.0
    }

    fn is_below_threshold(&mut self, vector: Point) -> bool {
        self.min_diameter = self.min_diameter.min(vector.mag());
        bearing_delta(vector, self.start_vector).abs() < self.threshold_degrees()
    }
}

impl TwoFingerGesture for TouchRotate {
    fn start(&mut self, [a, b]: [Point; 2]) {
        self.start_vector = a - b;
        self.vector = self.start_vector;
        self.min_diameter = a.dist(b);
    }

    fn touch_move(
        &mut self,
        [a, b]: [Point; 2],
        pinch_around: Around,
        _time_stamp: f64,
    ) -> Option<GestureResult> {
        let last_vector = self.vector;
        self.vector = a - b;
        if !self.active && self.is_below_threshold(self.vector) {
            return None;
        }
        if !self.active {
            trace!(threshold = self.threshold_degrees(), "two-finger rotate recognized");
        }
        self.active = true;
        Some(GestureResult {
            bearing_delta: Some(bearing_delta(self.vector, last_vector)),
            pinch_around: Some(pinch_around),
            ..GestureResult::default()
        })
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

fn bearing_delta(a: Point, b: Point) -> f64 {
    a.angle_with(b).to_degrees()
}

/// Pitch by dragging two fingers up or down together
///
/// The fingers must start one above the other. Whether the movement is a
/// pitch is decided once, on the first move where both fingers moved, and
/// then kept for the rest of the gesture.
#[derive(Debug, Clone, Default)]
pub struct TouchPitch {
    active: bool,
    valid: Option<bool>,
    first_move: Option<f64>,
    last_points: [Point; 2],
}

impl TouchPitch {
    /// `None` while undecided
    pub fn is_valid(&self) -> Option<bool> {
        self.valid
    }

    fn gesture_begins_vertically(&mut self, a: Point, b: Point, time_stamp: f64) -> Option<bool> {
        if self.valid.is_some() {
            return self.valid;
        }

        let moved_a = a.mag() > 0.0;
        let moved_b = b.mag() > 0.0;
        if !moved_a && !moved_b {
            return None;
        }
        if !moved_a || !moved_b {
            let first_move = *self.first_move.get_or_insert(time_stamp);
            return (time_stamp - first_move >= PITCH_SINGLE_TOUCH_MS).then_some(false);
        }

        let same_direction = (a.y > 0.0) == (b.y > 0.0);
        Some(a.is_vertical() && b.is_vertical() && same_direction)
    }
}

impl TwoFingerGesture for TouchPitch {
    fn start(&mut self, [a, b]: [Point; 2]) {
        self.last_points = [a, b];
        if !(a - b).is_vertical() {
            self.valid = Some(false);
        }
    }

    fn touch_move(
        &mut self,
        points: [Point; 2],
        _pinch_around: Around,
        time_stamp: f64,
    ) -> Option<GestureResult> {
        let vector_a = points[0] - self.last_points[0];
        let vector_b = points[1] - self.last_points[1];

        self.valid = self.gesture_begins_vertically(vector_a, vector_b, time_stamp);
        if self.valid != Some(true) {
            return None;
        }

        self.last_points = points;
        self.active = true;
        let y_delta_average = (vector_a.y + vector_b.y) / 2.0;
        Some(GestureResult::pitch(y_delta_average * PITCH_DEGREES_PER_PIXEL))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::RecordingPublisher;
    use crate::input::Touch;

    fn touches(time_stamp: f64, points: &[(u64, f64, f64)]) -> TouchEvent {
        TouchEvent::new(
            time_stamp,
            points
                .iter()
                .map(|&(id, x, y)| Touch::new(id, Point::new(x, y)))
                .collect(),
        )
    }

    /// Two fingers on a circle of `radius` around the origin at `degrees`
    fn twisted(time_stamp: f64, radius: f64, degrees: f64) -> TouchEvent {
        let (sin, cos) = degrees.to_radians().sin_cos();
        touches(
            time_stamp,
            &[(1, radius * cos, radius * sin), (2, -radius * cos, -radius * sin)],
        )
    }

    #[test]
    fn test_pinch_zoom_log2_of_distance_ratio() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut zoom = TouchZoomHandler::new();
        zoom.enable();

        zoom.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 100.0, 0.0)]));
        let result = zoom
            .touchmove(&mut cx, &touches(16.0, &[(1, -50.0, 0.0), (2, 150.0, 0.0)]))
            .unwrap();

        assert!((result.zoom_delta.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(result.pinch_around, Some(Around::Point(Point::new(50.0, 0.0))));
        assert!(zoom.is_active());
        assert!(cx.default_prevented());
    }

    #[test]
    fn test_pinch_around_center_option() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut zoom = TouchZoomHandler::new();
        zoom.enable();
        zoom.set_around_center(true);

        zoom.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 100.0, 0.0)]));
        let result = zoom
            .touchmove(&mut cx, &touches(16.0, &[(1, 0.0, 0.0), (2, 50.0, 0.0)]))
            .unwrap();
        assert_eq!(result.pinch_around, Some(Around::Center));
        assert!((result.zoom_delta.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_third_finger_is_ignored_and_lifting_tracked_finger_resets() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut zoom = TouchZoomHandler::new();
        zoom.enable();

        zoom.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 100.0, 0.0)]));
        zoom.touchstart(
            &mut cx,
            &touches(5.0, &[(1, 0.0, 0.0), (2, 100.0, 0.0), (3, 40.0, 40.0)]),
        );
        let result = zoom
            .touchmove(
                &mut cx,
                &touches(16.0, &[(1, 0.0, 0.0), (2, 200.0, 0.0), (3, 90.0, 90.0)]),
            )
            .unwrap();
        assert!((result.zoom_delta.unwrap() - 1.0).abs() < 1e-12);

        // A move without one of the tracked fingers is ignored
        assert!(zoom
            .touchmove(&mut cx, &touches(20.0, &[(1, 0.0, 0.0), (3, 10.0, 0.0)]))
            .is_none());

        // Lifting the untracked finger keeps the gesture
        zoom.touchend(&mut cx, &touches(30.0, &[(1, 0.0, 0.0), (2, 200.0, 0.0)]));
        assert!(zoom.is_active());

        zoom.touchend(&mut cx, &touches(40.0, &[(2, 200.0, 0.0)]));
        assert!(!zoom.is_active());
    }

    #[test]
    fn test_single_touch_does_not_start() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut zoom = TouchZoomHandler::new();
        zoom.enable();

        zoom.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0)]));
        assert!(zoom
            .touchmove(&mut cx, &touches(16.0, &[(1, 10.0, 0.0)]))
            .is_none());
        assert!(!cx.default_prevented());
    }

    #[test]
    fn test_rotate_waits_for_threshold() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut rotate = TouchRotateHandler::new();
        rotate.enable();

        // Fingers 100px apart: threshold is 20 / (100π) * 360 ≈ 22.9°
        rotate.touchstart(&mut cx, &twisted(0.0, 50.0, 0.0));
        assert!((rotate.gesture().threshold_degrees() - 72.0 / PI).abs() < 1e-9);

        assert!(rotate.touchmove(&mut cx, &twisted(16.0, 50.0, 10.0)).is_none());
        assert!(rotate.touchmove(&mut cx, &twisted(32.0, 50.0, 20.0)).is_none());
        assert!(!rotate.is_active());

        // Past the threshold the delta is relative to the previous move
        let result = rotate
            .touchmove(&mut cx, &twisted(48.0, 50.0, 30.0))
            .unwrap();
        assert!((result.bearing_delta.unwrap().abs() - 10.0).abs() < 1e-9);
        assert!(rotate.is_active());

        // Once active even small twists are reported
        let result = rotate
            .touchmove(&mut cx, &twisted(64.0, 50.0, 31.0))
            .unwrap();
        assert!((result.bearing_delta.unwrap().abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_threshold_grows_as_fingers_close() {
        let mut rotate = TouchRotate::default();
        rotate.start([Point::new(50.0, 0.0), Point::new(-50.0, 0.0)]);
        let wide = rotate.threshold_degrees();

        rotate.touch_move(
            [Point::new(10.0, 0.0), Point::new(-10.0, 0.0)],
            Around::Center,
            16.0,
        );
        assert!(rotate.threshold_degrees() > wide);

        // Spreading again does not lower it
        let narrow = rotate.threshold_degrees();
        rotate.touch_move(
            [Point::new(80.0, 0.0), Point::new(-80.0, 0.0)],
            Around::Center,
            32.0,
        );
        assert_eq!(rotate.threshold_degrees(), narrow);
    }

    #[test]
    fn test_pitch_with_fingers_moving_together() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut pitch = TouchPitchHandler::new();
        pitch.enable();

        pitch.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 0.0, 100.0)]));
        let result = pitch
            .touchmove(&mut cx, &touches(16.0, &[(1, 0.0, -10.0), (2, 0.0, 90.0)]))
            .unwrap();
        assert_eq!(result.pitch_delta, Some(5.0));
        assert!(pitch.is_active());

        let result = pitch
            .touchmove(&mut cx, &touches(32.0, &[(1, 1.0, -6.0), (2, 0.0, 94.0)]))
            .unwrap();
        assert_eq!(result.pitch_delta, Some(-2.0));
    }

    #[test]
    fn test_pitch_rejects_side_by_side_start() {
        let mut pitch = TouchPitch::default();
        pitch.start([Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(pitch.is_valid(), Some(false));
        assert!(pitch
            .touch_move(
                [Point::new(0.0, -10.0), Point::new(100.0, -10.0)],
                Around::Center,
                16.0
            )
            .is_none());
        assert!(!pitch.is_active());
    }

    #[test]
    fn test_pitch_rejects_opposite_directions() {
        let mut pitch = TouchPitch::default();
        pitch.start([Point::new(0.0, 0.0), Point::new(0.0, 100.0)]);
        assert!(pitch
            .touch_move(
                [Point::new(0.0, -10.0), Point::new(0.0, 110.0)],
                Around::Center,
                16.0
            )
            .is_none());
        assert_eq!(pitch.is_valid(), Some(false));

        // Decided once; a later aligned move stays rejected
        assert!(pitch
            .touch_move(
                [Point::new(0.0, -20.0), Point::new(0.0, 100.0)],
                Around::Center,
                32.0
            )
            .is_none());
    }

    #[test]
    fn test_pitch_single_finger_grace_window() {
        let mut pitch = TouchPitch::default();
        pitch.start([Point::new(0.0, 0.0), Point::new(0.0, 100.0)]);

        // Nobody moved: undecided, no timer
        assert!(pitch
            .touch_move([Point::new(0.0, 0.0), Point::new(0.0, 100.0)], Around::Center, 0.0)
            .is_none());
        assert_eq!(pitch.is_valid(), None);

        // One finger moved: wait
        assert!(pitch
            .touch_move([Point::new(0.0, -5.0), Point::new(0.0, 100.0)], Around::Center, 10.0)
            .is_none());
        assert_eq!(pitch.is_valid(), None);

        // Second finger joins within the window
        let result = pitch
            .touch_move([Point::new(0.0, -10.0), Point::new(0.0, 90.0)], Around::Center, 60.0)
            .unwrap();
        assert_eq!(result.pitch_delta, Some(5.0));
    }

    #[test]
    fn test_pitch_single_finger_times_out() {
        let mut pitch = TouchPitch::default();
        pitch.start([Point::new(0.0, 0.0), Point::new(0.0, 100.0)]);

        pitch.touch_move([Point::new(0.0, -5.0), Point::new(0.0, 100.0)], Around::Center, 10.0);
        pitch.touch_move([Point::new(0.0, -8.0), Point::new(0.0, 100.0)], Around::Center, 110.0);
        assert_eq!(pitch.is_valid(), Some(false));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut zoom = TouchZoomHandler::new();
        zoom.enable();
        zoom.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 100.0, 0.0)]));
        zoom.touchmove(&mut cx, &touches(16.0, &[(1, 0.0, 0.0), (2, 120.0, 0.0)]));
        assert!(zoom.is_active());

        zoom.reset();
        assert!(!zoom.is_active());
        assert!(zoom
            .touchmove(&mut cx, &touches(32.0, &[(1, 0.0, 0.0), (2, 140.0, 0.0)]))
            .is_none());
    }

    #[test]
    fn test_reset_clears_recognized_rotation() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut rotate = TouchRotateHandler::new();
        rotate.enable();

        rotate.touchstart(&mut cx, &twisted(0.0, 50.0, 0.0));
        assert!(rotate.touchmove(&mut cx, &twisted(16.0, 50.0, 30.0)).is_some());
        assert!(rotate.is_active());

        rotate.reset();
        assert!(!rotate.is_active());
        assert!(rotate.touchmove(&mut cx, &twisted(32.0, 50.0, 31.0)).is_none());

        // A new gesture has to cross the threshold again
        rotate.touchstart(&mut cx, &twisted(48.0, 50.0, 30.0));
        assert!(rotate.touchmove(&mut cx, &twisted(64.0, 50.0, 35.0)).is_none());
        assert!(!rotate.is_active());
    }

    #[test]
    fn test_reset_clears_decided_pitch() {
        let mut publisher = RecordingPublisher::default();
        let mut cx = HandlerContext::new(&mut publisher);
        let mut pitch = TouchPitchHandler::new();
        pitch.enable();

        pitch.touchstart(&mut cx, &touches(0.0, &[(1, 0.0, 0.0), (2, 0.0, 100.0)]));
        assert!(pitch
            .touchmove(&mut cx, &touches(16.0, &[(1, 0.0, -10.0), (2, 0.0, 90.0)]))
            .is_some());
        assert!(pitch.is_active());
        assert_eq!(pitch.gesture().is_valid(), Some(true));

        pitch.reset();
        assert!(!pitch.is_active());
        assert_eq!(pitch.gesture().is_valid(), None);
        assert!(pitch
            .touchmove(&mut cx, &touches(32.0, &[(1, 0.0, -20.0), (2, 0.0, 80.0)]))
            .is_none());

        // Validity is decided afresh for the next gesture
        pitch.touchstart(&mut cx, &touches(48.0, &[(1, 0.0, 0.0), (2, 0.0, 100.0)]));
        assert!(pitch
            .touchmove(&mut cx, &touches(64.0, &[(1, 0.0, -5.0), (2, 0.0, 100.0)]))
            .is_none());
        assert_eq!(pitch.gesture().is_valid(), None);
    }
}
