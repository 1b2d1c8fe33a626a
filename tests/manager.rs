//! Integration tests for the handler manager

use std::any::Any;

use glam::DVec2;
use map_gestures::camera::{Camera, CameraTransform};
use map_gestures::config::InteractionConfig;
use map_gestures::handler::{
    GestureResult, Handler, HandlerContext, HandlerKind, MouseDragHandler, TouchZoomHandler,
};
use map_gestures::inertia::{Inertia, InertiaOptions, NoInertia};
use map_gestures::input::{InputEvent, MouseButton, MouseEvent, Touch, TouchEvent};
use map_gestures::manager::Axis;
use map_gestures::map::{EaseOptions, FrameHandle, MapEvent, MapEventKind, MapHost, Publisher};
use map_gestures::geometry::Point;
use map_gestures::{GestureError, HandlerManager};

const LIFECYCLE: &[MapEventKind] = &[
    MapEventKind::MoveStart,
    MapEventKind::Move,
    MapEventKind::MoveEnd,
    MapEventKind::ZoomStart,
    MapEventKind::Zoom,
    MapEventKind::ZoomEnd,
    MapEventKind::DragStart,
    MapEventKind::Drag,
    MapEventKind::DragEnd,
    MapEventKind::PitchStart,
    MapEventKind::Pitch,
    MapEventKind::PitchEnd,
    MapEventKind::RotateStart,
    MapEventKind::Rotate,
    MapEventKind::RotateEnd,
];

/// Map host that records everything the manager asks of it
struct MockMap {
    camera: Camera,
    fired: Vec<MapEventKind>,
    veto: Vec<MapEventKind>,
    eases: Vec<EaseOptions>,
    stopped_animations: usize,
    next_frame: u64,
    cancelled: Vec<FrameHandle>,
}

impl MockMap {
    fn new() -> Self {
        Self {
            camera: Camera::new(DVec2::ZERO, 800.0, 600.0),
            fired: Vec::new(),
            veto: Vec::new(),
            eases: Vec::new(),
            stopped_animations: 0,
            next_frame: 0,
            cancelled: Vec::new(),
        }
    }

    fn lifecycle(&self) -> Vec<MapEventKind> {
        self.fired
            .iter()
            .copied()
            .filter(|kind| LIFECYCLE.contains(kind))
            .collect()
    }

    fn count(&self, kind: MapEventKind) -> usize {
        self.fired.iter().filter(|k| **k == kind).count()
    }
}

impl Publisher for MockMap {
    fn fire(&mut self, event: &mut MapEvent) {
        self.fired.push(event.kind);
        if self.veto.contains(&event.kind) {
            event.prevent_default();
        }
    }
}

impl MapHost for MockMap {
    type Transform = Camera;

    fn transform(&self) -> &Camera {
        &self.camera
    }

    fn transform_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn ease_to(&mut self, options: EaseOptions, _original_event: Option<&InputEvent>) {
        self.eases.push(options);
    }

    fn stop_animations(&mut self) {
        self.stopped_animations += 1;
    }

    fn request_render_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        FrameHandle(self.next_frame)
    }

    fn cancel_render_frame(&mut self, handle: FrameHandle) {
        self.cancelled.push(handle);
    }
}

/// Inertia tracker that records calls and returns a canned ease
#[derive(Default)]
struct MockInertia {
    recorded: Vec<GestureResult>,
    cleared: usize,
    cleared_with_result: usize,
    ease: Option<EaseOptions>,
    move_ends: Vec<bool>,
}

impl Inertia for MockInertia {
    fn record(&mut self, result: &GestureResult, _time_stamp: f64) {
        self.recorded.push(result.clone());
    }

    fn clear(&mut self, result: Option<&GestureResult>) {
        self.cleared += 1;
        if result.is_some() {
            self.cleared_with_result += 1;
        }
    }

    fn on_move_end(
        &mut self,
        _original_event: Option<&InputEvent>,
        bearing_changed: bool,
        _options: &InertiaOptions,
    ) -> Option<EaseOptions> {
        self.move_ends.push(bearing_changed);
        self.ease.clone()
    }
}

/// Handler that claims every mouse down and replays scripted moves
#[derive(Default)]
struct Scripted {
    enabled: bool,
    active: bool,
    resets: usize,
    downs: usize,
    moves: Vec<GestureResult>,
}

impl Scripted {
    fn with_moves(moves: Vec<GestureResult>) -> Self {
        Self {
            moves,
            ..Self::default()
        }
    }
}

impl Handler for Scripted {
    fn reset(&mut self) {
        self.active = false;
        self.resets += 1;
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
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        self.downs += 1;
        self.active = true;
        Some(GestureResult::claim())
    }

    fn mousemove(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        if self.moves.is_empty() {
            None
        } else {
            Some(self.moves.remove(0))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn mouse(kind: fn(MouseEvent) -> InputEvent, t: f64, x: f64, y: f64) -> InputEvent {
    kind(MouseEvent::new(t, Point::new(x, y)))
}

fn right(kind: fn(MouseEvent) -> InputEvent, t: f64, x: f64, y: f64) -> InputEvent {
    kind(MouseEvent::new(t, Point::new(x, y)).with_button(MouseButton::Right))
}

fn touches(kind: fn(TouchEvent) -> InputEvent, t: f64, points: &[(u64, f64, f64)]) -> InputEvent {
    kind(TouchEvent::new(
        t,
        points
            .iter()
            .map(|&(id, x, y)| Touch::new(id, Point::new(x, y)))
            .collect(),
    ))
}

fn default_manager() -> HandlerManager<MockMap, MockInertia> {
    HandlerManager::with_default_handlers(
        MockMap::new(),
        MockInertia::default(),
        &InteractionConfig::default(),
    )
    .unwrap()
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn test_default_registration_order() {
    let manager = default_manager();
    let kinds: Vec<_> = manager.registered().collect();
    assert_eq!(
        kinds,
        vec![
            HandlerKind::MapEvent,
            HandlerKind::TouchPitch,
            HandlerKind::MouseRotate,
            HandlerKind::MousePitch,
            HandlerKind::MousePan,
            HandlerKind::TouchPan,
            HandlerKind::TouchRotate,
            HandlerKind::TouchZoom,
            HandlerKind::BlockableMapEvent,
        ]
    );
}

#[test]
fn test_pan_gesture_lifecycle() {
    let mut manager = default_manager();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    // Below the click tolerance: nothing queued
    let outcome = manager.dispatch(&mouse(InputEvent::MouseMove, 8.0, 401.0, 300.0)).unwrap();
    assert!(!outcome.queued_change);
    assert!(outcome.default_prevented);
    assert_eq!(manager.pending_changes(), 0);

    manager.dispatch(&mouse(InputEvent::MouseMove, 16.0, 410.0, 300.0)).unwrap();
    assert_eq!(manager.pending_changes(), 1);
    manager.flush_frame(16.0);
    assert_eq!(manager.pending_changes(), 0);
    assert!(manager.is_moving());
    assert_eq!(
        manager.in_progress(Axis::Drag).map(|p| p.handler),
        Some(HandlerKind::MousePan)
    );

    // Measured from the suppressed move, and the world point under the
    // cursor followed it
    assert_close(manager.map().camera.center.x, -9.0);
    assert_close(manager.map().camera.center.y, 0.0);

    manager.dispatch(&mouse(InputEvent::MouseMove, 32.0, 415.0, 300.0)).unwrap();
    manager.flush_frame(32.0);
    assert_close(manager.map().camera.center.x, -14.0);

    manager.dispatch(&mouse(InputEvent::MouseUp, 40.0, 415.0, 300.0)).unwrap();
    manager.flush_frame(48.0);

    assert_eq!(
        manager.map().lifecycle(),
        vec![
            MapEventKind::MoveStart,
            MapEventKind::DragStart,
            MapEventKind::Move,
            MapEventKind::Drag,
            MapEventKind::Move,
            MapEventKind::Drag,
            MapEventKind::DragEnd,
            MapEventKind::MoveEnd,
        ]
    );
    assert!(!manager.is_moving());
    assert!(!manager.is_active());
    assert_eq!(manager.inertia().recorded.len(), 2);
    assert_eq!(manager.inertia().move_ends, vec![false]);
}

#[test]
fn test_changes_in_one_frame_are_summed() {
    let mut manager = HandlerManager::new(MockMap::new(), MockInertia::default());
    manager
        .register(
            HandlerKind::Custom("scripted"),
            Scripted::with_moves(vec![
                GestureResult::pan(Point::new(1.0, 0.0), Point::new(400.0, 300.0)),
                GestureResult::pan(Point::new(0.0, 1.0), Point::new(400.0, 300.0)),
            ]),
            &[],
        )
        .unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 1.0, 401.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 2.0, 401.0, 301.0)).unwrap();
    assert_eq!(manager.pending_changes(), 2);

    manager.flush_frame(16.0);
    assert_eq!(manager.pending_changes(), 0);
    assert_eq!(manager.inertia().recorded.len(), 1);
    assert_eq!(
        manager.inertia().recorded[0].pan_delta,
        Some(Point::new(1.0, 1.0))
    );
    assert_close(manager.map().camera.center.x, -1.0);
    assert_close(manager.map().camera.center.y, -1.0);

    // Exactly one frame was requested for both events
    assert_eq!(manager.map().next_frame, 1);
}

#[test]
fn test_empty_change_still_clears_queue() {
    let mut manager = HandlerManager::new(MockMap::new(), MockInertia::default());
    manager
        .register(HandlerKind::Custom("scripted"), Scripted::default(), &[])
        .unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    manager.stop(false);
    // The handler was active and is not anymore
    manager.dispatch(&mouse(InputEvent::MouseMove, 1.0, 0.0, 0.0)).unwrap();
    assert_eq!(manager.pending_changes(), 1);

    manager.flush_frame(16.0);
    assert_eq!(manager.pending_changes(), 0);
    assert!(manager.inertia().recorded.is_empty());
    assert_eq!(manager.map().camera.center, DVec2::ZERO);
}

#[test]
fn test_earlier_handler_blocks_later_one() {
    let first = HandlerKind::Custom("first");
    let second = HandlerKind::Custom("second");

    let mut manager = HandlerManager::new(MockMap::new(), NoInertia);
    manager.register(first, Scripted::default(), &[]).unwrap();
    manager.register(second, Scripted::default(), &[]).unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    let a = manager.handler::<Scripted>(first).unwrap();
    let b = manager.handler::<Scripted>(second).unwrap();
    assert_eq!((a.downs, a.resets), (1, 0));
    assert_eq!((b.downs, b.resets), (0, 1));
}

#[test]
fn test_allow_list_lets_handlers_share_input() {
    let first = HandlerKind::Custom("first");
    let second = HandlerKind::Custom("second");

    let mut manager = HandlerManager::new(MockMap::new(), NoInertia);
    manager.register(first, Scripted::default(), &[]).unwrap();
    manager.register(second, Scripted::default(), &[first]).unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    assert_eq!(manager.handler::<Scripted>(second).unwrap().downs, 1);
}

#[test]
fn test_blocking_depends_on_registration_order() {
    let first = HandlerKind::Custom("first");
    let second = HandlerKind::Custom("second");

    // `second` allows `first`, but `first` allows nobody and runs later
    let mut manager = HandlerManager::new(MockMap::new(), NoInertia);
    manager.register(second, Scripted::default(), &[first]).unwrap();
    manager.register(first, Scripted::default(), &[]).unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    let a = manager.handler::<Scripted>(first).unwrap();
    let b = manager.handler::<Scripted>(second).unwrap();
    assert_eq!((b.downs, b.resets), (1, 0));
    assert_eq!((a.downs, a.resets), (0, 1));
}

#[test]
fn test_disabled_handler_is_skipped() {
    let kind = HandlerKind::Custom("scripted");
    let mut manager = HandlerManager::new(MockMap::new(), NoInertia);
    manager.register(kind, Scripted::default(), &[]).unwrap();
    manager.set_enabled(kind, false).unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    assert_eq!(manager.handler::<Scripted>(kind).unwrap().downs, 0);
    assert!(!manager.is_active());
}

#[test]
fn test_duplicate_registration_fails() {
    let mut manager = default_manager();
    let err = manager
        .register(HandlerKind::MousePan, MouseDragHandler::pan(3.0), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        GestureError::DuplicateHandler {
            kind: HandlerKind::MousePan
        }
    ));
    assert_eq!(manager.registered().count(), 9);
}

#[test]
fn test_invalid_timestamp_is_rejected() {
    let mut manager = default_manager();
    let err = manager
        .dispatch(&mouse(InputEvent::MouseDown, f64::NAN, 0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, GestureError::InvalidTimestamp { .. }));
    assert!(manager.map().fired.is_empty());
}

#[test]
fn test_listener_veto_blocks_gestures() {
    let mut map = MockMap::new();
    map.veto.push(MapEventKind::MouseDown);
    let mut manager =
        HandlerManager::with_default_handlers(map, NoInertia, &InteractionConfig::default())
            .unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 16.0, 450.0, 300.0)).unwrap();
    manager.flush_frame(16.0);

    assert_eq!(manager.map().count(MapEventKind::DragStart), 0);
    assert_eq!(manager.map().camera.center, DVec2::ZERO);
}

#[test]
fn test_pinch_zoom_around_fingers() {
    let mut manager = default_manager();

    manager
        .dispatch(&touches(
            InputEvent::TouchStart,
            0.0,
            &[(1, 350.0, 300.0), (2, 450.0, 300.0)],
        ))
        .unwrap();
    manager
        .dispatch(&touches(
            InputEvent::TouchMove,
            16.0,
            &[(1, 300.0, 300.0), (2, 500.0, 300.0)],
        ))
        .unwrap();
    manager.flush_frame(16.0);

    assert_close(manager.map().camera.zoom(), 1.0);
    assert!(manager.is_zooming());
    assert_eq!(
        manager.map().lifecycle(),
        vec![
            MapEventKind::MoveStart,
            MapEventKind::ZoomStart,
            MapEventKind::Move,
            MapEventKind::Zoom,
        ]
    );

    manager
        .dispatch(&touches(InputEvent::TouchEnd, 32.0, &[]))
        .unwrap();
    manager.flush_frame(32.0);
    assert!(!manager.is_zooming());
    assert_eq!(manager.map().count(MapEventKind::ZoomEnd), 1);
    assert_eq!(manager.map().count(MapEventKind::MoveEnd), 1);
}

#[test]
fn test_mouse_rotate_snaps_back_to_north() {
    let mut manager = default_manager();

    manager.dispatch(&right(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    let outcome = manager
        .dispatch(&right(InputEvent::ContextMenu, 0.0, 400.0, 300.0))
        .unwrap();
    assert!(outcome.default_prevented);

    manager.dispatch(&right(InputEvent::MouseMove, 16.0, 405.0, 300.0)).unwrap();
    manager.flush_frame(16.0);
    assert_close(manager.map().camera.bearing(), 4.0);
    assert!(manager.is_rotating());

    manager.dispatch(&right(InputEvent::MouseUp, 32.0, 405.0, 300.0)).unwrap();
    manager.flush_frame(32.0);

    assert!(!manager.is_rotating());
    assert_eq!(manager.map().count(MapEventKind::RotateEnd), 1);
    assert_eq!(manager.map().count(MapEventKind::MoveEnd), 1);
    assert_eq!(manager.inertia().move_ends, vec![true]);

    let reset = manager.map().eases.last().unwrap();
    assert_eq!(reset.bearing, Some(0.0));
    assert_eq!(reset.duration, 1000.0);
}

#[test]
fn test_inertia_takes_over_at_move_end() {
    let inertia = MockInertia {
        ease: Some(EaseOptions {
            center: Some(DVec2::new(-40.0, 0.0)),
            bearing: Some(5.0),
            duration: 300.0,
            ..EaseOptions::default()
        }),
        ..MockInertia::default()
    };
    let mut manager =
        HandlerManager::with_default_handlers(MockMap::new(), inertia, &InteractionConfig::default())
            .unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 16.0, 420.0, 300.0)).unwrap();
    manager.flush_frame(16.0);
    manager.dispatch(&mouse(InputEvent::MouseUp, 20.0, 420.0, 300.0)).unwrap();
    manager.flush_frame(32.0);

    assert_eq!(manager.map().count(MapEventKind::DragEnd), 1);
    assert_eq!(manager.map().count(MapEventKind::MoveEnd), 0);
    let ease = manager.map().eases.last().unwrap();
    assert_eq!(ease.duration, 300.0);
    // Within the snap threshold of north
    assert_eq!(ease.bearing, Some(0.0));
}

#[test]
fn test_blur_stops_gesture() {
    let mut manager = default_manager();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 16.0, 420.0, 300.0)).unwrap();
    manager.flush_frame(16.0);
    manager.dispatch(&mouse(InputEvent::MouseMove, 20.0, 430.0, 300.0)).unwrap();
    assert_eq!(manager.pending_changes(), 1);

    manager.dispatch(&InputEvent::Blur { time_stamp: 24.0 }).unwrap();

    assert!(!manager.is_active());
    assert!(!manager.is_moving());
    assert_eq!(manager.pending_changes(), 0);
    assert_eq!(manager.map().cancelled, vec![FrameHandle(2)]);
    assert_eq!(manager.map().count(MapEventKind::DragEnd), 1);
    assert_eq!(manager.map().count(MapEventKind::MoveEnd), 1);
    assert_eq!(manager.inertia().cleared, 1);
    // The queued 10px never reached the camera
    assert_close(manager.map().camera.center.x, -20.0);
}

#[test]
fn test_active_gesture_stops_camera_animations() {
    let mut manager = default_manager();
    manager.dispatch(&mouse(InputEvent::MouseMove, 0.0, 10.0, 10.0)).unwrap();
    assert_eq!(manager.map().stopped_animations, 0);

    manager.dispatch(&mouse(InputEvent::MouseDown, 1.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 2.0, 420.0, 300.0)).unwrap();
    assert!(manager.map().stopped_animations > 0);
}

#[test]
fn test_animated_change_eases_instead_of_jumping() {
    let animated = |zoom: f64| GestureResult {
        zoom_delta: Some(zoom),
        duration: Some(200.0),
        ..GestureResult::default()
    };
    let mut manager = HandlerManager::new(MockMap::new(), MockInertia::default());
    manager
        .register(
            HandlerKind::Custom("scripted"),
            Scripted::with_moves(vec![animated(1.0), animated(0.5)]),
            &[],
        )
        .unwrap();

    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 0.0, 0.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 1.0, 0.0, 0.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 2.0, 0.0, 0.0)).unwrap();
    manager.flush_frame(16.0);

    // The later animated change replaced the earlier one
    let ease = manager.map().eases.last().unwrap();
    assert_eq!(ease.zoom, Some(0.5));
    assert_eq!(ease.duration, 200.0);
    assert_eq!(manager.map().camera.zoom(), 0.0);
    assert_eq!(manager.inertia().cleared_with_result, 1);
    assert!(manager.inertia().recorded.is_empty());
}

#[test]
fn test_config_toggles_and_typed_access() {
    let mut config = InteractionConfig::default();
    config.handlers.drag_pan = false;
    let mut manager =
        HandlerManager::with_default_handlers(MockMap::new(), NoInertia, &config).unwrap();

    let pan = manager
        .handler::<MouseDragHandler>(HandlerKind::MousePan)
        .unwrap();
    assert!(!pan.is_enabled());

    let zoom = manager
        .handler_mut::<TouchZoomHandler>(HandlerKind::TouchZoom)
        .unwrap();
    assert!(!zoom.around_center());
    zoom.set_around_center(true);
    assert!(
        manager
            .handler::<TouchZoomHandler>(HandlerKind::TouchZoom)
            .unwrap()
            .around_center()
    );

    let wrong_type = manager.handler::<TouchZoomHandler>(HandlerKind::MousePan);
    assert!(matches!(
        wrong_type,
        Err(GestureError::UnknownHandler {
            kind: HandlerKind::MousePan
        })
    ));

    // Panning is off: dragging does not move the map
    manager.dispatch(&mouse(InputEvent::MouseDown, 0.0, 400.0, 300.0)).unwrap();
    manager.dispatch(&mouse(InputEvent::MouseMove, 16.0, 450.0, 300.0)).unwrap();
    manager.flush_frame(16.0);
    assert_eq!(manager.map().camera.center, DVec2::ZERO);
}
