//! Handler arbitration and camera application
//!
//! The [`HandlerManager`] owns the registered handlers and the map host. Each
//! input event goes to every enabled handler in registration order; a handler
//! is skipped (and reset) while another active handler that is not on its
//! allow-list claims the input. Results are merged per event, queued, and
//! applied to the camera once per render frame.

use std::any::Any;
use std::mem;

use enum_map::{Enum, EnumMap};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::camera::CameraTransform;
use crate::config::{InteractionConfig, PinchAnchor};
use crate::error::GestureError;
use crate::geometry::Point;
use crate::handler::{
    Around, BlockableMapEventHandler, GestureResult, Handler, HandlerContext, HandlerKind,
    MapEventHandler, MouseDragHandler, TouchPanHandler, TouchPitchHandler, TouchRotateHandler,
    TouchZoomHandler,
};
use crate::inertia::{Inertia, InertiaOptions, NoInertia};
use crate::input::InputEvent;
use crate::map::{EaseOptions, FrameHandle, MapEvent, MapEventKind, MapHost};

/// Bearing, in degrees, within which the map snaps back to north
pub const DEFAULT_BEARING_SNAP: f64 = 7.0;

/// Camera dimension that a handler can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Axis {
    Zoom,
    Drag,
    Pitch,
    Rotate,
}

impl Axis {
    fn start_event(self) -> MapEventKind {
        match self {
            Self::Zoom => MapEventKind::ZoomStart,
            Self::Drag => MapEventKind::DragStart,
            Self::Pitch => MapEventKind::PitchStart,
            Self::Rotate => MapEventKind::RotateStart,
        }
    }

    fn event(self) -> MapEventKind {
        match self {
            Self::Zoom => MapEventKind::Zoom,
            Self::Drag => MapEventKind::Drag,
            Self::Pitch => MapEventKind::Pitch,
            Self::Rotate => MapEventKind::Rotate,
        }
    }

    fn end_event(self) -> MapEventKind {
        match self {
            Self::Zoom => MapEventKind::ZoomEnd,
            Self::Drag => MapEventKind::DragEnd,
            Self::Pitch => MapEventKind::PitchEnd,
            Self::Rotate => MapEventKind::RotateEnd,
        }
    }
}

/// Handler currently driving an axis
#[derive(Debug, Clone, PartialEq)]
pub struct InProgress {
    pub handler: HandlerKind,
    /// Input that last moved the axis; `None` for render-frame driven changes
    pub original_event: Option<InputEvent>,
}

type EventsInProgress = EnumMap<Axis, Option<InProgress>>;

/// Handlers that stopped being active, with the input that stopped them
type Deactivated = IndexMap<HandlerKind, Option<InputEvent>>;

struct Registration {
    handler: Box<dyn Handler>,
    allowed: Vec<HandlerKind>,
}

/// Change queued by one dispatch pass, applied on the next frame
struct PendingChange {
    result: GestureResult,
    events_in_progress: EventsInProgress,
    deactivated: Deactivated,
}

/// One pass over the handlers: an input event or a render frame
#[derive(Clone, Copy)]
enum Pass<'e> {
    Input(&'e InputEvent),
    RenderFrame(f64),
}

impl Pass<'_> {
    fn original_event(self) -> Option<InputEvent> {
        match self {
            Pass::Input(event) => Some(event.clone()),
            Pass::RenderFrame(_) => None,
        }
    }
}

/// What the host should know after dispatching an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// A handler asked to suppress the platform default action
    pub default_prevented: bool,
    /// A change was queued for the next frame
    pub queued_change: bool,
}

/// Arbitrates between gesture handlers and drives the camera
///
/// # Frame lifecycle
///
/// 1. [`dispatch`](Self::dispatch) every input event as it arrives
/// 2. When a change is queued, the manager asks the host for a render frame
/// 3. The host calls [`flush_frame`](Self::flush_frame) from that frame
pub struct HandlerManager<M: MapHost, I: Inertia = NoInertia> {
    map: M,
    inertia: I,
    inertia_options: InertiaOptions,
    bearing_snap: f64,
    handlers: IndexMap<HandlerKind, Registration>,
    previous_active: IndexSet<HandlerKind>,
    events_in_progress: EventsInProgress,
    changes: Vec<PendingChange>,
    frame: Option<FrameHandle>,
}

impl<M: MapHost, I: Inertia> HandlerManager<M, I> {
    /// Creates a manager without any handler
    pub fn new(map: M, inertia: I) -> Self {
        Self {
            map,
            inertia,
            inertia_options: InertiaOptions::default(),
            bearing_snap: DEFAULT_BEARING_SNAP,
            handlers: IndexMap::new(),
            previous_active: IndexSet::new(),
            events_in_progress: EnumMap::default(),
            changes: Vec::new(),
            frame: None,
        }
    }

    /// Creates a manager with the built-in handlers, configured from `config`
    ///
    /// Registration order decides which gesture wins a conflict: map event
    /// listeners first, then touch pitch, mouse rotate and pitch, mouse pan,
    /// and the touch pan, rotate and zoom trio.
    pub fn with_default_handlers(
        map: M,
        inertia: I,
        config: &InteractionConfig,
    ) -> Result<Self, GestureError> {
        let mut manager = Self::new(map, inertia);
        manager.bearing_snap = config.bearing_snap;
        manager.inertia_options = config.inertia;

        let tolerance = config.click_tolerance;
        let toggles = &config.handlers;
        let around_center = toggles.touch_zoom_rotate.around == PinchAnchor::Center;

        let mut touch_rotate = TouchRotateHandler::new();
        touch_rotate.set_around_center(around_center);
        let mut touch_zoom = TouchZoomHandler::new();
        touch_zoom.set_around_center(around_center);

        use HandlerKind as K;
        manager.register(K::MapEvent, MapEventHandler::new(tolerance), &[])?;
        manager.register(K::TouchPitch, TouchPitchHandler::new(), &[])?;
        manager.register(
            K::MouseRotate,
            MouseDragHandler::rotate(tolerance),
            &[K::MousePitch],
        )?;
        manager.register(
            K::MousePitch,
            MouseDragHandler::pitch(tolerance),
            &[K::MouseRotate],
        )?;
        manager.register(K::MousePan, MouseDragHandler::pan(tolerance), &[])?;
        manager.register(
            K::TouchPan,
            TouchPanHandler::new(tolerance, toggles.cooperative_gestures),
            &[K::TouchZoom, K::TouchRotate],
        )?;
        manager.register(K::TouchRotate, touch_rotate, &[K::TouchPan, K::TouchZoom])?;
        manager.register(K::TouchZoom, touch_zoom, &[K::TouchPan, K::TouchRotate])?;
        manager.register(K::BlockableMapEvent, BlockableMapEventHandler::new(), &[])?;

        if !toggles.drag_pan {
            manager.set_enabled(K::MousePan, false)?;
            manager.set_enabled(K::TouchPan, false)?;
        }
        if !toggles.drag_rotate {
            manager.set_enabled(K::MouseRotate, false)?;
            manager.set_enabled(K::MousePitch, false)?;
        }
        if !toggles.touch_zoom_rotate.enabled {
            manager.set_enabled(K::TouchRotate, false)?;
            manager.set_enabled(K::TouchZoom, false)?;
        }
        if !toggles.touch_pitch {
            manager.set_enabled(K::TouchPitch, false)?;
        }

        Ok(manager)
    }

    /// Sets the bearing, in degrees, within which motion ends pointing north
    pub fn set_bearing_snap(&mut self, bearing_snap: f64) {
        self.bearing_snap = bearing_snap;
    }

    /// Sets the momentum options forwarded to the inertia tracker
    pub fn set_inertia_options(&mut self, options: InertiaOptions) {
        self.inertia_options = options;
    }

    /// Registers and enables a handler
    ///
    /// `allowed` lists the handlers that may stay active alongside this one;
    /// any other active handler blocks it. Handlers registered earlier win.
    pub fn register<H>(
        &mut self,
        kind: HandlerKind,
        handler: H,
        allowed: &[HandlerKind],
    ) -> Result<(), GestureError>
    where
        H: Handler + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(GestureError::DuplicateHandler { kind });
        }

        let mut handler: Box<dyn Handler> = Box::new(handler);
        handler.enable();
        debug!(handler = %kind, allowed = ?allowed, "registered handler");
        self.handlers.insert(
            kind,
            Registration {
                handler,
                allowed: allowed.to_vec(),
            },
        );
        Ok(())
    }

    /// Registered handler kinds in dispatch order
    pub fn registered(&self) -> impl Iterator<Item = HandlerKind> + '_ {
        self.handlers.keys().copied()
    }

    /// Enables or disables a registered handler; disabling resets it
    pub fn set_enabled(&mut self, kind: HandlerKind, enabled: bool) -> Result<(), GestureError> {
        let registration = self
            .handlers
            .get_mut(&kind)
            .ok_or(GestureError::UnknownHandler { kind })?;
        if enabled {
            registration.handler.enable();
        } else {
            registration.handler.disable();
        }
        Ok(())
    }

    /// Typed access to a registered handler
    pub fn handler<T: Any>(&self, kind: HandlerKind) -> Result<&T, GestureError> {
        self.handlers
            .get(&kind)
            .and_then(|r| r.handler.as_any().downcast_ref::<T>())
            .ok_or(GestureError::UnknownHandler { kind })
    }

    /// Typed mutable access to a registered handler, e.g. to change options
    pub fn handler_mut<T: Any>(&mut self, kind: HandlerKind) -> Result<&mut T, GestureError> {
        self.handlers
            .get_mut(&kind)
            .and_then(|r| r.handler.as_any_mut().downcast_mut::<T>())
            .ok_or(GestureError::UnknownHandler { kind })
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn inertia(&self) -> &I {
        &self.inertia
    }

    /// Returns true while any handler is driving a gesture
    pub fn is_active(&self) -> bool {
        self.handlers.values().any(|r| r.handler.is_active())
    }

    /// Returns true while a gesture or an animation zooms the map
    pub fn is_zooming(&self) -> bool {
        self.events_in_progress[Axis::Zoom].is_some() || self.map.is_zooming()
    }

    pub fn is_rotating(&self) -> bool {
        self.events_in_progress[Axis::Rotate].is_some()
    }

    /// Returns true while any axis is driven by a gesture
    pub fn is_moving(&self) -> bool {
        self.events_in_progress.values().any(Option::is_some)
    }

    /// Handler driving `axis`, if any
    pub fn in_progress(&self, axis: Axis) -> Option<&InProgress> {
        self.events_in_progress[axis].as_ref()
    }

    /// Number of changes waiting for the next frame
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Routes one input event through the handlers
    ///
    /// The camera is not touched here; changes wait for
    /// [`flush_frame`](Self::flush_frame).
    pub fn dispatch(&mut self, event: &InputEvent) -> Result<DispatchOutcome, GestureError> {
        let time_stamp = event.time_stamp();
        if !time_stamp.is_finite() {
            return Err(GestureError::InvalidTimestamp {
                event: event.kind(),
                time_stamp,
            });
        }

        if let InputEvent::Blur { .. } = event {
            self.stop(true);
            return Ok(DispatchOutcome::default());
        }

        Ok(self.run_handlers(Pass::Input(event)))
    }

    /// Applies every change queued since the last frame
    ///
    /// Call from the render frame requested through
    /// [`MapHost::request_render_frame`]. Handlers first get a render-frame
    /// callback, then the queue is combined and applied once.
    pub fn flush_frame(&mut self, time_stamp: f64) {
        if self.frame.take().is_none() {
            return;
        }
        self.run_handlers(Pass::RenderFrame(time_stamp));
        self.apply_changes(time_stamp);
    }

    /// Resets every handler and drops pending changes
    ///
    /// Axes still in progress end now. With `allow_end_animation` the usual
    /// end-of-motion easing (momentum or snap to north) still runs.
    pub fn stop(&mut self, allow_end_animation: bool) {
        debug!(allow_end_animation, "stopping gesture handling");
        for registration in self.handlers.values_mut() {
            registration.handler.reset();
        }
        self.inertia.clear(None);
        self.fire_events(EnumMap::default(), Deactivated::new(), allow_end_animation);
        self.changes.clear();
        if let Some(frame) = self.frame.take() {
            self.map.cancel_render_frame(frame);
        }
    }

    fn run_handlers(&mut self, pass: Pass<'_>) -> DispatchOutcome {
        let mut merged = GestureResult::default();
        let mut events_in_progress = EventsInProgress::default();
        let mut active = IndexSet::new();
        let mut needs_render_frame = false;

        let mut cx = HandlerContext::new(&mut self.map);
        for (&kind, registration) in &mut self.handlers {
            let handler = registration.handler.as_mut();
            if !handler.is_enabled() {
                continue;
            }

            let mut data = None;
            if let Some(blocker) = blocked_by_active(&active, &registration.allowed, kind) {
                trace!(handler = %kind, blocked_by = %blocker, "handler blocked");
                handler.reset();
            } else {
                data = deliver(handler, &mut cx, pass);
                if let Some(result) = &data {
                    merge_result(&mut merged, &mut events_in_progress, result, kind, pass);
                    needs_render_frame |= result.needs_render_frame;
                }
            }

            if data.is_some() || handler.is_active() {
                active.insert(kind);
            }
        }
        let default_prevented = cx.default_prevented();

        let original_event = pass.original_event();
        let deactivated: Deactivated = self
            .previous_active
            .iter()
            .filter(|kind| !active.contains(*kind))
            .map(|&kind| (kind, original_event.clone()))
            .collect();
        let has_change = merged.has_change();
        let any_active = !active.is_empty();
        self.previous_active = active;

        if needs_render_frame {
            self.trigger_render_frame();
        }

        let queued_change = !deactivated.is_empty() || has_change;
        if queued_change {
            trace!(
                deactivated = deactivated.len(),
                has_change,
                "queued change"
            );
            self.changes.push(PendingChange {
                result: merged,
                events_in_progress,
                deactivated,
            });
            self.trigger_render_frame();
        }

        if any_active || has_change {
            self.map.stop_animations();
        }

        DispatchOutcome {
            default_prevented,
            queued_change,
        }
    }

    fn trigger_render_frame(&mut self) {
        if self.frame.is_none() {
            self.frame = Some(self.map.request_render_frame());
        }
    }

    fn apply_changes(&mut self, time_stamp: f64) {
        let mut combined = GestureResult::default();
        let mut events_in_progress = EventsInProgress::default();
        let mut deactivated = Deactivated::new();

        for change in mem::take(&mut self.changes) {
            // A new animated change replaces stale deltas
            if change.result.duration.is_some() && combined.duration.is_some() {
                combined = GestureResult::default();
            }
            combined.accumulate(&change.result);
            for (axis, in_progress) in change.events_in_progress {
                if in_progress.is_some() {
                    events_in_progress[axis] = in_progress;
                }
            }
            deactivated.extend(change.deactivated);
        }

        if combined.has_change() {
            self.update_map_transform(&combined, time_stamp);
        }
        self.fire_events(events_in_progress, deactivated, true);
    }

    fn update_map_transform(&mut self, combined: &GestureResult, time_stamp: f64) {
        self.map.stop_animations();

        let anchor = combined.pinch_around.or(combined.around).unwrap_or_default();
        let transform = self.map.transform_mut();
        let around = match anchor {
            Around::Point(point) => point,
            Around::Center => transform.center_point(),
        };

        if let Some(duration) = combined.duration {
            let center = combined
                .pan_delta
                .map(|pan| transform.unproject(transform.center_point() - pan));
            let options = EaseOptions {
                center,
                zoom: combined.zoom_delta.map(|d| transform.zoom() + d),
                bearing: combined.bearing_delta.map(|d| transform.bearing() + d),
                pitch: combined.pitch_delta.map(|d| transform.pitch() + d),
                around: matches!(anchor, Around::Point(_)).then_some(around),
                duration,
                easing: combined.easing,
                delay_end_events: combined.delay_end_events,
            };
            debug!(duration, "easing camera for animated change");
            self.map.ease_to(options, None);
            self.inertia.clear(Some(combined));
            return;
        }

        let pan_delta = combined.pan_delta.unwrap_or(Point::ZERO);
        let location = transform.unproject(around - pan_delta);
        if let Some(delta) = combined.bearing_delta {
            transform.set_bearing(transform.bearing() + delta);
        }
        if let Some(delta) = combined.pitch_delta {
            transform.set_pitch(transform.pitch() + delta);
        }
        if let Some(delta) = combined.zoom_delta {
            transform.set_zoom(transform.zoom() + delta);
        }
        transform.set_location_at_point(location, around);
        trace!(?pan_delta, ?around, "applied camera change");

        if !combined.no_inertia {
            self.inertia.record(combined, time_stamp);
        }
    }

    fn fire_events(
        &mut self,
        new_events: EventsInProgress,
        deactivated: Deactivated,
        allow_end_animation: bool,
    ) {
        let was_moving = self.is_moving();
        let now_moving = first_in_progress(&new_events).cloned();

        let mut start_events = Vec::new();
        for (axis, in_progress) in &new_events {
            let Some(in_progress) = in_progress else {
                continue;
            };
            if self.events_in_progress[axis].is_none() {
                start_events.push((axis.start_event(), in_progress.original_event.clone()));
            }
            self.events_in_progress[axis] = Some(in_progress.clone());
        }

        if !was_moving && let Some(moving) = &now_moving {
            debug!(handler = %moving.handler, "movement started");
            self.fire(MapEventKind::MoveStart, moving.original_event.clone());
        }
        for (kind, original_event) in start_events {
            self.fire(kind, original_event);
        }
        if let Some(moving) = &now_moving {
            self.fire(MapEventKind::Move, moving.original_event.clone());
        }
        for (axis, in_progress) in &new_events {
            if let Some(in_progress) = in_progress {
                self.fire(axis.event(), in_progress.original_event.clone());
            }
        }

        let mut end_events = Vec::new();
        let mut original_end_event = None;
        for (axis, slot) in &mut self.events_in_progress {
            let Some(in_progress) = slot.as_ref() else {
                continue;
            };
            let still_active = self
                .handlers
                .get(&in_progress.handler)
                .is_some_and(|r| r.handler.is_active());
            if still_active {
                continue;
            }
            let original_event = match deactivated.get(&in_progress.handler) {
                Some(event) => event.clone(),
                None => in_progress.original_event.clone(),
            };
            trace!(axis = ?axis, handler = %in_progress.handler, "axis ended");
            *slot = None;
            original_end_event = original_event.clone();
            end_events.push((axis, original_event));
        }
        let rotation_ended = end_events.iter().any(|(axis, _)| *axis == Axis::Rotate);
        for (axis, original_event) in end_events {
            self.fire(axis.end_event(), original_event);
        }

        let finished_moving = (was_moving || now_moving.is_some()) && !self.is_moving();
        if allow_end_animation && finished_moving {
            self.finish_moving(original_end_event, rotation_ended);
        }
    }

    fn finish_moving(&mut self, original_event: Option<InputEvent>, bearing_changed: bool) {
        let snap = self.bearing_snap;
        let should_snap = |bearing: f64| bearing != 0.0 && -snap < bearing && bearing < snap;
        let bearing = self.map.transform().bearing();

        let ease = self.inertia.on_move_end(
            original_event.as_ref(),
            bearing_changed,
            &self.inertia_options,
        );
        if let Some(mut ease) = ease {
            if should_snap(ease.bearing.unwrap_or(bearing)) {
                ease.bearing = Some(0.0);
            }
            debug!(duration = ease.duration, "handing off to inertia");
            self.map.ease_to(ease, original_event.as_ref());
        } else {
            debug!("movement ended");
            self.fire(MapEventKind::MoveEnd, original_event.clone());
            if should_snap(bearing) {
                self.map.reset_north(original_event.as_ref());
            }
        }
    }

    fn fire(&mut self, kind: MapEventKind, original_event: Option<InputEvent>) {
        self.map.fire(&mut MapEvent::new(kind, original_event));
    }
}

/// First active handler not on `allowed`, other than `kind` itself
fn blocked_by_active(
    active: &IndexSet<HandlerKind>,
    allowed: &[HandlerKind],
    kind: HandlerKind,
) -> Option<HandlerKind> {
    active
        .iter()
        .copied()
        .find(|other| *other != kind && !allowed.contains(other))
}

fn first_in_progress(events: &EventsInProgress) -> Option<&InProgress> {
    events.values().find_map(Option::as_ref)
}

fn merge_result(
    merged: &mut GestureResult,
    events_in_progress: &mut EventsInProgress,
    result: &GestureResult,
    kind: HandlerKind,
    pass: Pass<'_>,
) {
    merged.merge(result);

    let in_progress = || {
        Some(InProgress {
            handler: kind,
            original_event: pass.original_event(),
        })
    };
    if result.zoom_delta.is_some() {
        events_in_progress[Axis::Zoom] = in_progress();
    }
    if result.pan_delta.is_some() {
        events_in_progress[Axis::Drag] = in_progress();
    }
    if result.pitch_delta.is_some() {
        events_in_progress[Axis::Pitch] = in_progress();
    }
    if result.bearing_delta.is_some() {
        events_in_progress[Axis::Rotate] = in_progress();
    }
}

fn deliver(
    handler: &mut dyn Handler,
    cx: &mut HandlerContext<'_>,
    pass: Pass<'_>,
) -> Option<GestureResult> {
    let event = match pass {
        Pass::RenderFrame(time_stamp) => return handler.render_frame(cx, time_stamp),
        Pass::Input(event) => event,
    };

    match event {
        InputEvent::MouseDown(e) => handler.mousedown(cx, e, e.point),
        InputEvent::MouseUp(e) => handler.mouseup(cx, e, e.point),
        InputEvent::MouseMove(e) => handler.mousemove(cx, e, e.point),
        InputEvent::MouseOver(e) => handler.mouseover(cx, e, e.point),
        InputEvent::MouseOut(e) => handler.mouseout(cx, e, e.point),
        InputEvent::Click(e) => handler.click(cx, e, e.point),
        InputEvent::DblClick(e) => handler.dblclick(cx, e, e.point),
        InputEvent::ContextMenu(e) => handler.contextmenu(cx, e, e.point),
        InputEvent::Wheel(e) => handler.wheel(cx, e, e.point),
        InputEvent::TouchStart(e) => handler.touchstart(cx, e),
        InputEvent::TouchMove(e) => handler.touchmove(cx, e),
        InputEvent::TouchEnd(e) => handler.touchend(cx, e),
        InputEvent::TouchCancel(e) => handler.touchcancel(cx, e),
        InputEvent::KeyDown(e) => handler.keydown(cx, e),
        InputEvent::KeyUp(e) => handler.keyup(cx, e),
        InputEvent::Blur { .. } => None,
    }
}
