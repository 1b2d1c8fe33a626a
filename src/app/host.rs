//! Map host backed by the planar camera

use std::sync::Arc;

use tracing::{debug, trace};
use winit::window::Window;

use crate::camera::{Camera, CameraTransform, WorldLocation};
use crate::easing::Easing;
use crate::geometry::Point;
use crate::input::InputEvent;
use crate::map::{EaseOptions, FrameHandle, MapEvent, MapEventKind, MapHost, Publisher};

/// Eased transition in flight
#[derive(Debug, Clone)]
struct Animation {
    start_time: Option<f64>,
    from: Camera,
    options: EaseOptions,
    easing: Easing,
}

/// Map host for the demo window
///
/// Render frames become window redraws; notifications are logged.
pub struct WindowHost {
    camera: Camera,
    window: Option<Arc<Window>>,
    next_frame: u64,
    pending_frame: Option<FrameHandle>,
    animation: Option<Animation>,
    fired: usize,
}

impl WindowHost {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            window: None,
            next_frame: 0,
            pending_frame: None,
            animation: None,
            fired: 0,
        }
    }

    /// Attaches the window that render frames are requested from
    pub fn attach(&mut self, window: Arc<Window>) {
        self.window = Some(window);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.camera.resize(width, height);
    }

    /// Number of notifications published so far
    pub fn fired(&self) -> usize {
        self.fired
    }

    /// Returns true while a render frame or an animation is pending
    pub fn needs_redraw(&self) -> bool {
        self.pending_frame.is_some() || self.animation.is_some()
    }

    /// Takes the frame requested since the last redraw, if any
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.pending_frame.take()
    }

    /// Steps the running animation to `now` (milliseconds)
    pub fn advance(&mut self, now: f64) {
        let Some(animation) = &mut self.animation else {
            return;
        };
        let start = *animation.start_time.get_or_insert(now);
        let t = if animation.options.duration > 0.0 {
            ((now - start) / animation.options.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let k = animation.easing.apply(t);

        let from = &animation.from;
        let options = &animation.options;
        let anchor = options.around;
        let pinned = anchor.map(|point| self.camera.unproject(point));

        if let Some(zoom) = options.zoom {
            self.camera.set_zoom(lerp(from.zoom(), zoom, k));
        }
        if let Some(bearing) = options.bearing {
            self.camera
                .set_bearing(from.bearing() + shortest_turn(from.bearing(), bearing) * k);
        }
        if let Some(pitch) = options.pitch {
            self.camera.set_pitch(lerp(from.pitch(), pitch, k));
        }
        match (options.center, anchor, pinned) {
            (Some(center), _, _) => {
                self.camera.center = from.center.lerp(center, k);
            }
            (None, Some(point), Some(location)) => {
                self.camera.set_location_at_point(location, point);
            }
            _ => {}
        }

        if t >= 1.0 {
            trace!("animation finished");
            self.animation = None;
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn lerp(a: f64, b: f64, k: f64) -> f64 {
    a + (b - a) * k
}

/// Signed rotation from `from` to `to` no larger than half a turn
fn shortest_turn(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

impl Publisher for WindowHost {
    fn fire(&mut self, event: &mut MapEvent) {
        self.fired += 1;
        match event.kind {
            MapEventKind::MouseMove | MapEventKind::TouchMove => {
                trace!(event = %event.kind, point = ?event.point(), "map event");
            }
            _ => {
                debug!(event = %event.kind, point = ?event.point(), "map event");
            }
        }
    }

    fn listens(&self, _kind: MapEventKind) -> bool {
        false
    }
}

impl MapHost for WindowHost {
    type Transform = Camera;

    fn transform(&self) -> &Camera {
        &self.camera
    }

    fn transform_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn ease_to(&mut self, options: EaseOptions, original_event: Option<&InputEvent>) {
        debug!(
            duration = options.duration,
            trigger = ?original_event.map(InputEvent::kind),
            "ease camera"
        );
        let easing = options.easing.unwrap_or_default();
        self.animation = Some(Animation {
            start_time: None,
            from: self.camera.clone(),
            options,
            easing,
        });
        self.request_redraw();
    }

    fn stop_animations(&mut self) {
        if self.animation.take().is_some() {
            trace!("animation stopped");
        }
    }

    fn is_zooming(&self) -> bool {
        self.animation
            .as_ref()
            .is_some_and(|animation| animation.options.zoom.is_some())
    }

    fn request_render_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        let handle = FrameHandle(self.next_frame);
        self.pending_frame = Some(handle);
        self.request_redraw();
        handle
    }

    fn cancel_render_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame == Some(handle) {
            self.pending_frame = None;
        }
    }
}

/// World location under the viewport center
pub fn center_location(camera: &Camera) -> WorldLocation {
    camera.unproject(camera.center_point())
}
