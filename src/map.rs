//! Map host contract and map notifications
//!
//! The handler manager never owns rendering or animation. It talks to the map
//! through [`MapHost`]: read and mutate the camera, start or stop eased
//! transitions, schedule render frames, and publish notifications.

use std::fmt;

use crate::camera::{CameraTransform, WorldLocation};
use crate::easing::Easing;
use crate::geometry::Point;
use crate::input::InputEvent;

/// Duration of the animated snap back to north
pub const RESET_NORTH_DURATION_MS: f64 = 1000.0;

/// Publishes map notifications to application listeners
pub trait Publisher {
    /// Delivers `event` to listeners; a listener may call
    /// [`MapEvent::prevent_default`] to veto gesture handling of the input
    fn fire(&mut self, event: &mut MapEvent);

    /// Returns true when at least one listener is attached for `kind`
    fn listens(&self, _kind: MapEventKind) -> bool {
        true
    }
}

/// Opaque handle for a scheduled render frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The map collaborator driven by the handler manager
pub trait MapHost: Publisher {
    type Transform: CameraTransform;

    /// Current camera transform
    fn transform(&self) -> &Self::Transform;

    /// Camera transform for synchronous updates
    fn transform_mut(&mut self) -> &mut Self::Transform;

    /// Starts an eased camera transition
    fn ease_to(&mut self, options: EaseOptions, original_event: Option<&InputEvent>);

    /// Stops any running camera animation
    fn stop_animations(&mut self);

    /// Returns true while an animated zoom is running
    fn is_zooming(&self) -> bool {
        false
    }

    /// Schedules a render frame; the host later calls
    /// [`HandlerManager::flush_frame`](crate::HandlerManager::flush_frame)
    fn request_render_frame(&mut self) -> FrameHandle;

    /// Cancels a frame scheduled with [`Self::request_render_frame`]
    fn cancel_render_frame(&mut self, handle: FrameHandle);

    /// Animates the bearing back to north
    fn reset_north(&mut self, original_event: Option<&InputEvent>) {
        self.ease_to(
            EaseOptions {
                bearing: Some(0.0),
                duration: RESET_NORTH_DURATION_MS,
                ..EaseOptions::default()
            },
            original_event,
        );
    }
}

/// Target and timing of an eased camera transition
///
/// Unset targets keep their current value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EaseOptions {
    pub center: Option<WorldLocation>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    /// Screen point kept fixed while zooming or rotating
    pub around: Option<Point>,
    /// Duration in milliseconds
    pub duration: f64,
    pub easing: Option<Easing>,
    /// Milliseconds to hold back end notifications after the transition
    pub delay_end_events: Option<f64>,
}

/// Public map notification
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
    pub kind: MapEventKind,
    /// Input event that caused the notification, if any
    pub original_event: Option<InputEvent>,
    default_prevented: bool,
}

impl MapEvent {
    /// Creates a notification
    pub fn new(kind: MapEventKind, original_event: Option<InputEvent>) -> Self {
        Self {
            kind,
            original_event,
            default_prevented: false,
        }
    }

    /// Vetoes gesture handling for the input behind this notification
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns true once a listener called [`Self::prevent_default`]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Screen position of the originating pointer, if there is one
    pub fn point(&self) -> Option<Point> {
        self.original_event
            .as_ref()
            .and_then(|event| event.points().first().copied())
    }
}

/// Kinds of map notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    MoveStart,
    Move,
    MoveEnd,
    ZoomStart,
    Zoom,
    ZoomEnd,
    DragStart,
    Drag,
    DragEnd,
    PitchStart,
    Pitch,
    PitchEnd,
    RotateStart,
    Rotate,
    RotateEnd,
    Click,
    DblClick,
    ContextMenu,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    Wheel,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
}

impl MapEventKind {
    /// Notification name as listeners know it
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveStart => "movestart",
            Self::Move => "move",
            Self::MoveEnd => "moveend",
            Self::ZoomStart => "zoomstart",
            Self::Zoom => "zoom",
            Self::ZoomEnd => "zoomend",
            Self::DragStart => "dragstart",
            Self::Drag => "drag",
            Self::DragEnd => "dragend",
            Self::PitchStart => "pitchstart",
            Self::Pitch => "pitch",
            Self::PitchEnd => "pitchend",
            Self::RotateStart => "rotatestart",
            Self::Rotate => "rotate",
            Self::RotateEnd => "rotateend",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::ContextMenu => "contextmenu",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::Wheel => "wheel",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
        }
    }
}

impl fmt::Display for MapEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
