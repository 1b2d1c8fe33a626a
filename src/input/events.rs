//! Raw input events delivered to the handler manager
//!
//! Positions are map-relative logical pixels. Timestamps are milliseconds on
//! a monotonic clock chosen by the host.

use std::fmt;

use super::state::{Modifiers, MouseButton};
use crate::geometry::Point;

/// Raw input event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    MouseMove(MouseEvent),
    MouseOver(MouseEvent),
    MouseOut(MouseEvent),
    Click(MouseEvent),
    DblClick(MouseEvent),
    ContextMenu(MouseEvent),
    Wheel(WheelEvent),
    TouchStart(TouchEvent),
    TouchMove(TouchEvent),
    TouchEnd(TouchEvent),
    TouchCancel(TouchEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// The map lost input focus
    Blur { time_stamp: f64 },
}

impl InputEvent {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MouseDown(_) => EventKind::MouseDown,
            Self::MouseUp(_) => EventKind::MouseUp,
            Self::MouseMove(_) => EventKind::MouseMove,
            Self::MouseOver(_) => EventKind::MouseOver,
            Self::MouseOut(_) => EventKind::MouseOut,
            Self::Click(_) => EventKind::Click,
            Self::DblClick(_) => EventKind::DblClick,
            Self::ContextMenu(_) => EventKind::ContextMenu,
            Self::Wheel(_) => EventKind::Wheel,
            Self::TouchStart(_) => EventKind::TouchStart,
            Self::TouchMove(_) => EventKind::TouchMove,
            Self::TouchEnd(_) => EventKind::TouchEnd,
            Self::TouchCancel(_) => EventKind::TouchCancel,
            Self::KeyDown(_) => EventKind::KeyDown,
            Self::KeyUp(_) => EventKind::KeyUp,
            Self::Blur { .. } => EventKind::Blur,
        }
    }

    /// When the event happened, in milliseconds
    pub fn time_stamp(&self) -> f64 {
        match self {
            Self::MouseDown(e)
            | Self::MouseUp(e)
            | Self::MouseMove(e)
            | Self::MouseOver(e)
            | Self::MouseOut(e)
            | Self::Click(e)
            | Self::DblClick(e)
            | Self::ContextMenu(e) => e.time_stamp,
            Self::Wheel(e) => e.time_stamp,
            Self::TouchStart(e) | Self::TouchMove(e) | Self::TouchEnd(e) | Self::TouchCancel(e) => {
                e.time_stamp
            }
            Self::KeyDown(e) | Self::KeyUp(e) => e.time_stamp,
            Self::Blur { time_stamp } => *time_stamp,
        }
    }

    /// Screen positions relevant to this event
    ///
    /// One point for mouse and wheel events, one per active touch for touch
    /// events, none for keyboard and focus events.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Self::MouseDown(e)
            | Self::MouseUp(e)
            | Self::MouseMove(e)
            | Self::MouseOver(e)
            | Self::MouseOut(e)
            | Self::Click(e)
            | Self::DblClick(e)
            | Self::ContextMenu(e) => vec![e.point],
            Self::Wheel(e) => vec![e.point],
            Self::TouchStart(e) | Self::TouchMove(e) | Self::TouchEnd(e) | Self::TouchCancel(e) => {
                e.touches.iter().map(|t| t.point).collect()
            }
            Self::KeyDown(_) | Self::KeyUp(_) | Self::Blur { .. } => Vec::new(),
        }
    }
}

/// Event kind without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    Click,
    DblClick,
    ContextMenu,
    Wheel,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    KeyDown,
    KeyUp,
    Blur,
}

impl EventKind {
    /// DOM-style event name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::ContextMenu => "contextmenu",
            Self::Wheel => "wheel",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Blur => "blur",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mouse event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub time_stamp: f64,
    pub point: Point,
    /// Button that changed state (the last pressed button for moves)
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Primary-button event without modifiers
    pub fn new(time_stamp: f64, point: Point) -> Self {
        Self {
            time_stamp,
            point,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    /// Builder method to set the button
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Builder method to set the modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Unit of a wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
}

/// Wheel event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub time_stamp: f64,
    pub point: Point,
    pub delta: Point,
    pub delta_mode: DeltaMode,
    pub modifiers: Modifiers,
}

/// Platform touch identifier, stable for the lifetime of one finger contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u64);

/// One finger contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: TouchId,
    pub point: Point,
}

impl Touch {
    /// Creates a touch from a raw id and position
    pub fn new(id: u64, point: Point) -> Self {
        Self {
            id: TouchId(id),
            point,
        }
    }
}

/// Touch event payload
///
/// `touches` lists every finger still in contact with the map after this
/// event, in the order they went down.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub time_stamp: f64,
    pub touches: Vec<Touch>,
    pub modifiers: Modifiers,
}

impl TouchEvent {
    /// Creates a touch event without modifiers
    pub fn new(time_stamp: f64, touches: Vec<Touch>) -> Self {
        Self {
            time_stamp,
            touches,
            modifiers: Modifiers::NONE,
        }
    }

    /// Position of the touch with this id, if it is still down
    pub fn point_of(&self, id: TouchId) -> Option<Point> {
        self.touches.iter().find(|t| t.id == id).map(|t| t.point)
    }
}

/// Keyboard event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub time_stamp: f64,
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

/// Keys map handlers care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Equal,
    Minus,
    NumpadAdd,
    NumpadSubtract,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Other,
}

/// Convert from winit key code
impl From<winit::keyboard::KeyCode> for KeyCode {
    fn from(key: winit::keyboard::KeyCode) -> Self {
        use winit::keyboard::KeyCode as WK;
        match key {
            WK::Equal => Self::Equal,
            WK::Minus => Self::Minus,
            WK::NumpadAdd => Self::NumpadAdd,
            WK::NumpadSubtract => Self::NumpadSubtract,
            WK::ArrowLeft => Self::Left,
            WK::ArrowRight => Self::Right,
            WK::ArrowUp => Self::Up,
            WK::ArrowDown => Self::Down,
            WK::Escape => Self::Escape,
            _ => Self::Other,
        }
    }
}
