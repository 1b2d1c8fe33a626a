//! Raw input collection from winit events

use std::time::Instant;

use indexmap::IndexMap;
use winit::event::{ElementState, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::events::{DeltaMode, InputEvent, KeyEvent, MouseEvent, Touch, TouchEvent, WheelEvent};
use super::state::{Modifiers, MouseButton};
use crate::geometry::Point;

/// Pixels per wheel line
const LINE_HEIGHT: f64 = 20.0;

/// Longest gap between two clicks that still counts as a double click
const DOUBLE_CLICK_MS: f64 = 500.0;

/// Collects winit window events and turns them into timestamped input events
///
/// winit reports fingers one at a time and has no click notion, so the
/// collector keeps the touch list and synthesizes clicks, double clicks and
/// context-menu requests the way a browser would.
pub struct InputCollector {
    scale_factor: f64,
    click_tolerance: f64,
    epoch: Instant,
    cursor: Option<Point>,
    modifiers: Modifiers,
    pressed: Vec<MouseButton>,
    last_click: Option<(f64, Point)>,
    touches: IndexMap<u64, Point>,
}

impl InputCollector {
    /// Creates a new input collector
    pub fn new(click_tolerance: f64) -> Self {
        Self {
            scale_factor: 1.0,
            click_tolerance,
            epoch: Instant::now(),
            cursor: None,
            modifiers: Modifiers::NONE,
            pressed: Vec::new(),
            last_click: None,
            touches: IndexMap::new(),
        }
    }

    /// Update scale factor (DPI scaling)
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Milliseconds since the collector was created
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Handle a winit window event
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Vec<InputEvent> {
        let time_stamp = self.now();
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let point = self.logical(position.x, position.y);
                self.cursor_moved(time_stamp, point)
            }

            WindowEvent::CursorEntered { .. } => self
                .cursor
                .map(|point| InputEvent::MouseOver(self.mouse_event(time_stamp, point)))
                .into_iter()
                .collect(),

            WindowEvent::CursorLeft { .. } => self.cursor_left(time_stamp),

            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_input(time_stamp, *state == ElementState::Pressed, (*button).into())
            }

            WindowEvent::MouseWheel { delta, .. } => {
                // Wheel deltas follow the DOM convention: positive y scrolls down
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Point::new(
                        -f64::from(*x) * LINE_HEIGHT,
                        -f64::from(*y) * LINE_HEIGHT,
                    ),
                    MouseScrollDelta::PixelDelta(pos) => {
                        self.logical(-pos.x, -pos.y)
                    }
                };
                self.wheel(time_stamp, delta)
            }

            WindowEvent::Touch(touch) => {
                let point = self.logical(touch.location.x, touch.location.y);
                self.touch(time_stamp, touch.id, touch.phase, point)
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state().into();
                Vec::new()
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return Vec::new();
                };
                let key = KeyEvent {
                    time_stamp,
                    key: code.into(),
                    modifiers: self.modifiers,
                };
                match event.state {
                    ElementState::Pressed => vec![InputEvent::KeyDown(key)],
                    ElementState::Released => vec![InputEvent::KeyUp(key)],
                }
            }

            WindowEvent::Focused(false) => {
                self.pressed.clear();
                self.touches.clear();
                vec![InputEvent::Blur { time_stamp }]
            }

            _ => Vec::new(),
        }
    }

    /// Cursor moved to `point`
    pub fn cursor_moved(&mut self, time_stamp: f64, point: Point) -> Vec<InputEvent> {
        let entered = self.cursor.is_none();
        self.cursor = Some(point);

        let mut events = Vec::new();
        if entered {
            events.push(InputEvent::MouseOver(self.mouse_event(time_stamp, point)));
        }
        events.push(InputEvent::MouseMove(self.mouse_event(time_stamp, point)));
        events
    }

    /// Cursor left the map
    pub fn cursor_left(&mut self, time_stamp: f64) -> Vec<InputEvent> {
        match self.cursor.take() {
            Some(point) => vec![InputEvent::MouseOut(self.mouse_event(time_stamp, point))],
            None => Vec::new(),
        }
    }

    /// A mouse button changed state at the current cursor position
    pub fn mouse_input(
        &mut self,
        time_stamp: f64,
        pressed: bool,
        button: MouseButton,
    ) -> Vec<InputEvent> {
        let Some(point) = self.cursor else {
            return Vec::new();
        };
        let event = MouseEvent {
            time_stamp,
            point,
            button,
            modifiers: self.modifiers,
        };

        if pressed {
            self.pressed.retain(|b| *b != button);
            self.pressed.push(button);
            let mut events = vec![InputEvent::MouseDown(event)];
            if button.is_secondary() {
                events.push(InputEvent::ContextMenu(event));
            }
            return events;
        }

        let press = self
            .pressed
            .iter()
            .position(|b| *b == button)
            .map(|index| self.pressed.remove(index));

        let mut events = vec![InputEvent::MouseUp(event)];
        if button.is_primary() && press.is_some() {
            events.push(InputEvent::Click(event));
            match self.last_click {
                Some((at, last_point))
                    if time_stamp - at <= DOUBLE_CLICK_MS
                        && last_point.dist(point) < self.click_tolerance * 2.0 =>
                {
                    events.push(InputEvent::DblClick(event));
                    self.last_click = None;
                }
                _ => self.last_click = Some((time_stamp, point)),
            }
        }
        events
    }

    /// Wheel scrolled by `delta` pixels at the current cursor position
    pub fn wheel(&mut self, time_stamp: f64, delta: Point) -> Vec<InputEvent> {
        let Some(point) = self.cursor else {
            return Vec::new();
        };
        vec![InputEvent::Wheel(WheelEvent {
            time_stamp,
            point,
            delta,
            delta_mode: DeltaMode::Pixel,
            modifiers: self.modifiers,
        })]
    }

    /// A single finger changed phase
    ///
    /// The emitted event lists every finger still down afterwards.
    pub fn touch(
        &mut self,
        time_stamp: f64,
        id: u64,
        phase: TouchPhase,
        point: Point,
    ) -> Vec<InputEvent> {
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, point);
                vec![InputEvent::TouchStart(self.touch_event(time_stamp))]
            }
            TouchPhase::Moved => {
                let Some(tracked) = self.touches.get_mut(&id) else {
                    return Vec::new();
                };
                if *tracked == point {
                    return Vec::new();
                }
                *tracked = point;
                vec![InputEvent::TouchMove(self.touch_event(time_stamp))]
            }
            TouchPhase::Ended => {
                if self.touches.shift_remove(&id).is_none() {
                    return Vec::new();
                }
                vec![InputEvent::TouchEnd(self.touch_event(time_stamp))]
            }
            TouchPhase::Cancelled => {
                if self.touches.shift_remove(&id).is_none() {
                    return Vec::new();
                }
                vec![InputEvent::TouchCancel(self.touch_event(time_stamp))]
            }
        }
    }

    /// Number of fingers currently down
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    fn logical(&self, x: f64, y: f64) -> Point {
        Point::new(x / self.scale_factor, y / self.scale_factor)
    }

    fn mouse_event(&self, time_stamp: f64, point: Point) -> MouseEvent {
        let button = self
            .pressed
            .last()
            .copied()
            .unwrap_or(MouseButton::Left);
        MouseEvent {
            time_stamp,
            point,
            button,
            modifiers: self.modifiers,
        }
    }

    fn touch_event(&self, time_stamp: f64) -> TouchEvent {
        TouchEvent {
            time_stamp,
            touches: self
                .touches
                .iter()
                .map(|(id, point)| Touch::new(*id, *point))
                .collect(),
            modifiers: self.modifiers,
        }
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(3.0)
    }
}
