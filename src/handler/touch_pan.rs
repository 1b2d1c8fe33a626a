//! Touch pan with one or more fingers

use std::any::Any;

use indexmap::IndexMap;

use super::{GestureResult, Handler, HandlerContext};
use crate::geometry::Point;
use crate::input::{TouchEvent, TouchId};

/// Pans by the average movement of the fingers on the map
///
/// Movement is held back until the accumulated pan reaches the click
/// tolerance, so a tap does not nudge the map.
#[derive(Debug, Clone)]
pub struct TouchPanHandler {
    click_tolerance: f64,
    min_touches: usize,
    enabled: bool,
    active: bool,
    touches: IndexMap<TouchId, Point>,
    sum: Point,
}

impl TouchPanHandler {
    /// Creates a disabled touch pan handler
    ///
    /// With `cooperative_gestures` a single finger scrolls the page instead
    /// and two fingers are needed to pan.
    pub fn new(click_tolerance: f64, cooperative_gestures: bool) -> Self {
        Self {
            click_tolerance,
            min_touches: if cooperative_gestures { 2 } else { 1 },
            enabled: false,
            active: false,
            touches: IndexMap::new(),
            sum: Point::ZERO,
        }
    }

    fn calculate_transform(&mut self, event: &TouchEvent) -> Option<GestureResult> {
        if !event.touches.is_empty() {
            self.active = true;
        }

        let mut point_sum = Point::ZERO;
        let mut delta_sum = Point::ZERO;
        let mut delta_count = 0usize;
        for touch in &event.touches {
            if let Some(previous) = self.touches.get(&touch.id) {
                point_sum += touch.point;
                delta_sum += touch.point - *previous;
                delta_count += 1;
            }
        }
        self.touches = event.touches.iter().map(|t| (t.id, t.point)).collect();

        if delta_count < self.min_touches || delta_sum.mag() == 0.0 {
            return None;
        }

        let count = delta_count as f64;
        let pan_delta = delta_sum / count;
        self.sum += pan_delta;
        if self.sum.mag() < self.click_tolerance {
            return None;
        }

        Some(GestureResult::pan(pan_delta, point_sum / count))
    }
}

impl Handler for TouchPanHandler {
    fn reset(&mut self) {
        self.active = false;
        self.touches.clear();
        self.sum = Point::ZERO;
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

    fn touchstart(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        self.calculate_transform(event)
    }

    fn touchmove(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        if !self.active || event.touches.len() < self.min_touches {
            return None;
        }
        cx.prevent_default();
        self.calculate_transform(event)
    }

    fn touchend(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        self.calculate_transform(event);
        if self.active && event.touches.len() < self.min_touches {
            self.reset();
        }
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
