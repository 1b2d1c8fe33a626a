//! Re-publishes raw input as map notifications
//!
//! [`MapEventHandler`] runs first in the handler order. When a listener calls
//! [`MapEvent::prevent_default`] on a preventable notification, the handler
//! claims the event, which blocks every other handler for that input.

use std::any::Any;

use super::{GestureResult, Handler, HandlerContext};
use crate::geometry::Point;
use crate::input::{InputEvent, MouseEvent, TouchEvent, WheelEvent};
use crate::map::{MapEvent, MapEventKind};

/// Publishes pointer, wheel and touch input and lets listeners veto it
#[derive(Debug, Clone)]
pub struct MapEventHandler {
    click_tolerance: f64,
    mousedown_pos: Option<Point>,
}

impl MapEventHandler {
    pub fn new(click_tolerance: f64) -> Self {
        Self {
            click_tolerance,
            mousedown_pos: None,
        }
    }

    fn fire_preventable(
        cx: &mut HandlerContext<'_>,
        kind: MapEventKind,
        original: InputEvent,
    ) -> Option<GestureResult> {
        let event = cx.fire(MapEvent::new(kind, Some(original)));
        event.default_prevented().then(GestureResult::claim)
    }

    fn fire(cx: &mut HandlerContext<'_>, kind: MapEventKind, original: InputEvent) {
        cx.fire(MapEvent::new(kind, Some(original)));
    }
}

impl Handler for MapEventHandler {
    fn reset(&mut self) {
        self.mousedown_pos = None;
    }

    // Always on
    fn enable(&mut self) {}

    fn disable(&mut self) {}

    fn is_enabled(&self) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        false
    }

    fn mousedown(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        point: Point,
    ) -> Option<GestureResult> {
        self.mousedown_pos = Some(point);
        Self::fire_preventable(cx, MapEventKind::MouseDown, InputEvent::MouseDown(*event))
    }

    fn mouseup(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        Self::fire(cx, MapEventKind::MouseUp, InputEvent::MouseUp(*event));
        None
    }

    fn click(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        point: Point,
    ) -> Option<GestureResult> {
        if let Some(down) = self.mousedown_pos
            && down.dist(point) >= self.click_tolerance
        {
            return None;
        }
        Self::fire(cx, MapEventKind::Click, InputEvent::Click(*event));
        None
    }

    fn dblclick(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        Self::fire_preventable(cx, MapEventKind::DblClick, InputEvent::DblClick(*event))
    }

    fn mouseover(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        Self::fire(cx, MapEventKind::MouseOver, InputEvent::MouseOver(*event));
        None
    }

    fn mouseout(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        Self::fire(cx, MapEventKind::MouseOut, InputEvent::MouseOut(*event));
        None
    }

    fn wheel(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &WheelEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        Self::fire_preventable(cx, MapEventKind::Wheel, InputEvent::Wheel(*event))
    }

    fn touchstart(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        Self::fire_preventable(
            cx,
            MapEventKind::TouchStart,
            InputEvent::TouchStart(event.clone()),
        )
    }

    fn touchmove(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        Self::fire(cx, MapEventKind::TouchMove, InputEvent::TouchMove(event.clone()));
        None
    }

    fn touchend(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        Self::fire(cx, MapEventKind::TouchEnd, InputEvent::TouchEnd(event.clone()));
        None
    }

    fn touchcancel(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &TouchEvent,
    ) -> Option<GestureResult> {
        Self::fire(
            cx,
            MapEventKind::TouchCancel,
            InputEvent::TouchCancel(event.clone()),
        );
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Publishes mouse moves and context menus; runs last so active gestures
/// can block it
///
/// Some platforms raise the context menu on press, others on release. A menu
/// raised while a button is held is deferred to the release, so listeners see
/// it once, after the press, on every platform. If a gesture became active in
/// between, the handler is reset and the deferred menu is dropped.
#[derive(Debug, Clone, Default)]
pub struct BlockableMapEventHandler {
    delay_context_menu: bool,
    ignore_context_menu: bool,
    context_menu_event: Option<MouseEvent>,
}

impl BlockableMapEventHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for BlockableMapEventHandler {
    fn reset(&mut self) {
        self.delay_context_menu = false;
        self.ignore_context_menu = true;
        self.context_menu_event = None;
    }

    fn enable(&mut self) {}

    fn disable(&mut self) {}

    fn is_enabled(&self) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        false
    }

    fn mousemove(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        cx.fire(MapEvent::new(
            MapEventKind::MouseMove,
            Some(InputEvent::MouseMove(*event)),
        ));
        None
    }

    fn mousedown(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        self.delay_context_menu = true;
        self.ignore_context_menu = false;
        None
    }

    fn mouseup(
        &mut self,
        cx: &mut HandlerContext<'_>,
        _event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        self.delay_context_menu = false;
        if let Some(menu) = self.context_menu_event.take() {
            cx.fire(MapEvent::new(
                MapEventKind::ContextMenu,
                Some(InputEvent::ContextMenu(menu)),
            ));
        }
        None
    }

    fn contextmenu(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &MouseEvent,
        _point: Point,
    ) -> Option<GestureResult> {
        if self.delay_context_menu {
            self.context_menu_event = Some(*event);
        } else if !self.ignore_context_menu {
            cx.fire(MapEvent::new(
                MapEventKind::ContextMenu,
                Some(InputEvent::ContextMenu(*event)),
            ));
        }

        if cx.listens(MapEventKind::ContextMenu) {
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
