//! Camera system for defining views into world space
//!
//! The handler manager only needs a handful of primitives from the camera:
//! the current zoom/bearing/pitch, the screen center, and conversion between
//! a screen point and the world location under it. [`CameraTransform`] is
//! that contract; [`Camera`] is a planar implementation of it.

use glam::DVec2;

use crate::geometry::Point;

/// A location in world space
pub type WorldLocation = DVec2;

/// Camera primitives consumed by the handler manager
pub trait CameraTransform {
    /// Zoom level (log2 of the world scale)
    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, zoom: f64);

    /// Bearing in degrees, clockwise from north
    fn bearing(&self) -> f64;
    fn set_bearing(&mut self, bearing: f64);

    /// Pitch in degrees away from straight down
    fn pitch(&self) -> f64;
    fn set_pitch(&mut self, pitch: f64);

    /// Screen point at the center of the viewport
    fn center_point(&self) -> Point;

    /// World location under a screen point
    fn unproject(&self, point: Point) -> WorldLocation;

    /// Moves the camera so that `location` sits under `point`
    fn set_location_at_point(&mut self, location: WorldLocation, point: Point);
}

/// Planar camera over an unbounded world plane
///
/// One world unit is one screen pixel at zoom 0. Pitch is tracked and clamped
/// but does not distort the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World location at the center of the viewport
    pub center: WorldLocation,
    zoom: f64,
    bearing: f64,
    pitch: f64,
    /// Viewport size in logical pixels
    pub size: [f64; 2],
    pub limits: CameraLimits,
}

/// Zoom and pitch clamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            max_zoom: 22.0,
            min_pitch: 0.0,
            max_pitch: 60.0,
        }
    }
}

impl Camera {
    /// Create camera centered on `center` for a viewport of the given size
    pub fn new(center: WorldLocation, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            size: [width, height],
            limits: CameraLimits::default(),
        }
    }

    /// Builder method to set the zoom level
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.set_zoom(zoom);
        self
    }

    /// Builder method to set the bearing
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.set_bearing(bearing);
        self
    }

    /// Resize the viewport, keeping the world center
    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = [width, height];
    }

    /// World units per screen pixel
    pub fn world_per_pixel(&self) -> f64 {
        2f64.powf(-self.zoom)
    }

    /// Screen-space rotation that undoes the bearing
    fn screen_to_world_rotation(&self) -> DVec2 {
        DVec2::from_angle(self.bearing.to_radians())
    }

    /// Screen position of a world location
    pub fn project(&self, location: WorldLocation) -> Point {
        let offset = (location - self.center) / self.world_per_pixel();
        let rotation = self.screen_to_world_rotation();
        let screen = DVec2::new(rotation.x, -rotation.y).rotate(offset);
        self.center_point() + Point::from(screen)
    }
}

impl CameraTransform for Camera {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.limits.min_zoom, self.limits.max_zoom);
    }

    fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Wraps into (-180, 180]
    fn set_bearing(&mut self, bearing: f64) {
        let wrapped = (bearing + 180.0).rem_euclid(360.0) - 180.0;
        self.bearing = if wrapped == -180.0 { 180.0 } else { wrapped };
    }

    fn pitch(&self) -> f64 {
        self.pitch
    }

    fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch.clamp(self.limits.min_pitch, self.limits.max_pitch);
    }

    fn center_point(&self) -> Point {
        Point::new(self.size[0] / 2.0, self.size[1] / 2.0)
    }

    fn unproject(&self, point: Point) -> WorldLocation {
        let offset = DVec2::from(point - self.center_point());
        self.center + self.screen_to_world_rotation().rotate(offset) * self.world_per_pixel()
    }

    fn set_location_at_point(&mut self, location: WorldLocation, point: Point) {
        let offset = DVec2::from(point - self.center_point());
        self.center =
            location - self.screen_to_world_rotation().rotate(offset) * self.world_per_pixel();
    }
}
