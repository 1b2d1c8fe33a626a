//! Easing curves for animated camera transitions

use serde::{Deserialize, Serialize};

/// Timing curve mapping linear progress `t` in `[0, 1]` to eased progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// CSS-style cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1)
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Easing {
    /// The default camera easing, `ease` in CSS terms
    pub const EASE: Self = Self::CubicBezier {
        x1: 0.25,
        y1: 0.1,
        x2: 0.25,
        y2: 1.0,
    };

    /// Decelerating curve used for momentum after a gesture
    pub const INERTIA: Self = Self::CubicBezier {
        x1: 0.0,
        y1: 0.0,
        x2: 0.3,
        y2: 1.0,
    };

    /// Evaluates the curve at `t`, clamped to `[0, 1]`
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Linear => t,
            Self::CubicBezier { x1, y1, x2, y2 } => UnitBezier::new(x1, y1, x2, y2).solve(t),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::EASE
    }
}

/// Polynomial form of a cubic bezier with fixed end points
struct UnitBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl UnitBezier {
    const EPSILON: f64 = 1e-6;

    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        Self {
            cx,
            bx,
            ax: 1.0 - cx - bx,
            cy,
            by,
            ay: 1.0 - cy - by,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_dx(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Finds the curve parameter whose x equals `x`
    fn solve_x(&self, x: f64) -> f64 {
        // Newton's method first, it converges in a few steps for sane curves
        let mut t = x;
        for _ in 0..8 {
            let error = self.sample_x(t) - x;
            if error.abs() < Self::EPSILON {
                return t;
            }
            let dx = self.sample_dx(t);
            if dx.abs() < Self::EPSILON {
                break;
            }
            t -= error / dx;
        }

        // Bisection fallback
        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        while lo < hi {
            let sample = self.sample_x(t);
            if (sample - x).abs() < Self::EPSILON {
                return t;
            }
            if x > sample {
                lo = t;
            } else {
                hi = t;
            }
            t = (hi - lo) * 0.5 + lo;
            if hi - lo < Self::EPSILON {
                break;
            }
        }
        t
    }

    fn solve(&self, x: f64) -> f64 {
        self.sample_y(self.solve_x(x))
    }
}
