use crate::point::CartesianPoint2d;
use nalgebra::{Point2, Scalar};
use num_traits::{FromPrimitive, Num};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle enclosing every observed coordinate.
///
/// An extent only ever grows: [`Extent::grow`] never moves a bound inwards, so
/// `x_min <= x_max` and `y_min <= y_max` hold for any extent built from points.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent<N = f64> {
    x_min: N,
    x_max: N,
    y_min: N,
    y_max: N,
}

impl<N: Num + Copy + PartialOrd + Scalar + FromPrimitive> Extent<N> {
    /// Creates an extent from its bounds.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Degenerate extent containing a single point.
    pub fn from_xy(x: N, y: N) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        }
    }

    /// Degenerate extent covering a single point.
    pub fn from_point(p: &impl CartesianPoint2d<Num = N>) -> Self {
        Self::from_xy(p.x(), p.y())
    }

    /// Smallest extent containing all points, or `None` if there are none.
    pub fn from_points<'a, P: CartesianPoint2d<Num = N> + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        let mut extent = Self::from_point(first);
        for p in points {
            extent.grow(p.x(), p.y());
        }

        Some(extent)
    }

    /// Minimum X.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Maximum X.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Minimum Y.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum Y.
    pub fn y_max(&self) -> N {
        self.y_max
    }

    /// Size along X.
    pub fn width(&self) -> N {
        self.x_max - self.x_min
    }

    /// Size along Y.
    pub fn height(&self) -> N {
        self.y_max - self.y_min
    }

    /// Extends the bounds so that they include `(x, y)`.
    pub fn grow(&mut self, x: N, y: N) {
        if x < self.x_min {
            self.x_min = x;
        }
        if x > self.x_max {
            self.x_max = x;
        }
        if y < self.y_min {
            self.y_min = y;
        }
        if y > self.y_max {
            self.y_max = y;
        }
    }

    /// Center of the rectangle.
    pub fn center(&self) -> Point2<N> {
        let two = N::one() + N::one();
        Point2::new(
            self.x_max - (self.x_max - self.x_min) / two,
            self.y_max - (self.y_max - self.y_min) / two,
        )
    }

    /// Corners in the order upper-right, upper-left, lower-left, lower-right.
    pub fn corners(&self) -> [Point2<N>; 4] {
        [
            Point2::new(self.x_max, self.y_max),
            Point2::new(self.x_min, self.y_max),
            Point2::new(self.x_min, self.y_min),
            Point2::new(self.x_max, self.y_min),
        ]
    }
}
