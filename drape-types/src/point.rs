use nalgebra::{Point2, Scalar};
use num_traits::{Bounded, Float, FromPrimitive, Num};
use serde::{Deserialize, Serialize};

/// Point on a plane.
pub trait CartesianPoint2d {
    type Num: Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive;

    fn x(&self) -> Self::Num;
    fn y(&self) -> Self::Num;
}

impl<N> CartesianPoint2d for Point2<N>
where
    N: Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive,
{
    type Num = N;

    fn x(&self) -> N {
        self.x
    }

    fn y(&self) -> N {
        self.y
    }
}

/// Point given by latitude and longitude in degrees.
pub trait GeoPoint {
    type Num: Float;

    fn lat(&self) -> Self::Num;
    fn lon(&self) -> Self::Num;

    fn lat_rad(&self) -> Self::Num {
        self.lat().to_radians()
    }

    fn lon_rad(&self) -> Self::Num {
        self.lon().to_radians()
    }
}

/// Constructors for geographic points.
pub trait NewGeoPoint<N = f64>: GeoPoint<Num = N> + Sized {
/// Creates a point from latitude and longitude in degrees.
    fn latlon(lat: N, lon: N) -> Self;
/// Creates a point from longitude and latitude in degrees.
    fn lonlat(lon: N, lat: N) -> Self {
        Self::latlon(lat, lon)
    }
}

/// 2d point on the surface of the Earth.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lat: f64,
    lon: f64,
}

impl GeoPoint for GeoPoint2d {
    type Num = f64;

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl NewGeoPoint<f64> for GeoPoint2d {
    fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}
