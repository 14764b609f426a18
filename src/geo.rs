// Proximity ranking over the `geo` crate's haversine metric.

use ::geo::{Distance, Haversine, Point};
use serde::Serialize;

const METERS_PER_KM: f64 = 1_000.0;
const METERS_PER_MILE: f64 = 1_609.344;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        is_latitude(self.latitude) && is_longitude(self.longitude)
    }

    fn point(&self) -> Point<f64> {
        // geo points are (x = lon, y = lat)
        Point::new(self.longitude, self.latitude)
    }
}

pub fn is_latitude(v: f64) -> bool {
    v.is_finite() && (-90.0..=90.0).contains(&v)
}

pub fn is_longitude(v: f64) -> bool {
    v.is_finite() && (-180.0..=180.0).contains(&v)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }

    fn from_meters(&self, m: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => m / METERS_PER_KM,
            DistanceUnit::Miles => m / METERS_PER_MILE,
        }
    }
}

/// Great-circle distance between two points.
pub fn distance(a: Coordinates, b: Coordinates, unit: DistanceUnit) -> f64 {
    unit.from_meters(Haversine::distance(a.point(), b.point()))
}

/// First item in list order with the smallest distance to `origin`, with that distance.
/// Items whose distance is not a number never win.
pub fn closest<'a, T, F>(items: &'a [T], origin: Coordinates, unit: DistanceUnit, coords: F) -> Option<(&'a T, f64)>
where
    F: Fn(&T) -> Coordinates,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let d = distance(origin, coords(item), unit);
        if !d.is_finite() {
            continue;
        }
        match best {
            // strict `<` keeps the earliest of equal candidates
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((item, d)),
        }
    }
    best
}
