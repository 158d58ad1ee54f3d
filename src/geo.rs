//! Geographic helpers shared by the loader and the layout engines.
//!
//! Distances are great-circle (haversine) on a spherical earth. Layouts never
//! work in raw degrees: they project a track onto a local plane where one
//! unit is roughly one meter, so a track's shape survives the trip from
//! lat/lon to poster coordinates without east-west stretching.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the haversine sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance between two lat/lon pairs, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// A point on the poster plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

impl Xy {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Bounds of a lat/lon sequence, `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lat, lon) = iter.next()?;
        let mut bbox = Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        };
        for (lat, lon) in iter {
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
        }
        Some(bbox)
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Grow any axis narrower than `eps` degrees to exactly `eps`, keeping
    /// it centered. Projection divides by the spans, so they must not be zero.
    pub fn expanded(&self, eps: f64) -> Self {
        let mut out = *self;
        if out.lat_span() < eps {
            let mid = (out.min_lat + out.max_lat) / 2.0;
            out.min_lat = mid - eps / 2.0;
            out.max_lat = mid + eps / 2.0;
        }
        if out.lon_span() < eps {
            let mid = (out.min_lon + out.max_lon) / 2.0;
            out.min_lon = mid - eps / 2.0;
            out.max_lon = mid + eps / 2.0;
        }
        out
    }

    /// Width and height of the box in meters on the local plane.
    pub fn extent_m(&self) -> (f64, f64) {
        let scale = self.mid_lat().to_radians().cos();
        (
            self.lon_span() * METERS_PER_DEGREE * scale,
            self.lat_span() * METERS_PER_DEGREE,
        )
    }

    /// Project a lat/lon into local meters relative to the box's north-west
    /// corner. `y` grows southward, matching SVG coordinates.
    pub fn project(&self, lat: f64, lon: f64) -> Xy {
        let scale = self.mid_lat().to_radians().cos();
        Xy::new(
            (lon - self.min_lon) * METERS_PER_DEGREE * scale,
            (self.max_lat - lat) * METERS_PER_DEGREE,
        )
    }
}
