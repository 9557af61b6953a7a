use super::*;
use approx::abs_diff_eq;
use geographiclib_rs::{DirectGeodesic, Geodesic, InverseGeodesic};
use planar::*;
use uom::si::{
    angle::degree,
    f64::*,
    length::{kilometer, meter},
};

/// A course directly north (0º)
pub const NORTH: f64 = 0.0;
/// A course directly north (0º)
#[inline(always)]
pub fn north_deg() -> Angle {
    Angle::new::<degree>(NORTH)
}

/// A course directly east (90º)
pub const EAST: f64 = 90.0;
/// A course directly east (90º)
#[inline(always)]
pub fn east_deg() -> Angle {
    Angle::new::<degree>(EAST)
}

/// A course directly south (180º)
pub const SOUTH: f64 = 180.0;
/// A course directly south (180º)
#[inline(always)]
pub fn south_deg() -> Angle {
    Angle::new::<degree>(SOUTH)
}

/// A course directly west (270º)
pub const WEST: f64 = 270.0;
/// A course directly west (270º)
#[inline(always)]
pub fn west_deg() -> Angle {
    Angle::new::<degree>(WEST)
}

/// Query boxes whose west and east edges are closer than this are read as
/// "the whole longitude circle".
pub const DATELINE_EPSILON: f64 = 0.001;

const EARTH_CIRCUMFERENCE_MERIDIONAL_KM: f64 = 40007.86;
/// Maximum radius of a circle that can still be bounded by a box
///
/// Bounding boxes around circles with radii greater than this number would wrap both poles,
/// making them useless for filtering.
pub const MAX_BOUNDING_RADIUS_KM: f64 = EARTH_CIRCUMFERENCE_MERIDIONAL_KM / 4.0;
#[inline(always)]
pub fn max_bounding_radius() -> Length {
    Length::new::<kilometer>(MAX_BOUNDING_RADIUS_KM)
}

const ERROR: f64 = 1e-8;

/// A caller query box, decomposed so that no single part wraps the antimeridian
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum QueryBox {
    Simple(Rect),
    /// A box crossing ±180º, split into the part east of `west`
    /// and the part west of `east`.
    DatelineWrap { west_part: Rect, east_part: Rect },
}

impl QueryBox {
    /// Decompose a caller box given by its edges
    ///
    /// If `west > east`, or both are within [DATELINE_EPSILON] of each other,
    /// the box is taken to cross the antimeridian and is split into
    /// `[west, 180]` and `[-180, east)`.
    /// The outer part edges are unbounded, so points stored at exactly ±180º are found.
    pub fn from_edges(north: f64, west: f64, south: f64, east: f64) -> QueryBox {
        if west > east || abs_diff_eq!(west, east, epsilon = DATELINE_EPSILON) {
            // a near-zero width box means the whole circle, so don't overlap the parts
            let east = east.min(west);
            QueryBox::DatelineWrap {
                west_part: Rect::new(north, west, south, f64::INFINITY),
                east_part: Rect::new(north, f64::NEG_INFINITY, south, east),
            }
        } else {
            QueryBox::Simple(Rect::new(north, west, south, east))
        }
    }

    /// A box around a circle on the WGS84 ellipsoid
    ///
    /// Returns `None` if the circle is too large to be usefully bounded,
    /// see [MAX_BOUNDING_RADIUS_KM].
    pub fn from_circle(lat: f64, lon: f64, radius: Length) -> Option<QueryBox> {
        if radius > max_bounding_radius() {
            return None;
        }
        // reasonably accurate bounding box
        let north = travel_accurate(lat, lon, north_deg(), radius);
        let south = travel_accurate(lat, lon, south_deg(), radius);

        if !abs_diff_eq!(north.lon(), lon, epsilon = ERROR) {
            // wrapped over the northpole
            if !abs_diff_eq!(south.lon(), lon, epsilon = ERROR) {
                log::warn!("Circle around ({lat},{lon}) with radius {radius:?} wraps both poles");
                return None;
            }
            return Some(QueryBox::Simple(Rect::new(
                f64::INFINITY,
                f64::NEG_INFINITY,
                south.lat(),
                f64::INFINITY,
            )));
        }
        if !abs_diff_eq!(south.lon(), lon, epsilon = ERROR) {
            // wrapped over the southpole
            // (we already checked for both overlap above)
            return Some(QueryBox::Simple(Rect::new(
                north.lat(),
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
            )));
        }
        let east = travel_accurate(lat, lon, east_deg(), radius);
        let west = travel_accurate(lat, lon, west_deg(), radius);
        Some(QueryBox::from_edges(
            north.lat(),
            west.lon(),
            south.lat(),
            east.lon(),
        ))
    }

    /// The non-wrapping parts of this box
    pub fn parts(&self) -> impl Iterator<Item = &Rect> {
        let (first, second) = match self {
            QueryBox::Simple(r) => (r, None),
            QueryBox::DatelineWrap {
                west_part,
                east_part,
            } => (west_part, Some(east_part)),
        };
        std::iter::once(first).chain(second)
    }
}

impl Intersecting<Point> for QueryBox {
    fn intersects(&self, other: &Point) -> bool {
        self.parts().any(|r| r.intersects(other))
    }

    fn contains(&self, other: &Point) -> bool {
        self.parts().any(|r| r.contains(other))
    }
}

/// Calculate a target position by travelling along a `course` for a certain `distance`
///
/// - `course` is the direction to travel in, given in [0º, 360º) (or something equivalent in different units)
/// - `distance` is the length of the arc to cover; must be non-negative
///
/// Uses the WGS84 ellipsoid.
pub fn travel_accurate(lat: f64, lon: f64, course: Angle, distance: Length) -> Point {
    let distance_m = distance.get::<meter>();
    debug_assert!(distance_m >= 0.0);
    let course_deg = course.get::<degree>();
    debug_assert!((0.0..360.0).contains(&course_deg));
    // convert to the [-180, 180]
    let azimuth = if course_deg <= 180.0 {
        course_deg
    } else {
        course_deg - 360.0
    };

    let g = Geodesic::wgs84();
    let (new_lat_deg, new_lon_deg) = g.direct(lat, lon, azimuth, distance_m);
    Point::from_lat_lon(new_lat_deg, new_lon_deg)
}

/// Geodesic distance between two positions on the WGS84 ellipsoid
pub fn distance_accurate(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Length {
    let g = Geodesic::wgs84();
    let dist_m: f64 = g.inverse(lat1, lon1, lat2, lon2);
    Length::new::<meter>(dist_m)
}
