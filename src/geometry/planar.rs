use super::*;
use approx::AbsDiffEq;
use std::fmt;

type FloatSize = f64;

/// Index of the north-western child of a split node.
pub const NORTH_WEST: usize = 0;
/// Index of the north-eastern child of a split node.
pub const NORTH_EAST: usize = 1;
/// Index of the south-eastern child of a split node.
pub const SOUTH_EAST: usize = 2;
/// Index of the south-western child of a split node.
pub const SOUTH_WEST: usize = 3;

/// A point in coordinate space
///
/// `x` is the longitude (or screen x) and `y` the latitude (or screen y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: FloatSize,
    pub y: FloatSize,
}

impl Point {
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Point { x: lon, y: lat }
    }

    #[inline(always)]
    pub fn lat(&self) -> f64 {
        self.y
    }

    #[inline(always)]
    pub fn lon(&self) -> f64 {
        self.x
    }

    /// Squared euclidean distance in coordinate space
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "・({},{})", self.y, self.x)
    }
}

impl AbsDiffEq for Point {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

/// An axis-aligned box given by its four edges
///
/// A single `Rect` never wraps around the antimeridian.
///
/// Point membership is half-open: a point belongs to the rect iff
/// `lon ∈ [west, east)` and `lat ∈ (south, north]`.
/// This way the four quadrants of a rect partition it without any point
/// belonging to two siblings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub north: FloatSize,
    pub west: FloatSize,
    pub south: FloatSize,
    pub east: FloatSize,
}

impl Rect {
    /// The whole lat/lon sphere in decimal degrees
    pub const WORLD: Rect = Rect {
        north: 90.0,
        west: -180.0,
        south: -90.0,
        east: 180.0,
    };

    pub const fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Rect {
            north,
            west,
            south,
            east,
        }
    }

    /// A rect that can be used as the bounds of a tree node
    pub fn is_legal(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.west.is_finite()
            && self.east.is_finite()
            && self.north > self.south
            && self.east > self.west
    }

    pub fn height(&self) -> f64 {
        (self.north - self.south).abs()
    }

    pub fn width(&self) -> f64 {
        (self.east - self.west).abs()
    }

    /// The point where the quadrants of this rect meet
    pub fn midpoint(&self) -> Point {
        Point {
            x: self.east - (self.east - self.west) * 0.5,
            y: self.north - (self.north - self.south) * 0.5,
        }
    }

    /// Half-open containment test, see the type docs
    pub fn point_within_bounds(&self, lat: f64, lon: f64) -> bool {
        lon >= self.west && lon < self.east && lat <= self.north && lat > self.south
    }

    /// Closed containment test, including every edge
    pub fn encloses(&self, lat: f64, lon: f64) -> bool {
        lon >= self.west && lon <= self.east && lat <= self.north && lat >= self.south
    }

    /// Overlap test (despite the name)
    ///
    /// The comparisons are asymmetric between the north/west and
    /// the south/east sides, matching the half-open point membership.
    /// A shared south or east edge is never an overlap, a shared north or west edge is.
    pub fn within(&self, other: &Rect) -> bool {
        if self.south >= other.north {
            return false;
        }
        if self.north < other.south {
            return false;
        }
        if self.west > other.east {
            return false;
        }
        if self.east <= other.west {
            return false;
        }
        true
    }

    /// Closed overlap test, where sharing any edge or corner counts
    pub fn touches(&self, other: &Rect) -> bool {
        self.south <= other.north
            && self.north >= other.south
            && self.west <= other.east
            && self.east >= other.west
    }

    /// Squared distance from a point to the nearest point on or in this rect
    ///
    /// Zero if the point lies inside or on the border.
    pub fn border_distance_sq(&self, lat: f64, lon: f64) -> f64 {
        let ns_distance = if lat > self.north {
            lat - self.north
        } else if lat < self.south {
            self.south - lat
        } else {
            0.0
        };
        let ew_distance = if lon > self.east {
            lon - self.east
        } else if lon < self.west {
            self.west - lon
        } else {
            0.0
        };
        ns_distance * ns_distance + ew_distance * ew_distance
    }

    /// Partition this rect at its midpoint
    ///
    /// Indexed by [NORTH_WEST], [NORTH_EAST], [SOUTH_EAST], [SOUTH_WEST].
    pub fn quadrants(&self) -> [Rect; 4] {
        let mid = self.midpoint();
        let mut quadrants = [*self; 4];
        quadrants[NORTH_WEST].south = mid.y;
        quadrants[NORTH_WEST].east = mid.x;
        quadrants[NORTH_EAST].south = mid.y;
        quadrants[NORTH_EAST].west = mid.x;
        quadrants[SOUTH_EAST].north = mid.y;
        quadrants[SOUTH_EAST].west = mid.x;
        quadrants[SOUTH_WEST].north = mid.y;
        quadrants[SOUTH_WEST].east = mid.x;
        quadrants
    }

    /// Which of the [quadrants](Rect::quadrants) a point falls into
    ///
    /// Points on the shared inner edges go south and east, as required by the
    /// half-open membership. Points outside this rect are mapped to the
    /// nearest quadrant, which keeps points on the closed outer edges of a
    /// tree's universe addressable.
    pub fn quadrant_of(&self, lat: f64, lon: f64) -> usize {
        let mid = self.midpoint();
        match (lat > mid.y, lon < mid.x) {
            (true, true) => NORTH_WEST,
            (true, false) => NORTH_EAST,
            (false, false) => SOUTH_EAST,
            (false, true) => SOUTH_WEST,
        }
    }

    /// Returns `false` when the midpoint collapses onto an edge on both axes,
    /// i.e. when splitting would produce a child identical to this rect.
    pub fn can_subdivide(&self) -> bool {
        let mid = self.midpoint();
        let lat_splits = mid.y > self.south && mid.y < self.north;
        let lon_splits = mid.x > self.west && mid.x < self.east;
        lat_splits || lon_splits
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[N{} W{} S{} E{}]",
            self.north, self.west, self.south, self.east
        )
    }
}

impl Intersecting<Point> for Rect {
    fn intersects(&self, other: &Point) -> bool {
        self.encloses(other.lat(), other.lon())
    }

    fn contains(&self, other: &Point) -> bool {
        self.point_within_bounds(other.lat(), other.lon())
    }
}

impl Intersecting for Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.within(other)
    }

    fn contains(&self, other: &Rect) -> bool {
        self.west <= other.west
            && other.east <= self.east
            && self.south <= other.south
            && other.north <= self.north
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_point_membership_is_half_open() {
        let r = Rect::new(10.0, 0.0, 0.0, 10.0);
        assert!(r.point_within_bounds(5.0, 5.0));
        // north and west edges are in
        assert!(r.point_within_bounds(10.0, 5.0));
        assert!(r.point_within_bounds(5.0, 0.0));
        // south and east edges are out
        assert!(!r.point_within_bounds(0.0, 5.0));
        assert!(!r.point_within_bounds(5.0, 10.0));
        // but closed containment keeps them
        assert!(r.encloses(0.0, 5.0));
        assert!(r.encloses(5.0, 10.0));
        assert!(!r.encloses(10.1, 5.0));
    }

    #[test]
    fn test_quadrants_partition_parent() {
        let parent = Rect::new(90.0, -180.0, -90.0, 180.0);
        let quads = parent.quadrants();
        assert_eq!(quads[NORTH_WEST], Rect::new(90.0, -180.0, 0.0, 0.0));
        assert_eq!(quads[NORTH_EAST], Rect::new(90.0, 0.0, 0.0, 180.0));
        assert_eq!(quads[SOUTH_EAST], Rect::new(0.0, 0.0, -90.0, 180.0));
        assert_eq!(quads[SOUTH_WEST], Rect::new(0.0, -180.0, -90.0, 0.0));
        let area: f64 = quads.iter().map(|q| q.height() * q.width()).sum();
        assert_abs_diff_eq!(area, parent.height() * parent.width());
        assert_abs_diff_eq!(parent.midpoint(), Point { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_shared_edges_map_to_exactly_one_quadrant() {
        let parent = Rect::new(10.0, 0.0, 0.0, 10.0);
        let quads = parent.quadrants();
        let samples = [
            (5.0, 5.0),
            (5.0, 2.0),
            (5.0, 7.0),
            (2.0, 5.0),
            (7.0, 5.0),
            (10.0, 0.0),
            (7.5, 2.5),
        ];
        for (lat, lon) in samples {
            let owners: Vec<usize> = (0..4)
                .filter(|i| quads[*i].point_within_bounds(lat, lon))
                .collect();
            assert_eq!(1, owners.len(), "({lat},{lon}) owned by {owners:?}");
            assert_eq!(owners[0], parent.quadrant_of(lat, lon));
        }
        // the midpoint itself belongs to the south-east quadrant
        assert_eq!(SOUTH_EAST, parent.quadrant_of(5.0, 5.0));
        // outer edges that are excluded by the half-open test still get a home
        assert_eq!(SOUTH_EAST, parent.quadrant_of(0.0, 10.0));
        assert_eq!(SOUTH_WEST, parent.quadrant_of(0.0, 0.0));
    }

    #[test]
    fn test_within_boundary_conventions() {
        let r = Rect::new(10.0, 0.0, 0.0, 10.0);
        // clearly disjoint on every side
        assert!(!r.within(&Rect::new(30.0, 0.0, 20.0, 10.0)));
        assert!(!r.within(&Rect::new(-20.0, 0.0, -30.0, 10.0)));
        assert!(!r.within(&Rect::new(10.0, 20.0, 0.0, 30.0)));
        assert!(!r.within(&Rect::new(10.0, -30.0, 0.0, -20.0)));
        // self.south == other.north: no overlap
        assert!(!r.within(&Rect::new(0.0, 0.0, -10.0, 10.0)));
        // self.north == other.south: overlap
        assert!(r.within(&Rect::new(20.0, 0.0, 10.0, 10.0)));
        // self.east == other.west: no overlap
        assert!(!r.within(&Rect::new(10.0, 10.0, 0.0, 20.0)));
        // self.west == other.east: overlap
        assert!(r.within(&Rect::new(10.0, -10.0, 0.0, 0.0)));
        // proper overlap and nesting
        assert!(r.within(&Rect::new(5.0, 5.0, -5.0, 15.0)));
        assert!(r.within(&Rect::new(6.0, 4.0, 5.0, 6.0)));
        assert!(Rect::new(6.0, 4.0, 5.0, 6.0).within(&r));
    }

    #[test]
    fn test_touches_and_rect_containment() {
        let r = Rect::new(10.0, 0.0, 0.0, 10.0);
        // shared edges that `within` rejects
        let below = Rect::new(0.0, 0.0, -10.0, 10.0);
        let east = Rect::new(10.0, 10.0, 0.0, 20.0);
        assert!(!r.within(&below));
        assert!(r.touches(&below));
        assert!(!r.within(&east));
        assert!(r.touches(&east));
        assert!(r.touches(&Rect::new(0.0, 10.0, -5.0, 15.0)));
        assert!(!r.touches(&Rect::new(-0.5, 0.0, -10.0, 10.0)));

        assert!(r.contains(&Rect::new(5.0, 0.0, 0.0, 5.0)));
        assert!(r.contains(&r));
        assert!(!r.contains(&Rect::new(11.0, 0.0, 0.0, 5.0)));
        for quadrant in r.quadrants() {
            assert!(r.contains(&quadrant));
        }
    }

    #[test]
    fn test_border_distance() {
        let r = Rect::new(10.0, 0.0, 0.0, 10.0);
        assert_eq!(0.0, r.border_distance_sq(5.0, 5.0));
        assert_eq!(0.0, r.border_distance_sq(10.0, 10.0));
        assert_abs_diff_eq!(4.0, r.border_distance_sq(12.0, 5.0));
        assert_abs_diff_eq!(9.0, r.border_distance_sq(5.0, -3.0));
        // corner
        assert_abs_diff_eq!(25.0, r.border_distance_sq(13.0, 14.0));
        assert_abs_diff_eq!(2.0, r.border_distance_sq(-1.0, -1.0));
    }

    #[test]
    fn test_subdivision_limits() {
        assert!(Rect::WORLD.can_subdivide());
        assert!(Rect::WORLD.is_legal());
        let flat = Rect::new(1.0, 0.0, 1.0, 0.0);
        assert!(!flat.is_legal());
        assert!(!flat.can_subdivide());
        // one ulp on both axes, the midpoint rounds onto the south/west edge
        let tiny = Rect::new(1.0 + f64::EPSILON, 1.0, 1.0, 1.0 + f64::EPSILON);
        assert!(!tiny.can_subdivide());
        assert!(!Rect::new(f64::NAN, 0.0, 0.0, 1.0).is_legal());
    }
}
