//! An adaptive quad-tree index over 2D point data, typically latitude/longitude.
//!
//! The [QuadTree] supports insertion, removal, nearest-point lookup
//! (optionally bounded by a distance), and rectangular range queries,
//! including boxes that wrap around the ±180º antimeridian.
//!
//! ```
//! use geo_quadtree::QuadTree;
//!
//! let mut tree = QuadTree::new(90.0, -180.0, -90.0, 180.0, 2, None).expect("legal bounds");
//! tree.insert(10.0, 10.0, "a");
//! tree.insert(10.0, 11.0, "b");
//! tree.insert(10.0, 12.0, "c");
//!
//! assert_eq!(Some(&"a"), tree.nearest(10.0, 10.4));
//! assert_eq!(3, tree.range(20.0, 0.0, 0.0, 20.0).len());
//! // crosses the antimeridian
//! assert!(tree.range(20.0, 170.0, 0.0, -170.0).is_empty());
//! ```
use snafu::{prelude::*, Backtrace};

pub mod config;
pub mod geometry;
pub mod indices;
pub mod loader;

pub use config::IndexConfig;
pub use geometry::planar::{Point, Rect};
pub use indices::quad_tree::{Entry, QuadTree, TreeStats};

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IndexError {
    #[snafu(display(
        "Bounds [N{north} W{west} S{south} E{east}] do not describe a non-empty box"
    ))]
    InvalidBounds {
        north: f64,
        west: f64,
        south: f64,
        east: f64,
    },
    #[snafu(display("A node must be allowed to hold at least one entry"))]
    InvalidCapacity,
    #[snafu(display("Minimum node size must be finite and non-negative, not {min_size}"))]
    InvalidMinSize { min_size: f64 },
    #[snafu(display("Point ({lat},{lon}) lies outside of the tree's universe"))]
    OutOfUniverse { lat: f64, lon: f64 },
    #[snafu(display("Point ({lat},{lon}) is not a finite coordinate"))]
    NonFiniteCoordinate { lat: f64, lon: f64 },
    #[snafu(display("Error reading input: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid point on line {line}: {description}"))]
    Parse {
        line: usize,
        description: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid index config: {source}"))]
    Config { source: toml::de::Error },
}
