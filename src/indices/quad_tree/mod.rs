pub mod geodesic;
mod nodes;

pub use nodes::{Entries, Entry};

use nodes::*;

use crate::{
    config::IndexConfig,
    geometry::{planar::Rect, spherical::QueryBox},
    InvalidBoundsSnafu,
    InvalidCapacitySnafu,
    InvalidMinSizeSnafu,
    NonFiniteCoordinateSnafu,
    OutOfUniverseSnafu,
};
use snafu::prelude::*;

/// Split threshold used by [QuadTree::default]
pub const DEFAULT_MAX_ITEMS: usize = 100;
/// Minimum node size used by [QuadTree::default], in coordinate units
pub const DEFAULT_MIN_SIZE: f64 = 0.001;

/// Shape of a tree, as reported by [QuadTree::stats]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub leaves: usize,
    pub internal_nodes: usize,
    /// Depth of the deepest node, the root being at depth 0
    pub max_depth: usize,
    pub entries: usize,
    pub largest_bucket: usize,
}

/// An adaptive quad-tree over 2D point data
///
/// Covers a fixed universe given at construction.
/// Leaves hold up to `max_items` entries before splitting into four quadrants,
/// unless every entry in the leaf sits at exactly the same coordinates,
/// or the leaf is already at the minimum node size.
/// Nodes never merge again after entries are removed.
///
/// Distances used by the nearest-point queries are squared euclidean distances
/// in coordinate space, not geodesic ones.
/// See [within_radius](QuadTree::within_radius) for geodesic queries.
///
/// The tree does no internal synchronisation; wrap it in a lock if it must be
/// shared between readers and writers.
#[derive(Debug)]
pub struct QuadTree<V> {
    root: Node<V>,
    policy: SplitPolicy,
    len: usize,
}

impl<V> QuadTree<V> {
    /// Create an empty tree covering the given universe
    ///
    /// - `max_items` is the number of entries a leaf may hold before it splits; must be positive
    /// - `min_size` stops splitting once a leaf is no larger than this on both axes;
    ///   `None` means no minimum
    pub fn new(
        north: f64,
        west: f64,
        south: f64,
        east: f64,
        max_items: usize,
        min_size: Option<f64>,
    ) -> crate::Result<Self> {
        let universe = Rect::new(north, west, south, east);
        ensure!(
            universe.is_legal(),
            InvalidBoundsSnafu {
                north,
                west,
                south,
                east
            }
        );
        ensure!(max_items > 0, InvalidCapacitySnafu);
        if let Some(min_size) = min_size {
            ensure!(
                min_size.is_finite() && min_size >= 0.0,
                InvalidMinSizeSnafu { min_size }
            );
        }
        Ok(QuadTree {
            root: Node::leaf(universe),
            policy: SplitPolicy {
                max_items,
                min_size,
            },
            len: 0,
        })
    }

    pub fn from_config(config: &IndexConfig) -> crate::Result<Self> {
        QuadTree::new(
            config.north,
            config.west,
            config.south,
            config.east,
            config.max_items,
            config.split_min_size(),
        )
    }

    /// The universe this tree covers
    pub fn bounds(&self) -> &Rect {
        self.root.bounds()
    }

    pub fn max_items(&self) -> usize {
        self.policy.max_items
    }

    pub fn min_size(&self) -> Option<f64> {
        self.policy.min_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add `payload` at `(lat, lon)`
    ///
    /// Returns `false` (and drops `payload`) if the point lies outside the universe
    /// or isn't a finite coordinate. The tree is unchanged in that case.
    pub fn insert(&mut self, lat: f64, lon: f64, payload: V) -> bool {
        self.try_insert(lat, lon, payload).is_ok()
    }

    /// Same as [insert](QuadTree::insert), but reports why a point was rejected
    pub fn try_insert(&mut self, lat: f64, lon: f64, payload: V) -> crate::Result<()> {
        ensure!(
            lat.is_finite() && lon.is_finite(),
            NonFiniteCoordinateSnafu { lat, lon }
        );
        ensure!(
            self.root.bounds().encloses(lat, lon),
            OutOfUniverseSnafu { lat, lon }
        );
        self.root.insert(Entry::new(lat, lon, payload), &self.policy);
        self.len += 1;
        Ok(())
    }

    /// Remove an entry at `(lat, lon)` whose payload equals `payload`
    ///
    /// Returns the stored payload, or `None` if there is no such entry.
    pub fn remove(&mut self, lat: f64, lon: f64, payload: &V) -> Option<V>
    where
        V: PartialEq,
    {
        self.remove_by(lat, lon, |candidate| candidate == payload)
    }

    /// Remove the first entry at `(lat, lon)` for which `matches` holds
    ///
    /// Use this with [Rc::ptr_eq](std::rc::Rc::ptr_eq) or similar
    /// to remove by identity instead of equality.
    pub fn remove_by<F>(&mut self, lat: f64, lon: f64, mut matches: F) -> Option<V>
    where
        F: FnMut(&V) -> bool,
    {
        if !self.root.bounds().encloses(lat, lon) {
            return None;
        }
        let removed = self.root.remove_by(lat, lon, &mut matches);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// The payload closest to `(lat, lon)`, if the tree isn't empty
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<&V> {
        self.nearest_within(lat, lon, f64::INFINITY)
    }

    /// The payload closest to `(lat, lon)`, if any is strictly closer than `max_distance`
    ///
    /// Ties are resolved in favour of the first one found.
    pub fn nearest_within(&self, lat: f64, lon: f64, max_distance: f64) -> Option<&V> {
        self.nearest_entry(lat, lon, max_distance).map(Entry::payload)
    }

    /// Like [nearest_within](QuadTree::nearest_within), but returns the whole entry
    pub fn nearest_entry(&self, lat: f64, lon: f64, max_distance: f64) -> Option<&Entry<V>> {
        if lat.is_nan() || lon.is_nan() || max_distance.is_nan() || max_distance < 0.0 {
            return None;
        }
        let mut best_distance_sq = max_distance * max_distance;
        self.root.nearest(lat, lon, &mut best_distance_sq)
    }

    /// All payloads within the given box
    ///
    /// Boxes with `west > east` (or `west ≈ east`) cross the antimeridian
    /// and are answered as two separate queries, see [QueryBox::from_edges].
    pub fn range(&self, north: f64, west: f64, south: f64, east: f64) -> Vec<&V> {
        let mut results = Vec::new();
        self.range_into(north, west, south, east, &mut results);
        results
    }

    /// Like [range](QuadTree::range), but appends to an existing vector
    pub fn range_into<'a>(
        &'a self,
        north: f64,
        west: f64,
        south: f64,
        east: f64,
        results: &mut Vec<&'a V>,
    ) {
        let query = QueryBox::from_edges(north, west, south, east);
        results.extend(self.query_entries(&query).into_iter().map(Entry::payload));
    }

    /// All entries within the parts of `query`
    pub fn query_entries(&self, query: &QueryBox) -> Vec<&Entry<V>> {
        let mut entries = Vec::new();
        let universe = self.root.bounds();
        for part in query.parts() {
            self.root.range_into(part, universe, &mut entries);
        }
        entries
    }

    /// Remove every entry, reverting to a single empty leaf
    pub fn clear(&mut self) {
        self.root.clear();
        self.len = 0;
    }

    /// All entries in the tree, in no particular order
    pub fn iter(&self) -> Entries<'_, V> {
        Entries::new(&self.root)
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.root.collect_stats(0, &mut stats);
        stats
    }

    /// Checks the whole tree to determine it is sound
    pub fn assert_invariants(&self) {
        let counted = self.root.assert_invariants(&self.policy);
        assert_eq!(self.len, counted, "Entry count is out of sync");
    }
}

impl<V> Default for QuadTree<V> {
    /// The whole lat/lon sphere with the default split settings
    fn default() -> Self {
        QuadTree {
            root: Node::leaf(Rect::WORLD),
            policy: SplitPolicy {
                max_items: DEFAULT_MAX_ITEMS,
                min_size: Some(DEFAULT_MIN_SIZE),
            },
            len: 0,
        }
    }
}

impl<V> Extend<(f64, f64, V)> for QuadTree<V> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (f64, f64, V)>,
    {
        for (lat, lon, payload) in iter {
            if let Err(e) = self.try_insert(lat, lon, payload) {
                log::warn!("Skipping entry: {e}");
            }
        }
    }
}

impl<'a, V> IntoIterator for &'a QuadTree<V> {
    type Item = &'a Entry<V>;
    type IntoIter = Entries<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
