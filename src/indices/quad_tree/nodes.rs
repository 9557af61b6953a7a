use super::*;

use crate::geometry::{
    planar::{Point, Rect},
    Intersecting,
};

use std::fmt;

/// A single point entry stored in a leaf bucket
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    lat: f64,
    lon: f64,
    payload: V,
}

impl<V> Entry<V> {
    pub fn new(lat: f64, lon: f64, payload: V) -> Self {
        Entry { lat, lon, payload }
    }

    pub fn latitude(&self) -> f64 {
        self.lat
    }

    pub fn longitude(&self) -> f64 {
        self.lon
    }

    pub fn position(&self) -> Point {
        Point::from_lat_lon(self.lat, self.lon)
    }

    pub fn payload(&self) -> &V {
        &self.payload
    }

    pub fn into_payload(self) -> V {
        self.payload
    }

    /// Squared distance to `(lat, lon)` in coordinate space
    #[inline]
    pub fn distance_sq(&self, lat: f64, lon: f64) -> f64 {
        self.position().distance_sq(&Point::from_lat_lon(lat, lon))
    }

    fn same_point(&self, lat: f64, lon: f64) -> bool {
        self.lat == lat && self.lon == lon
    }
}

impl<V> fmt::Display for Entry<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@({},{})", self.payload, self.lat, self.lon)
    }
}

/// How and when leaves turn into internal nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitPolicy {
    pub(crate) max_items: usize,
    pub(crate) min_size: Option<f64>,
}

impl SplitPolicy {
    /// Whether a leaf with these bounds may ever be split
    pub(crate) fn allows_split(&self, bounds: &Rect) -> bool {
        if let Some(min_size) = self.min_size {
            if bounds.height() <= min_size && bounds.width() <= min_size {
                return false;
            }
        }
        bounds.can_subdivide()
    }
}

/// The entries buffered in a leaf, plus the tracking needed to recognise
/// a bucket that only ever saw one coordinate.
#[derive(Debug)]
pub(crate) struct Bucket<V> {
    items: Vec<Entry<V>>,
    first_lat: f64,
    first_lon: f64,
    all_same_point: bool,
}

impl<V> Default for Bucket<V> {
    fn default() -> Self {
        Bucket {
            items: Vec::new(),
            first_lat: f64::NAN,
            first_lon: f64::NAN,
            all_same_point: false,
        }
    }
}

impl<V> Bucket<V> {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn entries(&self) -> std::slice::Iter<'_, Entry<V>> {
        self.items.iter()
    }

    pub(crate) fn all_same_point(&self) -> bool {
        self.all_same_point
    }

    fn push(&mut self, entry: Entry<V>) {
        if self.items.is_empty() {
            self.first_lat = entry.lat;
            self.first_lon = entry.lon;
            self.all_same_point = true;
        } else if self.all_same_point && !entry.same_point(self.first_lat, self.first_lon) {
            // once cleared, stays cleared while the bucket holds entries
            self.all_same_point = false;
        }
        self.items.push(entry);
    }

    fn take_entries(&mut self) -> Vec<Entry<V>> {
        self.all_same_point = false;
        std::mem::take(&mut self.items)
    }

    fn remove_matching<F>(&mut self, matches: &mut F) -> Option<V>
    where
        F: FnMut(&V) -> bool,
    {
        let position = self.items.iter().position(|e| matches(&e.payload))?;
        Some(self.items.remove(position).into_payload())
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind<V> {
    Leaf(Bucket<V>),
    Internal(Box<[Node<V>; 4]>),
}

/// A node of the tree, either a bucket of entries or exactly four children
///
/// The children partition `bounds` at its midpoint,
/// indexed as in [Rect::quadrants].
#[derive(Debug)]
pub(crate) struct Node<V> {
    bounds: Rect,
    kind: NodeKind<V>,
}

impl<V> Node<V> {
    pub(crate) fn leaf(bounds: Rect) -> Self {
        Node {
            bounds,
            kind: NodeKind::Leaf(Bucket::default()),
        }
    }

    pub(crate) fn bounds(&self) -> &Rect {
        &self.bounds
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &NodeKind<V> {
        &self.kind
    }

    #[cfg(test)]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// A leaf holding more than `max_items` entries at more than one point
    fn is_overfull(&self, policy: &SplitPolicy) -> bool {
        match &self.kind {
            NodeKind::Leaf(bucket) => bucket.len() > policy.max_items && !bucket.all_same_point(),
            NodeKind::Internal(_) => false,
        }
    }

    /// Put `entry` into the leaf responsible for its coordinates, splitting as needed
    ///
    /// The caller must make sure the entry lies within the tree's universe.
    pub(crate) fn insert(&mut self, entry: Entry<V>, policy: &SplitPolicy) {
        match &mut self.kind {
            NodeKind::Internal(children) => {
                let quadrant = self.bounds.quadrant_of(entry.lat, entry.lon);
                children[quadrant].insert(entry, policy);
            }
            NodeKind::Leaf(bucket) => {
                bucket.push(entry);
                if self.is_overfull(policy) {
                    self.split(policy);
                }
            }
        }
    }

    /// Split this leaf, and then every new leaf that is still overfull
    ///
    /// Tight clusters can cascade through hundreds of levels,
    /// so pending leaves are kept on a worklist instead of the call stack.
    fn split(&mut self, policy: &SplitPolicy) {
        let mut pending: Vec<&mut Node<V>> = vec![self];
        while let Some(node) = pending.pop() {
            if !node.split_once(policy) {
                continue;
            }
            if let NodeKind::Internal(children) = &mut node.kind {
                pending.extend(children.iter_mut().filter(|child| child.is_overfull(policy)));
            }
        }
    }

    /// Turn this leaf into an internal node and hand its entries to the new children
    ///
    /// Returns `false` if the leaf is too small to be split.
    fn split_once(&mut self, policy: &SplitPolicy) -> bool {
        if !policy.allows_split(&self.bounds) {
            log::trace!(
                "Not splitting leaf at {}: bounds are at the minimum size",
                self.bounds
            );
            return false;
        }
        let entries = match &mut self.kind {
            NodeKind::Leaf(bucket) => bucket.take_entries(),
            NodeKind::Internal(_) => return false,
        };
        log::debug!(
            "Splitting leaf at {} holding {} entries",
            self.bounds,
            entries.len()
        );
        let mut buckets: [Bucket<V>; 4] = std::array::from_fn(|_| Bucket::default());
        for entry in entries {
            buckets[self.bounds.quadrant_of(entry.lat, entry.lon)].push(entry);
        }
        let quadrants = self.bounds.quadrants();
        let children = std::array::from_fn(|index| Node {
            bounds: quadrants[index],
            kind: NodeKind::Leaf(std::mem::take(&mut buckets[index])),
        });
        self.kind = NodeKind::Internal(Box::new(children));
        true
    }

    /// Remove the first entry at `(lat, lon)`'s leaf whose payload `matches`
    pub(crate) fn remove_by<F>(&mut self, lat: f64, lon: f64, matches: &mut F) -> Option<V>
    where
        F: FnMut(&V) -> bool,
    {
        match &mut self.kind {
            NodeKind::Leaf(bucket) => bucket.remove_matching(matches),
            NodeKind::Internal(children) => {
                let quadrant = self.bounds.quadrant_of(lat, lon);
                children[quadrant].remove_by(lat, lon, matches)
            }
        }
    }

    /// Revert this subtree to a single empty leaf
    pub(crate) fn clear(&mut self) {
        self.kind = NodeKind::Leaf(Bucket::default());
    }

    /// Find the entry closest to `(lat, lon)` that is strictly closer than `best_distance_sq`
    ///
    /// `best_distance_sq` is lowered whenever a closer entry is found.
    /// Returns `None` if no entry in this subtree beat the initial value.
    pub(crate) fn nearest<'a>(
        &'a self,
        lat: f64,
        lon: f64,
        best_distance_sq: &mut f64,
    ) -> Option<&'a Entry<V>> {
        match &self.kind {
            NodeKind::Leaf(bucket) => {
                let mut closest = None;
                for entry in bucket.entries() {
                    let distance_sq = entry.distance_sq(lat, lon);
                    if distance_sq < *best_distance_sq {
                        *best_distance_sq = distance_sq;
                        closest = Some(entry);
                    }
                }
                closest
            }
            NodeKind::Internal(children) => {
                // visit the most promising children first, so the others are more likely pruned
                let mut order = [(0.0f64, 0usize); 4];
                for (index, child) in children.iter().enumerate() {
                    order[index] = (child.bounds.border_distance_sq(lat, lon), index);
                }
                order.sort_by(|l, r| l.0.total_cmp(&r.0));

                let mut closest = None;
                for (border_distance_sq, index) in order {
                    if border_distance_sq < *best_distance_sq {
                        if let Some(found) = children[index].nearest(lat, lon, best_distance_sq) {
                            closest = Some(found);
                        }
                    }
                }
                closest
            }
        }
    }

    /// Collect every entry in this subtree that lies within `query`
    ///
    /// `universe` are the bounds of the whole tree.
    pub(crate) fn range_into<'a>(
        &'a self,
        query: &Rect,
        universe: &Rect,
        out: &mut Vec<&'a Entry<V>>,
    ) {
        match &self.kind {
            NodeKind::Leaf(bucket) => {
                out.extend(bucket.entries().filter(|e| query.contains(&e.position())));
            }
            NodeKind::Internal(children) => {
                for child in children.iter() {
                    if child.may_overlap(query, universe) {
                        child.range_into(query, universe, out);
                    }
                }
            }
        }
    }

    /// Whether any entry of this subtree could lie within `query`
    ///
    /// Nodes along the south or east edge of the universe also hold the entries
    /// sitting exactly on that edge, which the half-open overlap test ignores.
    fn may_overlap(&self, query: &Rect, universe: &Rect) -> bool {
        if self.bounds.intersects(query) {
            return true;
        }
        let on_outer_edge =
            self.bounds.south == universe.south || self.bounds.east == universe.east;
        on_outer_edge && self.bounds.touches(query)
    }

    /// Checks the whole subtree to determine it is sound
    ///
    /// Returns the number of entries found.
    pub(crate) fn assert_invariants(&self, policy: &SplitPolicy) -> usize {
        match &self.kind {
            NodeKind::Leaf(bucket) => {
                for entry in bucket.entries() {
                    assert!(
                        self.bounds.encloses(entry.lat, entry.lon),
                        "Entry {} lies outside of its leaf {}",
                        entry.position(),
                        self.bounds
                    );
                }
                if bucket.len() > policy.max_items {
                    assert!(
                        bucket.all_same_point() || !policy.allows_split(&self.bounds),
                        "Leaf at {} holds {} > {} entries but should have been split",
                        self.bounds,
                        bucket.len(),
                        policy.max_items
                    );
                }
                if bucket.all_same_point() {
                    assert!(bucket
                        .entries()
                        .all(|e| e.same_point(bucket.first_lat, bucket.first_lon)));
                }
                bucket.len()
            }
            NodeKind::Internal(children) => {
                let quadrants = self.bounds.quadrants();
                let mut total = 0;
                for (index, child) in children.iter().enumerate() {
                    assert!(
                        self.bounds.contains(&child.bounds),
                        "Child {index} at {} sticks out of {}",
                        child.bounds,
                        self.bounds
                    );
                    assert_eq!(
                        quadrants[index], child.bounds,
                        "Child {index} of {} does not match its quadrant",
                        self.bounds
                    );
                    let mut entries = Entries::new(child);
                    assert!(
                        entries.all(|e| self.bounds.quadrant_of(e.lat, e.lon) == index),
                        "Child {index} of {} holds an entry of a sibling",
                        self.bounds
                    );
                    total += child.assert_invariants(policy);
                }
                total
            }
        }
    }

    pub(crate) fn collect_stats(&self, depth: usize, stats: &mut TreeStats) {
        stats.max_depth = stats.max_depth.max(depth);
        match &self.kind {
            NodeKind::Leaf(bucket) => {
                stats.leaves += 1;
                stats.entries += bucket.len();
                stats.largest_bucket = stats.largest_bucket.max(bucket.len());
            }
            NodeKind::Internal(children) => {
                stats.internal_nodes += 1;
                for child in children.iter() {
                    child.collect_stats(depth + 1, stats);
                }
            }
        }
    }
}

/// Depth-first iterator over all entries of a (sub)tree
pub struct Entries<'a, V> {
    pending: Vec<&'a Node<V>>,
    current: std::slice::Iter<'a, Entry<V>>,
}

impl<'a, V> Entries<'a, V> {
    pub(crate) fn new(root: &'a Node<V>) -> Self {
        let nothing: &'a [Entry<V>] = &[];
        Entries {
            pending: vec![root],
            current: nothing.iter(),
        }
    }
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(entry);
            }
            let node = self.pending.pop()?;
            match &node.kind {
                NodeKind::Leaf(bucket) => self.current = bucket.entries(),
                NodeKind::Internal(children) => self.pending.extend(children.iter().rev()),
            }
        }
    }
}
