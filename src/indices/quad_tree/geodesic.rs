use super::*;
use crate::geometry::spherical::{distance_accurate, QueryBox};

use uom::si::{f64::*, length::kilometer};

impl<V> QuadTree<V> {
    /// All entries whose geodesic distance to `(lat, lon)` is less than `radius`
    ///
    /// Coordinates are taken to be decimal degrees on the WGS84 ellipsoid.
    /// The tree is first searched with a box around the circle,
    /// then every candidate is checked with the accurate distance.
    /// Circles too large to be bounded by a box fall back to a full scan.
    pub fn within_radius(&self, lat: f64, lon: f64, radius: Length) -> Vec<&Entry<V>> {
        let radius_km = radius.get::<kilometer>();
        // some slack, since the box sides are only travelled along the cardinal courses
        let error_radius = Length::new::<kilometer>(radius_km * 1.1);
        let candidates = match QueryBox::from_circle(lat, lon, error_radius) {
            Some(bounding_box) => self.query_entries(&bounding_box),
            None => {
                log::debug!(
                    "Radius of {radius_km}km can't be bounded, scanning all {} entries",
                    self.len()
                );
                self.iter().collect()
            }
        };
        log::trace!("Found {} candidates in index", candidates.len());
        candidates
            .into_iter()
            .filter(|e| distance_accurate(lat, lon, e.latitude(), e.longitude()) < radius)
            .collect()
    }

    /// The entry with the smallest geodesic distance among those within `radius`
    pub fn nearest_geodesic(&self, lat: f64, lon: f64, radius: Length) -> Option<&Entry<V>> {
        self.within_radius(lat, lon, radius)
            .into_iter()
            .map(|e| (distance_accurate(lat, lon, e.latitude(), e.longitude()), e))
            .min_by(|l, r| l.0.value.total_cmp(&r.0.value))
            .map(|(_, e)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::spherical::{east_deg, north_deg, travel_accurate, west_deg};

    fn names<'a>(entries: Vec<&'a Entry<&'static str>>) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = entries.into_iter().map(|e| *e.payload()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_nodes_in_distance() {
        let mut tree: QuadTree<&'static str> = QuadTree::default();
        let (lat, lon) = (54.5, -8.3);
        let near = Length::new::<kilometer>(90.0);
        let far = Length::new::<kilometer>(110.0);
        let spots = [
            ("north-near", north_deg(), near),
            ("north-far", north_deg(), far),
            ("east-near", east_deg(), near),
            ("west-far", west_deg(), far),
        ];
        for (name, course, distance) in spots {
            let p = travel_accurate(lat, lon, course, distance);
            assert!(tree.insert(p.lat(), p.lon(), name));
        }
        tree.insert(lat, lon, "centre");
        tree.insert(-54.5, 171.7, "antipode");

        let found = names(tree.within_radius(lat, lon, Length::new::<kilometer>(100.0)));
        assert_eq!(vec!["centre", "east-near", "north-near"], found);

        let closest = tree
            .nearest_geodesic(lat, lon + 0.01, Length::new::<kilometer>(100.0))
            .expect("found");
        assert_eq!("centre", *closest.payload());
        assert!(tree
            .nearest_geodesic(0.0, 0.0, Length::new::<kilometer>(100.0))
            .is_none());
    }

    #[test]
    fn test_radius_across_dateline() {
        let mut tree: QuadTree<&'static str> = QuadTree::default();
        tree.insert(0.0, 179.9, "east-of-line");
        tree.insert(0.0, -179.9, "west-of-line");
        tree.insert(0.0, 180.0, "on-line");
        tree.insert(0.0, 170.0, "too-far");
        let found = names(tree.within_radius(0.0, 180.0, Length::new::<kilometer>(50.0)));
        assert_eq!(vec!["east-of-line", "on-line", "west-of-line"], found);
    }

    #[test]
    fn test_huge_radius_scans_everything() {
        let mut tree: QuadTree<&'static str> = QuadTree::default();
        tree.insert(0.0, 0.0, "here");
        tree.insert(0.0, 180.0, "antimeridian");
        let found = names(tree.within_radius(0.0, 0.0, Length::new::<kilometer>(15000.0)));
        assert_eq!(vec!["here"], found);
        let found = names(tree.within_radius(0.0, 0.0, Length::new::<kilometer>(25000.0)));
        assert_eq!(vec!["antimeridian", "here"], found);
    }
}
