//! R-tree index over item bounding boxes
//!
//! Envelopes are stored as f64 AABBs rounded outward so that a query never
//! misses a candidate because of float conversion.

use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Coord};

/// An indexed handle with its envelope
#[derive(Clone, Debug)]
pub struct IndexedItem<T> {
    pub handle: T,
    pub bounds: AABB<[f64; 2]>,
}

impl<T> RTreeObject for IndexedItem<T> {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

pub fn envelope(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bbox.min.x as f64 - 1.0, bbox.min.y as f64 - 1.0],
        [bbox.max.x as f64 + 1.0, bbox.max.y as f64 + 1.0],
    )
}

pub struct SpatialIndex<T> {
    tree: RTree<IndexedItem<T>>,
}

impl<T: Copy + Ord> SpatialIndex<T> {
    pub fn new(items: impl IntoIterator<Item = (T, BBox)>) -> Self {
        let objects: Vec<IndexedItem<T>> = items
            .into_iter()
            .map(|(handle, bbox)| IndexedItem { handle, bounds: envelope(&bbox) })
            .collect();
        Self { tree: RTree::bulk_load(objects) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Handles whose envelope meets `bbox` inflated by `margin`, in handle order
    pub fn query(&self, bbox: &BBox, margin: Coord) -> Vec<T> {
        let search = envelope(&bbox.inflated(margin));
        let mut hits: Vec<T> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .map(|item| item.handle)
            .collect();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_query_sorted_and_inflated() {
        let index = SpatialIndex::new(vec![
            (2usize, BBox::from_point(Point::new(100, 0))),
            (1usize, BBox::from_point(Point::new(0, 0))),
            (3usize, BBox::from_point(Point::new(10_000, 0))),
        ]);
        assert_eq!(index.len(), 3);
        let hits = index.query(&BBox::from_point(Point::new(50, 0)), 60);
        assert_eq!(hits, vec![1, 2]);
        assert!(index.query(&BBox::from_point(Point::new(5_000, 0)), 10).is_empty());
    }
}
