pub mod planar;
pub mod spherical;

/// Types implementing this trait can be checked for intersections with `Rhs`
pub trait Intersecting<Rhs = Self> {
    /// Returns `true` if `self` and `other` share at least one point
    /// under the boundary conventions of the implementing type.
    fn intersects(&self, other: &Rhs) -> bool;
    /// Returns true if `other` not only intersects `self`, but is completely
    /// contained within the confines of this shape
    fn contains(&self, other: &Rhs) -> bool;
}
