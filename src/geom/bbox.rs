use geo::{Point, Rect};
use rstar::{RTreeObject, AABB};

/// An R-tree entry: the bounding rectangle of one polygonal item, tagged with
/// the item's slot in the owning collection.
#[derive(Debug, Clone)]
pub(crate) struct SlotEnvelope {
    slot: usize, // Index of the corresponding item in its owning Vec
    rect: Rect<f64>,
}

impl SlotEnvelope {
    pub(crate) fn new(slot: usize, rect: Rect<f64>) -> Self {
        Self { slot, rect }
    }

    /// Get the slot of the corresponding item.
    #[inline] pub(crate) fn slot(&self) -> usize { self.slot }
}

impl RTreeObject for SlotEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.rect.min().into(), self.rect.max().into())
    }
}

/// Query envelope covering a rectangle.
#[inline]
pub(crate) fn rect_envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}

/// Degenerate query envelope at a single point.
#[inline]
pub(crate) fn point_envelope(point: &Point<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([point.x(), point.y()], [point.x(), point.y()])
}
