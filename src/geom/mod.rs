mod bbox;
mod intersect;
mod repair;
mod shape;

pub(crate) use bbox::{point_envelope, rect_envelope, SlotEnvelope};
pub(crate) use intersect::overlay;
pub use intersect::{intersect, Intersection};
pub(crate) use repair::validated;
pub use shape::Shape;
