pub mod geometry;
pub mod layers;
pub mod markers;
pub mod scale;
pub mod xml;
