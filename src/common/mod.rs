//! Geometry shared by the horizon detector and the flight controller.

pub(crate) mod geometry;
pub(crate) mod vec2d;

pub(crate) use geometry::FittedLine;
pub(crate) use vec2d::Vec2D;
