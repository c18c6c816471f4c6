use num::traits::{Num, real::Real};
use std::ops::{Add, Mul, Sub};

/// A 2D vector generic over any numeric type.
///
/// Used both for integer pixel coordinates (`Vec2D<u32>`) of contour points
/// and for sub-pixel geometry (`Vec2D<f64>`) like line anchors and directions.
///
/// # Type Parameters
/// * `T` - The functionality for the vector depends on traits implemented by `T`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Vec2D<T> {
    /// The x-component (image column).
    x: T,
    /// The y-component (image row, growing downwards).
    y: T,
}

impl<T: Copy> Vec2D<T> {
    /// Creates a new vector with the given x and y components.
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }

    /// Returns the x-component of the vector.
    pub const fn x(&self) -> T { self.x }

    /// Returns the y-component of the vector.
    pub const fn y(&self) -> T { self.y }
}

impl<T: Num + Copy> Vec2D<T> {
    /// Computes the z-component of the 3D cross product of two planar vectors.
    ///
    /// ```text
    /// cross = x1 * y2 - y1 * x2
    /// ```
    pub fn cross(self, other: Vec2D<T>) -> T { self.x * other.y - self.y * other.x }

    /// Creates a vector pointing from `self` to `other`.
    pub fn to(self, other: Vec2D<T>) -> Vec2D<T> { Vec2D::new(other.x - self.x, other.y - self.y) }

    /// Creates a zero vector (x = 0, y = 0).
    pub fn zero() -> Self { Self::new(T::zero(), T::zero()) }
}

impl<T: Real> Vec2D<T> {
    /// Unit vector for a direction given in degrees, measured from the +x axis
    /// towards +y (clockwise on screen, as image rows grow downwards).
    pub fn from_angle_deg(angle_deg: T) -> Self {
        let rad = angle_deg.to_radians();
        Self::new(rad.cos(), rad.sin())
    }
}

impl Vec2D<u32> {
    /// Lossless conversion of a pixel coordinate into floating point space.
    pub fn to_f64(self) -> Vec2D<f64> { Vec2D::new(f64::from(self.x), f64::from(self.y)) }
}

impl<T: Num + Copy> Add for Vec2D<T> {
    type Output = Vec2D<T>;

    fn add(self, rhs: Self) -> Self::Output { Vec2D::new(self.x + rhs.x, self.y + rhs.y) }
}

impl<T: Num + Copy> Sub for Vec2D<T> {
    type Output = Vec2D<T>;

    fn sub(self, rhs: Self) -> Self::Output { Vec2D::new(self.x - rhs.x, self.y - rhs.y) }
}

impl<T: Num + Copy> Mul<T> for Vec2D<T> {
    type Output = Vec2D<T>;

    /// Implements the `*` operator for a `Vec2D` and a scalar.
    fn mul(self, rhs: T) -> Self::Output { Vec2D::new(self.x * rhs, self.y * rhs) }
}
