use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
///
/// Used both for projected landmark positions (pixels) and for texture
/// coordinates (normalized to the color image).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// A 3D point in tracker or mesh space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Mirror the point through the XY plane.
    ///
    /// The tracker reports Z toward the sensor; output meshes expect Z away
    /// from it.
    pub const fn flip_z(self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z: -self.z,
        }
    }
}

impl std::ops::Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

/// Three vertex indices forming one mesh face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// The same face with the opposite winding.
    pub const fn reversed(self) -> Self {
        Self {
            a: self.c,
            b: self.b,
            c: self.a,
        }
    }

    pub const fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// Pixel dimensions of the color image the landmarks were projected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert a pixel position to texture space.
    ///
    /// No clamping: landmarks projected outside the image map outside [0,1].
    pub fn normalize(&self, p: Point) -> Point {
        Point::new(p.x / self.width as f32, p.y / self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_add_componentwise() {
        let base = Point3::new(1.0, 2.0, 3.0);
        let offset = Point3::new(0.5, -0.25, 0.0);
        assert_eq!(base + offset, Point3::new(1.5, 1.75, 3.0));
        assert_eq!(base + Point3::zero(), base);
    }

    #[test]
    fn flip_z_only_touches_depth() {
        let p = Point3::new(0.1, -0.2, 0.75);
        assert_eq!(p.flip_z(), Point3::new(0.1, -0.2, -0.75));
        assert_eq!(p.flip_z().flip_z(), p);
    }

    #[test]
    fn triangle_reversal() {
        let t = Triangle::new(4, 5, 6);
        assert_eq!(t.reversed().indices(), [6, 5, 4]);
    }

    #[test]
    fn image_normalization_does_not_clamp() {
        let size = ImageSize::new(640, 480);

        let inside = size.normalize(Point::new(320.0, 240.0));
        assert_eq!(inside, Point::new(0.5, 0.5));

        let outside = size.normalize(Point::new(960.0, -48.0));
        assert!((outside.x - 1.5).abs() < 1e-6);
        assert!((outside.y + 0.1).abs() < 1e-6);

        assert!(ImageSize::new(0, 480).is_empty());
        assert!(!size.is_empty());
    }
}
