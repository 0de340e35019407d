//! 2D affine transforms.
//!
//! One transform type serves the whole crate:
//! - glyph placement composes translate/rotate/scale factors per glyph
//! - node transforms arrive as a 6-element `[a,b,c,d,e,f]` property array
//!   whose translation components are in layout units and must be brought
//!   into device space
//!
//! Matrix layout (column-vector convention):
//! ```text
//! [ a c tx ]
//! [ b d ty ]
//! [ 0 0  1 ]
//! ```
//! Composition is `self.then_outer(outer) = outer * self`; the rightmost
//! factor in a product applies to points first.

use lyon::math::point;
use lyon::path::Path;

/// A 2D affine transform stored as the six non-trivial entries of a 3x3
/// matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

/// Errors produced when building a transform from a property array.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("transform matrices must be of size 6, got {0}")]
    MalformedTransform(usize),
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by an angle in degrees, counter-clockwise in a y-up system.
    #[inline]
    pub fn rotate_deg(deg: f32) -> Self {
        let (s, c) = deg.to_radians().sin_cos();
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            ..Self::IDENTITY
        }
    }

    /// Build from a `[a, b, c, d, e, f]` property array.
    ///
    /// The translation components `e`, `f` are layout-unit values and are
    /// multiplied by the device scale; the linear part is unit-free. The
    /// array must be exactly six entries long.
    pub fn from_svg_matrix(values: &[f32], scale: f32) -> Result<Self, TransformError> {
        if values.len() != 6 {
            return Err(TransformError::MalformedTransform(values.len()));
        }
        Ok(Self {
            a: values[0],
            b: values[1],
            c: values[2],
            d: values[3],
            tx: values[4] * scale,
            ty: values[5] * scale,
        })
    }

    /// Matrix product `self * rhs`: `rhs` applies to points first.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Rebuild a path with every point (control points included) transformed.
    ///
    /// Affine maps take bezier control polygons to the control polygons of the
    /// mapped curves, so event-wise rebuilding is exact.
    pub fn transform_path(&self, path: &Path) -> Path {
        use lyon::path::Event;

        let mut builder = Path::builder();
        let map = |p: lyon::math::Point| {
            let (x, y) = self.transform_point(p.x, p.y);
            point(x, y)
        };

        for event in path.iter() {
            match event {
                Event::Begin { at } => {
                    builder.begin(map(at));
                }
                Event::Line { to, .. } => {
                    builder.line_to(map(to));
                }
                Event::Quadratic { ctrl, to, .. } => {
                    builder.quadratic_bezier_to(map(ctrl), map(to));
                }
                Event::Cubic {
                    ctrl1, ctrl2, to, ..
                } => {
                    builder.cubic_bezier_to(map(ctrl1), map(ctrl2), map(to));
                }
                Event::End { close, .. } => {
                    builder.end(close);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_matrix_scales_translation_only() {
        let m = Affine::from_svg_matrix(&[1.0, 0.0, 0.0, 1.0, 10.0, 20.0], 2.0).unwrap();
        assert_eq!((m.a, m.b, m.c, m.d), (1.0, 0.0, 0.0, 1.0));
        assert_eq!((m.tx, m.ty), (20.0, 40.0));
    }

    #[test]
    fn svg_matrix_rejects_wrong_lengths() {
        assert_eq!(
            Affine::from_svg_matrix(&[1.0; 5], 1.0),
            Err(TransformError::MalformedTransform(5))
        );
        assert_eq!(
            Affine::from_svg_matrix(&[1.0; 7], 1.0),
            Err(TransformError::MalformedTransform(7))
        );
    }

    #[test]
    fn composition_applies_rightmost_first() {
        // Translate after scaling: p' = T(10, 0) * S(2) * p
        let m = Affine::translate(10.0, 0.0).mul(Affine::scale(2.0, 2.0));
        assert_eq!(m.transform_point(3.0, 0.0), (16.0, 0.0));
    }

    #[test]
    fn rotation_is_counter_clockwise() {
        let m = Affine::rotate_deg(90.0);
        let (x, y) = m.transform_point(1.0, 0.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn paths_transform_pointwise() {
        let mut b = Path::builder();
        b.begin(point(0.0, 0.0));
        b.line_to(point(1.0, 0.0));
        b.end(false);
        let path = b.build();

        let moved = Affine::translate(5.0, 5.0).transform_path(&path);
        let mut points = Vec::new();
        for event in moved.iter() {
            if let lyon::path::Event::Line { from, to } = event {
                points.push((from.x, from.y, to.x, to.y));
            }
        }
        assert_eq!(points, vec![(5.0, 5.0, 6.0, 5.0)]);
    }
}
