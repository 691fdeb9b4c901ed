//! Per-kind numeric domains and size-preserving conversions between shape kinds.

use crate::constants::{
    MAX_RECTILINEAR_SIZE, MAX_SIGMA_RINGS, MAX_THETA_RINGS, MIN_SIZE, THETA_SCALE,
};
use crate::types::{Shape, ShapeKind};

impl ShapeKind {
    /// All shape kinds.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Rectilinear, ShapeKind::Theta, ShapeKind::Sigma];

    /// Largest size this kind accepts.
    pub fn max_size(self) -> u32 {
        match self {
            ShapeKind::Rectilinear => MAX_RECTILINEAR_SIZE,
            ShapeKind::Theta => MAX_THETA_RINGS,
            ShapeKind::Sigma => MAX_SIGMA_RINGS,
        }
    }

    /// Discriminator letter used in the fragment.
    pub fn letter(self) -> char {
        match self {
            ShapeKind::Rectilinear => 'R',
            ShapeKind::Theta => 'T',
            ShapeKind::Sigma => 'S',
        }
    }

    /// Inverse of [`ShapeKind::letter`].
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.letter() == letter)
    }

    /// Builds a shape of this kind, clamping `size` into the kind's domain.
    pub fn with_size(self, size: i64) -> Shape {
        let size = clamp(self, size);
        match self {
            ShapeKind::Rectilinear => Shape::Rectilinear(size, size),
            ShapeKind::Theta => Shape::Theta(size),
            ShapeKind::Sigma => Shape::Sigma(size),
        }
    }
}

/// Clamps `value` into `[MIN_SIZE, kind.max_size()]`.
pub fn clamp(kind: ShapeKind, value: i64) -> u32 {
    let clamped = value.clamp(i64::from(MIN_SIZE), i64::from(kind.max_size()));
    // The range above always fits in u32.
    u32::try_from(clamped).unwrap_or(MIN_SIZE)
}

/// Converts `shape` to `target`, keeping the visual scale roughly the same.
///
/// Theta ring counts double when leaving theta and halve (rounding down) when
/// entering it. Rectilinear and sigma share a domain and keep their size.
/// Converting to the same kind leaves the shape untouched.
pub fn convert(shape: Shape, target: ShapeKind) -> Shape {
    let current = shape.kind();
    if current == target {
        return shape;
    }
    let size = i64::from(shape.size());
    let size = match (current, target) {
        (ShapeKind::Theta, _) => size * THETA_SCALE,
        (_, ShapeKind::Theta) => size / THETA_SCALE,
        _ => size,
    };
    target.with_size(size)
}

/// Applies `f` to the shape's size and clamps the result into the shape's domain.
///
/// Rectilinear shapes come out square, sized from their width.
pub fn adjust_size(shape: Shape, f: impl FnOnce(i64) -> i64) -> Shape {
    shape.kind().with_size(f(i64::from(shape.size())))
}

impl Shape {
    /// Clamped rectilinear shape.
    pub fn rectilinear(width: i64, height: i64) -> Self {
        Shape::Rectilinear(
            clamp(ShapeKind::Rectilinear, width),
            clamp(ShapeKind::Rectilinear, height),
        )
    }

    /// Clamped theta shape.
    pub fn theta(rings: i64) -> Self {
        ShapeKind::Theta.with_size(rings)
    }

    /// Clamped sigma shape.
    pub fn sigma(rings: i64) -> Self {
        ShapeKind::Sigma.with_size(rings)
    }

    /// The active variant's tag.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectilinear(..) => ShapeKind::Rectilinear,
            Shape::Theta(_) => ShapeKind::Theta,
            Shape::Sigma(_) => ShapeKind::Sigma,
        }
    }

    /// Primary size: width for rectilinear shapes, ring count otherwise.
    pub fn size(&self) -> u32 {
        match *self {
            Shape::Rectilinear(width, _) => width,
            Shape::Theta(rings) | Shape::Sigma(rings) => rings,
        }
    }

    /// This shape with every dimension clamped into its domain.
    pub fn clamped(self) -> Self {
        match self {
            Shape::Rectilinear(w, h) => Shape::rectilinear(i64::from(w), i64::from(h)),
            Shape::Theta(rings) => Shape::theta(i64::from(rings)),
            Shape::Sigma(rings) => Shape::sigma(i64::from(rings)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_each_domain() {
        assert_eq!(clamp(ShapeKind::Rectilinear, -7), 2);
        assert_eq!(clamp(ShapeKind::Rectilinear, 250), 100);
        assert_eq!(clamp(ShapeKind::Sigma, 100), 100);
        assert_eq!(clamp(ShapeKind::Theta, 51), 50);
        assert_eq!(clamp(ShapeKind::Theta, 12), 12);
        assert_eq!(clamp(ShapeKind::Theta, i64::MIN), 2);
        assert_eq!(clamp(ShapeKind::Sigma, i64::MAX), 100);
    }

    #[test]
    fn theta_doubles_when_leaving() {
        assert_eq!(convert(Shape::Theta(10), ShapeKind::Rectilinear), Shape::Rectilinear(20, 20));
        assert_eq!(convert(Shape::Theta(10), ShapeKind::Sigma), Shape::Sigma(20));
        assert_eq!(convert(Shape::Theta(50), ShapeKind::Sigma), Shape::Sigma(100));
    }

    #[test]
    fn theta_halves_when_entering() {
        assert_eq!(convert(Shape::Rectilinear(20, 20), ShapeKind::Theta), Shape::Theta(10));
        assert_eq!(convert(Shape::Sigma(21), ShapeKind::Theta), Shape::Theta(10));
        // 3 / 2 = 1, clamped back up to the minimum
        assert_eq!(convert(Shape::Rectilinear(3, 3), ShapeKind::Theta), Shape::Theta(2));
    }

    #[test]
    fn rectilinear_and_sigma_share_size() {
        assert_eq!(convert(Shape::Rectilinear(37, 37), ShapeKind::Sigma), Shape::Sigma(37));
        assert_eq!(convert(Shape::Sigma(99), ShapeKind::Rectilinear), Shape::Rectilinear(99, 99));
    }

    #[test]
    fn same_kind_conversion_is_identity() {
        assert_eq!(convert(Shape::Theta(9), ShapeKind::Theta), Shape::Theta(9));
        assert_eq!(convert(Shape::Rectilinear(4, 8), ShapeKind::Rectilinear), Shape::Rectilinear(4, 8));
    }

    #[test]
    fn adjust_size_clamps_after_applying() {
        assert_eq!(adjust_size(Shape::Theta(50), |s| s + 1), Shape::Theta(50));
        assert_eq!(adjust_size(Shape::Sigma(2), |s| s - 1), Shape::Sigma(2));
        assert_eq!(adjust_size(Shape::Rectilinear(12, 30), |s| s + 1), Shape::Rectilinear(13, 13));
        assert_eq!(adjust_size(Shape::Rectilinear(12, 12), |_| 500), Shape::Rectilinear(100, 100));
    }

    #[test]
    fn letters_roundtrip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_letter(kind.letter()), Some(kind));
        }
        assert_eq!(ShapeKind::from_letter('X'), None);
    }
}
