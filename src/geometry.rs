//! Frame construction and ray-target geometry shared by slits and foils.
//!
//! Points and vectors are plain `nalgebra` types in metres. Extents that are
//! part of the public model are carried as `uom` lengths and converted here.

use crate::error::{Error, Result};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use uom::si::{f64::Length, length::meter};

/// Norms below this are treated as zero when deriving a frame.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Largest `|x̂ · ŷ|` accepted before a basis is reported as skewed.
pub const ORTHOGONALITY_TOLERANCE: f64 = 1e-9;

/// Rotation mapping local +z onto `forward` and local +y onto the part of
/// `up` orthogonal to `forward`.
pub fn rotate_basis(forward: &Vector3<f64>, up: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::face_towards(forward, up)
}

/// Translation to `centre` composed with [`rotate_basis`]`(normal, basis_x)`.
pub fn frame_transform(
    centre: &Point3<f64>,
    normal: &Vector3<f64>,
    basis_x: &Vector3<f64>,
) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(centre.coords),
        rotate_basis(normal, basis_x),
    )
}

/// Returns `normalize(basis_x × basis_y)`.
///
/// Fails if either vector is zero, not finite, or the two are parallel, since
/// no unit normal exists in those cases. Orthogonality is not required.
pub(crate) fn unit_normal(
    object: &str,
    basis_x: &Vector3<f64>,
    basis_y: &Vector3<f64>,
) -> Result<Vector3<f64>> {
    let x = unit_vector(object, "basis_x", basis_x)?;
    let y = unit_vector(object, "basis_y", basis_y)?;

    let normal = x.cross(&y);
    if normal.norm() <= DEGENERATE_EPSILON {
        return Err(Error::value(
            object,
            "basis_y",
            "basis vectors are parallel and do not span a plane",
        ));
    }

    if x.dot(&y).abs() > ORTHOGONALITY_TOLERANCE {
        tracing::warn!(
            object,
            cos_angle = x.dot(&y),
            "basis vectors are not orthogonal, the derived frame is skewed"
        );
    }

    Ok(normal.normalize())
}

/// Returns `vector` scaled to unit length.
pub(crate) fn unit_vector(
    object: &str,
    field: &'static str,
    vector: &Vector3<f64>,
) -> Result<Vector3<f64>> {
    let norm = vector.norm();
    if !norm.is_finite() {
        return Err(Error::value(object, field, "vector components must be finite"));
    }
    if norm <= DEGENERATE_EPSILON {
        return Err(Error::value(object, field, "vector must have non-zero length"));
    }
    Ok(vector / norm)
}

/// Checks that every coordinate of `point` is finite.
pub(crate) fn finite_point(
    object: &str,
    field: &'static str,
    point: &Point3<f64>,
) -> Result<Point3<f64>> {
    if point.coords.iter().all(|c| c.is_finite()) {
        Ok(*point)
    } else {
        Err(Error::value(object, field, "point coordinates must be finite"))
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn positive_length(object: &str, field: &'static str, value: Length) -> Result<Length> {
    let metres = value.get::<meter>();
    if !metres.is_finite() {
        return Err(Error::value(object, field, format!("expected a finite length but got {metres}")));
    }
    if metres <= 0.0 {
        return Err(Error::value(
            object,
            field,
            format!("must be greater than zero but got {metres} m"),
        ));
    }
    Ok(value)
}

/// How a primitive interacts with rays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
    /// Rays pass through unaltered. Used for aim targets only.
    Transparent,
}

/// A box primitive placed in the parent frame by `transform`.
///
/// The box is centred on its local origin, so `lower == -upper`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetBox {
    half_extents: Vector3<f64>,
    transform: Isometry3<f64>,
    material: Material,
}

impl TargetBox {
    pub fn new(half_extents: Vector3<f64>, transform: Isometry3<f64>) -> Self {
        Self {
            half_extents,
            transform,
            material: Material::Transparent,
        }
    }

    pub fn lower(&self) -> Point3<f64> {
        Point3::from(-self.half_extents)
    }

    pub fn upper(&self) -> Point3<f64> {
        Point3::from(self.half_extents)
    }

    pub fn transform(&self) -> &Isometry3<f64> {
        &self.transform
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Returns true if `point`, given in the parent frame, lies inside the box.
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let local = self.transform.inverse_transform_point(point);
        local
            .coords
            .iter()
            .zip(self.half_extents.iter())
            .all(|(coord, half)| coord.abs() <= *half)
    }

    /// The eight corners of the box in the parent frame.
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let h = self.half_extents;
        let mut corners = [Point3::origin(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            let local = Point3::new(sign(1) * h.x, sign(2) * h.y, sign(4) * h.z);
            *corner = self.transform.transform_point(&local);
        }
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Vector3::x(), Vector3::y())]
    #[case(Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0))]
    #[case(Vector3::new(1.0, 1.0, 0.0), Vector3::new(0.0, 0.0, -3.0))]
    fn rotate_basis_maps_local_axes(#[case] forward: Vector3<f64>, #[case] up: Vector3<f64>) {
        let rotation = rotate_basis(&forward, &up);

        assert_relative_eq!(rotation * Vector3::z(), forward.normalize(), epsilon = 1e-12);
        assert_relative_eq!(rotation * Vector3::y(), up.normalize(), epsilon = 1e-12);
    }

    #[test]
    fn frame_transform_moves_origin_to_centre() {
        let centre = Point3::new(1.0, -2.0, 0.5);
        let transform = frame_transform(&centre, &Vector3::x(), &Vector3::y());

        assert_relative_eq!(transform.transform_point(&Point3::origin()), centre);
    }

    #[rstest]
    #[case(Vector3::zeros(), Vector3::y(), "basis_x")]
    #[case(Vector3::x(), Vector3::zeros(), "basis_y")]
    #[case(Vector3::x(), Vector3::x() * 4.0, "basis_y")]
    #[case(Vector3::new(f64::NAN, 0.0, 0.0), Vector3::y(), "basis_x")]
    fn degenerate_basis_is_rejected(
        #[case] basis_x: Vector3<f64>,
        #[case] basis_y: Vector3<f64>,
        #[case] expected: &str,
    ) {
        match unit_normal("test", &basis_x, &basis_y) {
            Err(Error::ValueConstraint { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected a value constraint error, got {other:?}"),
        }
    }

    #[test]
    fn skewed_basis_still_gives_unit_normal() {
        let normal = unit_normal("test", &Vector3::x(), &Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(normal, Vector3::z(), epsilon = 1e-12);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.01)]
    #[case(f64::INFINITY)]
    fn non_positive_length_is_rejected(#[case] metres: f64) {
        assert!(positive_length("test", "dx", Length::new::<meter>(metres)).is_err());
    }

    #[test]
    fn target_box_contains_its_centre_but_not_beyond_extents() {
        let transform = frame_transform(&Point3::new(0.0, 0.0, 1.0), &Vector3::z(), &Vector3::y());
        let target = TargetBox::new(Vector3::new(0.1, 0.2, 0.001), transform);

        assert_eq!(target.material(), Material::Transparent);
        assert!(target.contains(&Point3::new(0.0, 0.0, 1.0)));
        assert!(target.contains(&Point3::new(0.05, 0.15, 1.0)));
        assert!(!target.contains(&Point3::new(0.0, 0.0, 1.01)));
        assert!(!target.contains(&Point3::new(0.0, 0.25, 1.0)));
    }

    #[test]
    fn target_box_corners_surround_centre() {
        let centre = Point3::new(2.0, 0.0, 0.0);
        let half_extents = Vector3::new(0.1, 0.2, 0.001);
        let target = TargetBox::new(half_extents, frame_transform(&centre, &Vector3::x(), &Vector3::z()));

        for corner in target.corners() {
            assert_relative_eq!((corner - centre).norm(), half_extents.norm(), epsilon = 1e-12);
        }
        assert_relative_eq!(target.lower().coords, -target.upper().coords);
    }
}
