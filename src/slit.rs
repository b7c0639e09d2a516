use crate::{
    error::Result,
    geometry::{TargetBox, finite_point, frame_transform, positive_length, unit_normal},
};
use nalgebra::{Isometry3, Point3, Vector3};
use uom::si::{f64::Length, length::meter};

/// Slit depth along its normal unless given explicitly, in metres.
pub const DEFAULT_SLIT_DEPTH: f64 = 0.001;

/// A rectangular collimating aperture shared by one or more foils.
///
/// Slits are immutable and shared as `Arc<Slit>`. Two slits are the same slit
/// only if they are the same allocation, regardless of their fields.
#[derive(Debug)]
pub struct Slit {
    slit_id: String,
    centre_point: Point3<f64>,
    basis_x: Vector3<f64>,
    basis_y: Vector3<f64>,
    dx: Length,
    dy: Length,
    dz: Length,
    normal: Vector3<f64>,
    transform: Isometry3<f64>,
    target: TargetBox,
}

impl Slit {
    /// Create a slit with the default depth.
    pub fn new(
        slit_id: impl Into<String>,
        centre_point: Point3<f64>,
        basis_x: Vector3<f64>,
        dx: Length,
        basis_y: Vector3<f64>,
        dy: Length,
    ) -> Result<Self> {
        Self::with_depth(
            slit_id,
            centre_point,
            basis_x,
            dx,
            basis_y,
            dy,
            Length::new::<meter>(DEFAULT_SLIT_DEPTH),
        )
    }

    pub fn with_depth(
        slit_id: impl Into<String>,
        centre_point: Point3<f64>,
        basis_x: Vector3<f64>,
        dx: Length,
        basis_y: Vector3<f64>,
        dy: Length,
        dz: Length,
    ) -> Result<Self> {
        let slit_id = slit_id.into();
        let object = format!("slit '{slit_id}'");

        let centre_point = finite_point(&object, "centre_point", &centre_point)?;
        let normal = unit_normal(&object, &basis_x, &basis_y)?;
        let dx = positive_length(&object, "dx", dx)?;
        let dy = positive_length(&object, "dy", dy)?;
        let dz = positive_length(&object, "dz", dz)?;

        let transform = frame_transform(&centre_point, &normal, &basis_x);

        // The frame maps local +y onto basis_x, so dx spans the local y axis
        // and dy the local x axis.
        let target = TargetBox::new(
            Vector3::new(
                dy.get::<meter>() / 2.0,
                dx.get::<meter>() / 2.0,
                dz.get::<meter>() / 2.0,
            ),
            transform,
        );

        Ok(Self {
            slit_id,
            centre_point,
            basis_x,
            basis_y,
            dx,
            dy,
            dz,
            normal,
            transform,
            target,
        })
    }

    pub fn slit_id(&self) -> &str {
        &self.slit_id
    }

    pub fn centre_point(&self) -> Point3<f64> {
        self.centre_point
    }

    pub fn basis_x(&self) -> Vector3<f64> {
        self.basis_x
    }

    pub fn basis_y(&self) -> Vector3<f64> {
        self.basis_y
    }

    pub fn dx(&self) -> Length {
        self.dx
    }

    pub fn dy(&self) -> Length {
        self.dy
    }

    pub fn dz(&self) -> Length {
        self.dz
    }

    /// Unit normal, `normalize(basis_x × basis_y)`.
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn transform(&self) -> &Isometry3<f64> {
        &self.transform
    }

    /// Pass-through box covering the aperture, used to aim targeted rays.
    pub fn target(&self) -> &TargetBox {
        &self.target
    }
}
