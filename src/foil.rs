use crate::{
    error::{Error, Result},
    geometry::{finite_point, frame_transform, positive_length, unit_normal, unit_vector},
    observer::{Observation, ObservationEngine, ObserverMode, RayType, Sampling, SpectralWindow},
    pipeline::PowerPipeline,
    scene::{Attachable, NodeHandle},
    slit::Slit,
};
use nalgebra::{Isometry3, Point3, Vector3};
use std::sync::Arc;
use uom::si::f64::{Length, Power};

/// A flat rectangular bolometer foil viewing the scene through a slit.
///
/// The foil frame has its origin at `centre_point`, local +z along the foil
/// normal and local +y along `basis_x`.
#[derive(Clone, Debug)]
pub struct Foil {
    detector_id: String,
    centre_point: Point3<f64>,
    basis_x: Vector3<f64>,
    basis_y: Vector3<f64>,
    dx: Length,
    dy: Length,
    normal: Vector3<f64>,
    transform: Isometry3<f64>,
    slit: Arc<Slit>,
    sampling: Sampling,
    spectral: SpectralWindow,
    pipeline: PowerPipeline,
    parent: Option<NodeHandle>,
}

impl Foil {
    /// Create a foil detector.
    ///
    /// `basis_x` and `basis_y` are normalized. They need not be orthogonal but
    /// must span a plane. `dx` and `dy` must be positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        detector_id: impl Into<String>,
        centre_point: Point3<f64>,
        basis_x: Vector3<f64>,
        dx: Length,
        basis_y: Vector3<f64>,
        dy: Length,
        slit: Arc<Slit>,
        ray_type: RayType,
    ) -> Result<Self> {
        let detector_id = detector_id.into();
        let object = format!("foil '{detector_id}'");

        let centre_point = finite_point(&object, "centre_point", &centre_point)?;
        let normal = unit_normal(&object, &basis_x, &basis_y)?;
        let basis_x = unit_vector(&object, "basis_x", &basis_x)?;
        let basis_y = unit_vector(&object, "basis_y", &basis_y)?;
        let dx = positive_length(&object, "dx", dx)?;
        let dy = positive_length(&object, "dy", dy)?;

        Ok(Self {
            transform: frame_transform(&centre_point, &normal, &basis_x),
            detector_id,
            centre_point,
            basis_x,
            basis_y,
            dx,
            dy,
            normal,
            slit,
            sampling: Sampling::from(ray_type),
            spectral: SpectralWindow::default(),
            pipeline: PowerPipeline::new(),
            parent: None,
        })
    }

    pub fn detector_id(&self) -> &str {
        &self.detector_id
    }

    pub fn centre_point(&self) -> Point3<f64> {
        self.centre_point
    }

    /// Unit length `basis_x`.
    pub fn basis_x(&self) -> Vector3<f64> {
        self.basis_x
    }

    /// Unit length `basis_y`.
    pub fn basis_y(&self) -> Vector3<f64> {
        self.basis_y
    }

    pub fn dx(&self) -> Length {
        self.dx
    }

    pub fn dy(&self) -> Length {
        self.dy
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn slit(&self) -> &Arc<Slit> {
        &self.slit
    }

    pub fn ray_type(&self) -> RayType {
        self.sampling.ray_type()
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn spectral(&self) -> &SpectralWindow {
        &self.spectral
    }

    pub fn pipeline(&self) -> &PowerPipeline {
        &self.pipeline
    }

    pub fn sample_count(&self) -> u64 {
        self.pipeline.count()
    }

    /// Set the number of rays traced per observation.
    pub fn set_pixel_samples(&mut self, pixel_samples: usize) -> Result<()> {
        if pixel_samples == 0 {
            return Err(Error::value(
                &format!("foil '{}'", self.detector_id),
                "pixel_samples",
                "must be at least one",
            ));
        }
        self.sampling = self.sampling.with_pixel_samples(pixel_samples);
        Ok(())
    }

    pub fn set_spectral(&mut self, spectral: SpectralWindow) {
        self.spectral = spectral;
    }

    pub(crate) fn attach(&mut self, parent: NodeHandle) {
        self.parent = Some(parent);
    }

    /// Describe this foil's next observation.
    pub fn observation(&self) -> Observation<'_> {
        let Self {
            detector_id,
            transform,
            slit,
            sampling,
            spectral,
            parent,
            ..
        } = self;
        observation(detector_id, parent, transform, slit, sampling, spectral)
    }

    /// Ask the engine to sample this foil. Samples are added to those of
    /// earlier observations.
    pub fn observe<E>(&mut self, engine: &E) -> Result<()>
    where
        E: ObservationEngine + ?Sized,
    {
        tracing::trace!(detector_id = %self.detector_id, ray_type = %self.ray_type(), "observing");

        let Self {
            detector_id,
            transform,
            slit,
            sampling,
            spectral,
            pipeline,
            parent,
            ..
        } = self;
        let observation = observation(detector_id, parent, transform, slit, sampling, spectral);

        engine
            .observe(&observation, pipeline)
            .map_err(|source| Error::Observation {
                detector_id: detector_id.clone(),
                source,
            })
    }

    /// Mean power over every sample observed so far.
    pub fn observed_power(&self) -> Result<Power> {
        self.pipeline
            .mean()
            .ok_or_else(|| Error::NotObserved(self.detector_id.clone()))
    }
}

/// Takes the fields separately so `observe` can lend out the pipeline while
/// the request borrows the rest of the foil.
fn observation<'a>(
    detector_id: &'a str,
    parent: &'a Option<NodeHandle>,
    transform: &Isometry3<f64>,
    slit: &'a Slit,
    sampling: &Sampling,
    spectral: &'a SpectralWindow,
) -> Observation<'a> {
    let mode = match *sampling {
        Sampling::Sightline { pixel_samples } => ObserverMode::Sightline { pixel_samples },
        Sampling::Targeted { pixel_samples } => ObserverMode::Targeted {
            target: slit.target(),
            pixel_samples,
        },
    };

    Observation {
        detector_id,
        parent: parent.as_ref(),
        transform: *transform,
        spectral,
        mode,
    }
}

impl Attachable for Foil {
    fn parent(&self) -> Option<&NodeHandle> {
        self.parent.as_ref()
    }

    fn transform(&self) -> Isometry3<f64> {
        self.transform
    }
}
