//! The seam between foil detectors and the external observation engine.
//!
//! A foil does not trace rays itself. On `observe()` it describes what should
//! be sampled as an [`Observation`] and lends its [`PowerPipeline`] to an
//! [`ObservationEngine`], which appends the sampled power.

use crate::{
    error::{EngineError, Error, Result},
    geometry::TargetBox,
    pipeline::PowerPipeline,
    scene::NodeHandle,
};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uom::si::{f64::Length, length::nanometer};

/// Rays traced per observation by a targeted foil unless configured otherwise.
pub const DEFAULT_TARGETED_SAMPLES: usize = 250;

/// Rays traced per observation by a sightline foil unless configured otherwise.
pub const DEFAULT_SIGHTLINE_SAMPLES: usize = 1;

/// Observation strategy of a foil.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RayType {
    /// A single ray along the foil normal.
    Sightline,
    /// A sampled fan of rays aimed through the slit.
    Targeted,
}

impl RayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RayType::Sightline => "Sightline",
            RayType::Targeted => "Targeted",
        }
    }
}

impl FromStr for RayType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Sightline" => Ok(RayType::Sightline),
            "Targeted" => Ok(RayType::Targeted),
            other => Err(Error::UnsupportedRayType(other.to_string())),
        }
    }
}

impl fmt::Display for RayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling settings of a foil, one variant per [`RayType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SamplingFields")]
pub enum Sampling {
    Sightline { pixel_samples: usize },
    Targeted { pixel_samples: usize },
}

impl Sampling {
    pub fn ray_type(&self) -> RayType {
        match self {
            Sampling::Sightline { .. } => RayType::Sightline,
            Sampling::Targeted { .. } => RayType::Targeted,
        }
    }

    pub fn pixel_samples(&self) -> usize {
        match self {
            Sampling::Sightline { pixel_samples } | Sampling::Targeted { pixel_samples } => {
                *pixel_samples
            }
        }
    }

    pub(crate) fn with_pixel_samples(self, pixel_samples: usize) -> Self {
        match self {
            Sampling::Sightline { .. } => Sampling::Sightline { pixel_samples },
            Sampling::Targeted { .. } => Sampling::Targeted { pixel_samples },
        }
    }
}

#[derive(Deserialize)]
enum SamplingFields {
    Sightline { pixel_samples: usize },
    Targeted { pixel_samples: usize },
}

impl TryFrom<SamplingFields> for Sampling {
    type Error = Error;

    fn try_from(fields: SamplingFields) -> Result<Self> {
        let sampling = match fields {
            SamplingFields::Sightline { pixel_samples } => Sampling::Sightline { pixel_samples },
            SamplingFields::Targeted { pixel_samples } => Sampling::Targeted { pixel_samples },
        };
        if sampling.pixel_samples() == 0 {
            return Err(Error::value("sampling", "pixel_samples", "must be at least one"));
        }
        Ok(sampling)
    }
}

impl From<RayType> for Sampling {
    fn from(ray_type: RayType) -> Self {
        match ray_type {
            RayType::Sightline => Sampling::Sightline {
                pixel_samples: DEFAULT_SIGHTLINE_SAMPLES,
            },
            RayType::Targeted => Sampling::Targeted {
                pixel_samples: DEFAULT_TARGETED_SAMPLES,
            },
        }
    }
}

/// Wavelength range and bin count the engine integrates power over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpectralWindowFields")]
pub struct SpectralWindow {
    min_wavelength: Length,
    max_wavelength: Length,
    bins: usize,
}

impl SpectralWindow {
    pub fn new(min_wavelength: Length, max_wavelength: Length, bins: usize) -> Result<Self> {
        let (min, max) = (
            min_wavelength.get::<nanometer>(),
            max_wavelength.get::<nanometer>(),
        );
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 {
            return Err(Error::value(
                "spectral window",
                "min_wavelength",
                format!("expected finite positive wavelengths but got {min} nm to {max} nm"),
            ));
        }
        if min >= max {
            return Err(Error::value(
                "spectral window",
                "max_wavelength",
                format!("must exceed min_wavelength ({min} nm) but got {max} nm"),
            ));
        }
        if bins == 0 {
            return Err(Error::value("spectral window", "bins", "must be at least one"));
        }

        Ok(Self {
            min_wavelength,
            max_wavelength,
            bins,
        })
    }

    pub fn min_wavelength(&self) -> Length {
        self.min_wavelength
    }

    pub fn max_wavelength(&self) -> Length {
        self.max_wavelength
    }

    pub fn bins(&self) -> usize {
        self.bins
    }
}

#[derive(Deserialize)]
struct SpectralWindowFields {
    min_wavelength: Length,
    max_wavelength: Length,
    bins: usize,
}

impl TryFrom<SpectralWindowFields> for SpectralWindow {
    type Error = Error;

    fn try_from(fields: SpectralWindowFields) -> Result<Self> {
        Self::new(fields.min_wavelength, fields.max_wavelength, fields.bins)
    }
}

impl Default for SpectralWindow {
    /// The visible band, 375 nm to 740 nm, in a single bin.
    fn default() -> Self {
        Self {
            min_wavelength: Length::new::<nanometer>(375.0),
            max_wavelength: Length::new::<nanometer>(740.0),
            bins: 1,
        }
    }
}

/// What the engine should sample for one foil.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObserverMode<'a> {
    /// Trace `pixel_samples` rays along the local +z axis.
    Sightline { pixel_samples: usize },
    /// Trace `pixel_samples` rays from the foil surface aimed at `target`.
    Targeted {
        target: &'a TargetBox,
        pixel_samples: usize,
    },
}

/// A single observation request handed to an [`ObservationEngine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation<'a> {
    pub detector_id: &'a str,
    /// Scene node that `transform` is relative to.
    pub parent: Option<&'a NodeHandle>,
    /// Foil frame in the parent frame. Local +z is the foil normal.
    pub transform: Isometry3<f64>,
    pub spectral: &'a SpectralWindow,
    pub mode: ObserverMode<'a>,
}

/// External ray-sampling and power-integration service.
///
/// Implementations append one or more power samples to `pipeline` and must
/// not clear it.
pub trait ObservationEngine {
    fn observe(
        &self,
        observation: &Observation<'_>,
        pipeline: &mut PowerPipeline,
    ) -> std::result::Result<(), EngineError>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Sightline", RayType::Sightline)]
    #[case("Targeted", RayType::Targeted)]
    fn parse_ray_type(#[case] name: &str, #[case] expected: RayType) {
        let ray_type: RayType = name.parse().unwrap();
        assert_eq!(ray_type, expected);
        assert_eq!(ray_type.to_string(), name);
    }

    #[rstest]
    #[case("sightline")]
    #[case("Fan")]
    #[case("")]
    fn unknown_ray_type_is_unsupported(#[case] name: &str) {
        assert!(matches!(
            name.parse::<RayType>(),
            Err(Error::UnsupportedRayType(got)) if got == name
        ));
    }

    #[test]
    fn default_sampling_per_ray_type() {
        assert_eq!(Sampling::from(RayType::Targeted).pixel_samples(), 250);
        assert_eq!(Sampling::from(RayType::Sightline).pixel_samples(), 1);
        assert_eq!(
            Sampling::from(RayType::Sightline)
                .with_pixel_samples(10)
                .ray_type(),
            RayType::Sightline
        );
    }

    #[rstest]
    #[case(400.0, 400.0, 1)]
    #[case(500.0, 400.0, 1)]
    #[case(0.0, 400.0, 1)]
    #[case(400.0, 700.0, 0)]
    fn invalid_spectral_window(#[case] min: f64, #[case] max: f64, #[case] bins: usize) {
        assert!(matches!(
            SpectralWindow::new(
                Length::new::<nanometer>(min),
                Length::new::<nanometer>(max),
                bins
            ),
            Err(Error::ValueConstraint { .. })
        ));
    }

    #[test]
    fn spectral_window_from_json() {
        let window: SpectralWindow =
            serde_json::from_str(r#"{"min_wavelength":3e-7,"max_wavelength":7e-7,"bins":8}"#).unwrap();
        assert_eq!(window.bins(), 8);

        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(serde_json::from_str::<SpectralWindow>(&json).unwrap(), window);
    }

    #[rstest]
    #[case(r#"{"min_wavelength":7e-7,"max_wavelength":3e-7,"bins":1}"#)]
    #[case(r#"{"min_wavelength":3e-7,"max_wavelength":7e-7,"bins":0}"#)]
    #[case(r#"{"min_wavelength":-3e-7,"max_wavelength":7e-7,"bins":1}"#)]
    fn invalid_spectral_window_json(#[case] json: &str) {
        assert!(serde_json::from_str::<SpectralWindow>(json).is_err());
    }

    #[test]
    fn sampling_from_json() {
        let sampling: Sampling =
            serde_json::from_str(r#"{"Targeted":{"pixel_samples":16}}"#).unwrap();
        assert_eq!(sampling, Sampling::Targeted { pixel_samples: 16 });

        assert!(serde_json::from_str::<Sampling>(r#"{"Sightline":{"pixel_samples":0}}"#).is_err());
    }
}
