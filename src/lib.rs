// #![warn(missing_docs)]

//! Bolometer Camera Geometry
//!
//! A bolometer camera is an ordered set of rectangular [`Foil`](foil::Foil)
//! detectors, each collimated by a shared [`Slit`](slit::Slit). This crate
//! derives and validates their geometry, groups them into a
//! [`Camera`](camera::Camera), hands observations to an external
//! [`ObservationEngine`](observer::ObservationEngine) and saves cameras to a
//! tagged JSON format.

#[allow(missing_docs)]
pub mod error;

pub mod camera;
pub mod codec;
pub mod foil;
pub mod geometry;
pub mod observer;
pub mod pipeline;
pub mod scene;
pub mod slit;

pub mod prelude {
    pub use crate::camera::{Camera, FoilKey};
    pub use crate::codec::FileFormat;
    pub use crate::error::{Error, Result};
    pub use crate::foil::Foil;
    pub use crate::observer::{
        Observation, ObservationEngine, ObserverMode, RayType, Sampling, SpectralWindow,
    };
    pub use crate::pipeline::PowerPipeline;
    pub use crate::scene::{Attachable, NodeHandle};
    pub use crate::slit::Slit;
}
