#![allow(dead_code)]

use bolometry::{error::EngineError, prelude::*};
use nalgebra::{Point3, Vector3};
use std::sync::{Arc, Mutex};
use uom::si::{
    f64::{Length, Power},
    length::meter,
    power::watt,
};

/// Adds `power` once per traced ray and remembers the order foils were seen.
pub struct ConstantEngine {
    pub power: f64,
    pub calls: Mutex<Vec<String>>,
}

impl ConstantEngine {
    pub fn new(power: f64) -> Self {
        Self {
            power,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ObservationEngine for ConstantEngine {
    fn observe(
        &self,
        observation: &Observation<'_>,
        pipeline: &mut PowerPipeline,
    ) -> std::result::Result<(), EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(observation.detector_id.to_string());

        let rays = match observation.mode {
            ObserverMode::Sightline { pixel_samples } => pixel_samples,
            ObserverMode::Targeted { pixel_samples, .. } => pixel_samples,
        };
        pipeline.extend(std::iter::repeat_n(Power::new::<watt>(self.power), rays));
        Ok(())
    }
}

pub fn m(value: f64) -> Length {
    Length::new::<meter>(value)
}

/// Slit "S1" at the origin from the reference scenario.
pub fn slit_s1() -> Arc<Slit> {
    Arc::new(
        Slit::new(
            "S1",
            Point3::origin(),
            Vector3::x(),
            m(0.05),
            Vector3::y(),
            m(0.05),
        )
        .unwrap(),
    )
}

/// Foil "F1" at (1, 0, 0) looking back along -x at `slit`.
pub fn foil_f1(slit: &Arc<Slit>) -> Foil {
    Foil::new(
        "F1",
        Point3::new(1.0, 0.0, 0.0),
        Vector3::y(),
        m(0.01),
        Vector3::z(),
        m(0.01),
        Arc::clone(slit),
        RayType::Targeted,
    )
    .unwrap()
}
