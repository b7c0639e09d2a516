use crate::{
    error::{Error, Result},
    foil::Foil,
    observer::ObservationEngine,
    scene::{Attachable, NodeHandle},
    slit::Slit,
};
use nalgebra::Isometry3;
use rayon::prelude::*;
use std::sync::Arc;
use uom::si::f64::Power;

/// Selects a foil in a [`Camera`] by position or by detector id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoilKey<'a> {
    Index(usize),
    Id(&'a str),
}

impl From<usize> for FoilKey<'_> {
    fn from(index: usize) -> Self {
        FoilKey::Index(index)
    }
}

impl<'a> From<&'a str> for FoilKey<'a> {
    fn from(id: &'a str) -> Self {
        FoilKey::Id(id)
    }
}

/// An ordered group of bolometer foils and the slits they view through.
///
/// The slit registry is filled as foils are added and holds each slit
/// allocation once.
#[derive(Debug)]
pub struct Camera {
    camera_id: String,
    node: NodeHandle,
    parent: Option<NodeHandle>,
    transform: Isometry3<f64>,
    foils: Vec<Foil>,
    slits: Vec<Arc<Slit>>,
}

impl Camera {
    /// Create an empty, unattached camera.
    pub fn new(camera_id: impl Into<String>) -> Self {
        Self::with_parent(camera_id, None)
    }

    pub fn with_parent(camera_id: impl Into<String>, parent: Option<NodeHandle>) -> Self {
        let camera_id = camera_id.into();
        Self {
            node: NodeHandle::unique(&camera_id),
            camera_id,
            parent,
            transform: Isometry3::identity(),
            foils: Vec::new(),
            slits: Vec::new(),
        }
    }

    /// Create a camera holding `foils` in order.
    pub fn with_foils(
        camera_id: impl Into<String>,
        parent: Option<NodeHandle>,
        foils: impl IntoIterator<Item = Foil>,
    ) -> Self {
        let mut camera = Self::with_parent(camera_id, parent);
        camera.set_foil_detectors(foils);
        camera
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// The scene node foils of this camera are attached to.
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub fn set_parent(&mut self, parent: Option<NodeHandle>) {
        self.parent = parent;
    }

    pub fn set_transform(&mut self, transform: Isometry3<f64>) {
        self.transform = transform;
    }

    pub fn foil_detectors(&self) -> &[Foil] {
        &self.foils
    }

    /// Registered slits in order of first use.
    pub fn slits(&self) -> &[Arc<Slit>] {
        &self.slits
    }

    pub fn slit(&self, slit_id: &str) -> Option<&Arc<Slit>> {
        self.slits.iter().find(|slit| slit.slit_id() == slit_id)
    }

    pub fn len(&self) -> usize {
        self.foils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foils.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Foil> {
        self.foils.iter()
    }

    /// Append a foil, registering its slit if this camera has not seen it.
    pub fn add_foil_detector(&mut self, mut foil: Foil) {
        self.register(&mut foil);
        self.foils.push(foil);
    }

    /// Replace every foil with `foils`, in order.
    ///
    /// Slits registered by earlier foils stay registered.
    pub fn set_foil_detectors(&mut self, foils: impl IntoIterator<Item = Foil>) {
        let mut foils: Vec<Foil> = foils.into_iter().collect();
        for foil in foils.iter_mut() {
            self.register(foil);
        }
        self.foils = foils;
    }

    fn register(&mut self, foil: &mut Foil) {
        if !self.slits.iter().any(|slit| Arc::ptr_eq(slit, foil.slit())) {
            tracing::debug!(
                camera_id = %self.camera_id,
                slit_id = foil.slit().slit_id(),
                "registering slit"
            );
            self.slits.push(Arc::clone(foil.slit()));
        }
        foil.attach(self.node.clone());
    }

    pub fn get<'k>(&self, key: impl Into<FoilKey<'k>>) -> Result<&Foil> {
        let index = self.position(key.into())?;
        Ok(&self.foils[index])
    }

    pub fn get_mut<'k>(&mut self, key: impl Into<FoilKey<'k>>) -> Result<&mut Foil> {
        let index = self.position(key.into())?;
        Ok(&mut self.foils[index])
    }

    fn position(&self, key: FoilKey<'_>) -> Result<usize> {
        match key {
            FoilKey::Index(index) if index < self.foils.len() => Ok(index),
            FoilKey::Index(index) => Err(Error::IndexOutOfRange {
                index,
                len: self.foils.len(),
            }),
            FoilKey::Id(id) => self
                .foils
                .iter()
                .position(|foil| foil.detector_id() == id)
                .ok_or_else(|| Error::DetectorNotFound(id.to_string())),
        }
    }

    /// Observe every foil in order. Stops at the first failure.
    pub fn observe<E>(&mut self, engine: &E) -> Result<()>
    where
        E: ObservationEngine + ?Sized,
    {
        tracing::debug!(camera_id = %self.camera_id, foils = self.foils.len(), "observing camera");
        self.foils.iter_mut().try_for_each(|foil| foil.observe(engine))
    }

    /// Observe every foil in parallel.
    ///
    /// Each foil accumulates into its own pipeline, so the result matches
    /// [`Camera::observe`] when every observation succeeds. On failure, foils
    /// other than the failing one may or may not have been observed.
    pub fn par_observe<E>(&mut self, engine: &E) -> Result<()>
    where
        E: ObservationEngine + Sync + ?Sized,
    {
        tracing::debug!(camera_id = %self.camera_id, foils = self.foils.len(), "observing camera in parallel");
        self.foils
            .par_iter_mut()
            .try_for_each(|foil| foil.observe(engine))
    }

    /// Mean observed power of each foil, in foil order.
    pub fn observed_powers(&self) -> Result<Vec<(&str, Power)>> {
        self.foils
            .iter()
            .map(|foil| Ok((foil.detector_id(), foil.observed_power()?)))
            .collect()
    }
}

impl Attachable for Camera {
    fn parent(&self) -> Option<&NodeHandle> {
        self.parent.as_ref()
    }

    fn transform(&self) -> Isometry3<f64> {
        self.transform
    }
}

impl<'a> IntoIterator for &'a Camera {
    type Item = &'a Foil;
    type IntoIter = std::slice::Iter<'a, Foil>;

    fn into_iter(self) -> Self::IntoIter {
        self.foils.iter()
    }
}
