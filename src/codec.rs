//! Tagged, versioned JSON representation of a [`Camera`].
//!
//! ```text
//! BolometerCamera { version, camera_id, slits: [BolometerSlit], foil_detectors: [BolometerFoil] }
//! BolometerSlit   { version, slit_id, centre_point, basis_x, basis_y, dx, dy, dz }
//! BolometerFoil   { version, detector_id, centre_point, ray_type, basis_x, basis_y, dx, dy, slit_id }
//! ```
//!
//! Foils refer to their slit by `slit_id`. Lengths are in metres. Every
//! object carries a `type` tag and a `version` which are checked before any
//! other field is read.

use crate::{
    camera::Camera,
    error::{Error, Result},
    foil::Foil,
    observer::RayType,
    scene::NodeHandle,
    slit::Slit,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    ffi::OsStr,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    sync::Arc,
};
use uom::si::{f64::Length, length::meter};

pub const CAMERA_TAG: &str = "BolometerCamera";
pub const SLIT_TAG: &str = "BolometerSlit";
pub const FOIL_TAG: &str = "BolometerFoil";
pub const FORMAT_VERSION: u64 = 1;

/// On-disk formats a camera can be saved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Json,
}

impl FileFormat {
    /// Infer the format from the suffix of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        match path.as_ref().extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(FileFormat::Json),
            Some(ext) => Err(Error::UnsupportedFormat(ext.to_string())),
            None => Err(Error::UnsupportedFormat(String::new())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CameraRecord<S, F> {
    #[serde(rename = "type")]
    kind: String,
    version: u64,
    camera_id: String,
    slits: Vec<S>,
    foil_detectors: Vec<F>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlitRecord {
    #[serde(rename = "type")]
    kind: String,
    version: u64,
    slit_id: String,
    centre_point: [f64; 3],
    basis_x: [f64; 3],
    basis_y: [f64; 3],
    dx: f64,
    dy: f64,
    dz: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FoilRecord {
    #[serde(rename = "type")]
    kind: String,
    version: u64,
    detector_id: String,
    centre_point: [f64; 3],
    ray_type: String,
    basis_x: [f64; 3],
    basis_y: [f64; 3],
    dx: f64,
    dy: f64,
    slit_id: String,
}

impl From<&Slit> for SlitRecord {
    fn from(slit: &Slit) -> Self {
        Self {
            kind: SLIT_TAG.to_string(),
            version: FORMAT_VERSION,
            slit_id: slit.slit_id().to_string(),
            centre_point: slit.centre_point().coords.into(),
            basis_x: slit.basis_x().into(),
            basis_y: slit.basis_y().into(),
            dx: slit.dx().get::<meter>(),
            dy: slit.dy().get::<meter>(),
            dz: slit.dz().get::<meter>(),
        }
    }
}

impl From<&Foil> for FoilRecord {
    fn from(foil: &Foil) -> Self {
        Self {
            kind: FOIL_TAG.to_string(),
            version: FORMAT_VERSION,
            detector_id: foil.detector_id().to_string(),
            centre_point: foil.centre_point().coords.into(),
            ray_type: foil.ray_type().to_string(),
            basis_x: foil.basis_x().into(),
            basis_y: foil.basis_y().into(),
            dx: foil.dx().get::<meter>(),
            dy: foil.dy().get::<meter>(),
            slit_id: foil.slit().slit_id().to_string(),
        }
    }
}

/// Foils refer to slits by id, so distinct slits sharing an id cannot be
/// written.
fn camera_record(camera: &Camera) -> Result<CameraRecord<SlitRecord, FoilRecord>> {
    let slits = camera.slits();
    for (i, slit) in slits.iter().enumerate() {
        if slits[..i].iter().any(|other| other.slit_id() == slit.slit_id()) {
            return Err(Error::format(
                &format!("slits[{i}]"),
                "slit_id",
                format!("duplicate slit id '{}'", slit.slit_id()),
            ));
        }
    }

    Ok(CameraRecord {
        kind: CAMERA_TAG.to_string(),
        version: FORMAT_VERSION,
        camera_id: camera.camera_id().to_string(),
        slits: slits.iter().map(|slit| SlitRecord::from(slit.as_ref())).collect(),
        foil_detectors: camera.iter().map(FoilRecord::from).collect(),
    })
}

/// Encode the full state of `camera`.
///
/// Fails if two registered slits share a `slit_id`.
pub fn encode(camera: &Camera) -> Result<Value> {
    Ok(serde_json::to_value(camera_record(camera)?)?)
}

/// Rebuild a camera from its tagged representation.
///
/// Fails on the first invalid object, naming it and the offending field.
/// Foils are registered in document order through
/// [`Camera::add_foil_detector`].
pub fn decode(value: Value, parent: Option<NodeHandle>) -> Result<Camera> {
    let record: CameraRecord<Value, Value> = read_record("camera", value, CAMERA_TAG)?;

    let mut slits: HashMap<String, Arc<Slit>> = HashMap::with_capacity(record.slits.len());
    for (i, value) in record.slits.into_iter().enumerate() {
        let object = format!("slits[{i}]");
        let slit: SlitRecord = read_record(&object, value, SLIT_TAG)?;
        if slits.contains_key(&slit.slit_id) {
            return Err(Error::format(
                &object,
                "slit_id",
                format!("duplicate slit id '{}'", slit.slit_id),
            ));
        }

        let slit = Slit::with_depth(
            slit.slit_id,
            point(slit.centre_point),
            vector(slit.basis_x),
            m(slit.dx),
            vector(slit.basis_y),
            m(slit.dy),
            m(slit.dz),
        )?;
        slits.insert(slit.slit_id().to_string(), Arc::new(slit));
    }

    let mut camera = Camera::with_parent(record.camera_id, parent);
    for (j, value) in record.foil_detectors.into_iter().enumerate() {
        let object = format!("foil_detectors[{j}]");
        let foil: FoilRecord = read_record(&object, value, FOIL_TAG)?;
        let ray_type: RayType = foil.ray_type.parse()?;
        let slit = slits.get(&foil.slit_id).ok_or_else(|| {
            Error::format(
                &object,
                "slit_id",
                format!("no slit with id '{}' in slits", foil.slit_id),
            )
        })?;

        camera.add_foil_detector(Foil::new(
            foil.detector_id,
            point(foil.centre_point),
            vector(foil.basis_x),
            m(foil.dx),
            vector(foil.basis_y),
            m(foil.dy),
            Arc::clone(slit),
            ray_type,
        )?);
    }

    Ok(camera)
}

/// Check the tags of `value` and then read the remaining fields.
fn read_record<T: DeserializeOwned>(object: &str, value: Value, tag: &str) -> Result<T> {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::format(object, "type", format!("expected a tagged object but got {other}")));
        }
    };
    check_tags(object, &fields, tag)?;

    serde_json::from_value(Value::Object(fields)).map_err(|err| Error::TypeMismatch {
        object: object.to_string(),
        detail: err.to_string(),
    })
}

fn check_tags(object: &str, fields: &Map<String, Value>, tag: &str) -> Result<()> {
    match fields.get("type") {
        Some(Value::String(kind)) if kind == tag => {}
        Some(other) => {
            return Err(Error::format(object, "type", format!("expected '{tag}' but got {other}")));
        }
        None => return Err(Error::format(object, "type", "missing")),
    }

    match fields.get("version") {
        Some(version) if version.as_u64() == Some(FORMAT_VERSION) => Ok(()),
        Some(other) => Err(Error::format(
            object,
            "version",
            format!("expected {FORMAT_VERSION} but got {other}"),
        )),
        None => Err(Error::format(object, "version", "missing")),
    }
}

fn point(coords: [f64; 3]) -> Point3<f64> {
    Point3::from(coords)
}

fn vector(coords: [f64; 3]) -> Vector3<f64> {
    Vector3::from(coords)
}

fn m(value: f64) -> Length {
    Length::new::<meter>(value)
}

impl Camera {
    /// Write the camera to `path` in the format implied by its suffix.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match FileFormat::from_path(path)? {
            FileFormat::Json => {
                let record = camera_record(self)?;
                let mut writer = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(&mut writer, &record)?;
                writer.flush()?;
            }
        }

        tracing::info!(
            camera_id = %self.camera_id(),
            foils = self.len(),
            slits = self.slits().len(),
            path = %path.display(),
            "saved camera"
        );
        Ok(())
    }

    /// Read a camera from `path`, attaching it under `parent`.
    pub fn load(path: impl AsRef<Path>, parent: Option<NodeHandle>) -> Result<Self> {
        let path = path.as_ref();
        let camera = match FileFormat::from_path(path)? {
            FileFormat::Json => {
                let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
                decode(value, parent)?
            }
        };

        tracing::info!(
            camera_id = %camera.camera_id(),
            foils = camera.len(),
            slits = camera.slits().len(),
            path = %path.display(),
            "loaded camera"
        );
        Ok(camera)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&camera_record(self)?)?)
    }

    pub fn from_json_str(json: &str, parent: Option<NodeHandle>) -> Result<Self> {
        decode(serde_json::from_str(json)?, parent)
    }
}
