mod common;

use bolometry::prelude::*;
use common::{ConstantEngine, foil_f1, m, slit_s1};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use uom::si::{length::meter, power::watt};

fn sightline(id: &str, slit: &Arc<Slit>, z: f64) -> Foil {
    Foil::new(
        id,
        Point3::new(0.0, 0.0, z),
        Vector3::x(),
        m(0.002),
        Vector3::y(),
        m(0.004),
        Arc::clone(slit),
        RayType::Sightline,
    )
    .unwrap()
}

#[test]
fn lookup_by_index_and_id() {
    let slit = slit_s1();
    let mut camera = Camera::new("C1");
    camera.add_foil_detector(foil_f1(&slit));

    assert_eq!(camera.get("F1").unwrap().detector_id(), "F1");
    assert_eq!(camera.get(0usize).unwrap().detector_id(), "F1");
    assert_eq!(camera.get(0usize).unwrap().dx().get::<meter>(), 0.01);
}

#[test]
fn lookup_unknown_id_fails() {
    let mut camera = Camera::new("C1");
    camera.add_foil_detector(foil_f1(&slit_s1()));

    assert!(matches!(camera.get("F2"), Err(Error::DetectorNotFound(id)) if id == "F2"));
}

#[test]
fn empty_camera_observe_makes_no_engine_calls() {
    let mut camera = Camera::new("C1");
    let engine = ConstantEngine::new(1.0);

    camera.observe(&engine).unwrap();

    assert!(engine.calls().is_empty());
}

#[test]
fn observe_visits_each_foil_once_in_order() {
    let slit = slit_s1();
    let mut camera = Camera::with_foils(
        "C1",
        Some(NodeHandle::new("world")),
        vec![
            sightline("B", &slit, -0.1),
            sightline("A", &slit, -0.2),
            sightline("C", &slit, -0.3),
        ],
    );
    let engine = ConstantEngine::new(2.5e-6);

    camera.observe(&engine).unwrap();

    assert_eq!(engine.calls(), vec!["B", "A", "C"]);
    for (id, power) in camera.observed_powers().unwrap() {
        assert!(power.get::<watt>().is_finite(), "{id} power is not finite");
        assert_eq!(power.get::<watt>(), 2.5e-6);
    }
}

#[test]
fn observed_power_before_observation_fails() {
    let camera = Camera::with_foils("C1", None, [foil_f1(&slit_s1())]);

    assert!(matches!(
        camera.get("F1").unwrap().observed_power(),
        Err(Error::NotObserved(_))
    ));
    assert!(camera.observed_powers().is_err());
}

#[test]
fn repeated_observations_accumulate() {
    let mut camera = Camera::with_foils("C1", None, [foil_f1(&slit_s1())]);
    let engine = ConstantEngine::new(1.0);

    camera.observe(&engine).unwrap();
    camera.observe(&engine).unwrap();

    assert_eq!(camera.get("F1").unwrap().sample_count(), 500);
}

#[test]
fn foils_sharing_a_slit_register_it_once() {
    let shared = slit_s1();
    let other = slit_s1();
    let camera = Camera::with_foils(
        "C1",
        None,
        vec![
            sightline("F1", &shared, -0.1),
            sightline("F2", &shared, -0.2),
            sightline("F3", &other, -0.3),
        ],
    );

    assert_eq!(camera.slits().len(), 2);
    assert!(Arc::ptr_eq(&camera.slits()[0], &shared));
    assert!(Arc::ptr_eq(&camera.slits()[1], &other));
}

#[test]
fn bulk_replace_owns_its_copy() {
    let slit = slit_s1();
    let mut foils = vec![sightline("F1", &slit, -0.1), sightline("F2", &slit, -0.2)];
    let mut camera = Camera::new("C1");

    camera.set_foil_detectors(foils.clone());
    foils.push(sightline("F3", &slit, -0.3));
    foils.remove(0);

    let ids: Vec<_> = camera.iter().map(|foil| foil.detector_id()).collect();
    assert_eq!(ids, vec!["F1", "F2"]);
    assert!(foils.iter().all(|foil| foil.parent().is_none()));
    assert!(camera.iter().all(|foil| foil.parent() == Some(camera.node())));
}

#[test]
fn camera_is_attachable() {
    let camera = Camera::with_parent("C1", Some(NodeHandle::new("vessel")));

    assert_eq!(camera.parent().map(NodeHandle::name), Some("vessel"));
    assert_eq!(camera.transform(), nalgebra::Isometry3::identity());
}

#[test]
fn targeted_observation_carries_slit_target() {
    let slit = slit_s1();
    let camera = Camera::with_foils("C1", None, [foil_f1(&slit)]);
    let observation = camera.get("F1").unwrap().observation();

    assert_eq!(observation.parent, Some(camera.node()));
    match observation.mode {
        ObserverMode::Targeted { target, pixel_samples } => {
            assert_eq!(pixel_samples, 250);
            assert!(target.contains(&slit.centre_point()));
        }
        other => panic!("expected a targeted observation, got {other:?}"),
    }
}
