use nalgebra::Isometry3;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to a node owned by the external scene graph.
///
/// The scene graph resolves handles to world transforms. This crate only
/// passes them along. Handles made with [`NodeHandle::new`] are equal when
/// their names are. Nodes created by this crate for its own objects are
/// unique and only equal to their clones.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    name: Arc<str>,
    serial: u64,
}

impl NodeHandle {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            serial: 0,
        }
    }

    /// A handle distinct from every other handle, whatever its name.
    pub(crate) fn unique(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Something that can be placed under a scene graph node.
pub trait Attachable {
    /// The node this item is placed under, if any.
    fn parent(&self) -> Option<&NodeHandle>;

    /// Transform from this item's local frame into its parent's frame.
    fn transform(&self) -> Isometry3<f64>;
}
