use thiserror::Error;

/// Boxed error returned by an [`ObservationEngine`](crate::observer::ObservationEngine).
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{object} has a field of the wrong kind: {detail}")]
    TypeMismatch { object: String, detail: String },

    #[error("{object} {field} is invalid: {reason}")]
    ValueConstraint {
        object: String,
        field: &'static str,
        reason: String,
    },

    #[error("unsupported ray type '{0}', expected one of 'Sightline' or 'Targeted'")]
    UnsupportedRayType(String),

    #[error("foil detector index {index} is out of range for a camera with {len} detectors")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no foil detector with id '{0}' in this camera")]
    DetectorNotFound(String),

    #[error("foil detector '{0}' has no accumulated samples, call observe() first")]
    NotObserved(String),

    #[error("invalid {object} record, field `{field}`: {reason}")]
    Format {
        object: String,
        field: &'static str,
        reason: String,
    },

    #[error("unsupported file format '{0}', only 'json' is implemented")]
    UnsupportedFormat(String),

    #[error("observation of foil detector '{detector_id}' failed")]
    Observation {
        detector_id: String,
        #[source]
        source: EngineError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn value(object: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Error::ValueConstraint {
            object: object.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn format(object: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Error::Format {
            object: object.to_string(),
            field,
            reason: reason.into(),
        }
    }
}
