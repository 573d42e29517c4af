use serde::Serialize;
use thiserror::Error;

pub const VALIDATION_MESSAGE: &str =
    "Please fill in all required fields and ensure both files are present";

/// A draft entry that cannot be submitted and what it lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
    pub index: usize,
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// No entry was submittable; nothing was sent.
    #[error("{}", VALIDATION_MESSAGE)]
    Validation { invalid: Vec<InvalidEntry> },

    /// The store failed for a reason other than a duplicate. The run stopped
    /// and the collection was left as it was.
    #[error("Upload failed: {detail}")]
    Fatal {
        detail: String,
        succeeded_count: usize,
        /// Collection indices of the entries stored before the failure.
        succeeded: Vec<usize>,
    },

    #[error("An upload is already in progress")]
    AlreadyRunning,
}
