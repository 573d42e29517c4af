//! Sequential submission of an entry collection to an [`crate::entry_store::EntryStore`].

mod error;
mod outcome;
mod state;
mod uploader;

pub use error::{InvalidEntry, PipelineError, VALIDATION_MESSAGE};
pub use outcome::{
    duplicate_file_message, duplicate_title_message, success_message, EntryResult, UploadOutcome,
};
pub use state::{PipelineEvent, PipelineState};
pub use uploader::{PipelineSettings, ProgressEvent, ResetPolicy, UploadPipeline};
