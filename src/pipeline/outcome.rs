use serde::Serialize;

/// Result of one attempted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryResult {
    Succeeded { index: usize, title: String, id: String },
    Failed { index: usize, title: String, reason: String },
}

impl EntryResult {
    pub fn index(&self) -> usize {
        match self {
            EntryResult::Succeeded { index, .. } | EntryResult::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EntryResult::Succeeded { .. })
    }
}

/// Summary of a run that was not aborted by a fatal error.
///
/// Indices refer to the collection as it was when the run started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Attempted entries, in submission order.
    pub results: Vec<EntryResult>,
    pub succeeded_count: usize,
    /// Entries left out because they were not submittable.
    pub skipped: Vec<usize>,
    /// Submittable entries after a duplicate halt.
    pub not_attempted: Vec<usize>,
    pub success_message: Option<String>,
    /// Set when a duplicate stopped the run.
    pub error_message: Option<String>,
}

impl UploadOutcome {
    pub fn is_complete(&self) -> bool {
        self.error_message.is_none() && self.not_attempted.is_empty()
    }

    pub fn succeeded_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.is_success())
            .map(EntryResult::index)
            .collect()
    }
}

pub fn success_message(count: usize) -> String {
    if count == 1 {
        "Successfully uploaded 1 dance move".to_string()
    } else {
        format!("Successfully uploaded {} dance moves", count)
    }
}

pub fn duplicate_title_message(title: &str) -> String {
    format!("A dance move with the title \"{}\" already exists.", title)
}

pub fn duplicate_file_message(file_name: &str, title: &str) -> String {
    format!(
        "A file named \"{}\" already exists (while uploading \"{}\").",
        file_name, title
    )
}
