use super::error::{InvalidEntry, PipelineError, VALIDATION_MESSAGE};
use super::outcome::{
    duplicate_file_message, duplicate_title_message, success_message, EntryResult, UploadOutcome,
};
use super::state::{PipelineEvent, PipelineState};
use crate::entry::EntryCollection;
use crate::entry_store::{EntryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// What happens to the collection after a run that stored at least one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Back to a single blank entry.
    #[default]
    ClearAll,
    /// Drop only the stored entries, keep the rest for another try.
    KeepUnsubmitted,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub reset_policy: ResetPolicy,
}

/// Snapshot published on every state or progress change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub state: PipelineState,
    /// 0 to 100.
    pub progress: f64,
    pub succeeded_count: usize,
    pub is_uploading: bool,
}

struct PipelineStatus {
    state: PipelineState,
    progress: f64,
    succeeded_count: usize,
    message: Option<String>,
}

/// Submits the entries of a collection one at a time, in order.
pub struct UploadPipeline {
    store: Arc<dyn EntryStore>,
    settings: PipelineSettings,
    status: Mutex<PipelineStatus>,
    events: broadcast::Sender<ProgressEvent>,
}

/// Resets progress when a run ends, however it ends.
struct RunGuard<'a> {
    pipeline: &'a UploadPipeline,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.pipeline.status.lock().unwrap();
        if status.state.is_busy() {
            warn!("Upload run interrupted in state {:?}", status.state);
            status.state = PipelineState::Halted;
        }
        status.progress = 0.0;
        self.pipeline.publish(&status);
    }
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self::with_settings(store, PipelineSettings::default())
    }

    pub fn with_settings(store: Arc<dyn EntryStore>, settings: PipelineSettings) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            settings,
            status: Mutex::new(PipelineStatus {
                state: PipelineState::Idle,
                progress: 0.0,
                succeeded_count: 0,
                message: None,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.status.lock().unwrap().state
    }

    pub fn progress(&self) -> f64 {
        self.status.lock().unwrap().progress
    }

    pub fn is_uploading(&self) -> bool {
        self.state().is_busy()
    }

    /// Success or error message of the last run.
    pub fn last_message(&self) -> Option<String> {
        self.status.lock().unwrap().message.clone()
    }

    /// Submits every submittable entry of `collection`, in order.
    ///
    /// Entries that are not submittable are skipped and reported. A duplicate
    /// stops the run, keeping what was stored before it, and is reported in the
    /// outcome. Any other store failure aborts with [`PipelineError::Fatal`].
    /// If anything was stored the collection is reset per [`ResetPolicy`].
    pub async fn submit(
        &self,
        collection: &mut EntryCollection,
    ) -> Result<UploadOutcome, PipelineError> {
        let _guard = self.begin()?;

        let mut invalid = Vec::new();
        let mut candidates = Vec::new();
        for (index, entry) in collection.iter().enumerate() {
            if entry.is_submittable() {
                candidates.push(index);
            } else {
                invalid.push(InvalidEntry {
                    index,
                    missing: entry.missing_fields(),
                });
            }
        }

        if candidates.is_empty() {
            self.advance(PipelineEvent::Rejected);
            self.set_message(Some(VALIDATION_MESSAGE.to_string()));
            info!("Nothing to upload, {} entries incomplete", invalid.len());
            return Err(PipelineError::Validation { invalid });
        }
        if !invalid.is_empty() {
            info!(
                "Skipping {} incomplete entries: {:?}",
                invalid.len(),
                invalid.iter().map(|e| e.index).collect::<Vec<_>>()
            );
        }

        let total = candidates.len();
        self.advance(PipelineEvent::Validated { total });
        let mut outcome = UploadOutcome {
            skipped: invalid.iter().map(|e| e.index).collect(),
            ..Default::default()
        };

        for (position, &index) in candidates.iter().enumerate() {
            let Some(entry) = collection.get(index).and_then(|e| e.as_submittable()) else {
                continue;
            };
            let title = entry.title.to_string();
            debug!("Uploading entry {} ({}/{}): {}", index, position + 1, total, title);

            let message = match self.store.upload(entry).await {
                Ok(id) => {
                    outcome.succeeded_count += 1;
                    outcome
                        .results
                        .push(EntryResult::Succeeded { index, title, id });
                    self.advance(PipelineEvent::EntrySucceeded);
                    continue;
                }
                Err(StoreError::Duplicate(existing)) => duplicate_title_message(&existing),
                Err(StoreError::DuplicateFile(name)) => duplicate_file_message(&name, &title),
                Err(StoreError::Fatal(detail)) => {
                    error!("Upload of {} failed: {}", title, detail);
                    self.advance(PipelineEvent::Failed);
                    let err = PipelineError::Fatal {
                        detail,
                        succeeded_count: outcome.succeeded_count,
                        succeeded: outcome.succeeded_indices(),
                    };
                    self.set_message(Some(err.to_string()));
                    return Err(err);
                }
            };

            warn!("Halting batch at {}: {}", title, message);
            outcome.results.push(EntryResult::Failed {
                index,
                title,
                reason: message.clone(),
            });
            outcome.error_message = Some(message);
            outcome.not_attempted = candidates[position + 1..].to_vec();
            self.advance(PipelineEvent::Duplicate);
            break;
        }

        if outcome.succeeded_count > 0 {
            outcome.success_message = Some(success_message(outcome.succeeded_count));
            match self.settings.reset_policy {
                ResetPolicy::ClearAll => collection.reset(),
                ResetPolicy::KeepUnsubmitted => {
                    collection.remove_many(&outcome.succeeded_indices())
                }
            }
        }
        info!(
            "Upload run finished: {} of {} stored{}",
            outcome.succeeded_count,
            total,
            outcome
                .error_message
                .as_deref()
                .map(|m| format!(", {}", m))
                .unwrap_or_default()
        );
        self.set_message(
            outcome
                .error_message
                .clone()
                .or_else(|| outcome.success_message.clone()),
        );
        Ok(outcome)
    }

    fn begin(&self) -> Result<RunGuard<'_>, PipelineError> {
        let mut status = self.status.lock().unwrap();
        if status.state.is_busy() {
            return Err(PipelineError::AlreadyRunning);
        }
        status.state = status.state.on(PipelineEvent::Start);
        status.progress = 0.0;
        status.succeeded_count = 0;
        status.message = None;
        self.publish(&status);
        Ok(RunGuard { pipeline: self })
    }

    fn advance(&self, event: PipelineEvent) {
        let mut status = self.status.lock().unwrap();
        status.state = status.state.on(event);
        if event == PipelineEvent::EntrySucceeded {
            status.succeeded_count += 1;
        }
        if let Some(progress) = status.state.progress() {
            status.progress = progress;
        }
        self.publish(&status);
    }

    fn set_message(&self, message: Option<String>) {
        self.status.lock().unwrap().message = message;
    }

    fn publish(&self, status: &PipelineStatus) {
        // No subscribers is fine.
        let _ = self.events.send(ProgressEvent {
            state: status.state,
            progress: status.progress,
            succeeded_count: status.succeeded_count,
            is_uploading: status.state.is_busy(),
        });
    }
}
