use tracing::warn;

/// Where a submission run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Validating,
    /// `index` entries of `total` are done, the next one is in flight.
    Submitting { index: usize, total: usize },
    /// Stopped early by a duplicate or a fatal error.
    Halted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    Start,
    Validated { total: usize },
    Rejected,
    EntrySucceeded,
    Duplicate,
    Failed,
}

impl PipelineState {
    /// True while a run owns the pipeline.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Validating | PipelineState::Submitting { .. }
        )
    }

    /// Percentage of the run that is done.
    pub fn progress(&self) -> Option<f64> {
        match *self {
            PipelineState::Submitting { index, total } if total > 0 => {
                Some(index as f64 / total as f64 * 100.0)
            }
            PipelineState::Completed => Some(100.0),
            PipelineState::Validating => Some(0.0),
            _ => None,
        }
    }

    /// The single transition function. Unexpected events leave the state as is.
    pub fn on(self, event: PipelineEvent) -> PipelineState {
        use PipelineEvent::*;
        use PipelineState::*;

        match (self, event) {
            (Idle | Halted | Completed, Start) => Validating,
            (Validating, Validated { total }) if total > 0 => Submitting { index: 0, total },
            (Validating, Validated { .. }) | (Validating, Rejected) => Idle,
            (Submitting { index, total }, EntrySucceeded) if index + 1 >= total => Completed,
            (Submitting { index, total }, EntrySucceeded) => Submitting {
                index: index + 1,
                total,
            },
            (Submitting { .. }, Duplicate | Failed) => Halted,
            (state, event) => {
                warn!("Ignoring {:?} in state {:?}", event, state);
                state
            }
        }
    }
}
