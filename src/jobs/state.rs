use std::fmt;

/// Lifecycle state of a [`Job`](crate::Job).
///
/// ```text
/// New ──schedule──► Initializing ──trigger──► Running ──► Idle      (recurring)
///                                    │                └─► Finished  (once / exhausted)
///                                    └─► ExecutionDeferred ──queue──► Running
///                                                          └─skip──► (unchanged/resting)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    /// Constructed, never scheduled.
    #[default]
    New,
    /// Registered with an engine, waiting for the first trigger.
    Initializing,
    /// Between triggers.
    Idle,
    /// An execution is in progress.
    Running,
    /// No further executions will happen.
    Finished,
    /// A trigger hit a held guard or a saturated limiter.
    ExecutionDeferred,
}

impl JobState {
    /// Stable snake_case name (logs/metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::New => "new",
            JobState::Initializing => "initializing",
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Finished => "finished",
            JobState::ExecutionDeferred => "execution_deferred",
        }
    }

    pub(crate) fn code(&self) -> u8 {
        match self {
            JobState::New => 0,
            JobState::Initializing => 1,
            JobState::Idle => 2,
            JobState::Running => 3,
            JobState::Finished => 4,
            JobState::ExecutionDeferred => 5,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Scheduling shape of the call that most recently registered a job.
///
/// Descriptive only: whether a job rests in [`JobState::Idle`] or [`JobState::Finished`]
/// depends on whether any of its entries can still fire, not on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobKind {
    /// Fires once (`once_now`, `at`, `debounced`).
    Once,
    /// Fires repeatedly (`every`, `schedule`, `n_times_every`).
    #[default]
    Recurring,
}
