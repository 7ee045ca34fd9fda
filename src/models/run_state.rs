use std::fmt;

/// Phases of a single install run.
///
/// `Idle -> EnsureTarget -> Scan -> (Complete | RunQueue -> Complete)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallPhase {
    #[default]
    Idle,
    EnsureTarget,
    Scan,
    RunQueue,
    Complete,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallPhase::Idle => "idle",
            InstallPhase::EnsureTarget => "ensure target",
            InstallPhase::Scan => "scan",
            InstallPhase::RunQueue => "run queue",
            InstallPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Context of the current (or last) install run.
///
/// Wrapped in `Arc<RwLock<RunState>>` by [`crate::state::StateManager`]; never
/// shared between installers, and reset at the start of every run.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    pub phase: InstallPhase,

    // Queue progress
    pub queued_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub current_task: Option<String>,

    // Error flag and detail
    pub has_errors: bool,
    pub error_count: usize,
    pub last_error: Option<String>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, InstallPhase::Idle | InstallPhase::Complete)
    }

    /// Reset everything for a fresh run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a recoverable error and raise the error flag.
    pub fn record_error(&mut self, message: String) {
        self.has_errors = true;
        self.error_count += 1;
        self.last_error = Some(message);
    }

    /// Get queue statistics as (completed, failed, queued).
    pub fn task_stats(&self) -> (usize, usize, usize) {
        (self.completed_tasks, self.failed_tasks, self.queued_tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = RunState::default();
        assert_eq!(state.phase, InstallPhase::Idle);
        assert!(!state.has_errors);
        assert!(!state.is_running());
    }

    #[test]
    fn test_record_error_sets_flag() {
        let mut state = RunState::default();
        state.record_error("disk full".to_string());
        state.record_error("locked".to_string());

        assert!(state.has_errors);
        assert_eq!(state.error_count, 2);
        assert_eq!(state.last_error.as_deref(), Some("locked"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = RunState {
            phase: InstallPhase::RunQueue,
            queued_tasks: 3,
            completed_tasks: 2,
            ..Default::default()
        };
        state.record_error("x".to_string());
        assert!(state.is_running());

        state.reset();
        assert_eq!(state.phase, InstallPhase::Idle);
        assert_eq!(state.task_stats(), (0, 0, 0));
        assert!(!state.has_errors);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(InstallPhase::RunQueue.to_string(), "run queue");
    }
}
