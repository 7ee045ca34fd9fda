// State management module
//
// This module provides the StateManager which wraps the per-run RunState with
// thread-safe access using Arc<RwLock<T>> and emits change events.

use crate::models::{InstallPhase, RunState};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the run state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The installer moved to another phase
    PhaseChanged { phase: InstallPhase },

    /// A copy task was added to the queue
    TaskQueued { task: String, queued: usize },

    /// The worker started a task
    TaskStarted {
        task: String,
        index: usize,
        total: usize,
    },

    /// The worker finished a task
    TaskFinished { task: String, success: bool },

    /// A recoverable error was logged and the error flag raised
    ErrorRecorded { message: String },

    /// State was reset for a new run
    RunReset,
}

/// Thread-safe run context with event emission
///
/// Owns the error flag and queue progress of one installer. The scan phase
/// writes from the calling thread and the copy worker writes afterwards; the
/// lock keeps that safe should the phases ever overlap.
///
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<RunState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with a broadcast buffer of 256 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(RunState::default())),
            state_tx,
        }
    }

    /// Get a copy of the current state
    pub fn snapshot(&self) -> RunState {
        self.read(RunState::clone)
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RunState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies the update, and emits an event for
    /// every detected difference.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut RunState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            // Nobody listening is fine
            let _ = self.state_tx.send(change.clone());
        }
        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &RunState, new: &RunState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.phase != new.phase {
            changes.push(StateChange::PhaseChanged { phase: new.phase });
        }

        if new.error_count > old.error_count {
            changes.push(StateChange::ErrorRecorded {
                message: new.last_error.clone().unwrap_or_default(),
            });
        }

        changes
    }

    fn emit(&self, change: StateChange) -> StateChange {
        let _ = self.state_tx.send(change.clone());
        change
    }

    // Convenience methods for common state updates

    /// Reset the run context at the start of a run
    pub fn begin_run(&self) -> Vec<StateChange> {
        let mut changes = self.update(RunState::reset);
        changes.push(self.emit(StateChange::RunReset));
        changes
    }

    pub fn set_phase(&self, phase: InstallPhase) -> Vec<StateChange> {
        self.update(|state| state.phase = phase)
    }

    /// Raise the error flag
    pub fn record_error(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| state.record_error(message))
    }

    pub fn task_queued(&self, task: String) -> Vec<StateChange> {
        let mut queued = 0;
        let mut changes = self.update(|state| {
            state.queued_tasks += 1;
            queued = state.queued_tasks;
        });
        changes.push(self.emit(StateChange::TaskQueued { task, queued }));
        changes
    }

    pub fn task_started(&self, task: String, index: usize) -> Vec<StateChange> {
        let mut total = 0;
        let mut changes = self.update(|state| {
            state.current_task = Some(task.clone());
            total = state.queued_tasks;
        });
        changes.push(self.emit(StateChange::TaskStarted { task, index, total }));
        changes
    }

    pub fn task_finished(&self, task: String, success: bool) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.current_task = None;
            if success {
                state.completed_tasks += 1;
            } else {
                state.failed_tasks += 1;
            }
        });
        changes.push(self.emit(StateChange::TaskFinished { task, success }));
        changes
    }

    pub fn has_errors(&self) -> bool {
        self.read(|s| s.has_errors)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
