//! Download pipeline state machine
//!
//! A run progresses through:
//! RESOLVING → FETCHING → TRANSCODING → TAGGING → READY
//! and may drop to FAILED from any non-terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineState {
    /// Track resolver lookup
    Resolving,
    /// Raw audio being staged
    Fetching,
    /// Raw audio → target codec
    Transcoding,
    /// Lyrics/cover lookup and tag writing
    Tagging,
    /// Output ready to hand to the caller
    Ready,
    /// Run aborted
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Ready | PipelineState::Failed)
    }

    /// Legal successor of a non-terminal state (FAILED is always legal)
    pub fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Resolving => Some(PipelineState::Fetching),
            PipelineState::Fetching => Some(PipelineState::Transcoding),
            PipelineState::Transcoding => Some(PipelineState::Tagging),
            PipelineState::Tagging => Some(PipelineState::Ready),
            PipelineState::Ready | PipelineState::Failed => None,
        }
    }
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub run_id: Uuid,
    pub old_state: PipelineState,
    pub new_state: PipelineState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory record of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub state: PipelineState,
    pub transitions: Vec<StateTransition>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: PipelineState::Resolving,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to the next state in sequence
    ///
    /// Transitions out of a terminal state are ignored.
    pub fn advance(&mut self) -> Option<&StateTransition> {
        let next = self.state.next()?;
        Some(self.transition_to(next))
    }

    /// Drop to FAILED (no-op when already terminal)
    pub fn fail(&mut self) -> Option<&StateTransition> {
        if self.state.is_terminal() {
            return None;
        }
        Some(self.transition_to(PipelineState::Failed))
    }

    fn transition_to(&mut self, new_state: PipelineState) -> &StateTransition {
        let transition = StateTransition {
            run_id: self.run_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        tracing::debug!(
            run_id = %self.run_id,
            from = ?transition.old_state,
            to = ?transition.new_state,
            "Pipeline state transition"
        );

        self.transitions.push(transition);
        // Just pushed
        &self.transitions[self.transitions.len() - 1]
    }

    /// States visited so far, in order
    pub fn history(&self) -> Vec<PipelineState> {
        std::iter::once(PipelineState::Resolving)
            .chain(self.transitions.iter().map(|t| t.new_state))
            .collect()
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
