//! Per-turn pipeline state.
//!
//! `PipelineState` is created at turn start and dropped at turn end. Only its
//! effects (the saved thread and the session summary) outlive the turn.
//! Every stage checks that it runs from the expected stage and advances the
//! state machine when done:
//!
//! `Start -> ContextPrepared -> ModelInvoked -> Bookkept -> Done`

use std::fmt;

use serde::{Deserialize, Serialize};

use parley_types::chat::ConversationThread;
use parley_types::error::TurnError;

/// Position of a turn in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Start,
    ContextPrepared,
    ModelInvoked,
    Bookkept,
    Done,
}

impl TurnStage {
    /// The only stage allowed to advance into `self`.
    pub fn previous(self) -> Option<TurnStage> {
        match self {
            TurnStage::Start => None,
            TurnStage::ContextPrepared => Some(TurnStage::Start),
            TurnStage::ModelInvoked => Some(TurnStage::ContextPrepared),
            TurnStage::Bookkept => Some(TurnStage::ModelInvoked),
            TurnStage::Done => Some(TurnStage::Bookkept),
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStage::Start => write!(f, "start"),
            TurnStage::ContextPrepared => write!(f, "context_prepared"),
            TurnStage::ModelInvoked => write!(f, "model_invoked"),
            TurnStage::Bookkept => write!(f, "bookkept"),
            TurnStage::Done => write!(f, "done"),
        }
    }
}

/// How the model invocation stage resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The live model answered.
    Live,
    /// No live model; the deterministic reply was used.
    Disabled,
    /// The model call failed.
    Failed,
    /// The model call exceeded the turn deadline.
    TimedOut,
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationOutcome::Live => write!(f, "live"),
            InvocationOutcome::Disabled => write!(f, "disabled"),
            InvocationOutcome::Failed => write!(f, "failed"),
            InvocationOutcome::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Working state of a single turn.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub thread: ConversationThread,
    pub session_id: String,
    pub user_type: String,
    pub processed: bool,
    pub stage: TurnStage,
    pub outcome: Option<InvocationOutcome>,
    /// True if no thread existed for the session before this turn.
    pub is_new_session: bool,
}

impl PipelineState {
    pub fn new(session_id: impl Into<String>, user_type: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            thread: ConversationThread::new(session_id.clone()),
            session_id,
            user_type: user_type.into(),
            processed: false,
            stage: TurnStage::Start,
            outcome: None,
            is_new_session: false,
        }
    }

    /// Fail unless the turn is currently at `stage`.
    pub fn require(&self, stage: TurnStage) -> Result<(), TurnError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(TurnError::StageOrder {
                expected: stage.to_string(),
                actual: self.stage.to_string(),
            })
        }
    }

    /// Move to `to`, which must directly follow the current stage.
    pub fn advance(&mut self, to: TurnStage) -> Result<(), TurnError> {
        match to.previous() {
            Some(prev) if prev == self.stage => {
                self.stage = to;
                Ok(())
            }
            prev => Err(TurnError::StageOrder {
                expected: prev.map_or_else(|| "none".to_string(), |s| s.to_string()),
                actual: self.stage.to_string(),
            }),
        }
    }
}
