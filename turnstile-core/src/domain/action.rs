use crate::domain::{ParticipantId, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Why a turn was taken away or the game stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionReason {
    Timeout,
    Disconnection,
    AllUnreachable,
}

/// Outbound action, handed to the transport for broadcast
///
/// Serializes as `{"kind": "...", "participant": "...", "reason": "...", "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnAction {
    /// A participant's turn begins
    TurnStart {
        participant: ParticipantId,
        timestamp: Timestamp,
    },

    /// The active participant ran out of time
    AutoPass {
        participant: ParticipantId,
        reason: ActionReason,
        timestamp: Timestamp,
    },

    /// The active participant dropped and did not come back within the grace period
    EmergencyHandoff {
        participant: ParticipantId,
        reason: ActionReason,
        timestamp: Timestamp,
    },

    /// Nobody is reachable, play stops
    GameSuspended {
        reason: ActionReason,
        timestamp: Timestamp,
    },
}

impl TurnAction {
    pub fn turn_start(participant: ParticipantId, timestamp: Timestamp) -> Self {
        TurnAction::TurnStart {
            participant,
            timestamp,
        }
    }

    pub fn auto_pass(participant: ParticipantId, timestamp: Timestamp) -> Self {
        TurnAction::AutoPass {
            participant,
            reason: ActionReason::Timeout,
            timestamp,
        }
    }

    pub fn emergency_handoff(participant: ParticipantId, timestamp: Timestamp) -> Self {
        TurnAction::EmergencyHandoff {
            participant,
            reason: ActionReason::Disconnection,
            timestamp,
        }
    }

    pub fn game_suspended(timestamp: Timestamp) -> Self {
        TurnAction::GameSuspended {
            reason: ActionReason::AllUnreachable,
            timestamp,
        }
    }

    /// Wire name of the action kind
    pub fn kind(&self) -> &'static str {
        match self {
            TurnAction::TurnStart { .. } => "turn_start",
            TurnAction::AutoPass { .. } => "auto_pass",
            TurnAction::EmergencyHandoff { .. } => "emergency_handoff",
            TurnAction::GameSuspended { .. } => "game_suspended",
        }
    }

    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            TurnAction::TurnStart { participant, .. }
            | TurnAction::AutoPass { participant, .. }
            | TurnAction::EmergencyHandoff { participant, .. } => Some(participant),
            TurnAction::GameSuspended { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<ActionReason> {
        match self {
            TurnAction::TurnStart { .. } => None,
            TurnAction::AutoPass { reason, .. }
            | TurnAction::EmergencyHandoff { reason, .. }
            | TurnAction::GameSuspended { reason, .. } => Some(*reason),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            TurnAction::TurnStart { timestamp, .. }
            | TurnAction::AutoPass { timestamp, .. }
            | TurnAction::EmergencyHandoff { timestamp, .. }
            | TurnAction::GameSuspended { timestamp, .. } => *timestamp,
        }
    }
}

/// Errors a sink may report when handing off an action
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SinkError {
    #[error("Action sink closed")]
    Closed,
}

/// Destination for outbound actions (allows mocking in tests)
pub trait ActionSink {
    fn send(&mut self, action: TurnAction) -> Result<(), SinkError>;
}

/// Collects actions in memory
impl ActionSink for Vec<TurnAction> {
    fn send(&mut self, action: TurnAction) -> Result<(), SinkError> {
        self.push(action);
        Ok(())
    }
}
