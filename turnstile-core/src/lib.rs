pub mod application;
pub mod domain;

pub use application::{ConfigError, TurnConfig, TurnCoordinator, TurnError, TurnPhase};
pub use domain::{
    ActionReason, ActionSink, LivenessMonitor, LivenessStatus, LivenessTransition, ObserverId,
    Participant, ParticipantId, Roster, RosterError, SinkError, TimerKind, TimerToken, Timestamp,
    TurnAction,
};
