pub mod action;
pub mod liveness;
pub mod observer;
pub mod participant;
pub mod roster;
pub mod timer;

pub use action::{ActionReason, ActionSink, SinkError, TurnAction};
pub use liveness::{LivenessMonitor, LivenessStatus, LivenessTransition};
pub use observer::{ObserverId, Observers};
pub use participant::{Participant, ParticipantId, Timestamp};
pub use roster::{Roster, RosterError};
pub use timer::{ArmedTimer, TimerKind, TimerSlot, TimerToken};
