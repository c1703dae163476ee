use crate::domain::{ObserverId, Observers, ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A change in a participant's reachability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LivenessTransition {
    /// No signal for longer than the disconnect threshold
    Unreachable {
        participant: ParticipantId,
        last_signal_at: Timestamp,
        detected_at: Timestamp,
    },
    /// A signal arrived while the participant was unreachable
    Reachable {
        participant: ParticipantId,
        at: Timestamp,
    },
}

impl LivenessTransition {
    pub fn participant(&self) -> &ParticipantId {
        match self {
            LivenessTransition::Unreachable { participant, .. } => participant,
            LivenessTransition::Reachable { participant, .. } => participant,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, LivenessTransition::Reachable { .. })
    }
}

/// Read-only view of one monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessStatus {
    pub participant: ParticipantId,
    pub reachable: bool,
    pub last_signal_at: Timestamp,
}

/// Tracks whether a single participant is reachable
///
/// Poll-based: heartbeats only refresh `last_signal_at` (and restore
/// reachability), while `check` is called on a fixed cadence and decides when
/// the participant has gone quiet. With a 5s cadence and a 15s threshold a
/// single dropped heartbeat never flips the state.
#[derive(Debug)]
pub struct LivenessMonitor {
    participant: ParticipantId,
    reachable: bool,
    last_signal_at: Timestamp,
    disconnect_threshold: Duration,
    on_unreachable: Observers<LivenessTransition>,
    on_reachable: Observers<LivenessTransition>,
}

impl LivenessMonitor {
    /// Create a monitor that starts out reachable, as if a signal arrived at `now`
    pub fn new(participant: ParticipantId, now: Timestamp, disconnect_threshold: Duration) -> Self {
        Self {
            participant,
            reachable: true,
            last_signal_at: now,
            disconnect_threshold,
            on_unreachable: Observers::new(),
            on_reachable: Observers::new(),
        }
    }

    /// Record any liveness signal from the participant
    ///
    /// Returns the `Reachable` transition if the participant was unreachable.
    pub fn record_heartbeat(&mut self, now: Timestamp) -> Option<LivenessTransition> {
        self.last_signal_at = self.last_signal_at.max(now);

        if self.reachable {
            return None;
        }

        self.reachable = true;
        let transition = LivenessTransition::Reachable {
            participant: self.participant.clone(),
            at: now,
        };
        tracing::info!("🟢 Participant {} reachable again", self.participant);
        self.on_reachable.notify(&transition);
        Some(transition)
    }

    /// Periodic check, fires at most once per disconnect episode
    pub fn check(&mut self, now: Timestamp) -> Option<LivenessTransition> {
        if !self.reachable {
            return None;
        }

        let silence = now.since(self.last_signal_at);
        if silence <= self.disconnect_threshold {
            return None;
        }

        self.reachable = false;
        let transition = LivenessTransition::Unreachable {
            participant: self.participant.clone(),
            last_signal_at: self.last_signal_at,
            detected_at: now,
        };
        tracing::warn!(
            "🔴 Participant {} unreachable (silent for {:?})",
            self.participant,
            silence
        );
        self.on_unreachable.notify(&transition);
        Some(transition)
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn last_signal_at(&self) -> Timestamp {
        self.last_signal_at
    }

    pub fn status(&self) -> LivenessStatus {
        LivenessStatus {
            participant: self.participant.clone(),
            reachable: self.reachable,
            last_signal_at: self.last_signal_at,
        }
    }

    pub fn subscribe_unreachable<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&LivenessTransition) + Send + 'static,
    {
        self.on_unreachable.subscribe(observer)
    }

    pub fn subscribe_reachable<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&LivenessTransition) + Send + 'static,
    {
        self.on_reachable.subscribe(observer)
    }

    /// Remove an observer from whichever list holds it
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.on_unreachable.unsubscribe(id) || self.on_reachable.unsubscribe(id)
    }
}
