use crate::application::{ConfigError, TurnConfig};
use crate::domain::{
    ActionSink, ArmedTimer, LivenessMonitor, LivenessStatus, LivenessTransition, ObserverId,
    Observers, Participant, ParticipantId, Roster, RosterError, TimerKind, TimerSlot, TimerToken,
    Timestamp, TurnAction,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where the session is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No turn started yet
    Idle,
    /// A participant holds the turn, deadline armed
    Active,
    /// The active participant dropped, grace timer armed
    AwaitingGrace,
    /// Nobody reachable; only an explicit `start_turn` leaves this phase
    Suspended,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "Idle"),
            TurnPhase::Active => write!(f, "Active"),
            TurnPhase::AwaitingGrace => write!(f, "AwaitingGrace"),
            TurnPhase::Suspended => write!(f, "Suspended"),
        }
    }
}

/// Errors reported synchronously to the caller of a coordinator operation
///
/// Disconnects, timeouts and total outage are not errors: they only show up
/// in the action stream.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TurnError {
    #[error("Participant index {index} out of range (roster has {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("It is not {0}'s turn")]
    NotYourTurn(ParticipantId),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Owns the single active turn of a session
///
/// Every method takes `now` from the caller and must be called from one place
/// at a time (the runtime actor, or a test driving time by hand). Timers are
/// plain data here: the driver asks for `next_deadline` and calls
/// `poll_timers` once it has passed.
#[derive(Debug)]
pub struct TurnCoordinator<S: ActionSink> {
    roster: Roster,
    /// One per roster entry, same order
    monitors: Vec<LivenessMonitor>,
    config: TurnConfig,
    sink: S,
    active_index: usize,
    phase: TurnPhase,
    turn_deadline: TimerSlot,
    grace: TimerSlot,
    turn_observers: Observers<Participant>,
    actions_emitted: u64,
}

impl<S: ActionSink> TurnCoordinator<S> {
    pub fn new(roster: Roster, config: TurnConfig, sink: S, now: Timestamp) -> Result<Self, TurnError> {
        config.validate()?;

        let monitors = roster
            .iter()
            .map(|p| LivenessMonitor::new(p.id().clone(), now, config.disconnect_threshold()))
            .collect();

        tracing::info!(
            "🎯 Turn coordinator created for {} participants",
            roster.len()
        );

        Ok(Self {
            roster,
            monitors,
            config,
            sink,
            active_index: 0,
            phase: TurnPhase::Idle,
            turn_deadline: TimerSlot::new(TimerKind::TurnDeadline),
            grace: TimerSlot::new(TimerKind::Grace),
            turn_observers: Observers::new(),
            actions_emitted: 0,
        })
    }

    /// Build the roster and the coordinator in one go
    pub fn from_ids<I, P>(ids: I, config: TurnConfig, sink: S, now: Timestamp) -> Result<Self, TurnError>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let roster = Roster::new(ids)?;
        Self::new(roster, config, sink, now)
    }

    // ===== Turn flow =====

    /// Hand the turn to the participant at `index`
    ///
    /// Also the way back out of `Suspended` once play is restored externally.
    pub fn start_turn(&mut self, index: usize, now: Timestamp) -> Result<(), TurnError> {
        if index >= self.roster.len() {
            return Err(TurnError::InvalidIndex {
                index,
                len: self.roster.len(),
            });
        }

        self.begin_turn(index, now);
        Ok(())
    }

    /// Move the turn to the next reachable participant in cyclic order
    ///
    /// Probes at most one full cycle (the current participant last). If nobody
    /// is reachable the session is suspended.
    pub fn advance(&mut self, now: Timestamp) {
        if self.phase == TurnPhase::Suspended {
            tracing::debug!("Advance ignored, session suspended");
            return;
        }

        let len = self.roster.len();
        let start = self.roster.next_index(self.active_index);

        for probe in 0..len {
            let index = (start + probe) % len;
            if self.monitors[index].is_reachable() {
                self.begin_turn(index, now);
                return;
            }
            tracing::debug!(
                "⏭️  Skipping unreachable participant {}",
                self.monitors[index].participant()
            );
        }

        self.suspend(now);
    }

    /// The active participant finished their move
    pub fn complete_turn(&mut self, participant: &ParticipantId, now: Timestamp) -> Result<(), TurnError> {
        let index = self.index_of(participant)?;

        if self.phase == TurnPhase::Suspended {
            tracing::debug!("Turn completion by {} ignored, session suspended", participant);
            return Ok(());
        }

        if !self.holds_turn(index) {
            return Err(TurnError::NotYourTurn(participant.clone()));
        }

        tracing::info!("✅ {} completed their turn", participant);
        self.advance(now);
        Ok(())
    }

    fn begin_turn(&mut self, index: usize, now: Timestamp) {
        self.turn_deadline.cancel();
        self.grace.cancel();

        self.active_index = index;
        self.phase = TurnPhase::Active;

        let participant = self.roster.as_slice()[index].clone();
        tracing::info!("▶️  Turn started for {} (index {})", participant.id(), index);

        self.emit(TurnAction::turn_start(participant.id().clone(), now));
        self.turn_deadline
            .arm(now.after(self.config.turn_timeout()), index);
        self.turn_observers.notify(&participant);
    }

    fn suspend(&mut self, now: Timestamp) {
        self.turn_deadline.cancel();
        self.grace.cancel();
        self.phase = TurnPhase::Suspended;

        tracing::warn!("⏸️  No reachable participants, suspending session");
        self.emit(TurnAction::game_suspended(now));
    }

    // ===== Liveness feed =====

    /// Inbound liveness signal from the transport
    pub fn record_heartbeat(&mut self, participant: &ParticipantId, now: Timestamp) -> Result<(), TurnError> {
        let index = self.index_of(participant)?;

        if let Some(transition) = self.monitors[index].record_heartbeat(now) {
            self.react(index, &transition, now);
        }
        Ok(())
    }

    /// Periodic liveness check over every monitor, in roster order
    pub fn check_liveness(&mut self, now: Timestamp) -> Vec<LivenessTransition> {
        let mut transitions = Vec::new();

        for index in 0..self.monitors.len() {
            if let Some(transition) = self.monitors[index].check(now) {
                self.react(index, &transition, now);
                transitions.push(transition);
            }
        }

        transitions
    }

    /// Liveness hook: a participant went unreachable
    pub fn on_participant_unreachable(&mut self, participant: &ParticipantId, now: Timestamp) -> Result<(), TurnError> {
        let index = self.index_of(participant)?;
        self.handle_unreachable(index, now);
        Ok(())
    }

    /// Liveness hook: a participant became reachable again
    pub fn on_participant_reachable(&mut self, participant: &ParticipantId, now: Timestamp) -> Result<(), TurnError> {
        let index = self.index_of(participant)?;
        self.handle_reachable(index, now);
        Ok(())
    }

    fn react(&mut self, index: usize, transition: &LivenessTransition, now: Timestamp) {
        if transition.is_reachable() {
            self.handle_reachable(index, now);
        } else {
            self.handle_unreachable(index, now);
        }
    }

    fn handle_unreachable(&mut self, index: usize, now: Timestamp) {
        // Other participants only matter for later skip decisions
        if !self.holds_turn(index) {
            return;
        }

        let deadline = now.after(self.config.reconnect_grace());
        self.grace.arm(deadline, index);
        self.phase = TurnPhase::AwaitingGrace;

        tracing::warn!(
            "⚠️  Active participant {} unreachable, grace period until {}",
            self.monitors[index].participant(),
            deadline
        );
    }

    fn handle_reachable(&mut self, index: usize, _now: Timestamp) {
        if index != self.active_index || self.phase != TurnPhase::AwaitingGrace {
            return;
        }

        // The grace timer stays armed; its expiry re-checks reachability
        self.phase = TurnPhase::Active;
        tracing::info!(
            "🔄 Active participant {} back within grace period",
            self.monitors[index].participant()
        );
    }

    // ===== Timers =====

    /// Deliver a timer expiry identified by its token
    ///
    /// Returns false (and changes nothing) if the token was cancelled or
    /// superseded since it was armed.
    pub fn fire(&mut self, token: TimerToken, now: Timestamp) -> bool {
        let slot = match token.kind {
            TimerKind::TurnDeadline => &mut self.turn_deadline,
            TimerKind::Grace => &mut self.grace,
        };

        match slot.take_if_current(token) {
            Some(armed) => {
                self.dispatch(armed, now);
                true
            }
            None => {
                tracing::debug!(
                    "Ignoring stale {} timer (generation {})",
                    token.kind,
                    token.generation
                );
                false
            }
        }
    }

    /// Fire every timer whose deadline has passed, earliest first
    pub fn poll_timers(&mut self, now: Timestamp) -> usize {
        let mut fired = 0;

        while let Some(kind) = self.earliest_due(now) {
            let armed = match kind {
                TimerKind::TurnDeadline => self.turn_deadline.take_due(now),
                TimerKind::Grace => self.grace.take_due(now),
            };

            if let Some(armed) = armed {
                self.dispatch(armed, now);
                fired += 1;
            }
        }

        fired
    }

    /// Earliest armed deadline, if any
    pub fn next_deadline(&self) -> Option<Timestamp> {
        match (self.turn_deadline.deadline(), self.grace.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn earliest_due(&self, now: Timestamp) -> Option<TimerKind> {
        let due = |slot: &TimerSlot| slot.deadline().filter(|deadline| *deadline <= now);

        match (due(&self.turn_deadline), due(&self.grace)) {
            (Some(turn), Some(grace)) if grace < turn => Some(TimerKind::Grace),
            (Some(_), _) => Some(TimerKind::TurnDeadline),
            (None, Some(_)) => Some(TimerKind::Grace),
            (None, None) => None,
        }
    }

    fn dispatch(&mut self, armed: ArmedTimer, now: Timestamp) {
        match armed.token.kind {
            TimerKind::TurnDeadline => self.on_turn_deadline(armed, now),
            TimerKind::Grace => self.on_grace_expired(armed, now),
        }
    }

    fn on_turn_deadline(&mut self, armed: ArmedTimer, now: Timestamp) {
        if !self.holds_turn(armed.participant) {
            tracing::debug!("Turn deadline for index {} no longer current", armed.participant);
            return;
        }

        let participant = self.monitors[armed.participant].participant().clone();
        tracing::warn!("⏰ Turn timed out for {}", participant);

        self.emit(TurnAction::auto_pass(participant, now));
        self.advance(now);
    }

    fn on_grace_expired(&mut self, armed: ArmedTimer, now: Timestamp) {
        if !self.holds_turn(armed.participant) {
            tracing::debug!("Grace timer for index {} no longer current", armed.participant);
            return;
        }

        let monitor = &self.monitors[armed.participant];
        if monitor.is_reachable() {
            tracing::debug!("Grace expired but {} is reachable, no handoff", monitor.participant());
            self.phase = TurnPhase::Active;
            return;
        }

        let participant = monitor.participant().clone();
        tracing::warn!("🚨 Emergency handoff away from {}", participant);

        self.emit(TurnAction::emergency_handoff(participant, now));
        self.advance(now);
    }

    fn emit(&mut self, action: TurnAction) {
        tracing::debug!("📤 Emitting {}", action.kind());
        if let Err(e) = self.sink.send(action) {
            tracing::warn!("❌ Failed to hand action to sink: {}", e);
        }
        self.actions_emitted += 1;
    }

    // ===== Observers =====

    /// Observe every turn start, in registration order
    pub fn subscribe_turn_change<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&Participant) + Send + 'static,
    {
        self.turn_observers.subscribe(observer)
    }

    pub fn unsubscribe_turn_change(&mut self, id: ObserverId) -> bool {
        self.turn_observers.unsubscribe(id)
    }

    pub fn subscribe_unreachable<F>(&mut self, participant: &ParticipantId, observer: F) -> Result<ObserverId, TurnError>
    where
        F: FnMut(&LivenessTransition) + Send + 'static,
    {
        let index = self.index_of(participant)?;
        Ok(self.monitors[index].subscribe_unreachable(observer))
    }

    pub fn subscribe_reachable<F>(&mut self, participant: &ParticipantId, observer: F) -> Result<ObserverId, TurnError>
    where
        F: FnMut(&LivenessTransition) + Send + 'static,
    {
        let index = self.index_of(participant)?;
        Ok(self.monitors[index].subscribe_reachable(observer))
    }

    pub fn unsubscribe_liveness(&mut self, participant: &ParticipantId, id: ObserverId) -> Result<bool, TurnError> {
        let index = self.index_of(participant)?;
        Ok(self.monitors[index].unsubscribe(id))
    }

    // ===== Settings =====

    /// Applies to turns started after the call
    ///
    /// Durations below one millisecond are rejected like a zero
    /// `turnTimeoutMs` in the config.
    pub fn set_turn_timeout(&mut self, timeout: Duration) -> Result<(), TurnError> {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "turnTimeoutMs",
            }
            .into());
        }

        self.config.turn_timeout_ms = ms;
        tracing::debug!("Turn timeout set to {}ms", ms);
        Ok(())
    }

    // ===== Queries =====

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Participant holding (or last holding) the turn; `None` before the first turn
    pub fn active_participant(&self) -> Option<&Participant> {
        match self.phase {
            TurnPhase::Idle => None,
            _ => self.roster.get(self.active_index),
        }
    }

    pub fn is_participant_turn(&self, participant: &ParticipantId) -> bool {
        self.roster
            .index_of(participant)
            .is_some_and(|index| self.holds_turn(index))
    }

    pub fn participants(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    pub fn liveness(&self, participant: &ParticipantId) -> Option<&LivenessMonitor> {
        self.roster
            .index_of(participant)
            .map(|index| &self.monitors[index])
    }

    pub fn liveness_statuses(&self) -> Vec<LivenessStatus> {
        self.monitors.iter().map(LivenessMonitor::status).collect()
    }

    pub fn turn_deadline(&self) -> Option<&ArmedTimer> {
        self.turn_deadline.armed()
    }

    pub fn grace_timer(&self) -> Option<&ArmedTimer> {
        self.grace.armed()
    }

    pub fn actions_emitted(&self) -> u64 {
        self.actions_emitted
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn index_of(&self, participant: &ParticipantId) -> Result<usize, TurnError> {
        self.roster
            .index_of(participant)
            .ok_or_else(|| TurnError::UnknownParticipant(participant.clone()))
    }

    fn holds_turn(&self, index: usize) -> bool {
        index == self.active_index
            && matches!(self.phase, TurnPhase::Active | TurnPhase::AwaitingGrace)
    }
}
