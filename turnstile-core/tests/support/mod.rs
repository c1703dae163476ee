use std::collections::HashSet;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_core::{ParticipantId, Timestamp, TurnAction, TurnConfig, TurnCoordinator};

/// Milliseconds between simulation steps
const STEP_MS: u64 = 100;

/// Milliseconds between heartbeats of non-silent participants
const HEARTBEAT_MS: u64 = 1_000;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// Drives a coordinator through simulated time
///
/// Each step: heartbeats for participants that are not silenced, then the
/// periodic liveness check when it is due, then timer expiries.
pub struct SessionFixture {
    pub coordinator: TurnCoordinator<Vec<TurnAction>>,
    now: u64,
    silent: HashSet<ParticipantId>,
}

impl SessionFixture {
    pub fn new(ids: &[&str]) -> Self {
        Self::with_config(ids, TurnConfig::default())
    }

    pub fn with_config(ids: &[&str], config: TurnConfig) -> Self {
        init_test_tracing();

        let coordinator =
            TurnCoordinator::from_ids(ids.iter().copied(), config, Vec::new(), Timestamp::ZERO)
                .expect("valid session");

        Self {
            coordinator,
            now: 0,
            silent: HashSet::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now)
    }

    pub fn start_turn(&mut self, index: usize) {
        let now = self.now();
        self.coordinator.start_turn(index, now).expect("valid index");
    }

    /// Stop heartbeating for a participant
    pub fn silence(&mut self, id: &str) {
        self.silent.insert(id.into());
    }

    /// Resume regular heartbeats for a participant
    pub fn unsilence(&mut self, id: &str) {
        self.silent.remove(&ParticipantId::from(id));
    }

    /// One-off heartbeat at the current time
    pub fn heartbeat(&mut self, id: &str) {
        let now = self.now();
        self.coordinator
            .record_heartbeat(&id.into(), now)
            .expect("known participant");
    }

    /// Advance simulated time up to and including `target_ms`
    pub fn run_until(&mut self, target_ms: u64) {
        let check_every = self.coordinator.config().heartbeat_check_interval_ms;

        while self.now < target_ms {
            self.now += STEP_MS;
            let now = self.now();

            if self.now % HEARTBEAT_MS == 0 {
                let ids: Vec<ParticipantId> = self
                    .coordinator
                    .participants()
                    .iter()
                    .map(|p| p.id().clone())
                    .filter(|id| !self.silent.contains(id))
                    .collect();

                for id in ids {
                    self.coordinator
                        .record_heartbeat(&id, now)
                        .expect("known participant");
                }
            }

            if self.now % check_every == 0 {
                self.coordinator.check_liveness(now);
            }

            self.coordinator.poll_timers(now);
        }
    }

    pub fn actions(&self) -> &[TurnAction] {
        self.coordinator.sink()
    }

    /// Number of actions of `kind` for `participant`
    pub fn count(&self, kind: &str, participant: &str) -> usize {
        self.actions()
            .iter()
            .filter(|a| a.kind() == kind)
            .filter(|a| a.participant().map(ParticipantId::as_str) == Some(participant))
            .count()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.actions().iter().filter(|a| a.kind() == kind).count()
    }

    /// Actions emitted at or after `millis`
    pub fn actions_since(&self, millis: u64) -> Vec<TurnAction> {
        self.actions()
            .iter()
            .filter(|a| a.timestamp().as_millis() >= millis)
            .cloned()
            .collect()
    }
}
