use crate::clock::SessionClock;
use crate::error::Result;
use serde::Serialize;
use std::ops::Deref;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use turnstile_core::{
    ActionSink, LivenessStatus, ParticipantId, Roster, Timestamp, TurnConfig, TurnCoordinator,
    TurnError, TurnPhase,
};

/// Capacity of the command channel
const COMMAND_BUFFER: usize = 100;

type Reply = oneshot::Sender<std::result::Result<(), TurnError>>;

/// Snapshot of coordinator state (read-only, cheap to clone)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSnapshot {
    pub phase: TurnPhase,
    pub active_participant: Option<ParticipantId>,
    pub liveness: Vec<LivenessStatus>,
    pub actions_emitted: u64,
    pub next_deadline: Option<Timestamp>,
}

impl TurnSnapshot {
    fn capture<S: ActionSink>(coordinator: &TurnCoordinator<S>) -> Self {
        Self {
            phase: coordinator.phase(),
            active_participant: coordinator.active_participant().map(|p| p.id().clone()),
            liveness: coordinator.liveness_statuses(),
            actions_emitted: coordinator.actions_emitted(),
            next_deadline: coordinator.next_deadline(),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.phase == TurnPhase::Suspended
    }

    pub fn reachable_count(&self) -> usize {
        self.liveness.iter().filter(|s| s.reachable).count()
    }
}

/// Triggers delivered to the coordinator actor
#[derive(Debug)]
pub enum SessionCommand {
    Heartbeat {
        participant: ParticipantId,
        reply: Reply,
    },
    StartTurn {
        index: usize,
        reply: Reply,
    },
    Advance,
    CompleteTurn {
        participant: ParticipantId,
        reply: Reply,
    },
    SetTurnTimeout {
        timeout: Duration,
        reply: Reply,
    },
    Shutdown,
}

/// Cloneable access to a running session
#[derive(Debug, Clone)]
pub struct SessionClient {
    cmd_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<TurnSnapshot>,
}

impl SessionClient {
    /// Liveness signal for a participant
    pub async fn record_heartbeat(&self, participant: impl Into<ParticipantId>) -> Result<()> {
        let participant = participant.into();
        self.request(|reply| SessionCommand::Heartbeat { participant, reply })
            .await
    }

    pub async fn start_turn(&self, index: usize) -> Result<()> {
        self.request(|reply| SessionCommand::StartTurn { index, reply })
            .await
    }

    pub async fn advance(&self) -> Result<()> {
        self.cmd_tx.send(SessionCommand::Advance).await?;
        Ok(())
    }

    pub async fn complete_turn(&self, participant: impl Into<ParticipantId>) -> Result<()> {
        let participant = participant.into();
        self.request(|reply| SessionCommand::CompleteTurn { participant, reply })
            .await
    }

    /// Applies to turns started after the command is processed
    pub async fn set_turn_timeout(&self, timeout: Duration) -> Result<()> {
        self.request(|reply| SessionCommand::SetTurnTimeout { timeout, reply })
            .await
    }

    /// Get latest state snapshot (always succeeds, never blocks)
    pub fn snapshot(&self) -> TurnSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<TurnSnapshot> {
        self.state_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    async fn request<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(Reply) -> SessionCommand,
    {
        let (reply, response) = oneshot::channel();
        self.cmd_tx.send(build(reply)).await?;
        response.await??;
        Ok(())
    }
}

/// Owner of a running session task
#[derive(Debug)]
pub struct SessionHandle {
    client: SessionClient,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn client(&self) -> SessionClient {
        self.client.clone()
    }

    /// Stop the actor; every armed timer goes with it
    pub async fn shutdown(self) {
        if self.client.cmd_tx.send(SessionCommand::Shutdown).await.is_err() {
            tracing::debug!("SessionRuntime already stopped");
        }

        if let Err(e) = self.task.await {
            tracing::error!("SessionRuntime task failed: {}", e);
        }
    }
}

impl Deref for SessionHandle {
    type Target = SessionClient;

    fn deref(&self) -> &SessionClient {
        &self.client
    }
}

/// Background actor owning one `TurnCoordinator`
///
/// Commands, the periodic liveness check and timer expiries are all applied
/// from this one task, in the order they are observed.
pub struct SessionRuntime<S: ActionSink> {
    coordinator: TurnCoordinator<S>,
    clock: SessionClock,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    state_tx: watch::Sender<TurnSnapshot>,
}

impl<S> SessionRuntime<S>
where
    S: ActionSink + Send + 'static,
{
    /// Spawn a session on the wall clock
    pub fn spawn(roster: Roster, config: TurnConfig, sink: S) -> Result<SessionHandle> {
        Self::spawn_with_clock(roster, config, sink, SessionClock::system())
    }

    pub fn spawn_with_clock(
        roster: Roster,
        config: TurnConfig,
        sink: S,
        clock: SessionClock,
    ) -> Result<SessionHandle> {
        let coordinator = TurnCoordinator::new(roster, config, sink, clock.now())?;
        Ok(Self::spawn_coordinator(coordinator, clock))
    }

    /// Spawn around an existing coordinator (e.g. with observers registered)
    ///
    /// `clock` must be the clock the coordinator's timestamps came from.
    pub fn spawn_coordinator(coordinator: TurnCoordinator<S>, clock: SessionClock) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(TurnSnapshot::capture(&coordinator));

        let runtime = Self {
            coordinator,
            clock,
            cmd_rx,
            state_tx,
        };
        let task = tokio::spawn(runtime.run());

        SessionHandle {
            client: SessionClient { cmd_tx, state_rx },
            task,
        }
    }

    async fn run(mut self) {
        let period = self.coordinator.config().heartbeat_check_interval();
        let mut liveness_check = tokio::time::interval_at(self.clock.start() + period, period);
        liveness_check.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "SessionRuntime started for {} participants",
            self.coordinator.participants().len()
        );

        loop {
            let wake_at = self.coordinator.next_deadline();
            let wake_instant = wake_at.map(|at| self.clock.instant_at(at));

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = liveness_check.tick() => {
                    let now = self.clock.now();
                    self.coordinator.poll_timers(now);
                    let transitions = self.coordinator.check_liveness(now);
                    if !transitions.is_empty() {
                        tracing::debug!("Liveness check produced {} transitions", transitions.len());
                    }
                }
                _ = sleep_until_deadline(wake_instant) => {
                    // Millisecond rounding must never leave the deadline unreached
                    let now = match wake_at {
                        Some(at) => self.clock.now().max(at),
                        None => self.clock.now(),
                    };
                    let fired = self.coordinator.poll_timers(now);
                    tracing::debug!("SessionRuntime fired {} timers", fired);
                }
            }

            self.publish();
        }

        tracing::info!(
            "SessionRuntime stopped after {} actions",
            self.coordinator.actions_emitted()
        );
    }

    fn handle(&mut self, cmd: SessionCommand) {
        let now = self.clock.now();

        // Expiries that are already due take effect before the command
        self.coordinator.poll_timers(now);

        match cmd {
            SessionCommand::Heartbeat { participant, reply } => {
                respond(reply, self.coordinator.record_heartbeat(&participant, now));
            }
            SessionCommand::StartTurn { index, reply } => {
                respond(reply, self.coordinator.start_turn(index, now));
            }
            SessionCommand::Advance => self.coordinator.advance(now),
            SessionCommand::CompleteTurn { participant, reply } => {
                respond(reply, self.coordinator.complete_turn(&participant, now));
            }
            SessionCommand::SetTurnTimeout { timeout, reply } => {
                respond(reply, self.coordinator.set_turn_timeout(timeout));
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn publish(&self) {
        let next = TurnSnapshot::capture(&self.coordinator);
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

fn respond(reply: Reply, result: std::result::Result<(), TurnError>) {
    if let Err(e) = &result {
        tracing::debug!("Rejected session command: {}", e);
    }
    // The caller may have stopped waiting
    let _ = reply.send(result);
}

async fn sleep_until_deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
