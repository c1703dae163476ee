use crate::infrastructure::error::{CliError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use turnstile_core::{ParticipantId, Roster, TurnAction, TurnConfig, TurnError};
use turnstile_runtime::{ChannelSink, SessionClient, SessionRuntime};

/// A simulated session: who plays, who goes quiet, for how long
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub participants: Vec<ParticipantId>,
    /// Participants that stop heartbeating after `silent_after`
    pub silent: Vec<ParticipantId>,
    pub silent_after: Duration,
    pub duration: Duration,
    pub config: TurnConfig,
}

impl SimulationPlan {
    pub fn new<I, P>(participants: I, config: TurnConfig) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        Self {
            participants: participants.into_iter().map(Into::into).collect(),
            silent: Vec::new(),
            silent_after: Duration::ZERO,
            duration: Duration::from_secs(120),
            config,
        }
    }

    /// `count` participants with freshly generated ids
    pub fn generated(count: usize, config: TurnConfig) -> Self {
        Self::new((0..count).map(|_| ParticipantId::random()), config)
    }

    /// Silence whoever sits at `seat` in turn order
    pub fn with_silent_seat(self, seat: usize) -> Result<Self> {
        let participant = self.participants.get(seat).cloned().ok_or_else(|| {
            CliError::InvalidConfig(format!(
                "no participant at seat {} (roster has {})",
                seat,
                self.participants.len()
            ))
        })?;
        Ok(self.with_silent(participant))
    }

    pub fn with_silent(mut self, participant: impl Into<ParticipantId>) -> Self {
        self.silent.push(participant.into());
        self
    }

    pub fn with_silent_after(mut self, after: Duration) -> Self {
        self.silent_after = after;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Heartbeats go out twice per liveness check
    pub fn heartbeat_every(&self) -> Duration {
        (self.config.heartbeat_check_interval() / 2).max(Duration::from_millis(1))
    }

    fn roster(&self) -> Result<Roster> {
        let roster = Roster::new(self.participants.iter().cloned()).map_err(TurnError::from)?;

        if let Some(unknown) = self.silent.iter().find(|id| roster.index_of(id).is_none()) {
            return Err(CliError::InvalidConfig(format!(
                "silent participant {} is not in the roster",
                unknown
            )));
        }

        Ok(roster)
    }
}

/// Why a simulation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// Ran for the planned duration
    Completed,
    /// Nobody was reachable any more
    Suspended,
    /// Stopped from outside (Ctrl+C)
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub outcome: SimulationOutcome,
    pub actions: Vec<TurnAction>,
}

impl SimulationReport {
    pub fn count(&self, kind: &str) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }
}

/// Run a session on the wall clock, writing every action to `out` as one JSON line
pub async fn run_simulation<W, F>(plan: SimulationPlan, out: &mut W, interrupt: F) -> Result<SimulationReport>
where
    W: Write,
    F: Future<Output = ()>,
{
    let roster = plan.roster()?;
    let (sink, mut actions) = ChannelSink::channel();
    let handle = SessionRuntime::spawn(roster, plan.config.clone(), sink)?;

    tracing::info!(
        "🎲 Simulating {} participants for {:?} ({} silent after {:?})",
        plan.participants.len(),
        plan.duration,
        plan.silent.len(),
        plan.silent_after
    );

    let pulse = spawn_heartbeats(handle.client(), &plan);
    handle.start_turn(0).await?;

    let finished = tokio::time::sleep(plan.duration);
    tokio::pin!(finished);
    tokio::pin!(interrupt);

    let mut emitted = Vec::new();
    let outcome = loop {
        tokio::select! {
            action = actions.recv() => {
                let Some(action) = action else {
                    break SimulationOutcome::Completed;
                };

                writeln!(out, "{}", serde_json::to_string(&action)?)?;
                let suspended = matches!(action, TurnAction::GameSuspended { .. });
                emitted.push(action);

                if suspended {
                    break SimulationOutcome::Suspended;
                }
            }
            _ = &mut finished => break SimulationOutcome::Completed,
            _ = &mut interrupt => {
                tracing::info!("🛑 Interrupted");
                break SimulationOutcome::Interrupted;
            }
        }
    };

    pulse.abort();
    handle.shutdown().await;
    out.flush()?;

    tracing::info!("Simulation ended ({:?}) after {} actions", outcome, emitted.len());

    Ok(SimulationReport {
        outcome,
        actions: emitted,
    })
}

fn spawn_heartbeats(client: SessionClient, plan: &SimulationPlan) -> JoinHandle<()> {
    let participants = plan.participants.clone();
    let silent: HashSet<ParticipantId> = plan.silent.iter().cloned().collect();
    let silent_after = plan.silent_after;
    let every = plan.heartbeat_every();

    tokio::spawn(async move {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;
            let quiet = started.elapsed() >= silent_after;

            for id in &participants {
                if quiet && silent.contains(id) {
                    continue;
                }
                if let Err(e) = client.record_heartbeat(id.clone()).await {
                    tracing::debug!("Heartbeat loop stopping: {}", e);
                    return;
                }
            }
        }
    })
}
