use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_core::{Roster, Timestamp, TurnAction, TurnConfig};
use turnstile_runtime::{ChannelSink, SessionClock, SessionHandle, SessionRuntime};

/// Gap between heartbeats of kept-alive participants
const HEARTBEAT_EVERY: Duration = Duration::from_secs(1);

/// Longest a test waits for the next action
const ACTION_WAIT: Duration = Duration::from_secs(300);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

pub fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

/// Running session on a clock anchored at timestamp zero
///
/// Meant for `#[tokio::test(start_paused = true)]`, where tokio skips ahead
/// to the next timer whenever every task is idle.
pub struct RuntimeFixture {
    pub handle: SessionHandle,
    pub actions: mpsc::UnboundedReceiver<TurnAction>,
    pub clock: SessionClock,
    pulses: Vec<JoinHandle<()>>,
}

impl RuntimeFixture {
    pub fn new(ids: &[&str]) -> Self {
        Self::with_config(ids, TurnConfig::default())
    }

    pub fn with_config(ids: &[&str], config: TurnConfig) -> Self {
        init_test_tracing();

        let clock = SessionClock::starting_at(Timestamp::ZERO);
        let (sink, actions) = ChannelSink::channel();
        let roster = Roster::new(ids.iter().copied()).expect("valid roster");
        let handle =
            SessionRuntime::spawn_with_clock(roster, config, sink, clock).expect("valid session");

        Self {
            handle,
            actions,
            clock,
            pulses: Vec::new(),
        }
    }

    /// Heartbeat the given participants every second until the fixture is shut down
    pub fn keep_alive(&mut self, ids: &[&str]) {
        let client = self.handle.client();
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        self.pulses.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_EVERY);
            loop {
                ticker.tick().await;
                for id in &ids {
                    if client.record_heartbeat(id.as_str()).await.is_err() {
                        return;
                    }
                }
            }
        }));
    }

    /// Stop every keep-alive task
    pub fn silence_all(&mut self) {
        for pulse in self.pulses.drain(..) {
            pulse.abort();
        }
    }

    /// Sleep until the session clock reads `millis`
    pub async fn advance_to(&self, millis: u64) {
        tokio::time::sleep_until(self.clock.instant_at(at(millis))).await;
    }

    pub async fn next_action(&mut self) -> TurnAction {
        tokio::time::timeout(ACTION_WAIT, self.actions.recv())
            .await
            .expect("action within wait window")
            .expect("sink open")
    }

    /// Assert nothing is emitted for `window`
    pub async fn expect_quiet(&mut self, window: Duration) {
        if let Ok(action) = tokio::time::timeout(window, self.actions.recv()).await {
            panic!("unexpected action: {:?}", action);
        }
    }

    pub async fn shutdown(mut self) {
        self.silence_all();
        self.handle.shutdown().await;
    }
}
