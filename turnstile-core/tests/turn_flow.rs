mod support;

use std::sync::{Arc, Mutex};
use support::SessionFixture;
use turnstile_core::{ActionReason, Timestamp, TurnAction, TurnConfig, TurnPhase};

const PLAYERS: [&str; 4] = ["A", "B", "C", "D"];

fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

#[test]
fn test_active_participant_dropping_is_handed_off_after_grace() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    session.silence("A");

    // Last signal at 0: the 20s check is the first to exceed 15s of silence
    session.run_until(20_000);
    assert_eq!(session.coordinator.phase(), TurnPhase::AwaitingGrace);
    assert_eq!(session.count_kind("emergency_handoff"), 0);

    session.run_until(24_900);
    assert_eq!(session.count_kind("emergency_handoff"), 0);

    // Grace (5s) after the unreachable transition
    session.run_until(25_000);
    assert_eq!(
        session.actions_since(20_000),
        vec![
            TurnAction::emergency_handoff("A".into(), at(25_000)),
            TurnAction::turn_start("B".into(), at(25_000)),
        ]
    );
    assert_eq!(session.count("emergency_handoff", "A"), 1);
    assert_eq!(session.count("turn_start", "B"), 1);
    assert!(session.coordinator.is_participant_turn(&"B".into()));
}

#[test]
fn test_reconnect_within_grace_prevents_handoff() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    session.silence("A");

    session.run_until(20_000);
    assert_eq!(session.coordinator.phase(), TurnPhase::AwaitingGrace);

    // 3s into the grace period
    session.run_until(23_000);
    session.heartbeat("A");
    assert_eq!(session.coordinator.phase(), TurnPhase::Active);

    session.run_until(29_900);
    assert_eq!(session.count_kind("emergency_handoff"), 0);
    assert!(session.coordinator.is_participant_turn(&"A".into()));
}

#[test]
fn test_turn_deadline_keeps_running_through_reconnect() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    session.silence("A");

    session.run_until(23_000);
    session.heartbeat("A");

    // The deadline armed at turn start still expires at 30s
    session.run_until(30_000);
    assert_eq!(
        session.actions_since(30_000),
        vec![
            TurnAction::auto_pass("A".into(), at(30_000)),
            TurnAction::turn_start("B".into(), at(30_000)),
        ]
    );
    assert_eq!(session.count_kind("emergency_handoff"), 0);
}

#[test]
fn test_idle_participant_is_auto_passed() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(1);

    session.run_until(29_900);
    assert_eq!(session.count_kind("auto_pass"), 0);

    session.run_until(30_000);
    assert_eq!(session.count("auto_pass", "B"), 1);
    assert_eq!(session.count("turn_start", "C"), 1);

    let auto_pass = &session.actions()[1];
    assert_eq!(auto_pass.reason(), Some(ActionReason::Timeout));
    assert_eq!(session.actions()[2].participant().unwrap().as_str(), "C");
}

#[test]
fn test_auto_pass_skips_unreachable_successor() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(1);
    session.silence("C");

    session.run_until(30_000);
    assert_eq!(session.count("auto_pass", "B"), 1);
    assert_eq!(session.count("turn_start", "C"), 0);
    assert_eq!(session.count("turn_start", "D"), 1);
}

#[test]
fn test_everyone_unreachable_suspends_exactly_once() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    for id in PLAYERS {
        session.silence(id);
    }

    session.run_until(200_000);

    assert_eq!(session.coordinator.phase(), TurnPhase::Suspended);
    assert_eq!(session.count_kind("game_suspended"), 1);
    assert_eq!(
        session.actions().last().unwrap(),
        &TurnAction::game_suspended(at(25_000))
    );
    assert!(session.coordinator.next_deadline().is_none());
    assert!(session.coordinator.turn_deadline().is_none());
    assert!(session.coordinator.grace_timer().is_none());
}

#[test]
fn test_suspended_session_stays_quiet_when_participants_return() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    for id in PLAYERS {
        session.silence(id);
    }
    session.run_until(30_000);
    let emitted = session.actions().len();

    session.unsilence("C");
    session.run_until(120_000);

    assert_eq!(session.actions().len(), emitted);
    assert!(session.coordinator.liveness(&"C".into()).unwrap().is_reachable());
}

#[test]
fn test_unreachable_fires_once_per_episode() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);

    let drops = Arc::new(Mutex::new(0));
    let returns = Arc::new(Mutex::new(0));

    let counter = drops.clone();
    session
        .coordinator
        .subscribe_unreachable(&"D".into(), move |_| *counter.lock().unwrap() += 1)
        .unwrap();
    let counter = returns.clone();
    session
        .coordinator
        .subscribe_reachable(&"D".into(), move |_| *counter.lock().unwrap() += 1)
        .unwrap();

    session.silence("D");
    session.run_until(60_000);
    assert_eq!(*drops.lock().unwrap(), 1);
    assert_eq!(*returns.lock().unwrap(), 0);

    session.unsilence("D");
    session.run_until(70_000);
    assert_eq!(*drops.lock().unwrap(), 1);
    assert_eq!(*returns.lock().unwrap(), 1);

    session.silence("D");
    session.run_until(100_000);
    assert_eq!(*drops.lock().unwrap(), 2);
}

#[test]
fn test_stale_timer_tokens_never_act() {
    let mut session = SessionFixture::new(&PLAYERS);
    session.start_turn(0);
    session.silence("A");
    session.run_until(20_000);

    let grace = session.coordinator.grace_timer().unwrap().token;
    let deadline = session.coordinator.turn_deadline().unwrap().token;

    // The turn moves on before either timer expires
    session.coordinator.start_turn(2, at(21_000)).unwrap();
    let emitted = session.actions().len();

    assert!(!session.coordinator.fire(grace, at(25_000)));
    assert!(!session.coordinator.fire(deadline, at(30_000)));
    assert_eq!(session.actions().len(), emitted);
    assert_eq!(session.coordinator.active_index(), 2);
}

#[test]
fn test_at_most_one_recovery_action_per_turn() {
    // Grace expiry and turn deadline land on the same instant
    let config = TurnConfig::default()
        .with_turn_timeout(25_000)
        .with_reconnect_grace(5_000);
    let mut session = SessionFixture::with_config(&PLAYERS, config);
    session.start_turn(0);
    session.silence("A");

    session.run_until(25_000);

    let recoveries = session.count("auto_pass", "A") + session.count("emergency_handoff", "A");
    assert_eq!(recoveries, 1);
    assert_eq!(session.count("turn_start", "B"), 1);
}

#[test]
fn test_single_participant_session() {
    let mut session = SessionFixture::new(&["solo"]);
    session.start_turn(0);

    session.run_until(30_000);
    assert_eq!(session.count("auto_pass", "solo"), 1);
    assert_eq!(session.count("turn_start", "solo"), 2);
}
