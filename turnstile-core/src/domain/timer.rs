use crate::domain::Timestamp;
use std::fmt;

/// Which timer slot a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    TurnDeadline,
    Grace,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKind::TurnDeadline => write!(f, "turn-deadline"),
            TimerKind::Grace => write!(f, "grace"),
        }
    }
}

/// Identifies one arming of a timer slot
///
/// A token only fires if its generation still matches the armed one; anything
/// cancelled or re-armed since is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

/// An armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub token: TimerToken,
    pub deadline: Timestamp,
    /// Roster index the timer was armed for
    pub participant: usize,
}

/// Single-occupancy timer slot with a generation counter
#[derive(Debug, Clone)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    armed: Option<ArmedTimer>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            armed: None,
        }
    }

    /// Arm the slot, superseding whatever was armed before
    pub fn arm(&mut self, deadline: Timestamp, participant: usize) -> TimerToken {
        self.generation += 1;
        let token = TimerToken {
            kind: self.kind,
            generation: self.generation,
        };
        self.armed = Some(ArmedTimer {
            token,
            deadline,
            participant,
        });
        token
    }

    pub fn cancel(&mut self) -> Option<ArmedTimer> {
        self.armed.take()
    }

    /// Disarm and return the timer if `token` is the one currently armed
    pub fn take_if_current(&mut self, token: TimerToken) -> Option<ArmedTimer> {
        match self.armed {
            Some(armed) if armed.token == token => self.armed.take(),
            _ => None,
        }
    }

    /// Disarm and return the timer if its deadline has passed
    pub fn take_due(&mut self, now: Timestamp) -> Option<ArmedTimer> {
        match self.armed {
            Some(armed) if armed.deadline <= now => self.armed.take(),
            _ => None,
        }
    }

    pub fn armed(&self) -> Option<&ArmedTimer> {
        self.armed.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        self.armed.map(|a| a.deadline)
    }
}
