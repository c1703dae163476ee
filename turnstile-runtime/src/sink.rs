use tokio::sync::mpsc;
use turnstile_core::{ActionSink, SinkError, TurnAction};

/// Forwards actions to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TurnAction>,
}

impl ChannelSink {
    /// Create a sink and the receiver consumers read actions from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TurnAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ActionSink for ChannelSink {
    fn send(&mut self, action: TurnAction) -> Result<(), SinkError> {
        self.tx.send(action).map_err(|_| SinkError::Closed)
    }
}
