use std::sync::Arc;

use tokio::sync::Notify;

use crate::opamp::proto::AgentToServer;

/// NextMessage encapsulates the next message to be sent and provides a
/// concurrency-safe interface to accumulate partial updates until a sender
/// is ready to transmit them. Mirrors the coalescing buffer used by senders
/// to avoid emitting one wire message per field update.
#[derive(Debug)]
pub(crate) struct NextMessage {
    message: AgentToServer,
    pending: bool,
    sending_chan: Arc<Notify>,
}

impl NextMessage {
    /// Builds a `NextMessage` seeded with `message`, marked pending so the
    /// first `pop` call sends it even if no further field is updated.
    pub(crate) fn new(message: AgentToServer) -> Self {
        NextMessage {
            message,
            pending: true,
            sending_chan: Arc::new(Notify::new()),
        }
    }

    /// Applies `modifier` to the in-progress message and marks it pending.
    /// Wakes any task waiting on `sending_chan`.
    pub(crate) fn update<F>(&mut self, modifier: F)
    where
        F: FnOnce(&mut AgentToServer),
    {
        modifier(&mut self.message);
        self.pending = true;
        self.sending_chan.notify_waiters();
    }

    /// True if the message has unsent updates.
    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns a clone of the in-progress message without popping it.
    pub(crate) fn peek(&self) -> AgentToServer {
        self.message.clone()
    }

    /// A notification handle signalled every time `update` is called.
    pub(crate) fn sending_chan(&self) -> Arc<Notify> {
        self.sending_chan.clone()
    }

    /// Takes the in-progress message, clears the pending flag, and seeds
    /// the successor message with only the fields that must survive across
    /// sends: instance UID, capabilities, and the incremented sequence
    /// number.
    pub(crate) fn pop(&mut self) -> AgentToServer {
        let popped = self.message.clone();
        self.pending = false;
        self.message = AgentToServer {
            instance_uid: popped.instance_uid.clone(),
            capabilities: popped.capabilities,
            sequence_num: popped.sequence_num + 1,
            ..Default::default()
        };
        popped
    }
}

impl Default for NextMessage {
    fn default() -> Self {
        NextMessage::new(AgentToServer::default())
    }
}
