//! Owns the write direction of a single WebSocket connection. Multiplexes
//! a heartbeat timer, the pending-message signal and a cancellation
//! signal, mirroring the read loop's own event-driven shape.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::nextmessage::NextMessage;

use super::framing::encode_frame;
use super::WsError;

/// Deadline for the outbound close frame on shutdown; shutdown proceeds
/// regardless of whether it completes in time.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a running sender task.
pub(crate) struct SenderHandle {
    cancel: CancellationToken,
    heartbeat_interval_millis: Arc<AtomicU64>,
    heartbeat_updated: Arc<Notify>,
    join: JoinHandle<Result<(), WsError>>,
}

impl SenderHandle {
    /// Updates the heartbeat interval; a zero duration disables heartbeats.
    #[allow(dead_code)]
    pub(crate) fn set_heartbeat_interval(&self, interval: Duration) {
        self.heartbeat_interval_millis
            .store(interval.as_millis() as u64, Ordering::Relaxed);
        self.heartbeat_updated.notify_one();
    }

    /// Cancels the sender and waits for its graceful close to finish (or
    /// time out). The task's own `Err` from the close attempt is surfaced
    /// as a warning rather than failing shutdown, matching `stoppingErr`.
    pub(crate) async fn stop(self) -> Result<(), WsError> {
        self.cancel.cancel();
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(WsError::SenderTaskFailed(e.to_string())),
        }
    }
}

/// Spawns the sender task. `cancel` is shared with the receiver so either
/// side can tear down the whole connection.
pub(crate) fn spawn<S>(
    sink: S,
    next_message: Arc<RwLock<NextMessage>>,
    heartbeat_interval: Duration,
    cancel: CancellationToken,
) -> SenderHandle
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin + Send + 'static,
{
    let heartbeat_interval_millis = Arc::new(AtomicU64::new(heartbeat_interval.as_millis() as u64));
    let heartbeat_updated = Arc::new(Notify::new());

    let join = tokio::spawn(run(
        sink,
        next_message,
        heartbeat_interval_millis.clone(),
        heartbeat_updated.clone(),
        cancel.clone(),
    ));

    SenderHandle {
        cancel,
        heartbeat_interval_millis,
        heartbeat_updated,
        join,
    }
}

async fn run<S>(
    mut sink: S,
    next_message: Arc<RwLock<NextMessage>>,
    heartbeat_interval_millis: Arc<AtomicU64>,
    heartbeat_updated: Arc<Notify>,
    cancel: CancellationToken,
) -> Result<(), WsError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let pending_notify = next_message
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .sending_chan();

    loop {
        // Register interest before checking, so a concurrent `update` that
        // lands between the check and the `select!` below isn't missed.
        let notified = pending_notify.notified();

        if next_message
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_pending()
        {
            send_pending(&mut sink, &next_message).await?;
            continue;
        }

        let heartbeat_ms = heartbeat_interval_millis.load(Ordering::Relaxed);
        let heartbeat_enabled = heartbeat_ms > 0;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return close(&mut sink).await;
            }
            _ = heartbeat_updated.notified() => {
                continue;
            }
            _ = tokio::time::sleep(Duration::from_millis(heartbeat_ms)), if heartbeat_enabled => {
                next_message.write().unwrap_or_else(|e| e.into_inner()).update(|_| {});
                send_pending(&mut sink, &next_message).await?;
            }
            _ = notified => {
                continue;
            }
        }
    }
}

async fn send_pending<S>(
    sink: &mut S,
    next_message: &Arc<RwLock<NextMessage>>,
) -> Result<(), WsError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let msg = next_message.write().unwrap_or_else(|e| e.into_inner()).pop();
    let frame = encode_frame(&msg);
    sink.send(Message::Binary(frame.into())).await?;
    Ok(())
}

async fn close<S>(sink: &mut S) -> Result<(), WsError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let closing = sink.send(Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    })));

    match tokio::time::timeout(CLOSE_TIMEOUT, closing).await {
        Ok(Ok(())) => {
            debug!("sent websocket close frame");
            Ok(())
        }
        Ok(Err(e)) => {
            warn!("failed to send websocket close frame: {e}");
            Err(WsError::Transport(e))
        }
        Err(_) => {
            warn!("timed out sending websocket close frame");
            Err(WsError::CloseTimedOut)
        }
    }
}

#[cfg(test)]
mod test {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use crate::opamp::proto::AgentToServer;

    use super::*;

    /// A `Sink` that records every frame sent to it.
    struct RecordingSink {
        sent: Arc<std::sync::Mutex<Vec<Message>>>,
    }

    impl Sink<Message> for RecordingSink {
        type Error = tungstenite::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
            self.sent.lock().unwrap().push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn sends_initial_pending_message_immediately() {
        let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = RecordingSink { sent: sent.clone() };

        let next_message = Arc::new(RwLock::new(NextMessage::new(AgentToServer {
            instance_uid: vec![9; 16],
            ..Default::default()
        })));

        let cancel = CancellationToken::new();
        let handle = spawn(sink, next_message, Duration::ZERO, cancel.clone());

        // give the task a chance to run before tearing it down.
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await.ok();

        let sent = sent.lock().unwrap();
        assert!(!sent.is_empty());
        assert!(matches!(sent[0], Message::Binary(_)));
    }

    #[tokio::test]
    async fn sends_close_frame_on_cancel() {
        let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = RecordingSink { sent: sent.clone() };

        let next_message = Arc::new(RwLock::new(NextMessage::default()));
        next_message.write().unwrap().pop();

        let cancel = CancellationToken::new();
        let handle = spawn(sink, next_message, Duration::ZERO, cancel.clone());

        handle.stop().await.unwrap();

        let sent = sent.lock().unwrap();
        assert!(matches!(sent.last(), Some(Message::Close(_))));
    }
}
