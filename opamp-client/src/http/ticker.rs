//! # Polling ticker
//!
//! Drives the periodic `poll()` call of the HTTP managed client. A reset can be
//! triggered externally (e.g. after sending a message) to avoid polling right
//! after a fresh exchange with the server.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{error::SendError, Receiver, Sender};
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, Interval};

/// Errors produced while driving a [`Ticker`].
#[derive(Error, Debug)]
pub enum TickerError {
    /// The ticker has been stopped.
    #[error("ticker has been cancelled")]
    Cancelled,
    /// Failed to deliver a [`TickerEvent`] to the running ticker.
    #[error("`{0}`")]
    SendError(#[from] SendError<TickerEvent>),
}

/// Events accepted by the ticker's internal channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerEvent {
    /// Restart the interval from now.
    Reset,
    /// Stop ticking permanently.
    Stop,
}

/// Drives the polling loop of the HTTP managed client.
#[async_trait]
pub trait Ticker: Send + Sync {
    /// Waits for the next tick, returning as soon as the interval elapses or a
    /// reset/stop event is received.
    async fn next(&self) -> Result<(), TickerError>;
    /// Restarts the interval from now.
    async fn reset(&self) -> Result<(), TickerError>;
    /// Stops the ticker. Any in-flight or future call to [`Ticker::next`] returns
    /// [`TickerError::Cancelled`].
    async fn stop(&self) -> Result<(), TickerError>;
}

/// Tokio-backed [`Ticker`] implementation based on [`tokio::time::interval`].
pub struct TokioTicker {
    duration: Duration,
    reset_receiver: Arc<Mutex<Receiver<TickerEvent>>>,
    reset_sender: Sender<TickerEvent>,
}

impl TokioTicker {
    /// Builds a new ticker with the given polling `duration`.
    pub fn new(duration: Duration) -> Self {
        let (reset_sender, reset_receiver) = tokio::sync::mpsc::channel(1);
        Self {
            duration,
            reset_receiver: Arc::new(Mutex::new(reset_receiver)),
            reset_sender,
        }
    }

    fn new_interval(&self) -> Interval {
        interval(self.duration)
    }
}

#[async_trait]
impl Ticker for TokioTicker {
    async fn next(&self) -> Result<(), TickerError> {
        let mut ticker = self.new_interval();
        // the first tick fires immediately, consume it up front so callers get
        // the full interval before the first wait.
        ticker.tick().await;

        let mut reset_receiver = self.reset_receiver.lock().await;
        loop {
            tokio::select! {
                biased;
                event = reset_receiver.recv() => {
                    return match event {
                        Some(TickerEvent::Reset) => Ok(()),
                        Some(TickerEvent::Stop) | None => Err(TickerError::Cancelled),
                    };
                }
                _ = ticker.tick() => return Ok(()),
            }
        }
    }

    async fn reset(&self) -> Result<(), TickerError> {
        self.reset_sender.send(TickerEvent::Reset).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), TickerError> {
        self.reset_sender.send(TickerEvent::Stop).await?;
        Ok(())
    }
}
