//! Tracks download progress for a single in-flight package file so it can
//! be surfaced to the Agent without waiting for the download to finish.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Floor applied to a configured reporting interval; see
/// [`crate::operation::settings::StartSettings::download_reporter_interval`].
pub(crate) const MIN_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Reports the progress of a package download: percentage complete and a
/// rolling average transfer rate. Cheap to clone; all instances share the
/// same underlying counters.
#[derive(Debug, Clone)]
pub(crate) struct DownloadReporter {
    written: Arc<AtomicU64>,
    total: u64,
    started: Instant,
}

impl DownloadReporter {
    pub(crate) fn new(total_len: u64) -> Self {
        Self {
            written: Arc::new(AtomicU64::new(0)),
            total: total_len,
            started: Instant::now(),
        }
    }

    /// Bytes written to local storage so far.
    pub(crate) fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Percentage of the download complete, `0.0` if total length is
    /// unknown.
    pub(crate) fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.written() as f64 / self.total as f64) * 100.0
    }

    /// Average bytes per second since the download started. Returns `0`
    /// rather than dividing by zero if less than a second has elapsed.
    pub(crate) fn bytes_per_sec(&self) -> u64 {
        let elapsed = self.started.elapsed().as_secs();
        if elapsed == 0 {
            return 0;
        }
        self.written() / elapsed
    }

    fn add_bytes(&self, n: u64) {
        self.written.fetch_add(n, Ordering::Relaxed);
    }

    /// Spawns a task that logs progress on `interval` until the returned
    /// handle is stopped. Mirrors a ticker goroutine: it exits as soon as
    /// it's cancelled rather than waiting for its next tick.
    pub(crate) fn spawn_ticker(&self, package: String, interval: Duration) -> TickerHandle {
        let reporter = self.clone();
        let cancel = CancellationToken::new();
        let ticker_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately.
            loop {
                tokio::select! {
                    biased;
                    _ = ticker_cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        debug!(
                            package = %package,
                            percent = reporter.percent(),
                            bytes_per_sec = reporter.bytes_per_sec(),
                            "package download in progress"
                        );
                    }
                }
            }
        });

        TickerHandle { cancel, join }
    }
}

/// Handle to a running progress ticker.
pub(crate) struct TickerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TickerHandle {
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

/// Wraps an `AsyncRead` and tees every byte read through a
/// [`DownloadReporter`] before handing it to the caller, so storing the
/// package content and reporting progress happen in the same pass.
pub(crate) struct CountingReader<R> {
    inner: R,
    reporter: DownloadReporter,
}

impl<R> CountingReader<R> {
    pub(crate) fn new(inner: R, reporter: DownloadReporter) -> Self {
        Self { inner, reporter }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let inner = Pin::new(&mut self.inner);
        let result = inner.poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &result {
            let written = (buf.filled().len() - before) as u64;
            self.reporter.add_bytes(written);
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn percent_with_zero_total_is_zero() {
        let reporter = DownloadReporter::new(0);
        assert_eq!(reporter.percent(), 0.0);
    }

    #[test]
    fn bytes_per_sec_is_zero_before_one_second_elapses() {
        let reporter = DownloadReporter::new(100);
        reporter.add_bytes(50);
        assert_eq!(reporter.bytes_per_sec(), 0);
    }

    #[tokio::test]
    async fn counting_reader_tracks_bytes_read() {
        let reporter = DownloadReporter::new(5);
        let mut reader = CountingReader::new(&b"hello"[..], reporter.clone());
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();

        assert_eq!(buf, b"hello");
        assert_eq!(reporter.written(), 5);
        assert_eq!(reporter.percent(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_stops_promptly_when_cancelled() {
        let reporter = DownloadReporter::new(100);
        let ticker = reporter.spawn_ticker("agent".to_string(), Duration::from_secs(60));
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::time::timeout(Duration::from_secs(1), ticker.stop())
            .await
            .expect("stop should return without waiting for the next tick");
    }
}
