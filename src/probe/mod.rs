//! Connectivity probing while a lifecycle operation is in flight.
//!
//! [`run_probed`] awaits an operation on the caller's task while a spawned
//! prober checks reachability at a fixed interval. When the operation
//! finishes the prober is stopped over a oneshot channel and its
//! [`ProbeReport`] is joined, so a live migration can be asserted to keep a
//! server reachable throughout.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};

/// Default per-attempt connect timeout for [`TcpProbe`].
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Boxed future returned by [`Probe::check`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// A single reachability check.
pub trait Probe: Send + Sync + 'static {
    /// Returns `true` when the target is reachable.
    fn check(&self) -> ProbeFuture<'_>;
}

/// Checks reachability by opening a TCP connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TcpProbe {
    addr: SocketAddr,
    connect_timeout: Duration,
}

impl TcpProbe {
    /// Creates a probe for `addr` using [`DEFAULT_CONNECT_TIMEOUT`].
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Overrides the per-attempt connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, value: Duration) -> Self {
        self.connect_timeout = value;
        self
    }

    /// Address being probed.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Probe for TcpProbe {
    fn check(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let connect = timeout(self.connect_timeout, TcpStream::connect(self.addr)).await;
            matches!(connect, Ok(Ok(_)))
        })
    }
}

/// Tally of the checks made while an operation ran.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProbeReport {
    /// Checks performed.
    pub attempts: u32,
    /// Checks that found the target unreachable.
    pub failures: u32,
    /// Longest run of consecutive failed checks.
    pub longest_outage: u32,
}

impl ProbeReport {
    /// Returns `true` when at least one check ran and every check succeeded.
    ///
    /// A report with no attempts is not evidence of reachability.
    #[must_use]
    pub const fn is_uninterrupted(&self) -> bool {
        self.attempts > 0 && self.failures == 0
    }
}

#[derive(Default)]
struct Tally {
    report: ProbeReport,
    streak: u32,
}

impl Tally {
    fn record(&mut self, reachable: bool) {
        self.report.attempts = self.report.attempts.saturating_add(1);
        if reachable {
            self.streak = 0;
            return;
        }
        self.report.failures = self.report.failures.saturating_add(1);
        self.streak = self.streak.saturating_add(1);
        self.report.longest_outage = self.report.longest_outage.max(self.streak);
    }
}

/// Errors raised by [`run_probed`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProbeError {
    /// Raised when the probe interval is zero.
    #[error("probe interval must be greater than zero")]
    ZeroInterval,
    /// Raised when the prober task panicked or was cancelled.
    #[error("prober task failed: {message}")]
    Join {
        /// Join error message.
        message: String,
    },
}

/// Awaits `operation` while `probe` runs every `every` on a separate task.
///
/// The first check happens as soon as the prober task is scheduled. Missed
/// ticks are delayed rather than bursted.
///
/// # Errors
///
/// Returns [`ProbeError::ZeroInterval`] for a zero interval, or
/// [`ProbeError::Join`] when the prober task cannot be joined.
pub async fn run_probed<F, T, P>(
    operation: F,
    probe: P,
    every: Duration,
) -> Result<(T, ProbeReport), ProbeError>
where
    F: Future<Output = T>,
    P: Probe,
{
    if every.is_zero() {
        return Err(ProbeError::ZeroInterval);
    }

    let (stop_tx, mut stop_rx) = oneshot::channel();
    let prober = tokio::spawn(async move { probe_loop(&probe, every, &mut stop_rx).await });

    let output = operation.await;

    if stop_tx.send(()).is_err() {
        debug!("prober exited before the stop signal");
    }
    let report = prober.await.map_err(|err| ProbeError::Join {
        message: err.to_string(),
    })?;
    if report.attempts == 0 {
        warn!("no reachability checks ran during the operation");
    } else if !report.is_uninterrupted() {
        warn!(
            attempts = report.attempts,
            failures = report.failures,
            longest_outage = report.longest_outage,
            "target was unreachable during the operation"
        );
    }
    Ok((output, report))
}

async fn probe_loop<P: Probe>(
    probe: &P,
    every: Duration,
    stop: &mut oneshot::Receiver<()>,
) -> ProbeReport {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tally = Tally::default();

    loop {
        tokio::select! {
            biased;
            _ = &mut *stop => break,
            _ = ticker.tick() => {
                let reachable = probe.check().await;
                debug!(reachable, attempt = tally.report.attempts.saturating_add(1), "probe check");
                tally.record(reachable);
            }
        }
    }

    tally.report
}
