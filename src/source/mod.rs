//! Status accessors consumed by the poller.
//!
//! A [`StatusSource`] fetches the current status of a resource by id. Fetch
//! errors are treated as transient; the stage's retry budget decides how many
//! consecutive failures are tolerated.

use std::future::Future;
use std::pin::Pin;

use crate::status::StatusToken;

mod command;
mod runner;

pub use command::{CommandSourceError, CommandStatusSource, ID_PLACEHOLDER, StatusExtraction};
pub use runner::{CommandOutput, CommandRunner, ProcessCommandRunner};

/// Future returned by status sources.
pub type SourceFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Narrow interface for fetching a resource's current status.
pub trait StatusSource {
    /// Error describing a failed fetch.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the status of `resource_id`.
    fn fetch_status<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> SourceFuture<'a, StatusToken, Self::Error>;
}

/// Adapts a synchronous closure into a [`StatusSource`].
///
/// Additional accessor arguments are captured by the closure.
#[derive(Clone, Debug)]
pub struct StatusFn<F> {
    fetch: F,
}

/// Wraps `fetch` so it can drive a verifier.
///
/// ```
/// use stagewatch::source::status_fn;
///
/// let source = status_fn(|_id: &str| Ok::<_, std::io::Error>("available"));
/// # let _ = source;
/// ```
#[must_use]
pub const fn status_fn<F>(fetch: F) -> StatusFn<F> {
    StatusFn { fetch }
}

impl<F, T, E> StatusSource for StatusFn<F>
where
    F: Fn(&str) -> Result<T, E> + Sync,
    T: Into<StatusToken>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn fetch_status<'a>(&'a self, resource_id: &'a str) -> SourceFuture<'a, StatusToken, E> {
        Box::pin(async move { (self.fetch)(resource_id).map(Into::into) })
    }
}
