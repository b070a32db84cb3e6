// Cancellation, superseding and the tri-state outcome of network-bound work.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of an operation that may be abandoned before it completes.
///
/// `Cancelled` is not an error: the caller asked for it (or a newer request
/// superseded this one) and should simply drop the result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T, E> {
    Ready(T),
    Cancelled,
    Failed(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U, E> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
            Outcome::Failed(err) => Outcome::Failed(err),
        }
    }

    /// `Ok(Some(_))` when ready, `Ok(None)` when cancelled.
    pub fn into_result(self) -> Result<Option<T>, E> {
        match self {
            Outcome::Ready(value) => Ok(Some(value)),
            Outcome::Cancelled => Ok(None),
            Outcome::Failed(err) => Err(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Ready(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Fires a [`CancelToken`]. Dropping the handle without cancelling leaves
/// its tokens live forever.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observes cancellation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// A connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Race `fut` against cancellation. `None` means cancelled; an already
    /// cancelled token never polls `fut`.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            value = fut => Some(value),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadSlot
// ---------------------------------------------------------------------------

/// Identifies one load started through a [`LoadSlot`].
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    token: CancelToken,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// A display slot where a newer load supersedes any older in-flight load.
///
/// `begin` cancels the previous ticket's token and bumps a generation
/// counter; `finish` turns results from stale generations into
/// `Outcome::Cancelled` even if they completed.
#[derive(Debug, Default)]
pub struct LoadSlot {
    generation: AtomicU64,
    current: Mutex<Option<CancelHandle>>,
}

impl LoadSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadTicket {
        let (handle, token) = cancel_pair();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = current.replace(handle) {
            previous.cancel();
            debug!(generation, "superseded previous load");
        }
        LoadTicket { generation, token }
    }

    /// Cancel whatever is in flight without starting a new load.
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn finish<T, E>(&self, ticket: &LoadTicket, outcome: Outcome<T, E>) -> Outcome<T, E> {
        if self.is_current(ticket) {
            outcome
        } else {
            debug!(generation = ticket.generation, "discarding stale load result");
            Outcome::Cancelled
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
