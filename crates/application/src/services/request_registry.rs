//! Request registry
//!
//! Issues handles for asynchronous engine requests, runs each request as a
//! tokio task and tracks its lifecycle. Completion and cancellation race for
//! the same registry entry under one lock and only the winner acts, so a
//! callback fires at most once and never after a successful cancel.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use domain::value_objects::{RequestHandle, RequestState};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

use crate::error::ApplicationError;

/// Number of finished requests whose outcome stays inspectable
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Single-shot completion callback of a request
pub type Callback<T> = Box<dyn FnOnce(Result<T, ApplicationError>) + Send + 'static>;

#[derive(Debug)]
struct PendingRequest {
    state: RequestState,
    abort: Option<AbortHandle>,
    issued_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    pending: HashMap<RequestHandle, PendingRequest>,
    history: VecDeque<(RequestHandle, RequestState)>,
}

/// Tracks the requests issued by one query object
#[derive(Debug)]
pub struct RequestRegistry {
    kind: &'static str,
    next_handle: AtomicU64,
    history_limit: usize,
    state: Mutex<RegistryState>,
}

impl RequestRegistry {
    /// Create a registry; `kind` labels log events
    #[must_use]
    pub fn new(kind: &'static str, history_limit: usize) -> Self {
        Self {
            kind,
            next_handle: AtomicU64::new(1),
            history_limit,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Issue a request and return its handle immediately
    ///
    /// `request` runs on the current tokio runtime. Its outcome is handed to
    /// `callback` unless the request is cancelled first. Without a runtime
    /// the request fails at once through the callback.
    pub fn issue<T, Fut>(self: &Arc<Self>, request: Fut, callback: Callback<T>) -> RequestHandle
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApplicationError>> + Send + 'static,
    {
        let handle = RequestHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let state = match RequestState::Idle.transition(RequestState::Pending) {
            Ok(state) => state,
            Err(e) => {
                callback(Err(e.into()));
                return handle;
            },
        };

        self.state.lock().pending.insert(
            handle,
            PendingRequest {
                state,
                abort: None,
                issued_at: Instant::now(),
            },
        );
        debug!(kind = self.kind, %handle, "Request issued");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let error = ApplicationError::Internal("No async runtime available".to_string());
            if self.finish(handle, RequestState::Failed) {
                callback(Err(error));
            }
            return handle;
        };

        // The request runs in its own task so a panic surfaces as a JoinError
        let task = runtime.spawn(request);
        let abort = task.abort_handle();

        let registry = Arc::clone(self);
        let kind = self.kind;
        runtime.spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    error!(kind, %handle, "Request panicked");
                    Err(ApplicationError::Internal("Request panicked".to_string()))
                },
                Err(_) => Err(ApplicationError::Cancelled),
            };
            let outcome = if result.is_ok() {
                RequestState::Completed
            } else {
                RequestState::Failed
            };
            if registry.finish(handle, outcome) {
                callback(result);
            }
        });

        let mut state = self.state.lock();
        match state.pending.get_mut(&handle) {
            Some(entry) => entry.abort = Some(abort),
            // Already finished or cancelled
            None => abort.abort(),
        }
        handle
    }

    /// Cancel a pending request
    ///
    /// Returns `false` when the request already finished or the handle is
    /// unknown; the callback is not invoked in either case.
    pub fn cancel(&self, handle: RequestHandle) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.pending.remove(&handle) else {
            debug!(kind = self.kind, %handle, "Cancel ignored, request not pending");
            return false;
        };
        if let Some(abort) = &entry.abort {
            abort.abort();
        }
        self.record(&mut state, handle, entry, RequestState::Cancelled)
    }

    /// Current state of a request, `None` if unknown or evicted from history
    #[must_use]
    pub fn state(&self, handle: RequestHandle) -> Option<RequestState> {
        let state = self.state.lock();
        if let Some(entry) = state.pending.get(&handle) {
            return Some(entry.state);
        }
        state
            .history
            .iter()
            .rev()
            .find(|(h, _)| *h == handle)
            .map(|(_, s)| *s)
    }

    /// Number of requests still waiting for the engine
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Claim the entry for completion; `false` if a cancel won the race
    fn finish(&self, handle: RequestHandle, outcome: RequestState) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.pending.remove(&handle) else {
            return false;
        };
        self.record(&mut state, handle, entry, outcome)
    }

    fn record(
        &self,
        state: &mut RegistryState,
        handle: RequestHandle,
        entry: PendingRequest,
        outcome: RequestState,
    ) -> bool {
        let terminal = match entry.state.transition(outcome) {
            Ok(terminal) => terminal,
            Err(e) => {
                warn!(kind = self.kind, %handle, error = %e, "Rejected request transition");
                return false;
            },
        };

        debug!(
            kind = self.kind,
            %handle,
            state = %terminal,
            elapsed_ms = u64::try_from(entry.issued_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );

        if self.history_limit > 0 {
            if state.history.len() >= self.history_limit {
                state.history.pop_front();
            }
            state.history.push_back((handle, terminal));
        }
        true
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new("request", DEFAULT_HISTORY_LIMIT)
    }
}
