use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use crate::domain::FetchError;

pub const DEFAULT_ABORT_MESSAGE: &str = "This operation was aborted";

struct SignalState {
    reason: Mutex<Option<FetchError>>,
    notify: Notify,
}

/// Cancellation source. `abort` is level-triggered: signals observed after
/// the fact still see the reason.
pub struct AbortController {
    state: Arc<SignalState>,
}

#[derive(Clone)]
pub struct AbortSignal {
    state: Arc<SignalState>,
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                reason: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal { state: Arc::clone(&self.state) }
    }

    pub fn abort(&self, reason: Option<&str>) {
        let err = FetchError::abort(reason.unwrap_or(DEFAULT_ABORT_MESSAGE));
        {
            let mut slot = self.state.reason.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.state.notify.notify_waiters();
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AbortController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AbortController")
    }
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.aborted().is_some())
            .finish()
    }
}

impl AbortSignal {
    pub fn aborted(&self) -> Option<FetchError> {
        self.state.reason.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Resolves with the abort reason. Pends forever if never aborted.
    pub async fn cancelled(&self) -> FetchError {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(reason) = self.aborted() {
                return reason;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorClass;

    #[test]
    fn abort_sets_reason_once() {
        let ctl = AbortController::new();
        let signal = ctl.signal();
        assert!(signal.aborted().is_none());

        ctl.abort(Some("cancelled by test"));
        ctl.abort(Some("second reason is ignored"));

        let reason = signal.aborted().unwrap();
        assert_eq!(reason.class, ErrorClass::Abort);
        assert_eq!(reason.message, "cancelled by test");
    }

    #[test]
    fn default_reason_message() {
        let ctl = AbortController::new();
        ctl.abort(None);
        assert_eq!(ctl.signal().aborted().unwrap().message, DEFAULT_ABORT_MESSAGE);
    }

    #[tokio::test]
    async fn cancelled_resolves_after_abort() {
        let ctl = AbortController::new();
        let signal = ctl.signal();
        let waiter = tokio::spawn(async move { signal.cancelled().await });
        tokio::task::yield_now().await;
        ctl.abort(Some("stop"));
        let reason = waiter.await.unwrap();
        assert_eq!(reason.message, "stop");
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_aborted() {
        let ctl = AbortController::new();
        ctl.abort(None);
        let reason = ctl.signal().cancelled().await;
        assert!(reason.is_abort());
    }
}
