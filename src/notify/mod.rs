//! Notification gateway.
//!
//! The gateway does not know how a notification reaches the user. It only
//! follows the permission protocol of a [`NotificationHost`]: deliver when
//! granted, ask when undetermined, drop otherwise. Asking never blocks the
//! caller; the answer is awaited in a detached task and applied once.

pub mod desktop;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::pomodoro::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Text announcing the end of an interval spent in `finished`.
    pub fn for_completion(finished: Mode) -> Self {
        if finished.is_break() {
            Self::new("break ended", "time to focus")
        } else {
            Self::new("focus session ended", "time for a break")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Undetermined,
    Granted,
    Denied,
}

/// A notification capability provided by the environment.
///
/// Hosts own their [`PermissionState`]; only a resolved permission request
/// may move it away from `Undetermined`.
pub trait NotificationHost: Send + Sync + 'static {
    fn is_supported(&self) -> bool;

    fn permission(&self) -> PermissionState;

    /// Ask the user for permission. The receiver resolves once with the
    /// answer; if the sender is dropped the request never resolves.
    fn request_permission(&self) -> oneshot::Receiver<PermissionState>;

    fn show(&self, request: &NotificationRequest) -> Result<()>;
}

/// Outcome of a single `notify` call, mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Unsupported,
    /// Handed to the host on the blocking pool; the result is only logged.
    Dispatched,
    Denied,
    AwaitingPermission,
}

pub struct NotificationGateway<H> {
    host: Arc<H>,
}

impl<H> Clone for NotificationGateway<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H: NotificationHost> NotificationGateway<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// Fire-and-forget. Must be called from within a tokio runtime; the
    /// host is never invoked on the caller's task.
    pub fn notify(&self, request: NotificationRequest) -> Dispatch {
        if !self.host.is_supported() {
            tracing::debug!(title = %request.title, "notifications unsupported, skipping");
            return Dispatch::Unsupported;
        }

        match self.host.permission() {
            PermissionState::Granted => {
                deliver(Arc::clone(&self.host), request);
                Dispatch::Dispatched
            }
            PermissionState::Denied => {
                tracing::debug!(title = %request.title, "notification permission denied, dropping");
                Dispatch::Denied
            }
            PermissionState::Undetermined => {
                let answer = self.host.request_permission();
                let host = Arc::clone(&self.host);
                tokio::spawn(async move {
                    match answer.await {
                        Ok(PermissionState::Granted) => deliver(host, request),
                        Ok(state) => {
                            tracing::debug!(?state, title = %request.title, "permission not granted, dropping");
                        }
                        Err(_) => {
                            tracing::debug!(title = %request.title, "permission request abandoned");
                        }
                    }
                });
                Dispatch::AwaitingPermission
            }
        }
    }
}

/// Notification servers can be slow or hang; `show` runs on the blocking pool.
fn deliver<H: NotificationHost>(host: Arc<H>, request: NotificationRequest) {
    tokio::task::spawn_blocking(move || match host.show(&request) {
        Ok(()) => {
            tracing::info!(title = %request.title, body = %request.body, "notification delivered");
        }
        Err(e) => tracing::warn!("Failed to send notification: {}", e),
    });
}


#[cfg(test)]
mod tests {
    use super::testing::FakeHost;
    use super::*;
    use tokio::time::{Duration, timeout};

    #[test]
    fn test_completion_text_per_mode() {
        let work = NotificationRequest::for_completion(Mode::Work);
        assert_eq!(work.title, "focus session ended");
        assert_eq!(work.body, "time for a break");

        let long = NotificationRequest::for_completion(Mode::LongBreak);
        assert_eq!(long.title, "break ended");
        assert_eq!(long.body, "time to focus");
    }

    #[tokio::test]
    async fn test_granted_delivers() {
        let host = Arc::new(FakeHost::new(PermissionState::Granted));
        let gateway = NotificationGateway::new(Arc::clone(&host));

        let dispatch = gateway.notify(NotificationRequest::for_completion(Mode::Work));

        assert_eq!(dispatch, Dispatch::Dispatched);
        let shown = timeout(Duration::from_secs(5), host.wait_shown(1))
            .await
            .unwrap();
        assert_eq!(shown.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_host_does_not_block_notify() {
        let host = Arc::new(FakeHost {
            show_delay: Duration::from_secs(2),
            ..FakeHost::new(PermissionState::Granted)
        });
        let gateway = NotificationGateway::new(Arc::clone(&host));

        let started = std::time::Instant::now();
        let dispatch = gateway.notify(NotificationRequest::for_completion(Mode::Work));
        assert_eq!(dispatch, Dispatch::Dispatched);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(host.shown().is_empty());
    }

    #[test]
    fn test_denied_and_unsupported_are_silent() {
        let denied = Arc::new(FakeHost::new(PermissionState::Denied));
        let gateway = NotificationGateway::new(Arc::clone(&denied));
        assert_eq!(
            gateway.notify(NotificationRequest::for_completion(Mode::Work)),
            Dispatch::Denied
        );
        assert!(denied.shown().is_empty());

        let unsupported = Arc::new(FakeHost::unsupported());
        let gateway = NotificationGateway::new(Arc::clone(&unsupported));
        assert_eq!(
            gateway.notify(NotificationRequest::for_completion(Mode::Work)),
            Dispatch::Unsupported
        );
        assert!(unsupported.shown().is_empty());
    }

    #[tokio::test]
    async fn test_undetermined_delivers_after_grant() {
        let host = Arc::new(FakeHost::new(PermissionState::Undetermined));
        let gateway = NotificationGateway::new(Arc::clone(&host));

        let dispatch = gateway.notify(NotificationRequest::for_completion(Mode::ShortBreak));
        assert_eq!(dispatch, Dispatch::AwaitingPermission);
        assert!(host.shown().is_empty());

        host.answer(PermissionState::Granted);
        let shown = timeout(Duration::from_secs(5), host.wait_shown(1))
            .await
            .unwrap();

        assert_eq!(
            shown,
            vec![NotificationRequest::new("break ended", "time to focus")]
        );
    }

    #[tokio::test]
    async fn test_undetermined_drops_after_deny() {
        let host = Arc::new(FakeHost::new(PermissionState::Undetermined));
        let gateway = NotificationGateway::new(Arc::clone(&host));

        gateway.notify(NotificationRequest::for_completion(Mode::Work));
        host.answer(PermissionState::Denied);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(host.shown().is_empty());

        // No retry on the next completion either.
        assert_eq!(
            gateway.notify(NotificationRequest::for_completion(Mode::Work)),
            Dispatch::Denied
        );
        assert!(host.shown().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_request_never_delivers() {
        let host = Arc::new(FakeHost::new(PermissionState::Undetermined));
        let gateway = NotificationGateway::new(Arc::clone(&host));

        gateway.notify(NotificationRequest::for_completion(Mode::Work));
        host.pending.lock().unwrap().clear();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(host.shown().is_empty());
    }
}
