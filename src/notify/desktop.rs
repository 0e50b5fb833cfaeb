use notify_rust::Notification;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use super::{NotificationHost, NotificationRequest, PermissionState};
use crate::error::Result;

pub const APP_NAME: &str = "kiri";
pub const DESKTOP_ICON: &str = "alarm-clock";

/// Action id the notification server reports for a click on the body.
const OPEN_ACTION: &str = "default";

/// Show a desktop notification through the platform notification server.
pub fn show_desktop(title: &str, body: &str, icon: &str) -> Result<()> {
    let handle = Notification::new()
        .appname(APP_NAME)
        .summary(title)
        .body(body)
        .icon(icon)
        .action(OPEN_ACTION, "Open")
        .timeout(0) // No auto-dismiss
        .show()?;
    watch_clicks(handle, title.to_string());
    Ok(())
}

/// Waits for the notification to be clicked or closed on its own thread.
#[cfg(all(unix, not(target_os = "macos")))]
fn watch_clicks(handle: notify_rust::NotificationHandle, title: String) {
    std::thread::spawn(move || {
        handle.wait_for_action(|action| {
            log_action(&title, action);
        })
    });
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn watch_clicks<T>(_handle: T, _title: String) {}

/// Returns whether the action was a click.
#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
fn log_action(title: &str, action: &str) -> bool {
    match action {
        OPEN_ACTION => {
            tracing::info!(title, "notification clicked");
            true
        }
        "__closed" => {
            tracing::debug!(title, "notification closed");
            false
        }
        other => {
            tracing::debug!(title, action = other, "unhandled notification action");
            false
        }
    }
}

/// A pending question to the user: may we show desktop notifications?
#[derive(Debug)]
pub struct PermissionPrompt {
    reply: oneshot::Sender<bool>,
}

impl PermissionPrompt {
    pub fn answer(self, granted: bool) {
        let _ = self.reply.send(granted);
    }
}

pub type PromptSender = mpsc::UnboundedSender<PermissionPrompt>;
pub type PromptReceiver = mpsc::UnboundedReceiver<PermissionPrompt>;

pub fn create_prompt_channel() -> (PromptSender, PromptReceiver) {
    mpsc::unbounded_channel()
}

/// Notification host for the plain deployment: desktop notifications, with
/// permission asked interactively through whoever holds the prompt receiver.
pub struct DesktopHost {
    supported: bool,
    permission: Arc<Mutex<PermissionState>>,
    prompts: PromptSender,
}

impl DesktopHost {
    pub fn new(permission: PermissionState, prompts: PromptSender) -> Self {
        Self {
            supported: true,
            permission: Arc::new(Mutex::new(permission)),
            prompts,
        }
    }

    /// A host standing in for an environment without notifications.
    pub fn unsupported(prompts: PromptSender) -> Self {
        Self {
            supported: false,
            ..Self::new(PermissionState::Denied, prompts)
        }
    }
}

impl NotificationHost for DesktopHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> PermissionState {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(PermissionState::Denied)
    }

    fn request_permission(&self) -> oneshot::Receiver<PermissionState> {
        let (answer_tx, answer_rx) = oneshot::channel();
        let (reply, user_answer) = oneshot::channel();

        if self.prompts.send(PermissionPrompt { reply }).is_err() {
            tracing::debug!("nobody to ask for notification permission");
            return answer_rx;
        }

        let permission = Arc::clone(&self.permission);
        tokio::spawn(async move {
            let Ok(granted) = user_answer.await else {
                return;
            };
            let resolved = match permission.lock() {
                Ok(mut current) => {
                    if *current == PermissionState::Undetermined {
                        *current = if granted {
                            PermissionState::Granted
                        } else {
                            PermissionState::Denied
                        };
                        let state = *current;
                        tracing::info!(?state, "notification permission resolved");
                    }
                    *current
                }
                Err(_) => PermissionState::Denied,
            };
            let _ = answer_tx.send(resolved);
        });

        answer_rx
    }

    fn show(&self, request: &NotificationRequest) -> Result<()> {
        show_desktop(&request.title, &request.body, DESKTOP_ICON)
    }
}
