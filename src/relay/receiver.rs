use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use super::sender::EnvelopeReceiver;
use super::{Ack, NOTIFICATION_ICON, RuntimeMessage};
use crate::error::Result;
use crate::notify::desktop::show_desktop;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub icon_url: &'static str,
    pub title: String,
    pub message: String,
}

impl From<RuntimeMessage> for NotificationOptions {
    fn from(message: RuntimeMessage) -> Self {
        let RuntimeMessage::ShowNotification { title, message } = message;
        Self::basic(title, message)
    }
}

impl NotificationOptions {
    pub fn basic(title: String, message: String) -> Self {
        Self {
            kind: "basic",
            icon_url: NOTIFICATION_ICON,
            title,
            message,
        }
    }
}

/// The privileged notification API only the background process may call.
pub trait PlatformNotifications: Send + Sync + 'static {
    fn create(&self, options: &NotificationOptions) -> Result<()>;
}

/// Desktop notifications, with the icon resolved next to the executable.
#[derive(Debug, Default)]
pub struct DesktopNotifications;

impl DesktopNotifications {
    fn icon_path(icon: &str) -> String {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(icon)))
            .filter(|path: &PathBuf| path.exists())
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| icon.to_string())
    }
}

impl PlatformNotifications for DesktopNotifications {
    fn create(&self, options: &NotificationOptions) -> Result<()> {
        show_desktop(
            &options.title,
            &options.message,
            &Self::icon_path(options.icon_url),
        )
    }
}

/// Background half of the relay.
pub struct BackgroundRelay<P> {
    notifications: P,
}

impl<P: PlatformNotifications> BackgroundRelay<P> {
    pub fn new(notifications: P) -> Self {
        tracing::info!("background relay installed");
        Self { notifications }
    }

    /// Acknowledges receipt even when the platform call fails.
    pub fn handle(&self, message: RuntimeMessage) -> Ack {
        self.create(&message.into());
        Ack::received()
    }

    fn create(&self, options: &NotificationOptions) {
        if let Err(e) = self.notifications.create(options) {
            tracing::warn!("Failed to create notification: {}", e);
        } else {
            tracing::info!(title = %options.title, "notification created");
        }
    }

    /// Entry point for untyped wire messages. Anything without a known
    /// `action` is dropped without an answer.
    pub fn handle_value(&self, data: &Value) -> Option<Ack> {
        match RuntimeMessage::parse(data) {
            Some(message) => Some(self.handle(message)),
            None => {
                tracing::debug!(%data, "ignoring runtime message without known action");
                None
            }
        }
    }

    /// Acks each envelope on receipt; the platform call runs on the
    /// blocking pool so a stuck notification server never holds the loop.
    pub async fn serve(self, mut envelopes: EnvelopeReceiver) {
        let relay = Arc::new(self);
        while let Some(envelope) = envelopes.recv().await {
            if envelope.reply.send(Ack::received()).is_err() {
                tracing::debug!("relay sender went away before the acknowledgement");
            }
            let options = NotificationOptions::from(envelope.message);
            let relay = Arc::clone(&relay);
            tokio::task::spawn_blocking(move || relay.create(&options));
        }
    }
}
