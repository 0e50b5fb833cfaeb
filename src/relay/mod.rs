//! Cross-context relay.
//!
//! The page context cannot show notifications itself, so it posts a
//! `TIMER_COMPLETE` window message; the [`sender::ContentRelay`] picks up the
//! ones coming from its own window and forwards them as a `showNotification`
//! runtime message to the [`receiver::BackgroundRelay`], which holds the
//! notification permission and answers with an [`Ack`].

pub mod receiver;
pub mod sender;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

pub const TIMER_COMPLETE: &str = "TIMER_COMPLETE";
pub const NOTIFICATION_ICON: &str = "icons/48x48.png";

/// Identifies the page window a message was posted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// The window the timer itself posts from.
pub const TIMER_WINDOW: WindowId = WindowId(0);

/// A raw message as posted on a page window. `data` is whatever the page
/// sent; only the relay decides whether it means anything.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    pub source: WindowId,
    pub data: Value,
}

pub type WindowSender = mpsc::UnboundedSender<WindowMessage>;
pub type WindowReceiver = mpsc::UnboundedReceiver<WindowMessage>;

pub fn create_window_channel() -> (WindowSender, WindowReceiver) {
    mpsc::unbounded_channel()
}

/// Window messages the relay understands, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageEvent {
    #[serde(rename = "TIMER_COMPLETE")]
    TimerComplete {
        #[serde(default)]
        title: String,
        #[serde(default)]
        message: String,
    },
}

impl PageEvent {
    pub fn parse(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// Messages sent to the background process, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RuntimeMessage {
    #[serde(rename = "showNotification")]
    ShowNotification {
        #[serde(default)]
        title: String,
        #[serde(default)]
        message: String,
    },
}

impl RuntimeMessage {
    pub fn parse(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// Receipt acknowledgement; says nothing about delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn received() -> Self {
        Self {
            success: true,
            message: Some("Message received".to_string()),
        }
    }
}
