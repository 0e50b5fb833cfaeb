use std::future::Future;
use tokio::sync::{mpsc, oneshot};

use super::{
    Ack, PageEvent, RuntimeMessage, TIMER_COMPLETE, WindowId, WindowMessage, WindowReceiver,
    WindowSender,
};
use crate::error::{KiriError, Result};
use crate::notify::{NotificationHost, NotificationRequest, PermissionState};

/// One-shot request/acknowledge channel towards the background process.
pub trait RuntimeChannel: Send + Sync + 'static {
    fn send_message(&self, message: RuntimeMessage) -> impl Future<Output = Result<Ack>> + Send;
}

/// A runtime message in flight inside one process, with its reply slot.
#[derive(Debug)]
pub struct RelayEnvelope {
    pub message: RuntimeMessage,
    pub reply: oneshot::Sender<Ack>,
}

pub type EnvelopeSender = mpsc::Sender<RelayEnvelope>;
pub type EnvelopeReceiver = mpsc::Receiver<RelayEnvelope>;

pub fn create_runtime_channel() -> (InProcessChannel, EnvelopeReceiver) {
    let (tx, rx) = mpsc::channel(16);
    (InProcessChannel { tx }, rx)
}

#[derive(Debug, Clone)]
pub struct InProcessChannel {
    tx: EnvelopeSender,
}

impl RuntimeChannel for InProcessChannel {
    async fn send_message(&self, message: RuntimeMessage) -> Result<Ack> {
        let (reply, ack) = oneshot::channel();
        self.tx
            .send(RelayEnvelope { message, reply })
            .await
            .map_err(|_| KiriError::RelayClosed("background"))?;
        ack.await.map_err(|_| KiriError::RelayClosed("background"))
    }
}

/// Page-side half of the relay. Bound to one window; everything posted by
/// other windows is ignored.
pub struct ContentRelay<C> {
    window: WindowId,
    channel: C,
}

impl<C: RuntimeChannel> ContentRelay<C> {
    pub fn new(window: WindowId, channel: C) -> Self {
        Self { window, channel }
    }

    /// Returns `None` when the message is not ours to forward.
    pub async fn handle(&self, message: &WindowMessage) -> Option<Result<Ack>> {
        if message.source != self.window {
            tracing::debug!(source = %message.source, window = %self.window, "ignoring foreign window message");
            return None;
        }

        let PageEvent::TimerComplete { title, message: body } = PageEvent::parse(&message.data)?;
        tracing::debug!(window = %self.window, %title, "forwarding timer completion");
        Some(
            self.channel
                .send_message(RuntimeMessage::ShowNotification {
                    title,
                    message: body,
                })
                .await,
        )
    }

    pub async fn run(self, mut messages: WindowReceiver) {
        while let Some(message) = messages.recv().await {
            match self.handle(&message).await {
                Some(Ok(ack)) => tracing::debug!(?ack, "relay acknowledged"),
                Some(Err(e)) => tracing::warn!("Failed to relay notification: {}", e),
                None => {}
            }
        }
    }
}

/// Notification host for the extension deployment. The page never asks for
/// permission itself; completions are posted to its window for the relay.
pub struct PageRelayHost {
    window: WindowId,
    page: WindowSender,
}

impl PageRelayHost {
    pub fn new(window: WindowId, page: WindowSender) -> Self {
        Self { window, page }
    }
}

impl NotificationHost for PageRelayHost {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&self) -> oneshot::Receiver<PermissionState> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(PermissionState::Granted);
        rx
    }

    fn show(&self, request: &NotificationRequest) -> Result<()> {
        let data = serde_json::to_value(PageEvent::TimerComplete {
            title: request.title.clone(),
            message: request.body.clone(),
        })?;
        tracing::debug!(window = %self.window, "posting {} window message", TIMER_COMPLETE);
        self.page
            .send(WindowMessage {
                source: self.window,
                data,
            })
            .map_err(|_| KiriError::RelayClosed("page"))
    }
}
