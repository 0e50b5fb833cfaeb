use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};

use super::engine::{TimerEngine, TimerState};
use super::mode::Mode;
use super::ticker::Ticker;
use crate::notify::{NotificationGateway, NotificationHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Toggle,
    Reset,
    SwitchMode(Mode),
    Shutdown,
}

pub type CommandSender = mpsc::Sender<TimerCommand>;
pub type CommandReceiver = mpsc::Receiver<TimerCommand>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::channel(32)
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub completed_work_cycles: u32,
}

impl SessionSummary {
    pub fn duration_minutes(&self) -> i64 {
        (Local::now() - self.started_at).num_minutes()
    }
}

/// Drives a [`TimerEngine`] from user commands and its own tick subscription.
///
/// Everything happens on one task: a tick or a command is fully applied,
/// the ticker is re-synced with the running flag and the new state is
/// published before the next event is looked at.
pub struct TimerService<H> {
    engine: TimerEngine,
    ticker: Ticker,
    gateway: NotificationGateway<H>,
    state_tx: watch::Sender<TimerState>,
    started_at: DateTime<Local>,
}

impl<H: NotificationHost> TimerService<H> {
    pub fn new(gateway: NotificationGateway<H>) -> (Self, watch::Receiver<TimerState>) {
        Self::with_ticker(gateway, Ticker::default())
    }

    pub fn with_ticker(
        gateway: NotificationGateway<H>,
        ticker: Ticker,
    ) -> (Self, watch::Receiver<TimerState>) {
        let engine = TimerEngine::new();
        let (state_tx, state_rx) = watch::channel(*engine.state());
        let service = Self {
            engine,
            ticker,
            gateway,
            state_tx,
            started_at: Local::now(),
        };
        (service, state_rx)
    }

    pub async fn run(mut self, mut commands: CommandReceiver) -> SessionSummary {
        tracing::info!(
            "{} Starting in {} mode",
            self.engine.state().current_mode.emoji(),
            self.engine.state().current_mode
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                () = self.ticker.tick() => self.handle_tick(),
            }
            self.ticker.follow(self.engine.state().is_running);
            self.state_tx.send_replace(*self.engine.state());
        }

        self.ticker.disarm();
        SessionSummary {
            started_at: self.started_at,
            completed_work_cycles: self.engine.state().completed_work_cycles,
        }
    }

    fn apply(&mut self, command: TimerCommand) {
        tracing::debug!(?command, "applying command");
        match command {
            TimerCommand::Start => self.engine.start(),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Toggle => self.engine.toggle(),
            TimerCommand::Reset => self.engine.reset(),
            TimerCommand::SwitchMode(mode) => self.engine.switch_mode(mode),
            TimerCommand::Shutdown => {}
        }
    }

    fn handle_tick(&mut self) {
        if let Some(completion) = self.engine.on_tick() {
            tracing::info!(
                "[{}] 🔔 {} complete, next up: {} {} (cycles: {})",
                completion.at.format("%H:%M:%S"),
                completion.finished,
                completion.next.emoji(),
                completion.next,
                completion.completed_work_cycles
            );
            // The countdown stops here; the ticker is dropped right after.
            let dispatch = self.gateway.notify(completion.notification);
            tracing::debug!(?dispatch, "completion notification issued");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::PermissionState;
    use crate::notify::testing::FakeHost;
    use std::sync::Arc;
    use tokio::time::{Duration, sleep};

    fn spawn_service(
        permission: PermissionState,
    ) -> (
        Arc<FakeHost>,
        CommandSender,
        watch::Receiver<TimerState>,
        tokio::task::JoinHandle<SessionSummary>,
    ) {
        let host = Arc::new(FakeHost::new(permission));
        let (service, state_rx) = TimerService::new(NotificationGateway::new(Arc::clone(&host)));
        let (tx, rx) = create_command_channel();
        let handle = tokio::spawn(service.run(rx));
        (host, tx, state_rx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_countdown() {
        let (_host, tx, state_rx, _handle) = spawn_service(PermissionState::Granted);

        tx.send(TimerCommand::Start).await.unwrap();
        sleep(Duration::from_millis(3500)).await;
        assert_eq!(state_rx.borrow().remaining_seconds, 1497);

        tx.send(TimerCommand::Pause).await.unwrap();
        sleep(Duration::from_secs(10)).await;
        let state = *state_rx.borrow();
        assert_eq!(state.remaining_seconds, 1497);
        assert!(!state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_completion_notifies_and_stops() {
        let (host, tx, mut state_rx, _handle) = spawn_service(PermissionState::Granted);

        tx.send(TimerCommand::SwitchMode(Mode::ShortBreak)).await.unwrap();
        tx.send(TimerCommand::Start).await.unwrap();
        state_rx
            .wait_for(|s| s.current_mode == Mode::ShortBreak && s.is_running)
            .await
            .unwrap();
        state_rx
            .wait_for(|s| s.current_mode == Mode::Work)
            .await
            .unwrap();

        sleep(Duration::from_secs(30)).await;
        let state = *state_rx.borrow();
        assert!(!state.is_running);
        assert_eq!(state.remaining_seconds, 1500);

        let shown = host.wait_shown(1).await;
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "break ended");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_permission_does_not_block_countdown() {
        let (host, tx, mut state_rx, _handle) = spawn_service(PermissionState::Undetermined);

        tx.send(TimerCommand::SwitchMode(Mode::ShortBreak)).await.unwrap();
        tx.send(TimerCommand::Start).await.unwrap();
        state_rx
            .wait_for(|s| s.current_mode == Mode::ShortBreak && s.is_running)
            .await
            .unwrap();
        state_rx
            .wait_for(|s| s.current_mode == Mode::Work)
            .await
            .unwrap();
        assert_eq!(host.pending.lock().unwrap().len(), 1);

        // The question stays open while the next interval runs.
        tx.send(TimerCommand::Start).await.unwrap();
        sleep(Duration::from_millis(5500)).await;
        assert_eq!(state_rx.borrow().remaining_seconds, 1495);
        assert!(state_rx.borrow().is_running);

        tx.send(TimerCommand::Pause).await.unwrap();
        state_rx.wait_for(|s| !s.is_running).await.unwrap();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(state_rx.borrow().remaining_seconds, 1495);
        assert!(host.shown().is_empty());

        host.answer(PermissionState::Granted);
        let shown = host.wait_shown(1).await;
        assert_eq!(
            shown,
            vec![crate::notify::NotificationRequest::new("break ended", "time to focus")]
        );
        sleep(Duration::from_secs(1)).await;
        assert_eq!(host.shown().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_permission_still_transitions() {
        let (host, tx, mut state_rx, _handle) = spawn_service(PermissionState::Denied);

        tx.send(TimerCommand::Toggle).await.unwrap();
        state_rx
            .wait_for(|s| s.current_mode == Mode::ShortBreak)
            .await
            .unwrap();

        let state = *state_rx.borrow();
        assert_eq!(state.completed_work_cycles, 1);
        assert_eq!(state.remaining_seconds, 300);
        assert!(host.shown().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_summary() {
        let (_host, tx, _state_rx, handle) = spawn_service(PermissionState::Granted);
        tx.send(TimerCommand::Reset).await.unwrap();
        tx.send(TimerCommand::Shutdown).await.unwrap();
        let summary = handle.await.unwrap();
        assert_eq!(summary.completed_work_cycles, 0);
    }
}
