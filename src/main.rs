use chrono::Local;
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod native_messaging;
mod notify;
mod pomodoro;
mod relay;
mod ui;
mod ws;

use config::{Args, Config, RunMode};
use error::Result;
use notify::desktop::{DesktopHost, create_prompt_channel};
use notify::{NotificationGateway, NotificationHost};
use pomodoro::mode::{LONG_BREAK_EVERY, Mode};
use pomodoro::service::{
    CommandSender, SessionSummary, TimerCommand, TimerService, create_command_channel,
};
use relay::TIMER_WINDOW;
use relay::receiver::{BackgroundRelay, DesktopNotifications};
use relay::sender::{ContentRelay, PageRelayHost, create_runtime_channel};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args(Args::parse());
    logging::init(&config.log_file, config.verbose)?;
    tracing::info!(
        "=== Session started at {} ({:?} mode) ===",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        config.mode
    );

    match config.mode {
        RunMode::Terminal => run_timer_mode(&config).await,
        RunMode::Daemon => run_daemon_mode(&config).await,
        RunMode::NativeHost => run_native_host().await,
    }
}

fn print_banner(title: &str, config: &Config) {
    println!("🍅 {}", title);
    println!("======================================================");
    println!(
        "Pomodoro settings: {}min focus / {}min short break / {}min long break every {} sessions",
        Mode::Work.duration_secs() / 60,
        Mode::ShortBreak.duration_secs() / 60,
        Mode::LongBreak.duration_secs() / 60,
        LONG_BREAK_EVERY
    );
    println!("Logging to: {}", config.log_file.display());
}

fn print_stats(summary: &SessionSummary) {
    println!("\n--- Session Statistics ---");
    println!("Session duration: {} minutes", summary.duration_minutes());
    println!("Focus sessions completed: {}", summary.completed_work_cycles);
    println!("------------------------\n");
}

fn shutdown_on_ctrl_c(commands: CommandSender) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = commands.send(TimerCommand::Shutdown).await;
        }
    });
}

async fn run_with_terminal<H: NotificationHost>(
    host: H,
    prompts: Option<notify::desktop::PromptReceiver>,
    quit_on_eof: bool,
) -> Result<()> {
    let (service, state_rx) = TimerService::new(NotificationGateway::new(Arc::new(host)));
    let (command_tx, command_rx) = create_command_channel();
    let timer = tokio::spawn(service.run(command_rx));

    shutdown_on_ctrl_c(command_tx.clone());
    ui::run_terminal(command_tx, state_rx, prompts, quit_on_eof).await;

    let summary = timer.await?;
    tracing::info!(
        cycles = summary.completed_work_cycles,
        "session ended after {} minutes",
        summary.duration_minutes()
    );
    print_stats(&summary);
    Ok(())
}

/// Plain deployment: the timer notifies through the desktop directly.
async fn run_timer_mode(config: &Config) -> Result<()> {
    print_banner("kiri - Pomodoro Timer", config);
    println!("Press Ctrl+C or type q to stop and see stats\n");

    let (prompt_tx, prompt_rx) = create_prompt_channel();
    let host = if config.notifications_supported {
        DesktopHost::new(config.permission, prompt_tx)
    } else {
        DesktopHost::unsupported(prompt_tx)
    };

    run_with_terminal(host, Some(prompt_rx), true).await
}

/// Extension deployment - the timer posts completions to its page window,
/// the relay forwards them to the background, and pages may join over
/// WebSocket.
async fn run_daemon_mode(config: &Config) -> Result<()> {
    print_banner("kiri - Daemon Mode", config);
    let ws_addr: SocketAddr = config.ws_addr.parse()?;
    println!("Running WebSocket server on ws://{}", ws_addr);
    println!("Press Ctrl+C to stop and see stats\n");

    let (channel, envelopes) = create_runtime_channel();
    tokio::spawn(BackgroundRelay::new(DesktopNotifications).serve(envelopes));

    let (page_tx, page_rx) = relay::create_window_channel();
    tokio::spawn(ContentRelay::new(TIMER_WINDOW, channel.clone()).run(page_rx));

    tokio::spawn(async move {
        if let Err(e) = ws::websocket_server::start_websocket_server(ws_addr, channel).await {
            tracing::error!("WebSocket server error: {}", e);
        }
    });

    run_with_terminal(PageRelayHost::new(TIMER_WINDOW, page_tx), None, false).await
}

/// Background receiver behind Chrome's native messaging pipe. Nothing but
/// protocol frames may be written to stdout here.
async fn run_native_host() -> Result<()> {
    let relay = BackgroundRelay::new(DesktopNotifications);
    tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        let stdout = io::stdout();
        native_messaging::serve(&relay, &mut stdin.lock(), &mut stdout.lock())
    })
    .await?
}
