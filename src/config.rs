use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::notify::PermissionState;
use crate::ws::websocket_server::DEFAULT_WS_ADDR;

/// Chrome passes the caller origin as the first argument to a native host.
const EXTENSION_ORIGIN_PREFIX: &str = "chrome-extension://";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "🍅 kiri - Pomodoro timer with desktop notifications")]
pub struct Args {
    /// Relay-backed notifications plus the WebSocket bridge for pages
    #[arg(long, conflicts_with = "native_host")]
    pub daemon: bool,
    /// Serve the background relay over native messaging on stdio
    #[arg(long)]
    pub native_host: bool,
    #[arg(long, default_value = DEFAULT_WS_ADDR)]
    pub ws_addr: String,
    /// Initial desktop notification permission
    #[arg(long, value_enum, default_value_t = PermissionArg::Ask)]
    pub permission: PermissionArg,
    /// Behave as if desktop notifications were unavailable
    #[arg(long)]
    pub no_notifications: bool,
    #[arg(short, long)]
    pub log: Option<PathBuf>,
    #[arg(short, long)]
    pub verbose: bool,
    #[arg(hide = true)]
    pub origin: Option<String>,
    /// Passed by Chrome on Windows alongside the origin.
    #[arg(long, hide = true)]
    pub parent_window: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Ask,
    Granted,
    Denied,
}

impl From<PermissionArg> for PermissionState {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Ask => PermissionState::Undetermined,
            PermissionArg::Granted => PermissionState::Granted,
            PermissionArg::Denied => PermissionState::Denied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Terminal,
    Daemon,
    NativeHost,
}

impl RunMode {
    fn log_name(self) -> &'static str {
        match self {
            RunMode::Terminal => "kiri.log",
            RunMode::Daemon => "daemon.log",
            RunMode::NativeHost => "native-host.log",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RunMode,
    pub ws_addr: String,
    pub permission: PermissionState,
    pub notifications_supported: bool,
    pub log_file: PathBuf,
    pub verbose: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let launched_by_browser = args.parent_window.is_some()
            || args
                .origin
                .as_deref()
                .is_some_and(|origin| origin.starts_with(EXTENSION_ORIGIN_PREFIX));

        let mode = if args.native_host || launched_by_browser {
            RunMode::NativeHost
        } else if args.daemon {
            RunMode::Daemon
        } else {
            RunMode::Terminal
        };

        let log_file = args.log.unwrap_or_else(|| default_log_dir().join(mode.log_name()));

        Self {
            mode,
            ws_addr: args.ws_addr,
            permission: args.permission.into(),
            notifications_supported: !args.no_notifications,
            log_file,
            verbose: args.verbose,
        }
    }
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/kiri")
}
