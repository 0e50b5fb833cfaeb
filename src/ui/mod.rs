//! Terminal front-end: a single redrawn status line plus line commands.

pub mod input;
pub mod render;

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::thread;
use tokio::sync::{mpsc, watch};

use crate::notify::desktop::{PermissionPrompt, PromptReceiver};
use crate::pomodoro::engine::TimerState;
use crate::pomodoro::service::{CommandSender, TimerCommand};
use input::{HELP, Input, parse_line};

fn redraw(state: &TimerState) {
    let mut out = io::stdout();
    let _ = write!(out, "\r\x1b[2K{}", render::render_status(state));
    let _ = out.flush();
}

fn say(message: &str) {
    println!("\r\x1b[2K{message}");
}

/// Blocking stdin reads live on their own thread so they never hold up
/// runtime shutdown. The channel closes on EOF or a read error.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Runs until the user quits, the timer goes away, or (with `quit_on_eof`)
/// stdin is closed.
pub async fn run_terminal(
    commands: CommandSender,
    mut state_rx: watch::Receiver<TimerState>,
    mut prompts: Option<PromptReceiver>,
    quit_on_eof: bool,
) {
    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut pending: VecDeque<PermissionPrompt> = VecDeque::new();

    say(HELP);
    redraw(&state_rx.borrow());

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(&state_rx.borrow_and_update());
            }
            Some(prompt) = recv_prompt(&mut prompts) => {
                say("🔔 Allow desktop notifications? [y/n]");
                pending.push_back(prompt);
            }
            line = lines.recv(), if stdin_open => {
                let line = match line {
                    Some(line) => line,
                    None => {
                        stdin_open = false;
                        if quit_on_eof {
                            let _ = commands.send(TimerCommand::Shutdown).await;
                            break;
                        }
                        continue;
                    }
                };
                match parse_line(&line) {
                    Some(Input::Command(command)) => {
                        let quit = command == TimerCommand::Shutdown;
                        if commands.send(command).await.is_err() || quit {
                            break;
                        }
                    }
                    Some(Input::Answer(granted)) => match pending.pop_front() {
                        Some(prompt) => prompt.answer(granted),
                        None => say("nothing to answer"),
                    },
                    Some(Input::Help) => say(HELP),
                    Some(Input::Unknown(word)) => say(&format!("unknown command '{word}' ({HELP})")),
                    None => {}
                }
                redraw(&state_rx.borrow());
            }
        }
    }
    println!();
}

async fn recv_prompt(prompts: &mut Option<PromptReceiver>) -> Option<PermissionPrompt> {
    match prompts.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
