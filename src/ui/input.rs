use crate::pomodoro::mode::Mode;
use crate::pomodoro::service::TimerCommand;

pub const HELP: &str =
    "commands: s/toggle, start, p/pause, r/reset, 1/work, 2/short, 3/long, q/quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(TimerCommand),
    /// Answer to a pending permission prompt.
    Answer(bool),
    Help,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Option<Input> {
    let word = line.trim().to_lowercase();
    let input = match word.as_str() {
        "" => return None,
        "s" | "space" | "toggle" => Input::Command(TimerCommand::Toggle),
        "start" => Input::Command(TimerCommand::Start),
        "p" | "pause" => Input::Command(TimerCommand::Pause),
        "r" | "reset" => Input::Command(TimerCommand::Reset),
        "q" | "quit" | "exit" => Input::Command(TimerCommand::Shutdown),
        "y" | "yes" => Input::Answer(true),
        "n" | "no" => Input::Answer(false),
        "h" | "help" | "?" => Input::Help,
        other => match other.parse::<Mode>() {
            Ok(mode) => Input::Command(TimerCommand::SwitchMode(mode)),
            Err(_) => Input::Unknown(other.to_string()),
        },
    };
    Some(input)
}
