use crate::pomodoro::engine::TimerState;
use crate::pomodoro::mode::Mode;

const BAR_WIDTH: usize = 20;
const RESET: &str = "\x1b[0m";

pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// 24-bit foreground escape for a `#rrggbb` colour token.
pub fn color_escape(token: &str) -> Option<String> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(format!(
        "\x1b[38;2;{};{};{}m",
        channel(0)?,
        channel(2)?,
        channel(4)?
    ))
}

fn paint(text: &str, token: &str) -> String {
    match color_escape(token) {
        Some(escape) => format!("{escape}{text}{RESET}"),
        None => text.to_string(),
    }
}

fn mode_selector(active: Mode) -> String {
    Mode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            if *mode == active {
                paint(&format!("[{}:{}]", i + 1, mode.label()), mode.color())
            } else {
                format!(" {}:{} ", i + 1, mode.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One status line for the current state.
pub fn render_status(state: &TimerState) -> String {
    let mode = state.current_mode;
    let control = if state.is_running { "⏸ Pause" } else { "▶ Start" };
    format!(
        "{} | {} {} {} {:>3.0}% | {} (s)  ↺ Reset (r) | {} focus sessions completed",
        mode_selector(mode),
        mode.emoji(),
        paint(&format_time(state.remaining_seconds), mode.color()),
        progress_bar(state.progress(), BAR_WIDTH),
        state.progress(),
        control,
        state.completed_work_cycles,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_pads() {
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(0), "00:00");
    }

    #[test]
    fn test_progress_bar_ends() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(100.0, 4), "████");
    }

    #[test]
    fn test_color_escape() {
        assert_eq!(
            color_escape("#2c3e50").as_deref(),
            Some("\x1b[38;2;44;62;80m")
        );
        assert_eq!(color_escape("2c3e50"), None);
        assert_eq!(color_escape("#zzzzzz"), None);
    }

    #[test]
    fn test_status_shows_controls_and_cycles() {
        let mut state = TimerState::new(Mode::ShortBreak);
        state.completed_work_cycles = 2;
        let line = render_status(&state);
        assert!(line.contains("05:00"));
        assert!(line.contains("▶ Start"));
        assert!(line.contains("2 focus sessions completed"));

        state.is_running = true;
        assert!(render_status(&state).contains("⏸ Pause"));
    }
}
