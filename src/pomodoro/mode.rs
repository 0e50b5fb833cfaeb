use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const WORK_SECONDS: u32 = 25 * 60;
pub const SHORT_BREAK_SECONDS: u32 = 5 * 60;
pub const LONG_BREAK_SECONDS: u32 = 15 * 60;

/// Every n-th completed focus session is followed by a long break.
pub const LONG_BREAK_EVERY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Work,
    ShortBreak,
    LongBreak,
}

/// Fixed per-mode attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpec {
    pub duration_secs: u32,
    pub label: &'static str,
    /// Opaque display colour token, a `#rrggbb` string.
    pub color: &'static str,
}

const WORK: ModeSpec = ModeSpec {
    duration_secs: WORK_SECONDS,
    label: "Focus",
    color: "#2c3e50",
};

const SHORT_BREAK: ModeSpec = ModeSpec {
    duration_secs: SHORT_BREAK_SECONDS,
    label: "Short Break",
    color: "#7f8c8d",
};

const LONG_BREAK: ModeSpec = ModeSpec {
    duration_secs: LONG_BREAK_SECONDS,
    label: "Long Break",
    color: "#95a5a6",
};

impl Mode {
    /// Display order of the mode selector.
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    pub fn spec(self) -> &'static ModeSpec {
        match self {
            Mode::Work => &WORK,
            Mode::ShortBreak => &SHORT_BREAK,
            Mode::LongBreak => &LONG_BREAK,
        }
    }

    pub fn duration_secs(self) -> u32 {
        self.spec().duration_secs
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn color(self) -> &'static str {
        self.spec().color
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Work)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "WORK",
            Mode::ShortBreak => "SHORT BREAK",
            Mode::LongBreak => "LONG BREAK",
        }
    }

    pub(crate) fn emoji(&self) -> &'static str {
        match self {
            Mode::Work => "💼",
            Mode::ShortBreak => "☕",
            Mode::LongBreak => "🌴",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" | "focus" | "w" | "1" => Ok(Mode::Work),
            "short" | "shortbreak" | "short_break" | "2" => Ok(Mode::ShortBreak),
            "long" | "longbreak" | "long_break" | "3" => Ok(Mode::LongBreak),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
