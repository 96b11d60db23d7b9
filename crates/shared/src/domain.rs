use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ActionError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CommandId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandAction {
    Play,
    Pause,
    Stop,
    Record,
    Save,
    Abort,
    Discard,
    SelectAll,
    Delete,
    GoToStart,
    ClearAll,
}

impl CommandAction {
    pub const ALL: [CommandAction; 11] = [
        CommandAction::Play,
        CommandAction::Pause,
        CommandAction::Stop,
        CommandAction::Record,
        CommandAction::Save,
        CommandAction::Abort,
        CommandAction::Discard,
        CommandAction::SelectAll,
        CommandAction::Delete,
        CommandAction::GoToStart,
        CommandAction::ClearAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandAction::Play => "play",
            CommandAction::Pause => "pause",
            CommandAction::Stop => "stop",
            CommandAction::Record => "record",
            CommandAction::Save => "save",
            CommandAction::Abort => "abort",
            CommandAction::Discard => "discard",
            CommandAction::SelectAll => "select-all",
            CommandAction::Delete => "delete",
            CommandAction::GoToStart => "go-to-start",
            CommandAction::ClearAll => "clear-all",
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, CommandAction::ClearAll)
    }

    /// Primitive actions this action stands for, in dispatch order.
    ///
    /// A primitive action expands to itself.
    pub fn expand(self) -> Vec<CommandAction> {
        match self {
            CommandAction::ClearAll => vec![
                CommandAction::SelectAll,
                CommandAction::Delete,
                CommandAction::GoToStart,
            ],
            primitive => vec![primitive],
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CommandAction {
    type Err = ActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        CommandAction::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ActionError::UnknownAction(raw.to_string()))
    }
}

/// Host transport modes as reported in the first field of a `TRANSPORT` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
    Recording,
    RecordPaused,
}

impl PlayState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PlayState::Stopped),
            1 => Some(PlayState::Playing),
            2 => Some(PlayState::Paused),
            5 => Some(PlayState::Recording),
            6 => Some(PlayState::RecordPaused),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            PlayState::Stopped => 0,
            PlayState::Playing => 1,
            PlayState::Paused => 2,
            PlayState::Recording => 5,
            PlayState::RecordPaused => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    /// Raw host code; values outside [`PlayState`] are kept as-is.
    pub playstate: i64,
    pub position: f64,
    pub is_repeat: bool,
    pub position_display: String,
    pub position_beats: String,
}

impl TransportSnapshot {
    pub fn play_state(&self) -> Option<PlayState> {
        PlayState::from_code(self.playstate)
    }
}

/// On/off state of a host command: positive is on, zero is off, negative has no defined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandState(pub i64);

impl CommandState {
    pub fn is_on(self) -> bool {
        self.0 > 0
    }

    pub fn is_off(self) -> bool {
        self.0 == 0
    }

    pub fn is_undefined(self) -> bool {
        self.0 < 0
    }
}
