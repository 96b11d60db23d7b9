use serde::Serialize;
use shared::domain::{CommandAction, PlayState, TransportSnapshot};

pub const INITIAL_POSITION_DISPLAY: &str = "0:00.000";

/// Button highlight flags derived from a transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportFlags {
    pub play_active: bool,
    pub pause_active: bool,
    pub record_active: bool,
}

impl TransportFlags {
    pub fn from_playstate(code: i64) -> Self {
        let (play_active, pause_active, record_active) = match PlayState::from_code(code) {
            Some(PlayState::Stopped) | None => (false, false, false),
            Some(PlayState::Playing) => (true, false, false),
            Some(PlayState::Paused) => (false, true, false),
            Some(PlayState::Recording) => (true, false, true),
            Some(PlayState::RecordPaused) => (false, true, true),
        };
        Self {
            play_active,
            pause_active,
            record_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub play_active: bool,
    pub pause_active: bool,
    pub record_active: bool,
    pub position_display: String,
    pub is_online: bool,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            play_active: false,
            pause_active: false,
            record_active: false,
            position_display: INITIAL_POSITION_DISPLAY.to_string(),
            is_online: true,
        }
    }
}

impl ViewModel {
    pub fn flags(&self) -> TransportFlags {
        TransportFlags {
            play_active: self.play_active,
            pause_active: self.pause_active,
            record_active: self.record_active,
        }
    }

    fn set_flags(&mut self, flags: TransportFlags) {
        self.play_active = flags.play_active;
        self.pause_active = flags.pause_active;
        self.record_active = flags.record_active;
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: &TransportSnapshot) {
        self.set_flags(TransportFlags::from_playstate(snapshot.playstate));
        self.position_display.clone_from(&snapshot.position_display);
    }

    /// Guesses the effect of a command the host just accepted.
    pub(crate) fn apply_optimistic(&mut self, action: CommandAction) {
        match action {
            CommandAction::Play => {
                self.play_active = true;
                self.pause_active = false;
            }
            CommandAction::Pause => {
                self.play_active = false;
                self.pause_active = true;
            }
            CommandAction::Stop => {
                self.play_active = false;
                self.pause_active = false;
            }
            CommandAction::Record => self.record_active = !self.record_active,
            _ => {}
        }
    }
}
