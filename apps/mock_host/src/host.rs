//! Simulated transport of the host application.

use std::time::{Duration, Instant};

use shared::{
    commands::{CommandProfile, CommandTable},
    domain::{CommandAction, CommandId, CommandState, PlayState, TransportSnapshot},
    protocol::format_position,
};

const BEATS_PER_MEASURE: f64 = 4.0;

/// Finds the action behind `id` in any known profile.
pub fn action_for(id: CommandId) -> Option<CommandAction> {
    [CommandProfile::Standard, CommandProfile::Legacy]
        .into_iter()
        .flat_map(|profile| CommandTable::new(profile).entries())
        .find(|(_, candidate)| *candidate == id)
        .map(|(action, _)| action)
}

pub fn format_beats(position: f64, bpm: f64) -> String {
    let beats = position.max(0.0) * bpm / 60.0;
    let measure = (beats / BEATS_PER_MEASURE).floor() as u64 + 1;
    let beat = (beats % BEATS_PER_MEASURE).floor() as u64 + 1;
    let hundredths = ((beats.fract()) * 100.0).floor() as u64;
    format!("{measure}.{beat}.{hundredths:02}")
}

pub struct HostModel {
    playstate: PlayState,
    position: f64,
    edit_cursor: f64,
    repeat: bool,
    bpm: f64,
    clock: Instant,
}

impl HostModel {
    pub fn new(bpm: f64, now: Instant) -> Self {
        Self {
            playstate: PlayState::Stopped,
            position: 0.0,
            edit_cursor: 0.0,
            repeat: false,
            bpm,
            clock: now,
        }
    }

    pub fn play_state(&self) -> PlayState {
        self.playstate
    }

    /// Moves the play cursor forward by the wall time elapsed while rolling.
    pub fn advance_to(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.clock);
        self.clock = now;
        self.advance(elapsed);
    }

    pub fn advance(&mut self, elapsed: Duration) {
        if matches!(self.playstate, PlayState::Playing | PlayState::Recording) {
            self.position += elapsed.as_secs_f64();
        }
    }

    /// Returns false for actions the simulation does not model.
    pub fn apply(&mut self, action: CommandAction) -> bool {
        use PlayState::*;

        self.playstate = match (action, self.playstate) {
            (CommandAction::Play, Stopped | Paused) => Playing,
            (CommandAction::Play, RecordPaused) => Recording,
            (CommandAction::Pause, Playing) => Paused,
            (CommandAction::Pause, Paused) => Playing,
            (CommandAction::Pause, Recording) => RecordPaused,
            (CommandAction::Pause, RecordPaused) => Recording,
            (CommandAction::Pause, Stopped) => Paused,
            (CommandAction::Record, Recording | RecordPaused) => Stopped,
            (CommandAction::Record, _) => Recording,
            (CommandAction::Stop | CommandAction::Abort, _) => Stopped,
            (CommandAction::GoToStart, state) => {
                self.edit_cursor = 0.0;
                if state == Stopped {
                    self.position = 0.0;
                }
                state
            }
            (CommandAction::Play, state) => state,
            (CommandAction::Save | CommandAction::SelectAll | CommandAction::Delete, state) => state,
            (CommandAction::Discard | CommandAction::ClearAll, _) => return false,
        };

        if self.playstate == Stopped {
            self.position = self.edit_cursor;
        }
        true
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            playstate: self.playstate.code(),
            position: self.position,
            is_repeat: self.repeat,
            position_display: format_position(self.position),
            position_beats: format_beats(self.position, self.bpm),
        }
    }

    pub fn command_state(&self, action: Option<CommandAction>) -> CommandState {
        let on = match action {
            Some(CommandAction::Play) => {
                matches!(self.playstate, PlayState::Playing | PlayState::Recording)
            }
            Some(CommandAction::Pause) => {
                matches!(self.playstate, PlayState::Paused | PlayState::RecordPaused)
            }
            Some(CommandAction::Record) => {
                matches!(self.playstate, PlayState::Recording | PlayState::RecordPaused)
            }
            Some(CommandAction::Stop) => self.playstate == PlayState::Stopped,
            _ => return CommandState(-1),
        };
        CommandState(i64::from(on))
    }
}
