//! Static action-to-command-id lookup for the host's action list.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{CommandAction, CommandId},
    error::ActionError,
};

/// Deployment profile selecting which save/discard ids the host expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandProfile {
    #[default]
    Standard,
    Legacy,
}

impl CommandProfile {
    fn base_ids(self) -> &'static [(CommandAction, u32)] {
        match self {
            CommandProfile::Standard => &[
                (CommandAction::Play, 1007),
                (CommandAction::Pause, 1008),
                (CommandAction::Stop, 1016),
                (CommandAction::Record, 1013),
                (CommandAction::Save, 42230),
                (CommandAction::Abort, 40668),
                (CommandAction::SelectAll, 40182),
                (CommandAction::Delete, 40006),
                (CommandAction::GoToStart, 40042),
            ],
            CommandProfile::Legacy => &[
                (CommandAction::Play, 1007),
                (CommandAction::Pause, 1008),
                (CommandAction::Stop, 1016),
                (CommandAction::Record, 1013),
                (CommandAction::Save, 40026),
                (CommandAction::Discard, 40029),
                (CommandAction::SelectAll, 40182),
                (CommandAction::Delete, 40006),
                (CommandAction::GoToStart, 40042),
            ],
        }
    }
}

impl fmt::Display for CommandProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandProfile::Standard => f.write_str("standard"),
            CommandProfile::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for CommandProfile {
    type Err = ActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(CommandProfile::Standard),
            "legacy" => Ok(CommandProfile::Legacy),
            _ => Err(ActionError::UnknownProfile(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandTable {
    profile: CommandProfile,
    ids: HashMap<CommandAction, CommandId>,
}

impl CommandTable {
    pub fn new(profile: CommandProfile) -> Self {
        let ids = profile
            .base_ids()
            .iter()
            .map(|(action, id)| (*action, CommandId(*id)))
            .collect();
        Self { profile, ids }
    }

    pub fn profile(&self) -> CommandProfile {
        self.profile
    }

    /// Maps `action` to a deployment-specific id, replacing any profile default.
    pub fn set_id(&mut self, action: CommandAction, id: CommandId) -> Result<(), ActionError> {
        if action.is_composite() {
            return Err(ActionError::CompositeHasNoId(action));
        }
        self.ids.insert(action, id);
        Ok(())
    }

    pub fn with_id(mut self, action: CommandAction, id: CommandId) -> Result<Self, ActionError> {
        self.set_id(action, id)?;
        Ok(self)
    }

    /// Composite actions never resolve.
    pub fn resolve(&self, action: CommandAction) -> Option<CommandId> {
        self.ids.get(&action).copied()
    }

    pub fn supports(&self, action: CommandAction) -> bool {
        if action.is_composite() {
            return action.expand().into_iter().all(|step| self.ids.contains_key(&step));
        }
        self.ids.contains_key(&action)
    }

    pub fn entries(&self) -> Vec<(CommandAction, CommandId)> {
        CommandAction::ALL
            .into_iter()
            .filter_map(|action| self.resolve(action).map(|id| (action, id)))
            .collect()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(CommandProfile::default())
    }
}
