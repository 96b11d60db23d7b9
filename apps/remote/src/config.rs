use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use client_core::SyncMode;
use serde::Deserialize;
use shared::{
    commands::{CommandProfile, CommandTable},
    domain::{CommandAction, CommandId},
};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "remote.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeSetting {
    Poll,
    Optimistic,
}

impl FromStr for ModeSetting {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(ModeSetting::Poll),
            "optimistic" => Ok(ModeSetting::Optimistic),
            other => Err(anyhow!("unknown sync mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host_url: String,
    pub profile: CommandProfile,
    pub mode: ModeSetting,
    pub poll_interval_ms: u64,
    pub command_overrides: BTreeMap<String, u32>,
    pub confirm: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host_url: "http://127.0.0.1:8080".into(),
            profile: CommandProfile::Standard,
            mode: ModeSetting::Poll,
            poll_interval_ms: 200,
            command_overrides: BTreeMap::new(),
            confirm: vec!["discard".into()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    host_url: Option<String>,
    profile: Option<String>,
    mode: Option<String>,
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    commands: BTreeMap<String, u32>,
    confirm: Option<Vec<String>>,
}

impl Settings {
    pub fn host_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.host_url).with_context(|| format!("invalid host url '{}'", self.host_url))
    }

    pub fn command_table(&self) -> anyhow::Result<CommandTable> {
        let mut table = CommandTable::new(self.profile);
        for (name, id) in &self.command_overrides {
            let action = name
                .parse::<CommandAction>()
                .with_context(|| format!("invalid [commands] entry '{name}'"))?;
            table.set_id(action, CommandId(*id))?;
        }
        Ok(table)
    }

    pub fn confirm_actions(&self) -> anyhow::Result<Vec<CommandAction>> {
        self.confirm
            .iter()
            .map(|name| {
                name.parse::<CommandAction>()
                    .with_context(|| format!("invalid confirm entry '{name}'"))
            })
            .collect()
    }

    pub fn sync_mode(&self) -> SyncMode {
        match self.mode {
            ModeSetting::Poll => SyncMode::Polling {
                interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            },
            ModeSetting::Optimistic => SyncMode::Optimistic,
        }
    }
}

/// Defaults, then the config file, then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
    };
    if let Some(path) = path {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.host_url {
        settings.host_url = v;
    }
    if let Some(v) = file_cfg.profile {
        settings.profile = v.parse::<CommandProfile>()?;
    }
    if let Some(v) = file_cfg.mode {
        settings.mode = v.parse::<ModeSetting>()?;
    }
    if let Some(v) = file_cfg.poll_interval_ms {
        settings.poll_interval_ms = v;
    }
    settings.command_overrides.extend(file_cfg.commands);
    if let Some(v) = file_cfg.confirm {
        settings.confirm = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("REMOTE_HOST_URL") {
        settings.host_url = v;
    }
    if let Some(v) = var("APP__HOST_URL") {
        settings.host_url = v;
    }

    if let Some(v) = var("APP__PROFILE") {
        settings.profile = v
            .parse::<CommandProfile>()
            .context("invalid APP__PROFILE")?;
    }

    if let Some(v) = var("APP__MODE") {
        settings.mode = v.parse::<ModeSetting>().context("invalid APP__MODE")?;
    }

    if let Some(v) = var("APP__POLL_INTERVAL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_interval_ms = parsed;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
