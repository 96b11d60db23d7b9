//! Terminal yes/no confirmation sharing stdin with the command reader.

use std::{io::Write, sync::Arc};

use async_trait::async_trait;
use client_core::ConfirmationPrompt;
use shared::domain::CommandAction;
use tokio::{
    io::{BufReader, Lines, Stdin},
    sync::Mutex,
};

pub type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedLines {
    use tokio::io::AsyncBufReadExt;
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

pub fn question_for(action: CommandAction) -> String {
    match action {
        CommandAction::Discard => "Are you sure you want to undo recent changes?".to_string(),
        CommandAction::ClearAll => {
            "Select all, delete, and return to the project start?".to_string()
        }
        other => format!("Send '{other}' to the host?"),
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub struct StdinPrompt {
    lines: SharedLines,
}

impl StdinPrompt {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl ConfirmationPrompt for StdinPrompt {
    async fn confirm(&self, action: CommandAction) -> bool {
        print!("{} [y/N] ", question_for(action));
        let _ = std::io::stdout().flush();

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(answer)) => is_affirmative(&answer),
            Ok(None) | Err(_) => false,
        }
    }
}
