use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AlwaysConfirm, ConfirmationPrompt, ControlEvent, DispatchOutcome, SyncController,
    TransportClient, TransportHandle,
};
use shared::{commands::CommandProfile, domain::CommandAction};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod prompt;
mod render;

use config::{load_settings, ModeSetting, Settings};
use prompt::{stdin_lines, SharedLines, StdinPrompt};

#[derive(Parser, Debug)]
#[command(name = "reaper-remote", about = "Remote transport control over the host's web interface")]
struct Args {
    /// TOML settings file (defaults to ./remote.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    host_url: Option<String>,
    #[arg(long)]
    profile: Option<CommandProfile>,
    #[arg(long, value_enum)]
    mode: Option<ModeSetting>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Skip confirmation prompts.
    #[arg(long, short)]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one action, expanding composites.
    Send { action: CommandAction },
    /// Print the host's transport state once.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Print the on/off state of an action's command.
    State { action: CommandAction },
    /// List the command ids of the active profile.
    Actions,
    /// Live status; type action names to send them, `quit` to leave.
    Watch,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.host_url {
            settings.host_url = v.clone();
        }
        if let Some(v) = self.profile {
            settings.profile = v;
        }
        if let Some(v) = self.mode {
            settings.mode = v;
        }
        if let Some(v) = self.poll_interval_ms {
            settings.poll_interval_ms = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);

    let table = settings.command_table()?;
    let transport = Arc::new(TransportClient::new(settings.host_url()?, table));
    let lines = stdin_lines();
    let confirmer: Arc<dyn ConfirmationPrompt> = if args.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinPrompt::new(Arc::clone(&lines)))
    };
    let controller = SyncController::new(transport.clone(), settings.sync_mode(), confirmer)
        .with_confirmation(settings.confirm_actions()?);

    match args.command {
        Command::Send { action } => match controller.dispatch(action).await {
            DispatchOutcome::Sent => println!("sent {action}"),
            DispatchOutcome::Declined => println!("cancelled {action}"),
            DispatchOutcome::Failed => bail!("failed to send '{action}' to {}", settings.host_url),
        },
        Command::Status { json } => {
            let snapshot = transport.query_transport_state().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", render::snapshot_summary(&snapshot));
            }
        }
        Command::State { action } => {
            let state = transport.query_command_state(action).await?;
            let label = if state.is_on() {
                "on"
            } else if state.is_off() {
                "off"
            } else {
                "no defined state"
            };
            println!("{action}: {label}");
        }
        Command::Actions => {
            println!("profile: {}", transport.table().profile());
            for (action, id) in transport.table().entries() {
                println!("{action:>12}  {id}");
            }
            if transport.table().supports(CommandAction::ClearAll) {
                println!("{:>12}  select-all, delete, go-to-start", CommandAction::ClearAll);
            }
        }
        Command::Watch => watch(&controller, lines).await?,
    }

    controller.shutdown();
    Ok(())
}

async fn watch(controller: &SyncController, lines: SharedLines) -> Result<()> {
    let mut views = controller.subscribe_view();
    let render_task = tokio::spawn(async move {
        loop {
            match views.recv().await {
                Ok(view) => println!("{}", render::status_line(&view)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", render::status_line(&controller.view()));
    controller.start();
    info!("watching host transport; type an action name or `quit`");

    loop {
        let line = tokio::select! {
            line = async { lines.lock().await.next_line().await } => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit") {
            break;
        }
        match input.parse::<CommandAction>() {
            Ok(action) => {
                controller.handle_event(ControlEvent { action }).await;
            }
            Err(err) => eprintln!("{err}"),
        }
    }

    controller.shutdown();
    render_task.abort();
    Ok(())
}
