use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use clap::Parser;
use shared::{
    domain::CommandId,
    protocol::{format_command_state_record, format_transport_record, TRANSPORT_TAG},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod host;

use host::{action_for, HostModel};

/// Stand-in for the host's web interface, speaking the same text protocol.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,
    #[arg(long)]
    repeat: bool,
}

type SharedHost = Arc<Mutex<HostModel>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut model = HostModel::new(args.bpm, Instant::now());
    model.set_repeat(args.repeat);
    let app = build_router(Arc::new(Mutex::new(model)));

    info!(addr = %args.bind, "mock host listening");
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(host: SharedHost) -> Router {
    Router::new()
        .route("/_/GET/:id", get(command_state))
        .route("/_/:token", get(command_or_transport))
        .with_state(host)
}

async fn command_or_transport(
    State(host): State<SharedHost>,
    Path(token): Path<String>,
) -> (StatusCode, String) {
    let mut model = host.lock().unwrap_or_else(PoisonError::into_inner);
    model.advance_to(Instant::now());

    if token == TRANSPORT_TAG {
        return (StatusCode::OK, format_transport_record(&model.snapshot()));
    }

    let Ok(id) = token.parse::<u32>() else {
        return (StatusCode::NOT_FOUND, String::new());
    };
    let Some(action) = action_for(CommandId(id)) else {
        warn!(id, "unknown command id ignored");
        return (StatusCode::OK, String::new());
    };
    if model.apply(action) {
        info!(%action, id, state = ?model.play_state(), "command applied");
    } else {
        debug!(%action, id, "command accepted without effect");
    }
    (StatusCode::OK, String::new())
}

async fn command_state(
    State(host): State<SharedHost>,
    Path(id): Path<String>,
) -> (StatusCode, String) {
    let Ok(id) = id.parse::<u32>() else {
        return (StatusCode::NOT_FOUND, String::new());
    };
    let mut model = host.lock().unwrap_or_else(PoisonError::into_inner);
    model.advance_to(Instant::now());
    let id = CommandId(id);
    let state = model.command_state(action_for(id));
    (StatusCode::OK, format_command_state_record(id, state))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
