use client_core::ViewModel;
use shared::domain::{PlayState, TransportSnapshot};

const OFFLINE_BANNER: &str = "Offline - Not connected to host";

fn lamp(label: &str, lit: bool) -> String {
    if lit {
        format!("[{label}]")
    } else {
        format!(" {} ", label.to_ascii_lowercase())
    }
}

pub fn status_line(view: &ViewModel) -> String {
    let transport = format!(
        "{}  {}{}{}",
        view.position_display,
        lamp("PLAY", view.play_active),
        lamp("PAUSE", view.pause_active),
        lamp("REC", view.record_active)
    );
    if view.is_online {
        transport
    } else {
        format!("{OFFLINE_BANNER} | {transport}")
    }
}

pub fn play_state_label(code: i64) -> String {
    match PlayState::from_code(code) {
        Some(PlayState::Stopped) => "stopped".to_string(),
        Some(PlayState::Playing) => "playing".to_string(),
        Some(PlayState::Paused) => "paused".to_string(),
        Some(PlayState::Recording) => "recording".to_string(),
        Some(PlayState::RecordPaused) => "record-paused".to_string(),
        None => format!("unknown ({code})"),
    }
}

pub fn snapshot_summary(snapshot: &TransportSnapshot) -> String {
    format!(
        "{}  position {} (beats {})  repeat {}",
        play_state_label(snapshot.playstate),
        snapshot.position_display,
        snapshot.position_beats,
        if snapshot.is_repeat { "on" } else { "off" }
    )
}
