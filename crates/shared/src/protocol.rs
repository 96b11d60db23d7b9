//! Text protocol spoken by the host's web interface.
//!
//! Every request is a bodiless GET under `/_/`. Query responses are
//! tab-separated records whose first field names the record kind.

use crate::{
    domain::{CommandId, CommandState, TransportSnapshot},
    error::ProtocolError,
};

pub const TRANSPORT_TAG: &str = "TRANSPORT";
pub const CMDSTATE_TAG: &str = "CMDSTATE";

/// Tag plus playstate, position, repeat, display and beats.
pub const TRANSPORT_MIN_FIELDS: usize = 6;
/// Tag plus command id and state.
pub const CMDSTATE_MIN_FIELDS: usize = 3;

pub const TRANSPORT_PATH: &str = "/_/TRANSPORT";

pub fn command_path(id: CommandId) -> String {
    format!("/_/{id}")
}

pub fn command_state_path(id: CommandId) -> String {
    format!("/_/GET/{id}")
}

fn record_fields<'a>(
    body: &'a str,
    tag: &'static str,
    min_fields: usize,
) -> Result<Vec<&'a str>, ProtocolError> {
    let line = body.lines().next().unwrap_or_default();
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Err(ProtocolError::EmptyBody);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields[0] != tag {
        return Err(ProtocolError::UnexpectedTag {
            expected: tag,
            actual: fields[0].to_string(),
        });
    }
    if fields.len() < min_fields {
        return Err(ProtocolError::TooFewFields {
            tag,
            expected: min_fields,
            actual: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_number<T: std::str::FromStr>(
    tag: &'static str,
    field: &'static str,
    value: &str,
) -> Result<T, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidNumber {
        tag,
        field,
        value: value.to_string(),
    })
}

pub fn parse_transport_record(body: &str) -> Result<TransportSnapshot, ProtocolError> {
    let fields = record_fields(body, TRANSPORT_TAG, TRANSPORT_MIN_FIELDS)?;
    Ok(TransportSnapshot {
        playstate: parse_number(TRANSPORT_TAG, "playstate", fields[1])?,
        position: parse_number(TRANSPORT_TAG, "position", fields[2])?,
        is_repeat: fields[3] == "1",
        position_display: fields[4].to_string(),
        position_beats: fields[5].to_string(),
    })
}

/// Returns the command id echoed by the host together with its state.
pub fn parse_command_state_record(body: &str) -> Result<(CommandId, CommandState), ProtocolError> {
    let fields = record_fields(body, CMDSTATE_TAG, CMDSTATE_MIN_FIELDS)?;
    let id = parse_number(CMDSTATE_TAG, "command_id", fields[1])?;
    let state = parse_number(CMDSTATE_TAG, "state", fields[2])?;
    Ok((CommandId(id), CommandState(state)))
}

pub fn format_transport_record(snapshot: &TransportSnapshot) -> String {
    format!(
        "{TRANSPORT_TAG}\t{}\t{:.6}\t{}\t{}\t{}\n",
        snapshot.playstate,
        snapshot.position,
        u8::from(snapshot.is_repeat),
        snapshot.position_display,
        snapshot.position_beats
    )
}

pub fn format_command_state_record(id: CommandId, state: CommandState) -> String {
    format!("{CMDSTATE_TAG}\t{id}\t{}\n", state.0)
}

/// Renders seconds the way the host's position display does, e.g. `1:02.500`.
pub fn format_position(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = total_millis / 60_000;
    let secs = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{minutes}:{secs:02}.{millis:03}")
}
