use std::fmt;

use shared::{
    domain::{CommandAction, CommandId},
    error::ProtocolError,
};
use thiserror::Error;

/// What a failed request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
    Command { action: CommandAction, id: CommandId },
    TransportState,
    CommandState { action: CommandAction, id: CommandId },
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Command { action, id } => write!(f, "command '{action}' (id {id})"),
            RequestTarget::TransportState => f.write_str("transport state"),
            RequestTarget::CommandState { action, id } => {
                write!(f, "state of command '{action}' (id {id})")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("host unreachable for {target}: {reason}")]
    Unreachable {
        target: RequestTarget,
        reason: String,
    },
    #[error("malformed response for {target}: {reason}")]
    MalformedResponse {
        target: RequestTarget,
        reason: String,
    },
    #[error("host rejected command '{action}' (id {id}) with status {status}")]
    Rejected {
        action: CommandAction,
        id: CommandId,
        status: u16,
    },
    #[error("composite action '{0}' must be expanded before sending")]
    CompositeAction(CommandAction),
    #[error("no command id configured for action '{0}'")]
    UnmappedAction(CommandAction),
}

impl TransportError {
    pub fn malformed(target: RequestTarget, err: ProtocolError) -> Self {
        TransportError::MalformedResponse {
            target,
            reason: err.to_string(),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Unreachable { .. })
    }
}
