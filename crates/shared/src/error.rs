use thiserror::Error;

use crate::domain::CommandAction;

/// A host response that does not match the tab-delimited record shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty response body")]
    EmptyBody,
    #[error("expected record tag '{expected}', got '{actual}'")]
    UnexpectedTag {
        expected: &'static str,
        actual: String,
    },
    #[error("{tag} record has {actual} fields, expected at least {expected}")]
    TooFewFields {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{tag} field '{field}' is not a valid number: '{value}'")]
    InvalidNumber {
        tag: &'static str,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown command action '{0}'")]
    UnknownAction(String),
    #[error("'{0}' is a composite action and cannot be mapped to a command id")]
    CompositeHasNoId(CommandAction),
    #[error("unknown command profile '{0}'")]
    UnknownProfile(String),
}
