use async_trait::async_trait;
use reqwest::Client;
use shared::{
    commands::CommandTable,
    domain::{CommandAction, CommandId, CommandState, TransportSnapshot},
    protocol::{
        command_path, command_state_path, parse_command_state_record, parse_transport_record,
        TRANSPORT_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    connectivity::{ConnectivityListener, ConnectivityMonitor, ConnectivitySubscription},
    error::{RequestTarget, TransportError},
};

/// Typed operations against the host's control endpoint.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    async fn send_command(&self, action: CommandAction) -> Result<(), TransportError>;

    /// Sends `actions` one at a time, stopping at the first failure.
    ///
    /// Commands already sent are not rolled back.
    async fn send_command_sequence(&self, actions: &[CommandAction]) -> Result<(), TransportError> {
        for action in actions {
            self.send_command(*action).await?;
        }
        Ok(())
    }

    async fn query_transport_state(&self) -> Result<TransportSnapshot, TransportError>;
    async fn query_command_state(&self, action: CommandAction)
        -> Result<CommandState, TransportError>;
    fn subscribe_connectivity(&self, listener: ConnectivityListener) -> ConnectivitySubscription;
    fn is_online(&self) -> bool;

    /// Whether `action` can be sent, composites included. Nothing is requested.
    fn supports(&self, _action: CommandAction) -> bool {
        true
    }
}

pub struct TransportClient {
    http: Client,
    base_url: Url,
    table: CommandTable,
    connectivity: ConnectivityMonitor,
}

impl TransportClient {
    pub fn new(base_url: Url, table: CommandTable) -> Self {
        Self::with_http_client(Client::new(), base_url, table)
    }

    pub fn with_http_client(http: Client, base_url: Url, table: CommandTable) -> Self {
        Self {
            http,
            base_url,
            table,
            connectivity: ConnectivityMonitor::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    fn resolve(&self, action: CommandAction) -> Result<CommandId, TransportError> {
        if action.is_composite() {
            return Err(TransportError::CompositeAction(action));
        }
        self.table
            .resolve(action)
            .ok_or(TransportError::UnmappedAction(action))
    }

    fn endpoint(&self, target: RequestTarget, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|err| TransportError::Unreachable {
                target,
                reason: format!("invalid endpoint url: {err}"),
            })
    }

    /// Issues a GET, reporting connectivity loss on transport-level failure.
    async fn get(
        &self,
        target: RequestTarget,
        path: &str,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.endpoint(target, path)?;
        debug!(%target, %url, "host request");
        match self.http.get(url).send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.connectivity.report(false);
                Err(TransportError::Unreachable {
                    target,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Reads a successful query body; status and body failures are protocol violations.
    async fn query_body(
        &self,
        target: RequestTarget,
        path: &str,
    ) -> Result<String, TransportError> {
        let response = self.get(target, path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::MalformedResponse {
                target,
                reason: format!("unexpected status {status}"),
            });
        }
        response.text().await.map_err(|err| {
            if err.is_decode() {
                TransportError::MalformedResponse {
                    target,
                    reason: err.to_string(),
                }
            } else {
                self.connectivity.report(false);
                TransportError::Unreachable {
                    target,
                    reason: err.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl TransportHandle for TransportClient {
    async fn send_command(&self, action: CommandAction) -> Result<(), TransportError> {
        let id = self.resolve(action)?;
        let target = RequestTarget::Command { action, id };
        let response = self.get(target, &command_path(id)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected {
                action,
                id,
                status: status.as_u16(),
            });
        }
        self.connectivity.report(true);
        debug!(%action, id = id.0, "command accepted");
        Ok(())
    }

    async fn query_transport_state(&self) -> Result<TransportSnapshot, TransportError> {
        let target = RequestTarget::TransportState;
        let body = self.query_body(target, TRANSPORT_PATH).await?;
        let snapshot =
            parse_transport_record(&body).map_err(|err| TransportError::malformed(target, err))?;
        self.connectivity.report(true);
        Ok(snapshot)
    }

    async fn query_command_state(
        &self,
        action: CommandAction,
    ) -> Result<CommandState, TransportError> {
        let id = self.resolve(action)?;
        let target = RequestTarget::CommandState { action, id };
        let body = self.query_body(target, &command_state_path(id)).await?;
        let (echoed_id, state) = parse_command_state_record(&body)
            .map_err(|err| TransportError::malformed(target, err))?;
        if echoed_id != id {
            return Err(TransportError::MalformedResponse {
                target,
                reason: format!("record is for command id {echoed_id}"),
            });
        }
        self.connectivity.report(true);
        Ok(state)
    }

    fn subscribe_connectivity(&self, listener: ConnectivityListener) -> ConnectivitySubscription {
        self.connectivity.subscribe(listener)
    }

    fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    fn supports(&self, action: CommandAction) -> bool {
        self.table.supports(action)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
