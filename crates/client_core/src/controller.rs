//! Reconciles poll results and UI commands into the [`ViewModel`].

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::CommandAction;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{connectivity::ConnectivitySubscription, transport::TransportHandle, view::ViewModel};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const VIEW_EVENT_CAPACITY: usize = 64;

/// The single event a control surface emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub action: CommandAction,
}

/// Yes/no prompt shown before a destructive action is sent.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, action: CommandAction) -> bool;
}

pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmationPrompt for AlwaysConfirm {
    async fn confirm(&self, _action: CommandAction) -> bool {
        true
    }
}

/// How the controller learns transport state; fixed for the controller's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Derive flags from periodic transport queries.
    Polling { interval: Duration },
    /// No queries; flip flags locally after each accepted command.
    Optimistic,
}

impl SyncMode {
    pub fn polling() -> Self {
        SyncMode::Polling {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Declined,
    Failed,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ViewState {
    view: Mutex<ViewModel>,
    events: broadcast::Sender<ViewModel>,
}

impl ViewState {
    /// Applies `change` atomically and publishes the result if anything moved.
    fn update(&self, change: impl FnOnce(&mut ViewModel)) {
        let mut view = lock(&self.view);
        let before = view.clone();
        change(&mut view);
        if *view != before {
            let _ = self.events.send(view.clone());
        }
    }
}

async fn poll_once(transport: &dyn TransportHandle, state: &ViewState) {
    match transport.query_transport_state().await {
        Ok(snapshot) => state.update(|view| view.apply_snapshot(&snapshot)),
        Err(err) => debug!(error = %err, "transport poll failed"),
    }
}

pub struct SyncController {
    transport: Arc<dyn TransportHandle>,
    mode: SyncMode,
    confirmer: Arc<dyn ConfirmationPrompt>,
    confirm_actions: HashSet<CommandAction>,
    state: Arc<ViewState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    connectivity: Mutex<Option<ConnectivitySubscription>>,
}

impl SyncController {
    pub fn new(
        transport: Arc<dyn TransportHandle>,
        mode: SyncMode,
        confirmer: Arc<dyn ConfirmationPrompt>,
    ) -> Self {
        let (events, _) = broadcast::channel(VIEW_EVENT_CAPACITY);
        let state = Arc::new(ViewState {
            view: Mutex::new(ViewModel::default()),
            events,
        });

        let listener_state = Arc::downgrade(&state);
        let subscription = transport.subscribe_connectivity(Box::new(move |online| {
            if let Some(state) = listener_state.upgrade() {
                state.update(|view| view.is_online = online);
            }
        }));
        // Flips that happened before the subscription are never replayed.
        let online = transport.is_online();
        state.update(|view| view.is_online = online);

        Self {
            transport,
            mode,
            confirmer,
            confirm_actions: HashSet::from([CommandAction::Discard]),
            state,
            poll_task: Mutex::new(None),
            connectivity: Mutex::new(Some(subscription)),
        }
    }

    /// Replaces the set of actions that need confirmation before sending.
    pub fn with_confirmation(mut self, actions: impl IntoIterator<Item = CommandAction>) -> Self {
        self.confirm_actions = actions.into_iter().collect();
        self
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn requires_confirmation(&self, action: CommandAction) -> bool {
        self.confirm_actions.contains(&action)
    }

    pub fn view(&self) -> ViewModel {
        lock(&self.state.view).clone()
    }

    /// Receives a copy of the view model after every change.
    pub fn subscribe_view(&self) -> broadcast::Receiver<ViewModel> {
        self.state.events.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.poll_task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Starts the poll loop, querying once right away. Must run inside a tokio runtime.
    pub fn start(&self) {
        let SyncMode::Polling { interval } = self.mode else {
            warn!("start ignored: controller runs in optimistic mode");
            return;
        };

        let mut task = lock(&self.poll_task);
        if task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        *task = Some(tokio::spawn(async move {
            poll_once(transport.as_ref(), &state).await;
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                poll_once(transport.as_ref(), &state).await;
            }
        }));
        info!(interval_ms = interval.as_millis() as u64, "transport polling started");
    }

    /// Cancels the poll loop. Safe to call when not started.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.poll_task).take() {
            task.abort();
            info!("transport polling stopped");
        }
    }

    /// Stops polling and releases the connectivity listener.
    pub fn shutdown(&self) {
        self.stop();
        lock(&self.connectivity).take();
    }

    pub async fn handle_event(&self, event: ControlEvent) -> DispatchOutcome {
        self.dispatch(event.action).await
    }

    /// Sends a UI command. Failures are logged and reported only through the outcome
    /// and the connectivity flag.
    pub async fn dispatch(&self, action: CommandAction) -> DispatchOutcome {
        if !self.transport.supports(action) {
            warn!(%action, "action has no command id in the active profile");
            return DispatchOutcome::Failed;
        }
        if self.requires_confirmation(action) && !self.confirmer.confirm(action).await {
            info!(%action, "dispatch declined");
            return DispatchOutcome::Declined;
        }

        let result = if action.is_composite() {
            self.transport.send_command_sequence(&action.expand()).await
        } else {
            self.transport.send_command(action).await
        };

        match result {
            Ok(()) => {
                if self.mode == SyncMode::Optimistic {
                    self.state.update(|view| view.apply_optimistic(action));
                }
                DispatchOutcome::Sent
            }
            Err(err) => {
                warn!(%action, error = %err, "command dispatch failed");
                DispatchOutcome::Failed
            }
        }
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
