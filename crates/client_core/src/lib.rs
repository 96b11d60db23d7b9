pub mod connectivity;
pub mod controller;
pub mod error;
pub mod transport;
pub mod view;

pub use connectivity::{ConnectivityListener, ConnectivityMonitor, ConnectivitySubscription};
pub use controller::{
    AlwaysConfirm, ConfirmationPrompt, ControlEvent, DispatchOutcome, SyncController, SyncMode,
    DEFAULT_POLL_INTERVAL,
};
pub use error::{RequestTarget, TransportError};
pub use transport::{TransportClient, TransportHandle};
pub use view::{TransportFlags, ViewModel};
