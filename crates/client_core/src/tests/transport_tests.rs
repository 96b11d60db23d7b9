use super::*;
use std::{
    collections::HashSet,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use shared::commands::CommandProfile;
use tokio::net::TcpListener;

use crate::controller::{AlwaysConfirm, SyncController, SyncMode};

#[derive(Clone, Default)]
struct HostState {
    hits: Arc<Mutex<Vec<String>>>,
    rejected: Arc<Mutex<HashSet<String>>>,
    transport_body: Arc<Mutex<String>>,
    command_state_body: Arc<Mutex<String>>,
}

impl HostState {
    fn with_transport_body(self, body: &str) -> Self {
        *self.transport_body.lock().expect("lock") = body.to_string();
        self
    }

    fn with_command_state_body(self, body: &str) -> Self {
        *self.command_state_body.lock().expect("lock") = body.to_string();
        self
    }

    fn rejecting(self, id: u32) -> Self {
        self.rejected.lock().expect("lock").insert(id.to_string());
        self
    }

    fn hits(&self) -> Vec<String> {
        self.hits.lock().expect("lock").clone()
    }

    fn transport_hits(&self) -> usize {
        self.hits().iter().filter(|hit| *hit == "TRANSPORT").count()
    }
}

async fn handle_action(
    State(state): State<HostState>,
    Path(token): Path<String>,
) -> (StatusCode, String) {
    state.hits.lock().expect("lock").push(token.clone());
    if token == "TRANSPORT" {
        return (
            StatusCode::OK,
            state.transport_body.lock().expect("lock").clone(),
        );
    }
    if state.rejected.lock().expect("lock").contains(&token) {
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (StatusCode::OK, String::new())
}

async fn handle_command_state(
    State(state): State<HostState>,
    Path(id): Path<String>,
) -> (StatusCode, String) {
    state.hits.lock().expect("lock").push(format!("GET/{id}"));
    (
        StatusCode::OK,
        state.command_state_body.lock().expect("lock").clone(),
    )
}

async fn serve_host(listener: TcpListener, state: HostState) -> Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/_/GET/:id", get(handle_command_state))
        .route("/_/:token", get(handle_action))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}"))?)
}

async fn spawn_host(state: HostState) -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_host(listener, state).await
}

async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    addr
}

fn client(url: Url) -> TransportClient {
    TransportClient::new(url, CommandTable::new(CommandProfile::Standard))
}

type ListenerProbe = (Arc<AtomicUsize>, Arc<Mutex<Vec<bool>>>, ConnectivitySubscription);

fn counting_listener(client: &TransportClient) -> ListenerProbe {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener_calls = Arc::clone(&calls);
    let listener_seen = Arc::clone(&seen);
    let sub = client.subscribe_connectivity(Box::new(move |online| {
        listener_calls.fetch_add(1, Ordering::SeqCst);
        listener_seen.lock().expect("lock").push(online);
    }));
    (calls, seen, sub)
}

#[tokio::test]
async fn send_command_requests_numeric_id_path() {
    let host = HostState::default();
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    client.send_command(CommandAction::Play).await.expect("send");
    client.send_command(CommandAction::Save).await.expect("send");

    assert_eq!(host.hits(), vec!["1007", "42230"]);
    assert!(client.is_online());
}

#[tokio::test]
async fn sequence_is_sent_in_order() {
    let host = HostState::default();
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    client
        .send_command_sequence(&[
            CommandAction::Record,
            CommandAction::Stop,
            CommandAction::GoToStart,
        ])
        .await
        .expect("sequence");

    assert_eq!(host.hits(), vec!["1013", "1016", "40042"]);
}

#[tokio::test]
async fn sequence_stops_at_first_failure_without_rollback() {
    let host = HostState::default().rejecting(40006);
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    let err = client
        .send_command_sequence(&CommandAction::ClearAll.expand())
        .await
        .expect_err("delete is rejected");

    match err {
        TransportError::Rejected { action, id, status } => {
            assert_eq!(action, CommandAction::Delete);
            assert_eq!(id, CommandId(40006));
            assert_eq!(status, 500);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(host.hits(), vec!["40182", "40006"]);
}

#[tokio::test]
async fn composite_and_unmapped_actions_never_reach_the_wire() {
    let host = HostState::default();
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    assert!(matches!(
        client.send_command(CommandAction::ClearAll).await,
        Err(TransportError::CompositeAction(CommandAction::ClearAll))
    ));
    assert!(matches!(
        client.send_command(CommandAction::Discard).await,
        Err(TransportError::UnmappedAction(CommandAction::Discard))
    ));
    assert!(host.hits().is_empty());
}

#[tokio::test]
async fn queries_and_parses_transport_state() {
    let host =
        HostState::default().with_transport_body("TRANSPORT\t1\t12.5\t0\t0:12.500\t6.0\n");
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    let snapshot = client.query_transport_state().await.expect("query");

    assert_eq!(snapshot.playstate, 1);
    assert_eq!(snapshot.position, 12.5);
    assert!(!snapshot.is_repeat);
    assert_eq!(snapshot.position_display, "0:12.500");
    assert_eq!(snapshot.position_beats, "6.0");
    assert_eq!(host.hits(), vec!["TRANSPORT"]);
}

#[tokio::test]
async fn malformed_transport_record_is_reported_without_going_offline() {
    let host = HostState::default().with_transport_body("TRANSPORT\t1\t12.5\t0");
    let client = client(spawn_host(host).await.expect("spawn host"));
    let (calls, _seen, _sub) = counting_listener(&client);

    let err = client.query_transport_state().await.expect_err("too few fields");

    assert!(
        matches!(
            err,
            TransportError::MalformedResponse {
                target: RequestTarget::TransportState,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
    assert!(client.is_online());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn queries_command_state_by_id() {
    let host = HostState::default().with_command_state_body("CMDSTATE\t1013\t1\n");
    let client = client(spawn_host(host.clone()).await.expect("spawn host"));

    let state = client
        .query_command_state(CommandAction::Record)
        .await
        .expect("query");

    assert!(state.is_on());
    assert_eq!(host.hits(), vec!["GET/1013"]);
}

#[tokio::test]
async fn command_state_for_another_id_is_malformed() {
    let host = HostState::default().with_command_state_body("CMDSTATE\t1007\t0\n");
    let client = client(spawn_host(host).await.expect("spawn host"));

    let err = client
        .query_command_state(CommandAction::Record)
        .await
        .expect_err("id mismatch");

    assert!(matches!(err, TransportError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_host_flips_connectivity_once_per_edge() {
    let addr = closed_addr().await;
    let client = client(Url::parse(&format!("http://{addr}")).expect("url"));
    let (calls, seen, _sub) = counting_listener(&client);

    let err = client.send_command(CommandAction::Play).await.expect_err("refused");
    match err {
        TransportError::Unreachable { target, .. } => assert_eq!(
            target,
            RequestTarget::Command {
                action: CommandAction::Play,
                id: CommandId(1007)
            }
        ),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.query_transport_state().await.unwrap_err().is_unreachable());
    assert!(client.send_command(CommandAction::Stop).await.is_err());

    assert!(!client.is_online());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let host = HostState::default().with_transport_body("TRANSPORT\t0\t0\t0\t0:00.000\t1.1.00");
    let listener = TcpListener::bind(addr).await.expect("rebind");
    serve_host(listener, host).await.expect("serve");

    client.query_transport_state().await.expect("host back");
    client.send_command(CommandAction::Play).await.expect("send");

    assert!(client.is_online());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*seen.lock().expect("lock"), vec![false, true]);
}

#[test]
fn supports_follows_the_active_profile() {
    let standard = client(Url::parse("http://127.0.0.1:1").expect("url"));
    assert!(standard.supports(CommandAction::ClearAll));
    assert!(standard.supports(CommandAction::Abort));
    assert!(!standard.supports(CommandAction::Discard));

    let legacy = TransportClient::new(
        Url::parse("http://127.0.0.1:1").expect("url"),
        CommandTable::new(CommandProfile::Legacy),
    );
    assert!(legacy.supports(CommandAction::Discard));
}

#[tokio::test]
async fn controller_keeps_view_when_host_sends_malformed_transport() {
    let host =
        HostState::default().with_transport_body("TRANSPORT\t5\t4.25\t0\t0:04.250\t3.1.00\n");
    let client = Arc::new(client(spawn_host(host.clone()).await.expect("spawn host")));
    let controller = SyncController::new(
        client.clone(),
        SyncMode::Polling {
            interval: Duration::from_millis(10),
        },
        Arc::new(AlwaysConfirm),
    );
    let mut views = controller.subscribe_view();

    controller.start();
    let before = tokio::time::timeout(Duration::from_secs(2), views.recv())
        .await
        .expect("view in time")
        .expect("view channel open");
    assert!(before.play_active && before.record_active);
    assert_eq!(before.position_display, "0:04.250");

    *host.transport_body.lock().expect("lock") = "TRANSPORT\t5\t4.25".to_string();
    let polls = host.transport_hits();
    tokio::time::timeout(Duration::from_secs(2), async {
        while host.transport_hits() < polls + 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("polls in time");

    assert_eq!(controller.view(), before);
    assert!(client.is_online());
    controller.shutdown();
}
