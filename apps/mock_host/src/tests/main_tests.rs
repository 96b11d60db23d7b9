use super::*;
use axum::{body, body::Body, http::Request};
use shared::{
    domain::CommandState,
    protocol::{parse_command_state_record, parse_transport_record},
};
use tower::ServiceExt;

fn test_app() -> Router {
    build_router(Arc::new(Mutex::new(HostModel::new(120.0, Instant::now()))))
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, String::from_utf8(body.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn transport_record_starts_stopped() {
    let app = test_app();
    let (status, body) = get_text(&app, "/_/TRANSPORT").await;
    assert_eq!(status, StatusCode::OK);

    let snapshot = parse_transport_record(&body).expect("record");
    assert_eq!(snapshot.playstate, 0);
    assert_eq!(snapshot.position_display, "0:00.000");
    assert_eq!(snapshot.position_beats, "1.1.00");
}

#[tokio::test]
async fn commands_drive_the_transport() {
    let app = test_app();

    assert_eq!(get_text(&app, "/_/1013").await.0, StatusCode::OK);
    let (_, body) = get_text(&app, "/_/TRANSPORT").await;
    assert_eq!(parse_transport_record(&body).expect("record").playstate, 5);

    get_text(&app, "/_/1008").await;
    let (_, body) = get_text(&app, "/_/TRANSPORT").await;
    assert_eq!(parse_transport_record(&body).expect("record").playstate, 6);

    get_text(&app, "/_/1016").await;
    let (_, body) = get_text(&app, "/_/TRANSPORT").await;
    assert_eq!(parse_transport_record(&body).expect("record").playstate, 0);
}

#[tokio::test]
async fn unknown_numeric_ids_are_accepted_and_other_tokens_are_not_found() {
    let app = test_app();
    assert_eq!(get_text(&app, "/_/12345").await.0, StatusCode::OK);
    assert_eq!(get_text(&app, "/_/PLAY").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get_text(&app, "/_/GET/record").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn command_state_echoes_requested_id() {
    let app = test_app();
    get_text(&app, "/_/1007").await;

    let (_, body) = get_text(&app, "/_/GET/1007").await;
    assert_eq!(
        parse_command_state_record(&body).expect("record"),
        (CommandId(1007), CommandState(1))
    );

    let (_, body) = get_text(&app, "/_/GET/42230").await;
    assert_eq!(
        parse_command_state_record(&body).expect("record"),
        (CommandId(42230), CommandState(-1))
    );
}
