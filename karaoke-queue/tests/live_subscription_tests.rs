//! End-to-end tests for live queue subscriptions over WebSocket and SSE

mod helpers;

use axum::{body::Body, http::Request};
use futures::{SinkExt, StreamExt};
use helpers::{app_state, EVENT, SONG_A, SONG_B};
use http_body_util::BodyExt;
use karaoke_common::events::QueueEvent;
use karaoke_queue::hub::LiveHub;
use karaoke_queue::{build_router, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tower::util::ServiceExt;

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Poll until the hub reports `expected` connections for the event
async fn wait_for_connections(hub: &LiveHub, event_id: i64, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.connection_count(event_id) != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} connections, hub has {}",
            expected,
            hub.connection_count(event_id)
        )
    });
}

#[tokio::test]
async fn test_websocket_receives_queue_changes() {
    let state = app_state().await;
    let service = state.service.clone();
    let addr = spawn_server(state).await;

    let url = format!("ws://{addr}/karaoke/ws/events/{EVENT}/queue");
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    wait_for_connections(service.hub(), EVENT, 1).await;

    let ana = service.submit_request(EVENT, SONG_A, "Ana").await.unwrap();
    service.submit_request(EVENT, SONG_B, "Beto").await.unwrap();

    let mut orders = Vec::new();
    while orders.len() < 2 {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame within timeout")
            .expect("socket open")
            .unwrap();
        let Message::Text(text) = frame else { continue };

        match serde_json::from_str::<QueueEvent>(&text).unwrap() {
            QueueEvent::RequestAdded { request, .. } => orders.push(request.play_order),
            other => panic!("unexpected notification: {other:?}"),
        }
    }
    assert_eq!(orders, vec![0, 1]);

    // Client frames are ignored
    socket.send(Message::Text("hello".to_string())).await.unwrap();
    service
        .advance_status(ana.id, karaoke_common::db::RequestStatus::Playing)
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let event: QueueEvent = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(event.event_type(), "StatusChanged");

    drop(socket);
    wait_for_connections(service.hub(), EVENT, 0).await;
}

#[tokio::test]
async fn test_websocket_unknown_event_refused() {
    let state = app_state().await;
    let addr = spawn_server(state).await;

    let url = format!("ws://{addr}/karaoke/ws/events/404/queue");
    assert!(tokio_tungstenite::connect_async(url).await.is_err());
}

#[tokio::test]
async fn test_sse_stream_names_events_by_type() {
    let state = app_state().await;
    let service = state.service.clone();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/karaoke/events/{EVENT}/stream"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(service.hub().connection_count(EVENT), 1);

    service.submit_request(EVENT, SONG_A, "Ana").await.unwrap();

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("frame within timeout")
        .expect("stream open")
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = std::str::from_utf8(&data).unwrap();
    assert!(text.contains("event: RequestAdded"), "{text}");
    assert!(text.contains("\"requester_name\":\"Ana\""), "{text}");

    drop(body);
    assert_eq!(service.hub().connection_count(EVENT), 0);
}
