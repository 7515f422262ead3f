//! Session admission, messaging and removal over a real socket.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use futures::{SinkExt, StreamExt, future::join_all};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use common::TestServer;
use wsgate_server::{ServerConfig, ServerError};

#[tokio::test]
async fn test_admitted_session_is_live() -> Result<()> {
    let server = TestServer::start().await?;

    let _socket = server.connect("s1").await?;

    assert!(server.hub.session_exists("s1"));
    assert!(server.hub.get_connection("s1").is_some());
    assert!(server.hub.expires_at("s1").is_some());
    assert_eq!(server.hub.live_session_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_session_is_conflict() -> Result<()> {
    let server = TestServer::start().await?;

    let _socket = server.connect("s1").await?;
    let status = server.refused_status("s1").await?;

    assert_eq!(status, 409);
    assert_eq!(server.hub.live_session_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_denied_session_is_unauthorized() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let server = TestServer::start_with_authorizer(move |id: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        id != "blocked"
    })
    .await?;

    let status = server.refused_status("blocked").await?;

    assert_eq!(status, 401);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!server.hub.session_exists("blocked"));

    Ok(())
}

#[tokio::test]
async fn test_panicking_authorizer_denies() -> Result<()> {
    let server = TestServer::start_with_authorizer(|_: &str| -> bool {
        panic!("authorizer failure");
    })
    .await?;

    assert_eq!(server.refused_status("s1").await?, 401);
    assert_eq!(server.hub.live_session_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_send_to_reaches_client_once() -> Result<()> {
    let server = TestServer::start().await?;
    let mut socket = server.connect("s1").await?;

    server.hub.send_to("s1", "hello").await?;

    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await?
        .expect("stream ended")?;
    assert_eq!(msg.to_text()?, "hello");

    // Nothing else was written
    let extra = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(extra.is_err());

    Ok(())
}

#[tokio::test]
async fn test_send_to_unknown_session_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;

    let result = server.hub.send_to("ghost", "hello").await;
    assert!(matches!(result, Err(ServerError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_client_messages_are_readable() -> Result<()> {
    let server = TestServer::start().await?;
    let mut socket = server.connect("s1").await?;

    socket.send(Message::text("from client")).await?;

    let connection = server.hub.get_connection("s1").expect("session is live");
    let received = tokio::time::timeout(
        Duration::from_secs(5),
        wsgate_session::Connection::read_message(connection.as_ref()),
    )
    .await??;
    assert_eq!(
        received,
        Some(wsgate_session::Payload::Text("from client".to_string()))
    );

    Ok(())
}

#[tokio::test]
async fn test_close_session_keeps_entry() -> Result<()> {
    let server = TestServer::start().await?;
    let mut socket = server.connect("s1").await?;

    server.hub.close_session("s1").await?;

    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await?
        .expect("stream ended")?;
    match msg {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1000),
        other => panic!("expected close frame, got {:?}", other),
    }

    assert!(server.hub.session_exists("s1"));

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_session() -> Result<()> {
    let server = TestServer::start().await?;
    let _socket = server.connect("s1").await?;

    assert_eq!(server.delete("s1").await?, 204);
    assert!(!server.hub.session_exists("s1"));

    // Idempotent
    assert_eq!(server.delete("s1").await?, 204);
    assert_eq!(server.hub.live_session_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_removed_session_can_reconnect() -> Result<()> {
    let server = TestServer::start().await?;
    let _first = server.connect("s1").await?;

    assert_eq!(server.delete("s1").await?, 204);
    let _second = server.connect("s1").await?;

    assert_eq!(server.hub.live_session_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unauthorized_delete_is_ignored() -> Result<()> {
    let allowed = Arc::new(AtomicBool::new(true));
    let gate = Arc::clone(&allowed);
    let server =
        TestServer::start_with_authorizer(move |_: &str| gate.load(Ordering::SeqCst)).await?;

    let _socket = server.connect("s1").await?;
    allowed.store(false, Ordering::SeqCst);

    assert_eq!(server.delete("s1").await?, 204);
    assert!(server.hub.session_exists("s1"));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_distinct_admissions() -> Result<()> {
    let server = TestServer::start().await?;

    let ids: Vec<String> = (0..10).map(|i| format!("client-{}", i)).collect();
    let results = join_all(ids.iter().map(|id| connect_async(server.ws_url(id)))).await;

    let mut sockets = Vec::new();
    for result in results {
        let (socket, _) = result?;
        sockets.push(socket);
    }

    server.wait_for_count(10).await?;
    let mut live = server.hub.session_ids();
    live.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(live, expected);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_same_id_admits_one() -> Result<()> {
    let server = TestServer::start().await?;

    let attempts = join_all((0..8).map(|_| connect_async(server.ws_url("same")))).await;
    assert!(attempts.iter().any(|r| r.is_ok()));

    server.wait_for_count(1).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.hub.live_session_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_session_expires_after_ttl() -> Result<()> {
    let unit = Duration::from_millis(100);
    let config = ServerConfig::new()
        .with_session_ttl(unit * 3)
        .with_sweep_interval(unit);
    let server = TestServer::start_with(config, |_: &str| true).await?;

    let _socket = server.connect("s1").await?;

    tokio::time::sleep(unit).await;
    assert!(server.hub.session_exists("s1"));

    server.wait_until(|| !server.hub.session_exists("s1")).await?;
    assert_eq!(server.hub.live_session_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_health_reports_live_sessions() -> Result<()> {
    let server = TestServer::start().await?;
    let _socket = server.connect("s1").await?;

    let resp = server
        .client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await?;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["live_sessions"], 1);

    Ok(())
}
