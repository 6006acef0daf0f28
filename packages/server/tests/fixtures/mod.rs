//! Shared fixtures for the integration tests.
//!
//! The server runs in-process on an ephemeral port; clients talk to it over
//! real WebSocket and HTTP connections.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use roomcast_server::{AppState, serve};
use serde_json::{Value, json};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server with an in-memory message store.
    pub async fn start() -> Self {
        Self::with_state(AppState::in_memory()).await
    }

    pub async fn with_state(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown, stopped) = oneshot::channel::<()>();

        tokio::spawn(async move {
            serve(listener, Arc::new(state), async move {
                let _ = stopped.await;
            })
            .await
            .expect("Test server failed");
        });

        Self {
            addr,
            shutdown: Some(shutdown),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Live rooms as reported by the HTTP API.
    pub async fn rooms(&self) -> Vec<Value> {
        reqwest::get(format!("{}/api/rooms", self.base_url()))
            .await
            .expect("Failed to send request")
            .json::<Vec<Value>>()
            .await
            .expect("Failed to parse JSON")
    }

    /// Poll the room list until `check` holds; teardown runs asynchronously
    /// after a socket closes.
    pub async fn wait_for_rooms(&self, check: impl Fn(&[Value]) -> bool) -> Vec<Value> {
        for _ in 0..50 {
            let rooms = self.rooms().await;
            if check(&rooms) {
                return rooms;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("room list never reached the expected state: {:?}", self.rooms().await);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        Self { stream }
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: String) {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send frame");
    }

    /// Join `room` and return the replayed history.
    ///
    /// A malformed probe frame follows the join; since frames from one
    /// connection are handled in order, everything before the probe's error
    /// reply is the join's history.
    pub async fn join(&mut self, username: &str, room: &str) -> Vec<Value> {
        self.send_json(json!({"type": "joinRoom", "username": username, "room": room}))
            .await;
        self.sync().await
    }

    pub async fn chat(&mut self, body: &str) {
        self.send_json(json!({"type": "chatMessage", "body": body}))
            .await;
    }

    /// Wait until every previously sent frame has been handled, returning
    /// the events received in the meantime.
    pub async fn sync(&mut self) -> Vec<Value> {
        self.send_text("sync".to_string()).await;
        let mut events = Vec::new();
        loop {
            let event = self.recv_json().await;
            if event["type"] == "error" && event["reason"].as_str().is_some_and(|r| r.starts_with("malformed event")) {
                return events;
            }
            events.push(event);
        }
    }

    /// Next JSON text frame; panics after a timeout.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Keep only the `message` events, as `(username, room, message)`.
pub fn messages(events: &[Value]) -> Vec<(String, String, String)> {
    events
        .iter()
        .filter(|e| e["type"] == "message")
        .map(|e| {
            (
                e["username"].as_str().unwrap_or_default().to_string(),
                e["room"].as_str().unwrap_or_default().to_string(),
                e["message"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

pub fn msg(username: &str, room: &str, message: &str) -> (String, String, String) {
    (username.to_string(), room.to_string(), message.to_string())
}
