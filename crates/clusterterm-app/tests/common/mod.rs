#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use clusterterm_terminal::types::{Target, TargetKind};
use clusterterm_terminal::TerminalEndpoint;

/// Serve `router` on an ephemeral local port
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn endpoint(addr: SocketAddr) -> TerminalEndpoint {
    TerminalEndpoint::from_base_url(&format!("http://{}/api/v1", addr)).unwrap()
}

pub fn task(id: &str) -> Target {
    Target::new(TargetKind::Task, id).unwrap()
}

fn output(data: impl Into<String>) -> Message {
    Message::Text(json!({"type": "output", "data": data.into()}).to_string())
}

/// A shell that reports its size on resize and echoes typed lines
pub fn echo_shell() -> Router {
    async fn upgrade(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(run)
    }

    async fn run(mut socket: WebSocket) {
        while let Some(Ok(message)) = socket.recv().await {
            let Message::Text(text) = message else {
                continue;
            };
            let envelope: Value = serde_json::from_str(&text).unwrap();
            let reply = match envelope["type"].as_str() {
                Some("resize") => output(format!(
                    "size {}x{}\r\n",
                    envelope["cols"], envelope["rows"]
                )),
                Some("input") => output(format!(
                    "you typed: {}\n",
                    envelope["data"].as_str().unwrap_or_default()
                )),
                _ => continue,
            };
            if socket.send(reply).await.is_err() {
                break;
            }
        }
    }

    Router::new().route("/api/v1/task/:id/terminal", get(upgrade))
}

/// A shell that exits right away with a close code. The receiver resolves
/// to whether the client answered with its own close frame.
pub fn exiting_shell(code: u16, reason: &'static str) -> (Router, oneshot::Receiver<bool>) {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let upgrade = move |ws: WebSocketUpgrade| {
        let tx = tx.clone();
        async move {
            ws.on_upgrade(move |mut socket| async move {
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
                let answered = loop {
                    match socket.recv().await {
                        Some(Ok(Message::Close(_))) => break true,
                        Some(Ok(_)) => continue,
                        _ => break false,
                    }
                };
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(answered);
                }
            })
        }
    };
    (Router::new().route("/api/v1/task/:id/terminal", get(upgrade)), rx)
}

/// A shell whose connection drops without a close frame
pub fn vanishing_shell() -> Router {
    let upgrade = |ws: WebSocketUpgrade| async move {
        ws.on_upgrade(|socket| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(socket);
        })
    };
    Router::new().route("/api/v1/task/:id/terminal", get(upgrade))
}

/// A shell that reports a remote error and then ends normally
pub fn failing_shell(message: &'static str) -> Router {
    let upgrade = move |ws: WebSocketUpgrade| async move {
        ws.on_upgrade(move |mut socket| async move {
            let error = json!({"type": "error", "data": message}).to_string();
            let _ = socket.send(Message::Text(error)).await;
            let frame = CloseFrame {
                code: 1000,
                reason: "".into(),
            };
            let _ = socket.send(Message::Close(Some(frame))).await;
        })
    };
    Router::new().route("/api/v1/task/:id/terminal", get(upgrade))
}
