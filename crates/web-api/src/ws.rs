//! WebSocket 推送通道。
//!
//! 客户端连上后先发一帧注册身份，之后服务端把该身份名下的
//! `receive_message` 事件推过来。连接断开时只摘掉自己这一个句柄。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use domain::UserId;

use crate::state::AppState;

/// 客户端发来的控制帧。
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Register { email: String },
}

pub async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut incoming) = socket.split();

    // 第一帧必须是注册帧；在此之前不挂任何推送通道
    let user_id = loop {
        match incoming.next().await {
            Some(Ok(WsMessage::Text(text))) => match parse_register(&text) {
                Ok(user_id) => break user_id,
                Err(reason) => {
                    tracing::warn!(reason, "websocket register rejected");
                    let _ = sender.close().await;
                    return;
                }
            },
            Some(Ok(WsMessage::Close(_))) | None => return,
            Some(Ok(_)) => continue, // ping/pong 等控制帧
            Some(Err(err)) => {
                tracing::debug!(error = %err, "websocket read failed before register");
                return;
            }
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection_id = state.registry.register(user_id.clone(), tx).await;
    tracing::info!(user = %user_id, %connection_id, "websocket 连接已注册");

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize push event");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = incoming.next().await {
            if matches!(frame, WsMessage::Close(_)) {
                break;
            }
        }
    });

    // 任一方向结束即收尾
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.unregister(connection_id).await;
    tracing::info!(user = %user_id, %connection_id, "websocket 连接已注销");
}

fn parse_register(text: &str) -> Result<UserId, &'static str> {
    let frame: ClientFrame =
        serde_json::from_str(text).map_err(|_| "malformed register frame")?;
    let ClientFrame::Register { email } = frame;
    UserId::parse(email).map_err(|_| "blank identity")
}
