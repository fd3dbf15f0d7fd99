//! WebSocket 推送端到端测试：推送副本与落库副本一致。

mod support;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use support::spawn_app;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const OWNER: &str = "owner@example.com";
const ADOPTER: &str = "adopter@example.com";

#[tokio::test]
async fn registered_connection_receives_the_stored_message() {
    let app = spawn_app().await;

    let (mut socket, _) = connect_async(app.ws_url()).await.expect("ws connect");
    socket
        .send(Message::Text(
            json!({"type": "register", "email": ADOPTER}).to_string().into(),
        ))
        .await
        .unwrap();

    // 注册是异步生效的，给注册表一个调度间隙
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::new();
    let sent: Value = client
        .post(app.url("/chat/message"))
        .json(&json!({
            "fromEmail": OWNER,
            "toEmail": ADOPTER,
            "content": "Interested in a meet?"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("push within deadline")
        .expect("stream open")
        .expect("frame ok");
    let event: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(event["type"], "receive_message");
    assert_eq!(event["message"], sent);

    // 推送副本与历史接口返回的落库副本逐字段一致
    let history: Value = client
        .get(app.url("/chat/messages"))
        .query(&[("user1", OWNER), ("user2", ADOPTER)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history[0], event["message"]);
}

#[tokio::test]
async fn sender_devices_also_receive_the_push() {
    let app = spawn_app().await;

    let (mut owner_socket, _) = connect_async(app.ws_url()).await.unwrap();
    owner_socket
        .send(Message::Text(
            json!({"type": "register", "email": OWNER}).to_string().into(),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    reqwest::Client::new()
        .post(app.url("/chat/message"))
        .json(&json!({"fromEmail": OWNER, "toEmail": ADOPTER, "content": "hi"}))
        .send()
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), owner_socket.next())
        .await
        .expect("push within deadline")
        .expect("stream open")
        .expect("frame ok");
    let event: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(event["message"]["content"], "hi");
}

#[tokio::test]
async fn unregistered_connection_gets_nothing() {
    let app = spawn_app().await;

    let (mut socket, _) = connect_async(app.ws_url()).await.unwrap();
    socket
        .send(Message::Text(
            json!({"type": "register", "email": "bystander@example.com"})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    reqwest::Client::new()
        .post(app.url("/chat/message"))
        .json(&json!({"fromEmail": OWNER, "toEmail": ADOPTER, "content": "private"}))
        .send()
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_millis(300), socket.next()).await;
    assert!(result.is_err(), "bystander must not receive the push");
}
