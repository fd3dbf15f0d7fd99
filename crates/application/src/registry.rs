//! 推送通道注册表。
//!
//! 维护"身份 → 活跃连接"的弱关联：同一身份可以挂多个连接
//! （多标签页/多设备），查表只用于尽力推送，从不阻塞消息的
//! 持久化与读取，也不是任何业务状态的事实来源。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::UserId;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::dto::MessageDto;

/// 单个连接的句柄标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 推送给长连接的事件。消息体复用 [`MessageDto`]，与历史接口
/// 返回的序列化结果逐字段一致。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    ReceiveMessage { message: MessageDto },
}

/// 连接写端。发送失败（对端已断开）由调用方忽略，
/// 清理在连接自己的注销路径里完成。
pub type ChannelSender = mpsc::UnboundedSender<PushEvent>;

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 把一个活跃连接挂到身份名下，返回用于注销的句柄。
    async fn register(&self, user_id: UserId, sender: ChannelSender) -> ConnectionId;

    /// 摘掉且只摘掉断开的那一个连接。
    async fn unregister(&self, connection_id: ConnectionId);

    /// 该身份当前全部活跃连接的写端；没有连接时返回空表。
    async fn channels_for(&self, user_id: &UserId) -> Vec<ChannelSender>;
}

struct RegisteredChannel {
    id: ConnectionId,
    sender: ChannelSender,
}

#[derive(Default)]
struct RegistryState {
    /// 身份到连接的映射
    user_channels: HashMap<UserId, Vec<RegisteredChannel>>,
    /// 反向索引，注销时定位归属身份
    owners: HashMap<ConnectionId, UserId>,
}

/// 进程内注册表实现。
#[derive(Clone, Default)]
pub struct LocalConnectionRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl LocalConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for LocalConnectionRegistry {
    async fn register(&self, user_id: UserId, sender: ChannelSender) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let mut state = self.state.write().await;
        state
            .user_channels
            .entry(user_id.clone())
            .or_default()
            .push(RegisteredChannel {
                id: connection_id,
                sender,
            });
        state.owners.insert(connection_id, user_id.clone());
        tracing::debug!(%connection_id, user = %user_id, "connection registered");
        connection_id
    }

    async fn unregister(&self, connection_id: ConnectionId) {
        let mut state = self.state.write().await;
        let Some(user_id) = state.owners.remove(&connection_id) else {
            return;
        };
        if let Some(channels) = state.user_channels.get_mut(&user_id) {
            channels.retain(|channel| channel.id != connection_id);
            if channels.is_empty() {
                state.user_channels.remove(&user_id);
            }
        }
        tracing::debug!(%connection_id, user = %user_id, "connection unregistered");
    }

    async fn channels_for(&self, user_id: &UserId) -> Vec<ChannelSender> {
        let state = self.state.read().await;
        state
            .user_channels
            .get(user_id)
            .map(|channels| {
                channels
                    .iter()
                    .map(|channel| channel.sender.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
