//! 统一配置中心。
//!
//! 提供应用的全局配置管理，包括：
//! - 数据库连接
//! - 卡片栈参数（栈容量、补货水位）
//! - 服务设置

use serde::{Deserialize, Serialize};
use std::env;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 服务配置
    pub server: ServerConfig,
    /// 卡片栈配置
    pub deck: DeckConfig,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 为空时回退到内存存储（仅限本地运行）
    pub url: Option<String>,
    pub max_connections: u32,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 卡片栈配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeckConfig {
    /// 每次重建取的卡片数
    pub size: usize,
    /// 补货水位：剩余 ≤ low_water 时提示客户端重取
    pub low_water: usize,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            size: 10,
            low_water: 4,
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置。
    /// DATABASE_URL 缺失不是错误：服务会以内存存储启动，
    /// 仅适合本地联调，日志里会有明确提示。
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                max_connections: env_parsed("DB_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_parsed("SERVER_PORT", 8080),
            },
            deck: DeckConfig {
                size: env_parsed("DECK_SIZE", 10),
                low_water: env_parsed("DECK_LOW_WATER", 4),
            },
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_defaults_match_product_policy() {
        let deck = DeckConfig::default();
        assert_eq!(deck.size, 10);
        assert_eq!(deck.low_water, 4);
    }
}
