//! 基础设施层。
//!
//! 提供应用层仓储接口的 PostgreSQL 实现。卡片栈存储没有数据库
//! 实现：栈按设计是进程内状态，默认实现在应用层的 `memory` 模块。

pub mod repository;

pub use repository::{
    create_pg_pool, PgFavoriteRepository, PgListingRepository, PgMessageRepository,
};
