//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 注册表的读写路径本身不会失败：组不存在、订阅不存在都属于常态，以 `Option::None` 表达；
//! - 真正可能失败的只有配置加载，本模块为其提供集中定义，便于宿主进程在启动期统一上报。
//!
//! ## 设计要求（What）
//! - 所有错误类型实现 `thiserror::Error`，满足 `Send + Sync + 'static`，可跨线程传播；
//! - 并发创建出两个 [`GroupState`](crate::GroupState) 之类的不变量破坏由结构保证杜绝，
//!   不在此处建模为运行时错误。

use thiserror::Error;

/// 本 crate 统一的结果别名。
pub type Result<T, E = BrokerError> = core::result::Result<T, E>;

/// Broker 注册表错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：为配置阶段的失败提供可读上下文，帮助运维在启动时快速定位错误字段；
/// - **契约 (What)**：
///   - `InvalidConfig` 表示语法正确但语义非法的配置，`field` 指向出错字段；
///   - `ConfigParse` 包装 `toml` 的反序列化错误，保留行列信息；
/// - **设计权衡 (Trade-offs)**：使用 `String` 保存上下文，牺牲少量堆分配换取易读性。
#[derive(Debug, Error)]
pub enum BrokerError {
    /// 配置字段取值非法。
    #[error("invalid registry config `{field}`: {detail}")]
    InvalidConfig { field: &'static str, detail: String },

    /// TOML 文本无法解析为 [`RegistryConfig`](crate::RegistryConfig)。
    #[error("failed to parse registry config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl BrokerError {
    /// 构造 [`BrokerError::InvalidConfig`] 的便捷方法，减少调用点的 `String` 样板代码。
    pub fn invalid_config(field: &'static str, detail: impl Into<String>) -> Self {
        BrokerError::InvalidConfig {
            field,
            detail: detail.into(),
        }
    }
}
