//! # 注册表配置
//!
//! ## 核心意图（Why）
//! - 注册表本身没有运行期开关，但底层 `DashMap` 的初始容量、分片数以及空闲判定阈值需要由宿主按负载调整；
//! - 配置以 TOML 文本交付，与工作区其它组件的配置载体保持一致。
//!
//! ## 行为契约（What）
//! - 缺省字段回落到 [`RegistryConfig::default`]；未知字段直接拒绝，避免拼写错误被静默忽略；
//! - `shard_amount` 若提供，必须是大于 1 的 2 的幂，这是 `DashMap` 的硬性要求，违反时返回
//!   [`BrokerError::InvalidConfig`] 而不是在构造注册表时 panic。

use std::time::Duration;

use serde::Deserialize;

use crate::error::{BrokerError, Result};

const DEFAULT_INITIAL_CAPACITY: usize = 1024;
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000;

/// [`ConsumerRegistry`](crate::ConsumerRegistry) 的构造参数。
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// 组索引的初始容量。
    pub initial_capacity: usize,
    /// 组索引的分片数；`None` 表示交由 `DashMap` 按 CPU 数自行决定。
    pub shard_amount: Option<usize>,
    /// 成员多久未刷新心跳即视为空闲，单位毫秒。
    pub idle_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            shard_amount: None,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl RegistryConfig {
    /// 从 TOML 文本解析并校验配置。
    ///
    /// - **输入**：完整的 TOML 文档，可为空串（全部取默认值）；
    /// - **输出**：校验通过的配置；语法错误映射为 [`BrokerError::ConfigParse`]，
    ///   语义错误映射为 [`BrokerError::InvalidConfig`]。
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验字段组合是否可被注册表接受。
    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards <= 1 || !shards.is_power_of_two() {
                return Err(BrokerError::invalid_config(
                    "shard_amount",
                    format!("expected a power of two greater than 1, got {shards}"),
                ));
            }
        }
        if self.idle_timeout_ms == 0 {
            return Err(BrokerError::invalid_config(
                "idle_timeout_ms",
                "idle timeout must be positive",
            ));
        }
        Ok(())
    }

    /// 空闲阈值的 [`Duration`] 视图，供 [`GroupState::idle_members`](crate::GroupState::idle_members) 使用。
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}
