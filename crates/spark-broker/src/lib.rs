//! # spark-broker
//!
//! ## 定位与职责（Why）
//! - 作为 Broker 侧的消费组注册表，记录“哪些连接属于哪个消费组、该组订阅了什么、希望以何种方式消费”；
//! - 心跳、注册、注销与断链事件来自大量并发连接，本 crate 负责在并发下维持一致视图，并且只在
//!   **有意义的变化** 发生时通知下游，避免重复心跳引发的重平衡风暴。
//!
//! ## 架构嵌入（Where）
//! - `consumer` 模块承载注册表本体：[`GroupState`] 为单组状态叶子节点，[`ConsumerRegistry`]
//!   负责路由连接生命周期事件并驱动 [`MembershipListener`]；
//! - `config` 模块提供基于 TOML 的注册表配置；
//! - `error` 模块集中定义 `thiserror` 风格的错误类型，目前仅覆盖配置加载路径。
//!
//! ## 边界（What）
//! - 网络传输、消息投递、Topic 存储与协议解码均由外部协作者负责，本 crate 只接收已解码、已校验的输入；
//! - 注册表状态完全由存活连接的心跳派生，不做持久化，也不做跨 Broker 协调。

pub mod config;
pub mod consumer;
pub mod error;

pub use config::RegistryConfig;
pub use consumer::{
    ChannelHandle, ClientIdentity, ConsumeFromWhere, ConsumeType, ConsumerRegistry,
    ConsumptionPolicy, GroupState, MemberInfo, MembershipListener, MessageModel, NoopListener,
    Subscription,
};
pub use error::{BrokerError, Result};
