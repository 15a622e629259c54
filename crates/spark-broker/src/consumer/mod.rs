//! # consumer 模块说明
//!
//! ## 设计定位（Why）
//! - 聚合消费组注册表的全部组成部分：连接身份、消费策略、订阅关系、单组状态与全局路由；
//! - 依赖顺序自叶向根：`identity`/`policy`/`subscription` → `group` → `registry`。
//!
//! ## 契约边界（What）
//! - 连接句柄通过 [`ChannelHandle`] 抽象，注册表只做相等比较与原样回传，不拥有也不关闭连接；
//! - 变更通知通过 [`MembershipListener`] 同步回调，回调发生时不持有任何注册表内部锁。

mod group;
mod identity;
mod listener;
mod policy;
mod registry;
mod subscription;

pub use group::{GroupState, MemberInfo};
pub use identity::{ChannelHandle, ClientIdentity};
pub use listener::{MembershipListener, NoopListener};
pub use policy::{ConsumeFromWhere, ConsumeType, ConsumptionPolicy, MessageModel};
pub use registry::ConsumerRegistry;
pub use subscription::Subscription;
