//! # ConsumerRegistry：消费组注册表
//!
//! ## 核心意图（Why）
//! - 以 `DashMap` 维护“组名 → [`GroupState`]”索引，把连接生命周期事件路由到对应的组；
//! - 在组状态确有变化时，以该组变更后的完整成员列表回调 [`MembershipListener`]。
//!
//! ## 行为契约（What）
//! - `register`：组不存在时原子创建，并发首次注册只会留下同一个实例；
//! - `unregister`：组不存在视为无操作；
//! - `connection_closed`：遍历全部组，仅受影响的组各自通知一次；
//! - 回调发生在组锁与 `DashMap` 分片锁都已释放之后，监听器可安全回调注册表。
//!
//! ## 风险提示（Trade-offs）
//! - 组记录一旦创建不会被回收，成员清零的组仍然保留；
//! - `connection_closed` 的开销与组总数成正比，其余操作只触及单个组。

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::{debug, info};

use crate::{config::RegistryConfig, error::Result};

use super::{
    group::GroupState,
    identity::{ChannelHandle, ClientIdentity},
    listener::{MembershipListener, NoopListener},
    policy::ConsumptionPolicy,
    subscription::Subscription,
};

/// Broker 侧的消费组注册表。
///
/// # 教案式说明
/// - **意图 (Why)**：封装并发索引与通知时机，避免协议处理层直接操作 `DashMap` 或自行判断是否需要重平衡；
/// - **契约 (What)**：
///   - `H`：连接句柄类型，只用于比较与回传；
///   - `L`：成员变化监听器，默认 [`NoopListener`]；
///   - 所有操作均不会失败，缺失以 `None`/`false` 表达；
/// - **执行 (How)**：索引值为 `Arc<GroupState<H>>`，取出后立即释放分片锁，
///   再在组内锁下完成读改写。
#[derive(Debug)]
pub struct ConsumerRegistry<H, L = NoopListener> {
    groups: DashMap<Arc<str>, Arc<GroupState<H>>>,
    listener: L,
    config: RegistryConfig,
}

impl<H: ChannelHandle> Default for ConsumerRegistry<H, NoopListener> {
    fn default() -> Self {
        Self::new(NoopListener)
    }
}

impl<H, L> ConsumerRegistry<H, L>
where
    H: ChannelHandle,
    L: MembershipListener<H>,
{
    /// 使用默认配置创建注册表。
    #[must_use]
    pub fn new(listener: L) -> Self {
        let config = RegistryConfig::default();
        Self {
            groups: DashMap::with_capacity(config.initial_capacity),
            listener,
            config,
        }
    }

    /// 按配置创建注册表；配置非法时返回 [`BrokerError::InvalidConfig`](crate::BrokerError::InvalidConfig)。
    pub fn with_config(config: RegistryConfig, listener: L) -> Result<Self> {
        config.validate()?;
        let groups = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards)
            }
            None => DashMap::with_capacity(config.initial_capacity),
        };
        Ok(Self {
            groups,
            listener,
            config,
        })
    }

    /// 构造时生效的配置。
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 成员变更回调，便于宿主在测试或诊断时读取监听器内部状态。
    #[must_use]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// 处理一次注册或心跳。
    ///
    /// # 教案式注释
    /// - **意图 (Why)**：心跳与首次注册走同一路径，只有成员、策略或订阅确有变化时才通知下游；
    /// - **契约 (What)**：
    ///   - 组不存在时以 `policy` 创建，并发竞争时先写入者胜出，所有调用方拿到同一实例；
    ///   - 依次调用 [`GroupState::update_member`] 与 [`GroupState::update_subscriptions`]；
    ///   - 任一返回 `true` 时通知恰好一次，返回两者的逻辑或。
    pub fn register<I>(
        &self,
        group: &str,
        identity: ClientIdentity,
        handle: H,
        policy: ConsumptionPolicy,
        subscriptions: I,
    ) -> bool
    where
        I: IntoIterator<Item = Subscription>,
    {
        let state = self.group_or_create(group, policy);
        let member_changed = state.update_member(identity, handle, policy);
        let subscription_changed = state.update_subscriptions(subscriptions);

        let changed = member_changed || subscription_changed;
        if changed {
            self.notify(&state);
        }
        changed
    }

    /// 客户端主动注销；组不存在或成员不存在时不做任何事。
    pub fn unregister(&self, group: &str, identity: &ClientIdentity) -> bool {
        let Some(state) = self.group_info(group) else {
            debug!(group, client = %identity, "unregister for unknown group ignored");
            return false;
        };
        let removed = state.remove_member(identity);
        if removed {
            self.notify(&state);
        }
        removed
    }

    /// 连接关闭事件：从所有组中摘除该连接上的成员。
    ///
    /// # 教案式注释
    /// - **契约 (What)**：对每个组调用 [`GroupState::remove_by_channel`]，
    ///   返回 `true` 的组各自通知一次（成员列表可能为空），未受影响的组不通知；
    /// - **执行 (How)**：先克隆出全部 `Arc<GroupState>` 再逐个处理，遍历期间不持有分片锁；
    /// - **返回**：受影响的组数量。
    pub fn connection_closed(&self, remote_addr: &str, handle: &H) -> usize {
        let mut affected = 0;
        for state in self.snapshot_groups() {
            if state.remove_by_channel(remote_addr, handle) {
                affected += 1;
                self.notify(&state);
            }
        }

        if affected > 0 {
            info!(remote_addr, affected, "channel closed, consumer groups updated");
        }
        affected
    }

    /// 查询组记录。
    ///
    /// - 输入：组名；
    /// - 输出：组曾被注册过时返回共享的 `Arc<GroupState>`，成员清零后依然可查；从未注册时为 `None`。
    #[must_use]
    pub fn group_info(&self, group: &str) -> Option<Arc<GroupState<H>>> {
        self.groups.get(group).map(|entry| Arc::clone(entry.value()))
    }

    /// 组未知或 Topic 未订阅时返回 `None`。
    pub fn find_subscription(&self, group: &str, topic: &str) -> Option<Subscription> {
        self.group_info(group)?.find_subscription(topic)
    }

    /// 订阅了 `topic` 的全部组名，按字典序排列。
    pub fn groups_subscribing(&self, topic: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .iter()
            .filter(|entry| entry.value().is_subscribed(topic))
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    /// 已知的全部组名，按字典序排列；包含成员已清零的组。
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    /// 按配置的空闲阈值列出各组中心跳过期的成员，供外部扫描器决定是否断链。
    pub fn idle_members(&self) -> Vec<(String, ClientIdentity)> {
        let timeout = self.config.idle_timeout();
        let mut idle = Vec::new();
        for state in self.snapshot_groups() {
            for identity in state.idle_members(timeout) {
                idle.push((state.group_name().to_owned(), identity));
            }
        }
        idle
    }

    /// 已知组的数量，含空组。
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// 是否尚未登记任何组。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group_or_create(&self, group: &str, policy: ConsumptionPolicy) -> Arc<GroupState<H>> {
        if let Some(state) = self.group_info(group) {
            return state;
        }
        match self.groups.entry(Arc::from(group)) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let state = Arc::new(GroupState::new(Arc::clone(vacant.key()), policy));
                vacant.insert(Arc::clone(&state));
                info!(group, ?policy, "consumer group created");
                state
            }
        }
    }

    /// 克隆出全部组的引用，随即释放分片锁。
    fn snapshot_groups(&self) -> Vec<Arc<GroupState<H>>> {
        self.groups
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    fn notify(&self, state: &GroupState<H>) {
        let members = state.snapshot_members();
        debug!(group = state.group_name(), members = members.len(), "membership changed");
        self.listener.on_membership_changed(state.group_name(), &members);
    }
}
