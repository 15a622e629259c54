//! # GroupState：单个消费组的可变记录
//!
//! ## 核心意图（Why）
//! - 维护一个组的成员表、订阅集合与消费策略，并对每次写操作回答“是否真的变了”；
//! - 变更检测必须与写入处于同一临界区：只有持锁时才同时看得到旧值与新值，
//!   若放到注册表层做差分，两次并发更新可能漏报或重复上报。
//!
//! ## 行为契约（What）
//! - 所有写操作在组内写锁下原子完成，并发读者不会观察到半更新状态；
//! - 成员表按 [`ClientIdentity`] 排序，快照顺序稳定，便于下游做确定性的队列分配；
//! - 组记录一旦创建就不会被销毁，成员清零后仍保留策略与订阅。
//!
//! ## 风险提示（Trade-offs）
//! - 读写锁粒度为整个组，单组成员数量极大时写操作会串行化；不同组之间互不阻塞。

use std::{
    collections::{BTreeMap, HashMap, btree_map::Entry},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{
    identity::{ChannelHandle, ClientIdentity},
    policy::ConsumptionPolicy,
    subscription::Subscription,
};

/// 单个成员的只读快照。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberInfo<H> {
    pub identity: ClientIdentity,
    pub handle: H,
    pub last_update: Instant,
}

#[derive(Debug)]
struct MemberEntry<H> {
    handle: H,
    last_update: Instant,
}

#[derive(Debug)]
struct GroupInner<H> {
    members: BTreeMap<ClientIdentity, MemberEntry<H>>,
    subscriptions: HashMap<Arc<str>, Subscription>,
    policy: ConsumptionPolicy,
    last_update: Instant,
}

/// 消费组状态。
///
/// # 教案式说明
/// - **意图 (Why)**：作为注册表的叶子节点，承载绝大部分比较与合并逻辑；
/// - **契约 (What)**：
///   - `update_*` / `remove_*` 返回 `true` 当且仅当可观察状态发生变化，调用方据此决定是否通知；
///   - 心跳时间戳的刷新不算变化，它只服务于外部的过期扫描；
/// - **执行 (How)**：内部以 `parking_lot::RwLock` 保护成员表、订阅与策略，查询走读锁。
#[derive(Debug)]
pub struct GroupState<H> {
    name: Arc<str>,
    created_at: Instant,
    inner: RwLock<GroupInner<H>>,
}

impl<H: ChannelHandle> GroupState<H> {
    /// 以首次注册携带的策略创建空组。
    ///
    /// - 输入：组名与首次注册的消费策略；
    /// - 输出：无成员、无订阅的组，`created_at` 与 `last_update` 取同一时刻。
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, policy: ConsumptionPolicy) -> Self {
        let now = Instant::now();
        Self {
            name: name.into(),
            created_at: now,
            inner: RwLock::new(GroupInner {
                members: BTreeMap::new(),
                subscriptions: HashMap::new(),
                policy,
                last_update: now,
            }),
        }
    }

    /// 组名，创建后不再改变。
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.name
    }

    /// 组记录的创建时刻；组记录不会被回收，因此该值在进程生命周期内稳定。
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// 最近一次任意写操作（含纯心跳）的时间。
    #[must_use]
    pub fn last_update(&self) -> Instant {
        self.inner.read().last_update
    }

    /// 当前生效的消费策略，即最近一次 `update_member` 写入的值。
    #[must_use]
    pub fn policy(&self) -> ConsumptionPolicy {
        self.inner.read().policy
    }

    /// 插入或刷新成员。
    ///
    /// # 教案式注释
    /// - **意图 (Why)**：同一身份的重复心跳是常态，只有新成员、换了连接句柄的重连，
    ///   或组级策略被改写时才需要通知下游；
    /// - **契约 (What)**：
    ///   - 无论返回值如何都会刷新成员与组的时间戳；
    ///   - `policy` 无条件覆盖组内记录；
    ///   - 返回 `true` 表示成员新增、句柄变化或策略变化之一成立。
    pub fn update_member(
        &self,
        identity: ClientIdentity,
        handle: H,
        policy: ConsumptionPolicy,
    ) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.write();
        inner.last_update = now;

        let policy_changed = inner.policy != policy;
        if policy_changed {
            debug!(
                group = %self.name,
                from = ?inner.policy,
                to = ?policy,
                "consumption policy changed"
            );
            inner.policy = policy;
        }

        let member_changed = match inner.members.entry(identity) {
            Entry::Vacant(vacant) => {
                debug!(group = %self.name, client = %vacant.key(), "member joined");
                vacant.insert(MemberEntry {
                    handle,
                    last_update: now,
                });
                true
            }
            Entry::Occupied(mut occupied) => {
                let client = occupied.key().clone();
                let entry = occupied.get_mut();
                entry.last_update = now;
                if entry.handle != handle {
                    debug!(group = %self.name, %client, "member reconnected with a new channel");
                    entry.handle = handle;
                    true
                } else {
                    trace!(group = %self.name, %client, "heartbeat refreshed");
                    false
                }
            }
        };

        policy_changed || member_changed
    }

    /// 以新集合整体替换订阅。
    ///
    /// # 教案式注释
    /// - **契约 (What)**：
    ///   - 输入中同一 Topic 出现多次时，后出现者生效；
    ///   - 替换而非合并：旧集合中不在输入里的 Topic 被移除；
    ///   - 按 Topic 键比较内容（表达式、Tag、版本），对象是否为同一实例无关紧要；
    /// - **返回**：任一 Topic 新增、移除或内容变化时为 `true`。
    pub fn update_subscriptions<I>(&self, subscriptions: I) -> bool
    where
        I: IntoIterator<Item = Subscription>,
    {
        let mut incoming: HashMap<Arc<str>, Subscription> = HashMap::new();
        for subscription in subscriptions {
            incoming.insert(subscription.topic_arc().clone(), subscription);
        }

        let mut inner = self.inner.write();
        inner.last_update = Instant::now();
        if inner.subscriptions == incoming {
            return false;
        }

        let added = incoming
            .keys()
            .filter(|topic| !inner.subscriptions.contains_key(*topic))
            .count();
        let removed = inner
            .subscriptions
            .keys()
            .filter(|topic| !incoming.contains_key(*topic))
            .count();
        debug!(
            group = %self.name,
            added,
            removed,
            total = incoming.len(),
            "subscriptions changed"
        );
        inner.subscriptions = incoming;
        true
    }

    /// 按身份移除成员；身份不存在时返回 `false`，可重复调用。
    pub fn remove_member(&self, identity: &ClientIdentity) -> bool {
        let removed = self.inner.write().members.remove(identity).is_some();
        if removed {
            debug!(group = %self.name, client = %identity, "member unregistered");
        }
        removed
    }

    /// 连接关闭后摘除所有走这条连接的成员。
    ///
    /// # 教案式注释
    /// - **意图 (Why)**：同一地址上可能残留多次重连留下的旧身份，断链时需要一次性清理干净；
    /// - **契约 (What)**：句柄与 `handle` 相等，或句柄的对端地址等于 `remote_addr` 的成员全部移除；
    ///   至少移除一个时返回 `true`。
    pub fn remove_by_channel(&self, remote_addr: &str, handle: &H) -> bool {
        let mut inner = self.inner.write();
        let before = inner.members.len();
        inner.members.retain(|_, entry| {
            entry.handle != *handle && entry.handle.remote_addr() != remote_addr
        });
        let removed = before - inner.members.len();
        if removed > 0 {
            debug!(
                group = %self.name,
                remote_addr,
                removed,
                "members dropped on channel close"
            );
        }
        removed > 0
    }

    /// 按 Topic 查询订阅。
    ///
    /// - 输入：Topic 名；
    /// - 输出：命中时返回订阅的克隆，未订阅时为 `None`。
    #[must_use]
    pub fn find_subscription(&self, topic: &str) -> Option<Subscription> {
        self.inner.read().subscriptions.get(topic).cloned()
    }

    /// 当前订阅集合，按 Topic 排序。
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let mut subscriptions: Vec<_> =
            self.inner.read().subscriptions.values().cloned().collect();
        subscriptions.sort_by(|a, b| a.topic().cmp(b.topic()));
        subscriptions
    }

    /// 是否订阅了 `topic`。
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.inner.read().subscriptions.contains_key(topic)
    }

    /// 所有成员连接句柄的时点快照，按身份排序。
    pub fn snapshot_members(&self) -> Vec<H> {
        self.inner
            .read()
            .members
            .values()
            .map(|entry| entry.handle.clone())
            .collect()
    }

    /// 所有成员的完整快照。
    pub fn members(&self) -> Vec<MemberInfo<H>> {
        self.inner
            .read()
            .members
            .iter()
            .map(|(identity, entry)| MemberInfo {
                identity: identity.clone(),
                handle: entry.handle.clone(),
                last_update: entry.last_update,
            })
            .collect()
    }

    /// 所有成员的客户端实例 ID，按身份排序；同一实例在多个地址上注册时会出现多次。
    pub fn client_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .members
            .keys()
            .map(|identity| identity.instance_id().to_owned())
            .collect()
    }

    /// 按客户端实例 ID 查找成员，命中多个时返回最近刷新的那个。
    pub fn find_member(&self, instance_id: &str) -> Option<MemberInfo<H>> {
        self.inner
            .read()
            .members
            .iter()
            .filter(|(identity, _)| identity.instance_id() == instance_id)
            .max_by_key(|(_, entry)| entry.last_update)
            .map(|(identity, entry)| MemberInfo {
                identity: identity.clone(),
                handle: entry.handle.clone(),
                last_update: entry.last_update,
            })
    }

    /// 当前成员数量。
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.inner.read().members.len()
    }

    /// 组内是否已无成员；空组依然保留订阅与策略。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().members.is_empty()
    }

    /// 超过 `timeout` 未刷新心跳的成员，供外部过期扫描使用；本方法不做任何移除。
    pub fn idle_members(&self, timeout: Duration) -> Vec<ClientIdentity> {
        self.idle_members_at(Instant::now(), timeout)
    }

    /// 以 `now` 为基准计算空闲成员。
    pub fn idle_members_at(&self, now: Instant, timeout: Duration) -> Vec<ClientIdentity> {
        self.inner
            .read()
            .members
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_update) > timeout)
            .map(|(identity, _)| identity.clone())
            .collect()
    }
}
