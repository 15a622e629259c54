use std::{fmt, sync::Arc};

/// 注册表眼中的连接句柄。
///
/// # 教案式说明
/// - **意图 (Why)**：注册表需要记录“成员当前走哪条连接”，以便通知下游重新路由，但连接的生命周期
///   归传输层所有。该 trait 只暴露注册表真正需要的两件事：相等比较与对端地址；
/// - **契约 (What)**：
///   - `Eq` 用于判断重连后句柄是否发生变化；
///   - [`remote_addr`](Self::remote_addr) 用于断链时按地址批量摘除残留成员；
///   - 实现者通常是 `Arc<Channel>` 的轻量包装或连接 ID，`clone` 应当廉价；
/// - **风险 (Trade-offs)**：注册表永远不会调用任何关闭/释放动作，句柄若持有强引用，
///   其资源回收仍由传输层负责。
pub trait ChannelHandle: Clone + Eq + fmt::Debug + Send + Sync + 'static {
    /// 连接对端的网络地址，格式需与断链事件携带的地址一致。
    fn remote_addr(&self) -> &str;
}

/// 消费端的逻辑身份：对端地址加客户端实例 ID。
///
/// 两次注册携带相同身份即视为同一成员，即便底层连接句柄已经更换（重连）。
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClientIdentity {
    remote_addr: Arc<str>,
    instance_id: Arc<str>,
}

impl ClientIdentity {
    pub fn new(remote_addr: impl Into<Arc<str>>, instance_id: impl Into<Arc<str>>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            instance_id: instance_id.into(),
        }
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// 客户端自生成的实例 ID（RocketMQ 语境下的 clientId）。
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.instance_id, self.remote_addr)
    }
}
