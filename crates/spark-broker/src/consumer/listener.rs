/// 成员变化的下游协作者。
///
/// # 教案式说明
/// - **意图 (Why)**：投递/路由组件需要在组成员变化后重新分配队列或切换推送目标；
///   注册表只负责在“确有变化”时通知一次，重平衡策略留给实现者；
/// - **契约 (What)**：
///   - `group`：发生变化的消费组；
///   - `members`：变化完成后该组的完整成员句柄列表，可能为空；
///   - 回调在触发线程上同步执行，发生在变更完成之后、公开操作返回之前；
///   - 调用时注册表不持有任何内部锁，实现者可以安全地回调注册表查询接口；
/// - **风险 (Trade-offs)**：不同组的变更可能并发回调，实现者需自行保证线程安全；
///   回调内的长耗时操作会直接拉长心跳处理时延。
pub trait MembershipListener<H>: Send + Sync {
    fn on_membership_changed(&self, group: &str, members: &[H]);
}

impl<H, F> MembershipListener<H> for F
where
    F: Fn(&str, &[H]) + Send + Sync,
{
    fn on_membership_changed(&self, group: &str, members: &[H]) {
        self(group, members)
    }
}

/// 丢弃所有通知的监听器，适用于只需要查询能力的场景。
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl<H> MembershipListener<H> for NoopListener {
    fn on_membership_changed(&self, _group: &str, _members: &[H]) {}
}
