//! 集成测试共享的连接句柄与记录型监听器。
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use spark_broker::{
    ChannelHandle, ClientIdentity, ConsumeFromWhere, ConsumeType, ConsumerRegistry,
    ConsumptionPolicy, MembershipListener, MessageModel,
};

/// 模拟传输层连接：`id` 区分同一地址上的不同物理连接。
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TestChannel {
    pub id: u64,
    pub addr: Arc<str>,
}

impl TestChannel {
    pub fn new(id: u64, addr: &str) -> Self {
        Self {
            id,
            addr: Arc::from(addr),
        }
    }
}

impl ChannelHandle for TestChannel {
    fn remote_addr(&self) -> &str {
        &self.addr
    }
}

/// 记录每一次成员变化通知。
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(String, Vec<TestChannel>)>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<(String, Vec<TestChannel>)> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, group: &str) -> Vec<Vec<TestChannel>> {
        self.events
            .lock()
            .iter()
            .filter(|(name, _)| name == group)
            .map(|(_, members)| members.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl MembershipListener<TestChannel> for RecordingListener {
    fn on_membership_changed(&self, group: &str, members: &[TestChannel]) {
        self.events.lock().push((group.to_owned(), members.to_vec()));
    }
}

pub type TestRegistry = ConsumerRegistry<TestChannel, RecordingListener>;

pub fn registry() -> TestRegistry {
    ConsumerRegistry::new(RecordingListener::default())
}

pub fn push_clustering() -> ConsumptionPolicy {
    ConsumptionPolicy::new(
        ConsumeType::Push,
        MessageModel::Clustering,
        ConsumeFromWhere::LastOffset,
    )
}

pub fn identity(addr: &str, client: &str) -> ClientIdentity {
    ClientIdentity::new(addr, client)
}
