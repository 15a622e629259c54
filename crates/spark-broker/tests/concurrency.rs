//! 注册表在多线程竞争下的不变量。
//!
//! # 教案级导览
//!
//! - **Why**：每条网络连接的事件都可能在不同工作线程上触发注册表操作，首次注册竞争、
//!   同组并发心跳与断链交错都必须收敛到唯一且完整的状态。
//! - **How**：以 `std::thread` 构造竞争者，借助 `Barrier` 让它们尽量同时进入临界区，
//!   结束后检查组实例唯一性、成员集合完整性与通知计数。
//! - **What**：测试均为纯内存场景，可在 CI 中快速运行。

mod common;

use std::{
    collections::BTreeSet,
    sync::{Arc, Barrier},
    thread,
};

use common::{TestChannel, identity, push_clustering, registry};
use spark_broker::Subscription;

const WORKERS: usize = 16;

#[test]
fn racing_first_registrations_share_one_group() {
    let registry = Arc::new(registry());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let addr = format!("10.0.0.{worker}:9000");
                barrier.wait();
                let changed = registry.register(
                    "G1",
                    identity(&addr, &format!("client-{worker}")),
                    TestChannel::new(worker as u64, &addr),
                    push_clustering(),
                    [Subscription::all("T1", 1)],
                );
                assert!(changed, "每个新成员的首次注册都是变化");
                registry.group_info("G1").expect("注册后组必然存在")
            })
        })
        .collect();

    let observed: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("注册线程不应 panic"))
        .collect();

    let survivor = registry.group_info("G1").expect("G1 已注册");
    assert!(
        observed.iter().all(|group| Arc::ptr_eq(group, &survivor)),
        "所有竞争者必须拿到同一个组实例"
    );
    assert_eq!(registry.len(), 1);

    let members: BTreeSet<u64> = survivor
        .snapshot_members()
        .into_iter()
        .map(|channel| channel.id)
        .collect();
    assert_eq!(
        members,
        (0..WORKERS as u64).collect::<BTreeSet<_>>(),
        "成员既不能丢失也不能重复"
    );
    assert_eq!(registry.listener().events_for("G1").len(), WORKERS);
}

#[test]
fn concurrent_heartbeats_for_one_member_notify_once() {
    let registry = Arc::new(registry());
    let barrier = Arc::new(Barrier::new(WORKERS));
    let channel = TestChannel::new(7, "addr7");

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let channel = channel.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.register(
                    "G1",
                    identity("addr7", "c7"),
                    channel,
                    push_clustering(),
                    [],
                )
            })
        })
        .collect();

    let changed = handles
        .into_iter()
        .map(|handle| handle.join().expect("心跳线程不应 panic"))
        .filter(|changed| *changed)
        .count();

    assert_eq!(changed, 1, "只有第一次写入能观察到变化");
    assert_eq!(registry.listener().len(), 1);
}

#[test]
fn groups_progress_independently_under_load() {
    let registry = Arc::new(registry());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let group = format!("G{}", worker % 4);
                barrier.wait();
                for round in 0..50u64 {
                    let addr = format!("w{worker}");
                    registry.register(
                        &group,
                        identity(&addr, "c"),
                        TestChannel::new(round, &addr),
                        push_clustering(),
                        [Subscription::all(format!("T{}", round % 3), round as i64)],
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("工作线程不应 panic");
    }

    assert_eq!(registry.group_names(), vec!["G0", "G1", "G2", "G3"]);
    for name in registry.group_names() {
        let group = registry.group_info(&name).expect("组已注册");
        assert_eq!(group.member_count(), WORKERS / 4);
        assert!(
            group
                .snapshot_members()
                .iter()
                .all(|channel| channel.id == 49),
            "每个成员最终停留在最后一次重连的句柄上"
        );
        assert_eq!(group.subscriptions().len(), 1, "订阅是整体替换而非合并");
    }
}

#[test]
fn connection_close_racing_with_registration_converges() {
    let registry = Arc::new(registry());
    for group in ["G1", "G2", "G3"] {
        registry.register(
            group,
            identity("doomed", "c0"),
            TestChannel::new(0, "doomed"),
            push_clustering(),
            [],
        );
    }

    let barrier = Arc::new(Barrier::new(2));
    let closer = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            registry.connection_closed("doomed", &TestChannel::new(0, "doomed"))
        })
    };
    let joiner = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for group in ["G1", "G2", "G3"] {
                registry.register(
                    group,
                    identity("alive", "c1"),
                    TestChannel::new(1, "alive"),
                    push_clustering(),
                    [],
                );
            }
        })
    };

    assert_eq!(closer.join().expect("断链线程不应 panic"), 3);
    joiner.join().expect("注册线程不应 panic");

    for group in ["G1", "G2", "G3"] {
        let members = registry
            .group_info(group)
            .expect("组已注册")
            .snapshot_members();
        assert_eq!(members, vec![TestChannel::new(1, "alive")]);
    }
}
