//! 消费组级别的消费策略。
//!
//! 三个枚举的取值与客户端心跳中的同名字段一一对应；解码由协议层完成，这里只保留强类型表示。

use serde::Deserialize;

/// 消费方式：Broker 主动推送还是客户端主动拉取。
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumeType {
    Push,
    Pull,
}

/// 消息模型：广播给每个成员，或在成员间分摊（集群消费）。
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageModel {
    Broadcasting,
    Clustering,
}

/// 消费组首次上线（无已提交位点）时从何处开始消费。
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub enum ConsumeFromWhere {
    #[serde(rename = "CONSUME_FROM_LAST_OFFSET")]
    LastOffset,
    #[serde(rename = "CONSUME_FROM_FIRST_OFFSET")]
    FirstOffset,
    #[serde(rename = "CONSUME_FROM_TIMESTAMP")]
    Timestamp,
}

/// 消费组的整体消费策略。
///
/// # 教案式说明
/// - **意图 (Why)**：三项策略总是随心跳一起上报、一起比较，打包成值类型后，
///   [`GroupState::update_member`](crate::GroupState::update_member) 只需一次 `!=` 即可判断策略是否变化；
/// - **契约 (What)**：`Copy` 语义，首次注册时记录，后续每次注册无条件覆盖为最新值。
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub struct ConsumptionPolicy {
    pub consume_type: ConsumeType,
    pub message_model: MessageModel,
    pub consume_from: ConsumeFromWhere,
}

impl ConsumptionPolicy {
    pub const fn new(
        consume_type: ConsumeType,
        message_model: MessageModel,
        consume_from: ConsumeFromWhere,
    ) -> Self {
        Self {
            consume_type,
            message_model,
            consume_from,
        }
    }

    /// 是否需要 Broker 维护组内负载均衡（集群消费）。
    pub fn is_clustering(&self) -> bool {
        self.message_model == MessageModel::Clustering
    }
}
