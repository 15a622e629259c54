use std::{collections::BTreeSet, sync::Arc};

/// 订阅全部消息的表达式。
pub const SUBSCRIBE_ALL: &str = "*";

/// 消费组对单个 Topic 的订阅。
///
/// # 教案式说明
/// - **意图 (Why)**：订阅集合以 Topic 为键，同一组内每个 Topic 只保留最新的一条订阅；
///   变更检测依赖结构相等，因此过滤表达式、解析出的 Tag 集合与版本号都参与比较；
/// - **契约 (What)**：
///   - `expression` 为客户端上报的原始过滤表达式，`*` 或空串表示订阅全部；
///   - `tags` 由表达式按 `||` 切分得到，使用 `BTreeSet` 保证比较与顺序无关；
///   - `version` 为客户端生成的订阅版本，版本变化即视为订阅变化；
/// - **风险 (Trade-offs)**：表达式只做 Tag 级解析，SQL 类过滤由投递侧协作者自行处理。
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Subscription {
    topic: Arc<str>,
    expression: Arc<str>,
    tags: BTreeSet<String>,
    version: i64,
}

impl Subscription {
    pub fn new(topic: impl Into<Arc<str>>, expression: impl Into<Arc<str>>, version: i64) -> Self {
        let expression = expression.into();
        let tags = parse_tags(&expression);
        Self {
            topic: topic.into(),
            expression,
            tags,
            version,
        }
    }

    /// 订阅全部消息的便捷构造。
    pub fn all(topic: impl Into<Arc<str>>, version: i64) -> Self {
        Self::new(topic, SUBSCRIBE_ALL, version)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub(crate) fn topic_arc(&self) -> &Arc<str> {
        &self.topic
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// 是否不做 Tag 过滤。
    pub fn subscribes_all(&self) -> bool {
        self.tags.is_empty()
    }

    /// 判断带有 `tag` 的消息是否命中该订阅；`None` 表示消息未打 Tag。
    pub fn accepts(&self, tag: Option<&str>) -> bool {
        if self.subscribes_all() {
            return true;
        }
        tag.is_some_and(|tag| self.tags.contains(tag))
    }
}

fn parse_tags(expression: &str) -> BTreeSet<String> {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed == SUBSCRIBE_ALL {
        return BTreeSet::new();
    }
    trimmed
        .split("||")
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
