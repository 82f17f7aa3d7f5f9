//! # 路由规则与有序规则集
//!
//! ## 核心意图（Why）
//! - 规则顺序具有语义：同一优先级层内“先写者胜出”，因此顺序必须从编写、持久化、装载一路保持到求值；
//! - 平局裁决依据装载时捕获的稳定下标，而不是某个可变容器的偶然迭代顺序。
//!
//! ## 契约（What）
//! - [`RuleSet`] 构造后不可变；仓储每次装载成功都整体替换 `Arc<RuleSet>`，从不原地修改；
//! - 同一容器的所有规则应具有相同的 [`RuleKind`]，混用属于编写界面负责拦截的配置错误，求值器不做仲裁。

use serde::{Deserialize, Serialize};

use crate::pattern::CompiledPattern;

/// 规则所属容器的接纳策略。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// 接纳匹配的 URL，也接纳其余任意 URL。
    Open,
    /// 仅接纳匹配自身规则的 URL，其余导航必须离开。
    Restricted,
}

/// 单条用户编写的路由规则。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub container_name: String,
    pub kind: RuleKind,
    pub url_pattern: String,
    #[serde(default)]
    pub high_priority: bool,
}

impl Rule {
    pub fn open(container_name: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            kind: RuleKind::Open,
            url_pattern: url_pattern.into(),
            high_priority: false,
        }
    }

    pub fn restricted(container_name: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            kind: RuleKind::Restricted,
            url_pattern: url_pattern.into(),
            high_priority: false,
        }
    }

    /// 将规则标记为高优先级。
    #[must_use]
    pub fn with_high_priority(mut self, high_priority: bool) -> Self {
        self.high_priority = high_priority;
        self
    }
}

/// 规则集中的一项：原始规则、装载时的稳定下标与预编译模式。
#[derive(Clone, Debug)]
pub struct IndexedRule {
    pub index: usize,
    pub rule: Rule,
    pub pattern: CompiledPattern,
}

impl IndexedRule {
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }
}

/// `RuleSet` 是某一时刻完整的有序规则序列。
///
/// # 教案式说明
/// - **意图 (Why)**：求值器需要稳定下标做平局裁决，也不希望每次导航都重新编译正则；
/// - **执行 (How)**：构造时按输入顺序枚举，记录下标并调用 [`CompiledPattern::compile`]；
/// - **契约 (What)**：`iter()` 的顺序即编写顺序，`index` 严格递增且从 0 开始。
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    entries: Vec<IndexedRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let entries = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                let pattern = CompiledPattern::compile(&rule.url_pattern);
                IndexedRule {
                    index,
                    rule,
                    pattern,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedRule> {
        self.entries.iter()
    }

    /// 属于指定容器的规则，保持编写顺序。
    pub fn for_container<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a IndexedRule> {
        self.entries
            .iter()
            .filter(move |entry| entry.rule.container_name == name)
    }

    /// 按编写顺序复制出原始规则，供编码回写。
    pub fn rules(&self) -> Vec<Rule> {
        self.entries.iter().map(|entry| entry.rule.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
