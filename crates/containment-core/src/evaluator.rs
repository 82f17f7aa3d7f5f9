//! # 规则求值器
//!
//! ## 路由策略（What）
//! 优先级自高向低，且必须严格按此顺序：
//! 1. 当前容器仍有资格且存在命中自身的候选规则 → 原地不动（粘滞）；
//! 2. 高优先级候选中编写顺序最靠前者；
//! 3. 全部候选中编写顺序最靠前者；
//! 4. 无任何候选且当前容器仍有资格 → 原地不动（不强制回到默认分区）；
//! 5. 否则回到默认分区。
//!
//! “有资格”指：当前容器不是受限容器，或 URL 命中其至少一条受限规则。
//!
//! ## 纯函数约束（Why）
//! - 不做 I/O、不持有状态，同样的输入永远得到同样的结果；这是整个系统中最值得做属性测试的部分。

use crate::container::{ContainerRegistry, DEFAULT_CONTAINER_NAME};
use crate::rule::{IndexedRule, RuleKind, RuleSet};

/// 求值结果：目标容器名与命中原因。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub target: String,
    pub reason: DecisionReason,
}

/// 目标容器的选择依据，仅用于诊断。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionReason {
    /// 当前容器有资格且存在命中自身的规则。
    Sticky,
    /// 编写顺序最靠前的高优先级候选。
    HighPriority { index: usize },
    /// 编写顺序最靠前的候选。
    FirstMatch { index: usize },
    /// 无候选，留在当前容器。
    StayPut,
    /// 当前受限容器拒绝该 URL 且无候选，回到默认分区。
    Expelled,
}

/// 计算导航应当所在的容器名。
///
/// - `current`：标签页当前所在容器名；缺省或为空串时视为默认分区；
/// - 引用了清单中不存在的容器的规则不产生候选，静默忽略。
pub fn decide(
    url: &str,
    current: Option<&str>,
    rules: &RuleSet,
    registry: &ContainerRegistry,
) -> String {
    evaluate(url, current, rules, registry).target
}

/// 与 [`decide`] 相同，额外给出选择依据。
pub fn evaluate(
    url: &str,
    current: Option<&str>,
    rules: &RuleSet,
    registry: &ContainerRegistry,
) -> Decision {
    let current = current
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CONTAINER_NAME);

    let target = if is_expelled(url, current, rules) {
        None
    } else {
        Some(current)
    };

    let mut first_high: Option<&IndexedRule> = None;
    let mut first_any: Option<&IndexedRule> = None;

    for entry in rules.iter() {
        let name = entry.rule.container_name.as_str();
        if !registry.contains(name) || !entry.matches(url) {
            continue;
        }
        if target == Some(name) {
            return Decision {
                target: name.to_owned(),
                reason: DecisionReason::Sticky,
            };
        }
        if entry.rule.high_priority && first_high.is_none() {
            first_high = Some(entry);
        }
        if first_any.is_none() {
            first_any = Some(entry);
        }
    }

    if let Some(entry) = first_high {
        return Decision {
            target: entry.rule.container_name.clone(),
            reason: DecisionReason::HighPriority { index: entry.index },
        };
    }
    if let Some(entry) = first_any {
        return Decision {
            target: entry.rule.container_name.clone(),
            reason: DecisionReason::FirstMatch { index: entry.index },
        };
    }

    match target {
        Some(name) => Decision {
            target: name.to_owned(),
            reason: DecisionReason::StayPut,
        },
        None => Decision {
            target: DEFAULT_CONTAINER_NAME.to_owned(),
            reason: DecisionReason::Expelled,
        },
    }
}

/// 当前容器是受限容器且 URL 未命中其任何受限规则时返回 `true`。
fn is_expelled(url: &str, current: &str, rules: &RuleSet) -> bool {
    if ContainerRegistry::is_default_name(current) {
        return false;
    }
    let mut restricted = rules
        .for_container(current)
        .filter(|entry| entry.rule.kind == RuleKind::Restricted)
        .peekable();
    if restricted.peek().is_none() {
        return false;
    }
    !restricted.any(|entry| entry.matches(url))
}
