//! 规则求值器性质验证
//!
//! - **核心目标 (Why)**：求值器是整个路由策略所在，优先级链
//!   “粘滞 > 高优先级按序 > 任意命中按序 > 原地不动 > 默认分区”必须在任意规则组合下成立；
//! - **设计手法 (How)**：用 Proptest 从小字母表（4 个容器、5 种模式、5 个 URL）生成规则集，
//!   让命中与冲突足够密集；每个容器的规则共享同一 [`RuleKind`]，与编写界面保证的不变量一致。
//!   各层优先级的前置条件由专门的策略直接构造（插入命中规则、剔除当前容器的命中规则），
//!   不依赖 `prop_assume!` 过滤；
//! - **断言 (What)**：每条性质独立成一个 proptest，失败时能直接定位违反的是哪一层优先级。

use containment_core::{
    Container, ContainerRegistry, DEFAULT_CONTAINER_NAME, Rule, RuleKind, RuleSet, decide, matches,
};
use proptest::prelude::*;
use proptest::sample::Index;

const CONTAINERS: [&str; 4] = ["A", "B", "C", "D"];
const PATTERNS: [&str; 5] = ["alpha", "beta", "/^https://gamma/", "/[bad/", ""];
const URLS: [&str; 5] = [
    "https://alpha.test/",
    "https://beta.test/alpha",
    "https://gamma.test/",
    "https://delta.test/",
    "https://gamma.test/beta",
];
/// 非法正则，永不命中。
const NEVER: &str = "/[bad/";

/// `(容器下标, 模式, 高优先级)`；规则种类在组装时由容器决定。
type RawRule = (usize, &'static str, bool);

#[derive(Clone, Debug)]
struct Scenario {
    restricted: [bool; 4],
    rules: Vec<Rule>,
    url: &'static str,
    current: Option<&'static str>,
}

impl Scenario {
    fn assemble(
        restricted: [bool; 4],
        raw: Vec<RawRule>,
        url: &'static str,
        current: Option<usize>,
    ) -> Self {
        let rules = raw
            .into_iter()
            .map(|(container, pattern, high)| {
                let name = CONTAINERS[container];
                let rule = if restricted[container] {
                    Rule::restricted(name, pattern)
                } else {
                    Rule::open(name, pattern)
                };
                rule.with_high_priority(high)
            })
            .collect();
        Self {
            restricted,
            rules,
            url,
            current: current.map(|idx| CONTAINERS[idx]),
        }
    }

    fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone())
    }

    fn decide(&self) -> String {
        decide(self.url, self.current, &self.rule_set(), &registry())
    }

    /// 命中 URL 的规则，保持编写顺序。
    fn candidates(&self) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|rule| matches(self.url, &rule.url_pattern))
            .collect()
    }

    fn current_has_candidate(&self) -> bool {
        let current = self.current.unwrap_or(DEFAULT_CONTAINER_NAME);
        self.candidates()
            .iter()
            .any(|rule| rule.container_name == current)
    }

    /// 当前容器为受限容器，且 URL 未命中其任何规则。
    fn current_expelled(&self) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let own: Vec<_> = self
            .rules
            .iter()
            .filter(|rule| rule.container_name == current)
            .collect();
        own.iter().any(|rule| rule.kind == RuleKind::Restricted)
            && !own.iter().any(|rule| matches(self.url, &rule.url_pattern))
    }
}

fn registry() -> ContainerRegistry {
    ContainerRegistry::from_containers(
        CONTAINERS
            .iter()
            .enumerate()
            .map(|(i, name)| Container::new(*name, format!("partition-{i}").as_str())),
    )
}

fn raw_rules() -> impl Strategy<Value = Vec<RawRule>> {
    prop::collection::vec(
        (0..CONTAINERS.len(), 0..PATTERNS.len(), any::<bool>())
            .prop_map(|(container, pattern, high)| (container, PATTERNS[pattern], high)),
        0..8,
    )
}

fn scenario() -> impl Strategy<Value = Scenario> {
    (
        prop::array::uniform4(any::<bool>()),
        raw_rules(),
        0..URLS.len(),
        prop::option::of(0..CONTAINERS.len()),
    )
        .prop_map(|(restricted, raw, url, current)| {
            Scenario::assemble(restricted, raw, URLS[url], current)
        })
}

/// 当前容器至少有一条命中 URL 的规则，插入位置与优先级任意。
fn sticky_scenario() -> impl Strategy<Value = Scenario> {
    (
        prop::array::uniform4(any::<bool>()),
        raw_rules(),
        0..URLS.len(),
        0..CONTAINERS.len(),
        any::<Index>(),
        any::<bool>(),
    )
        .prop_map(|(restricted, mut raw, url, current, at, high)| {
            let url = URLS[url];
            raw.insert(at.index(raw.len() + 1), (current, url, high));
            Scenario::assemble(restricted, raw, url, Some(current))
        })
}

/// 当前容器受限，且它的规则全部不命中 URL。
fn expelled_scenario() -> impl Strategy<Value = Scenario> {
    (
        prop::array::uniform4(any::<bool>()),
        raw_rules(),
        0..URLS.len(),
        0..CONTAINERS.len(),
    )
        .prop_map(|(mut restricted, mut raw, url, current)| {
            let url = URLS[url];
            restricted[current] = true;
            raw.retain(|(container, pattern, _)| *container != current || !matches(url, pattern));
            raw.push((current, NEVER, false));
            Scenario::assemble(restricted, raw, url, Some(current))
        })
}

/// 当前容器没有命中规则，但另有一个容器命中；`high` 决定插入的命中规则是否高优先级，
/// 为 `false` 时所有规则都降为普通优先级。
fn foreign_candidate_scenario(high: bool) -> impl Strategy<Value = Scenario> {
    (
        prop::array::uniform4(any::<bool>()),
        raw_rules(),
        0..URLS.len(),
        prop::option::of(0..CONTAINERS.len()),
        1..CONTAINERS.len(),
        any::<Index>(),
    )
        .prop_map(move |(restricted, raw, url, current, offset, at)| {
            let url = URLS[url];
            let mut raw: Vec<RawRule> = raw
                .into_iter()
                .filter(|(container, pattern, _)| {
                    Some(*container) != current || !matches(url, pattern)
                })
                .map(|(container, pattern, flag)| (container, pattern, high && flag))
                .collect();
            let target = (current.unwrap_or(0) + offset) % CONTAINERS.len();
            raw.insert(at.index(raw.len() + 1), (target, url, high));
            Scenario::assemble(restricted, raw, url, current)
        })
}

proptest! {
    #[test]
    fn prop_decision_is_deterministic(s in scenario()) {
        prop_assert_eq!(s.decide(), s.decide());
    }

    #[test]
    fn prop_eligible_current_with_candidate_is_sticky(s in sticky_scenario()) {
        prop_assert!(s.current_has_candidate());
        prop_assert!(!s.current_expelled());
        prop_assert_eq!(s.decide(), s.current.unwrap_or_default());
    }

    #[test]
    fn prop_restricted_container_expels_foreign_url(s in expelled_scenario()) {
        prop_assert!(s.current_expelled());
        let current = s.current.unwrap_or_default();
        prop_assert!(s.restricted[CONTAINERS.iter().position(|c| *c == current).unwrap_or(0)]);
        prop_assert_ne!(s.decide(), current);
    }

    #[test]
    fn prop_high_priority_outranks_order(s in foreign_candidate_scenario(true)) {
        prop_assert!(!s.current_has_candidate());
        let candidates = s.candidates();
        let first_high = candidates.iter().find(|rule| rule.high_priority);
        prop_assert!(first_high.is_some());
        let expected = first_high.map(|rule| rule.container_name.clone()).unwrap_or_default();
        prop_assert_eq!(s.decide(), expected);
    }

    #[test]
    fn prop_first_authored_candidate_breaks_ties(s in foreign_candidate_scenario(false)) {
        prop_assert!(!s.current_has_candidate());
        let candidates = s.candidates();
        prop_assert!(!candidates.is_empty());
        prop_assert!(candidates.iter().all(|rule| !rule.high_priority));
        prop_assert_eq!(s.decide(), candidates[0].container_name.clone());
    }

    #[test]
    fn prop_no_candidate_falls_back(s in scenario()) {
        prop_assume!(s.candidates().is_empty());
        let expected = match s.current {
            Some(current) if !s.current_expelled() => current,
            _ => DEFAULT_CONTAINER_NAME,
        };
        prop_assert_eq!(s.decide(), expected);
    }

    #[test]
    fn prop_result_is_always_a_known_container(s in scenario()) {
        prop_assert!(registry().contains(&s.decide()));
    }

    #[test]
    fn prop_pattern_matching_is_total(url in ".*", body in ".*") {
        let delimited = format!("/{body}/");
        let _ = matches(&url, &delimited);
        let _ = matches(&url, &body);
    }
}

fn work_registry() -> ContainerRegistry {
    ContainerRegistry::from_containers([
        Container::new("Work", "c-1"),
        Container::new("Personal", "c-2"),
        Container::new("A", "c-3"),
        Container::new("B", "c-4"),
    ])
}

#[test]
fn scenario_open_rule_routes_out_of_default() {
    let rules = RuleSet::new(vec![Rule::open("Work", "github.com")]);
    assert_eq!(
        decide(
            "https://github.com/x",
            Some(DEFAULT_CONTAINER_NAME),
            &rules,
            &work_registry()
        ),
        "Work"
    );
}

#[test]
fn scenario_priority_wins() {
    let rules = RuleSet::new(vec![
        Rule::open("Personal", "github.com"),
        Rule::open("Work", "github.com").with_high_priority(true),
    ]);
    assert_eq!(
        decide(
            "https://github.com",
            Some(DEFAULT_CONTAINER_NAME),
            &rules,
            &work_registry()
        ),
        "Work"
    );
}

#[test]
fn scenario_restricted_sends_foreign_url_home() {
    let rules = RuleSet::new(vec![Rule::restricted("Work", "work.com")]);
    assert_eq!(
        decide("https://facebook.com", Some("Work"), &rules, &work_registry()),
        DEFAULT_CONTAINER_NAME
    );
}

#[test]
fn scenario_no_rules_stays_put() {
    assert_eq!(
        decide(
            "https://example.org/anything",
            Some("Personal"),
            &RuleSet::default(),
            &work_registry()
        ),
        "Personal"
    );
}

#[test]
fn scenario_equal_priority_tie_goes_to_first_authored() {
    let rules = RuleSet::new(vec![
        Rule::open("A", "github.com").with_high_priority(true),
        Rule::open("B", "github.com").with_high_priority(true),
    ]);
    assert_eq!(
        decide("https://github.com", None, &rules, &work_registry()),
        "A"
    );
}
