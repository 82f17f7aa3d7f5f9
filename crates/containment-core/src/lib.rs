#![deny(unsafe_code)]
#![doc = "containment-core: 容器路由引擎的核心契约与纯函数求值层。"]
#![doc = ""]
#![doc = "本 crate 只包含无副作用的部分：容器/规则数据模型、模式匹配、规则求值，"]
#![doc = "以及宿主平台协作方（容器清单、规则存储、标签页控制）的 trait 契约。"]
#![doc = "有状态的仓储与导航拦截器位于 `containment-router`。"]

/// 规则持久化载荷的编解码契约与 JSON 默认实现。
///
/// - **意图 (Why)**：持久化格式历经多次演进（裸数组、带版本号、带压缩标记），解码职责集中在此处；
/// - **契约 (What)**：[`codec::RuleCodec`] 为外部协作方接口，[`codec::JsonRuleCodec`] 覆盖未压缩形态。
pub mod codec;

/// 容器（存储分区）与容器清单。
pub mod container;

/// 错误类型集中声明处。
pub mod error;

/// 规则求值器：把 `(url, 当前容器, 规则集, 清单)` 映射为目标容器。
///
/// - **意图 (Why)**：路由策略的全部优先级都在这里，保持纯函数以便属性测试；
/// - **契约 (What)**：[`evaluator::decide`] 为全函数，不做 I/O，不持有可变状态。
pub mod evaluator;

/// 宿主平台协作方契约。
pub mod host;

/// 可注入的诊断观察者，替代全局日志旁路。
pub mod observability;

/// URL 模式匹配：字面子串与 `/…/` 定界正则两种模式。
pub mod pattern;

/// 用户编写的路由规则与有序规则集。
pub mod rule;

/// 可注入时钟。
pub mod time;

pub use codec::{JsonRuleCodec, RuleCodec};
pub use container::{Container, ContainerRegistry, DEFAULT_CONTAINER_NAME, PartitionId};
pub use error::{DecodeError, HostError};
pub use evaluator::{Decision, DecisionReason, decide, evaluate};
pub use host::{
    ContainerProvider, InventoryChange, NavigationEvent, NavigationVerdict, OpenTabRequest,
    RULES_STORAGE_KEY, RuleStore, TabHost, TabId, TabInfo,
};
pub use observability::{
    NoopObserver, RefreshKind, RoutingObserver, SuppressReason, TracingObserver,
};
pub use pattern::{CompiledPattern, matches};
pub use rule::{IndexedRule, Rule, RuleKind, RuleSet};
pub use time::{Clock, ManualClock, Sleep, SystemClock};
