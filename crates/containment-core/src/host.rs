//! # 宿主平台协作方契约
//!
//! ## 定位（Why）
//! - 路由引擎不直接触碰浏览器 API：导航事件、标签页控制、容器清单与键值存储都经由本模块的 trait 注入；
//! - trait 通过 `async-trait` 保持对象安全，宿主实现以 `Arc<dyn …>` 形式交给仓储与拦截器。
//!
//! ## 契约（What）
//! - 所有方法以 [`HostError`] 表达失败，路由引擎不解析其内容；
//! - 实现必须满足 `Send + Sync + 'static`，拦截器会在并发导航之间共享同一实例。

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::container::{Container, PartitionId};
use crate::error::HostError;

/// 规则集在宿主键值存储中的固定键名。
pub const RULES_STORAGE_KEY: &str = "containerRules";

/// 宿主标签页标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// 一次顶层导航事件。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationEvent {
    pub url: String,
    /// 宿主内部合成的请求没有关联标签页。
    pub tab_id: Option<TabId>,
    /// 导航是否意图在前台展示；`None` 时由拦截器向宿主查询标签页状态。
    pub foreground: Option<bool>,
}

impl NavigationEvent {
    pub fn new(url: impl Into<String>, tab_id: TabId) -> Self {
        Self {
            url: url.into(),
            tab_id: Some(tab_id),
            foreground: None,
        }
    }

    #[must_use]
    pub fn with_foreground(mut self, foreground: bool) -> Self {
        self.foreground = Some(foreground);
        self
    }
}

/// 拦截器对一次导航的裁决。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationVerdict {
    /// 原样放行。
    Proceed,
    /// 已在目标容器重新打开，宿主应取消原始加载。
    Cancel,
}

/// 标签页的实时状态。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabInfo {
    pub partition: PartitionId,
    pub active: bool,
}

/// 在指定分区打开标签页的请求。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTabRequest {
    pub url: String,
    pub partition: PartitionId,
    /// 保留原始导航的前台/后台意图。
    pub active: bool,
    /// 被替换的原标签页，宿主可据此把新标签页放在相同位置。
    pub replaces: Option<TabId>,
}

/// 容器清单变更通知的种类。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryChange {
    Created,
    Removed,
    Updated,
}

/// 容器清单提供方。
#[async_trait]
pub trait ContainerProvider: Send + Sync + 'static {
    /// 枚举宿主当前全部容器，不含合成的默认分区。
    async fn list_containers(&self) -> Result<Vec<Container>, HostError>;
}

/// 规则持久化存储。
#[async_trait]
pub trait RuleStore: Send + Sync + 'static {
    /// 读取 [`RULES_STORAGE_KEY`] 下的原始载荷；键不存在时返回 `Value::Null`。
    async fn load_rules_payload(&self) -> Result<Value, HostError>;
}

/// 标签页控制。
#[async_trait]
pub trait TabHost: Send + Sync + 'static {
    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, HostError>;

    async fn open_tab(&self, request: OpenTabRequest) -> Result<TabId, HostError>;

    async fn close_tab(&self, tab: TabId) -> Result<(), HostError>;
}
