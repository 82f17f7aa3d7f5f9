//! 可注入的诊断观察者。
//!
//! # 设计缘起（Why）
//! - 路由引擎的诊断输出不应经由全局日志旁路，而是作为可选协作方注入；
//! - 观察者只接收事件，不参与控制流，也不改变任何错误语义。
//!
//! # 总体结构（How）
//! - [`RoutingObserver`] 的全部方法都带空默认实现，嵌入方只覆盖关心的事件；
//! - [`TracingObserver`] 为默认实现，把事件转为结构化 `tracing` 记录；
//! - [`NoopObserver`] 用于完全静默的嵌入场景与基准测试。

use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::evaluator::Decision;
use crate::host::TabId;

/// 仓储缓存的种类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshKind {
    Containers,
    Rules,
}

impl fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Containers => "containers",
            Self::Rules => "rules",
        })
    }
}

/// 拦截器放行且不处理某次导航的原因。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// 特权/内部协议，永不迁移。
    PrivilegedScheme,
    /// 宿主合成的无标签页事件。
    NoTab,
    /// 同一 `(标签页, URL)` 在窗口期内重复投递。
    DuplicateRequest,
    /// 同一 URL 在窗口期内已被迁移过。
    DuplicateRedirect,
    /// 同一对 `来源容器 → 目标容器` 在窗口期内刚迁移过，视为重定向链。
    RedirectChain,
    /// 已处于目标容器。
    AlreadyInTarget,
}

impl SuppressReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrivilegedScheme => "privileged_scheme",
            Self::NoTab => "no_tab",
            Self::DuplicateRequest => "duplicate_request",
            Self::DuplicateRedirect => "duplicate_redirect",
            Self::RedirectChain => "redirect_chain",
            Self::AlreadyInTarget => "already_in_target",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 路由引擎的诊断事件接收方。
///
/// # 合约说明（What）
/// - 实现必须线程安全（`Send + Sync + 'static`），并且不得阻塞：回调在导航处理路径上同步执行；
/// - 回调内部的失败只能自行吞掉，不得 panic。
pub trait RoutingObserver: Send + Sync + 'static {
    /// 求值器给出了目标容器。
    fn decision(&self, url: &str, current: &str, decision: &Decision) {
        let _ = (url, current, decision);
    }

    /// 导航被放行且未处理。
    fn suppressed(&self, reason: SuppressReason, url: &str) {
        let _ = (reason, url);
    }

    /// 导航已迁移到目标容器的新标签页。
    fn relocated(&self, url: &str, from: &str, to: &str, new_tab: TabId) {
        let _ = (url, from, to, new_tab);
    }

    /// 导航处理过程中的失败，已被吞掉并按放行处理。
    fn navigation_failed(&self, url: &str, error: &dyn Error) {
        let _ = (url, error);
    }

    /// 迁移成功后关闭原标签页失败；迁移本身不回滚。
    fn close_failed(&self, tab: TabId, error: &dyn Error) {
        let _ = (tab, error);
    }

    fn refresh_completed(&self, kind: RefreshKind, epoch: u64) {
        let _ = (kind, epoch);
    }

    fn refresh_failed(&self, kind: RefreshKind, error: &dyn Error) {
        let _ = (kind, error);
    }

    /// 冷启动等待首次初始化超时，继续使用现有缓存。
    fn cold_start_timeout(&self, waited: Duration) {
        let _ = waited;
    }
}

/// 丢弃全部事件。
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RoutingObserver for NoopObserver {}

/// 把诊断事件写入 `tracing`。
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl RoutingObserver for TracingObserver {
    fn decision(&self, url: &str, current: &str, decision: &Decision) {
        tracing::debug!(
            url,
            current,
            target_container = %decision.target,
            reason = ?decision.reason,
            "routing decision"
        );
    }

    fn suppressed(&self, reason: SuppressReason, url: &str) {
        tracing::debug!(url, reason = reason.as_str(), "navigation passed through");
    }

    fn relocated(&self, url: &str, from: &str, to: &str, new_tab: TabId) {
        tracing::info!(url, from, to, new_tab = new_tab.0, "navigation relocated");
    }

    fn navigation_failed(&self, url: &str, error: &dyn Error) {
        tracing::warn!(url, error = %error, "navigation routing failed; passing through");
    }

    fn close_failed(&self, tab: TabId, error: &dyn Error) {
        tracing::warn!(tab = tab.0, error = %error, "failed to close original tab");
    }

    fn refresh_completed(&self, kind: RefreshKind, epoch: u64) {
        tracing::debug!(kind = %kind, epoch, "cache refreshed");
    }

    fn refresh_failed(&self, kind: RefreshKind, error: &dyn Error) {
        tracing::warn!(kind = %kind, error = %error, "cache refresh failed");
    }

    fn cold_start_timeout(&self, waited: Duration) {
        tracing::warn!(
            waited_ms = waited.as_millis() as u64,
            "initialization still pending; routing with cached data"
        );
    }
}
