//! # 去重窗口
//!
//! ## 角色定位（Why）
//! - 宿主事件源会在极短时间内重复投递同一次导航，两个标签页也可能同时奔向同一 URL；
//!   拦截器依赖三张“键 → 最近一次处理时刻”的表压制重复迁移；
//! - 条目按时间自然过期，正常路径上不做显式删除；表规模超过阈值后才整体清扫回收内存。
//!
//! ## 契约（What）
//! - 所有方法都显式接收 `now`，时间来源由调用方注入的时钟决定，本模块不读取系统时间；
//! - 判定区间为左闭右开：与上次时间戳之差严格小于窗口才视为重复。

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use containment_core::TabId;

use crate::settings::RouterSettings;

/// 固定窗口的时间戳表。
#[derive(Clone, Debug)]
pub struct DedupWindow<K> {
    window: Duration,
    stamps: HashMap<K, Instant>,
}

impl<K: Eq + Hash> DedupWindow<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            stamps: HashMap::new(),
        }
    }

    /// `key` 是否在窗口期内被打过时间戳。
    pub fn is_recent<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.stamps
            .get(key)
            .is_some_and(|stamped| now.saturating_duration_since(*stamped) < self.window)
    }

    /// 记录 `key` 在 `now` 被处理过，覆盖旧时间戳。
    pub fn stamp(&mut self, key: K, now: Instant) {
        self.stamps.insert(key, now);
    }

    /// 窗口期内重复时返回 `true` 且不刷新时间戳；否则打上时间戳并返回 `false`。
    pub fn check_and_stamp(&mut self, key: K, now: Instant) -> bool {
        if self.is_recent(&key, now) {
            return true;
        }
        self.stamp(key, now);
        false
    }

    /// 删除已超出窗口的条目。
    pub fn sweep(&mut self, now: Instant) {
        let window = self.window;
        self.stamps
            .retain(|_, stamped| now.saturating_duration_since(*stamped) < window);
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// `(来源容器, 目标容器)` 名称对。
pub type ContainerPair = (String, String);

/// 拦截器私有的三张去重表。
///
/// # 教案式说明
/// - **意图 (Why)**：三种重复各有成因，窗口长度也不同，因此分表存放、互不干扰；
/// - **契约 (What)**：
///   - `requests`：`(标签页, URL)`，压制宿主的重复投递；
///   - `redirects`：仅 URL，压制多个标签页同时迁移同一 URL；
///   - `switches`：容器名称对，压制服务端重定向链触发的二次迁移；
/// - **清扫 (How)**：任一表规模超过 `sweep_threshold` 时，[`Self::sweep_all`] 按各自窗口清扫三张表。
#[derive(Clone, Debug)]
pub struct DedupLedger {
    pub requests: DedupWindow<(TabId, String)>,
    pub redirects: DedupWindow<String>,
    pub switches: DedupWindow<ContainerPair>,
    sweep_threshold: usize,
}

impl DedupLedger {
    pub fn new(settings: &RouterSettings) -> Self {
        Self {
            requests: DedupWindow::new(settings.request_window()),
            redirects: DedupWindow::new(settings.redirect_window()),
            switches: DedupWindow::new(settings.switch_window()),
            sweep_threshold: settings.sweep_threshold,
        }
    }

    pub fn needs_sweep(&self) -> bool {
        self.requests.len() > self.sweep_threshold
            || self.redirects.len() > self.sweep_threshold
            || self.switches.len() > self.sweep_threshold
    }

    pub fn sweep_all(&mut self, now: Instant) {
        self.requests.sweep(now);
        self.redirects.sweep(now);
        self.switches.sweep(now);
    }

    /// 三张表条目总数。
    pub fn total_len(&self) -> usize {
        self.requests.len() + self.redirects.len() + self.switches.len()
    }
}
