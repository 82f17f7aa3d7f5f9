//! # 导航拦截器
//!
//! ## 角色定位（Why）
//! - 消费宿主的顶层导航事件，决定“放行”还是“在目标容器重新打开并取消原加载”；
//! - 真正的复杂度在守卫条件：冷启动、特权协议、无标签页事件、三层去重，缺一都会导致循环迁移或重复标签页。
//!
//! ## 处理流程（How）
//! 1. 首次初始化未完成时有界等待，超时后沿用现有缓存继续；
//! 2. 特权协议与无标签页事件直接放行；
//! 3. `(标签页, URL)` 去重并打戳，URL 去重只检查；顺带按阈值清扫去重表；
//! 4. 查询标签页分区，映射为当前容器名，交给求值器得到目标容器；
//! 5. 目标与当前一致则放行；否则在同一临界区内复查 URL 与容器对窗口并打上全部时间戳，
//!    之后才发出打开/关闭标签页命令，关闭“命令发出到宿主重投事件”之间的竞态窗口。
//!
//! ## 契约（What）
//! - [`NavigationInterceptor::on_navigation`] 永不返回错误：任何失败都降级为放行并上报观察者；
//! - 去重表位于 `parking_lot::Mutex` 之后，锁从不跨越 `await` 持有。

use std::sync::Arc;

use containment_core::{
    Clock, DEFAULT_CONTAINER_NAME, InventoryChange, NavigationEvent, NavigationVerdict,
    OpenTabRequest, RefreshKind, RoutingObserver, SuppressReason, TabHost, TabId, evaluate,
};
use futures::future::{self, Either};
use parking_lot::Mutex;

use crate::dedup::DedupLedger;
use crate::error::{InterceptError, SettingsError};
use crate::repository::Repository;
use crate::settings::RouterSettings;

/// 有状态的导航编排器。
pub struct NavigationInterceptor {
    repository: Repository,
    tabs: Arc<dyn TabHost>,
    settings: RouterSettings,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn RoutingObserver>,
    ledger: Mutex<DedupLedger>,
}

/// 通过全部去重检查后、发出命令前确定的迁移计划。
struct Relocation {
    tab: TabId,
    url: String,
    from: String,
    to: String,
    request: OpenTabRequest,
}

impl NavigationInterceptor {
    /// 配置先经 [`RouterSettings::validate`] 校验。
    pub fn new(
        repository: Repository,
        tabs: Arc<dyn TabHost>,
        settings: RouterSettings,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn RoutingObserver>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let ledger = Mutex::new(DedupLedger::new(&settings));
        Ok(Self {
            repository,
            tabs,
            settings,
            clock,
            observer,
            ledger,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// 处理一次顶层导航。
    ///
    /// 返回 [`NavigationVerdict::Cancel`] 表示导航已在目标容器重新打开，宿主应取消原加载。
    pub async fn on_navigation(&self, event: NavigationEvent) -> NavigationVerdict {
        let url = event.url.clone();
        match self.route(event).await {
            Ok(verdict) => verdict,
            Err(err) => {
                self.observer.navigation_failed(&url, &err);
                NavigationVerdict::Proceed
            }
        }
    }

    /// 容器创建/删除/更新通知：三种变更都整体重建清单。失败已由仓储上报，这里只吞掉。
    pub async fn on_inventory_changed(&self, _change: InventoryChange) {
        let _ = self.repository.refresh(RefreshKind::Containers).await;
    }

    /// 规则存储键被改写的通知。
    pub async fn on_rules_changed(&self) {
        let _ = self.repository.refresh(RefreshKind::Rules).await;
    }

    /// 当前三张去重表的条目总数，供嵌入方观察内存占用。
    pub fn dedup_entries(&self) -> usize {
        self.ledger.lock().total_len()
    }

    async fn route(&self, event: NavigationEvent) -> Result<NavigationVerdict, InterceptError> {
        self.await_cold_start().await;

        let NavigationEvent {
            url,
            tab_id,
            foreground,
        } = event;

        if self.settings.is_privileged(&url) {
            return Ok(self.pass(SuppressReason::PrivilegedScheme, &url));
        }
        let Some(tab) = tab_id else {
            return Ok(self.pass(SuppressReason::NoTab, &url));
        };

        if let Some(reason) = self.screen_request(tab, &url) {
            return Ok(self.pass(reason, &url));
        }

        let info = self
            .tabs
            .tab_info(tab)
            .await
            .map_err(|source| InterceptError::TabLookup { tab, source })?;

        let snapshot = self.repository.current_snapshot();
        let current = snapshot
            .containers
            .name_of(&info.partition)
            .unwrap_or(DEFAULT_CONTAINER_NAME)
            .to_owned();
        let decision = evaluate(&url, Some(current.as_str()), &snapshot.rules, &snapshot.containers);
        self.observer.decision(&url, &current, &decision);

        // 查不到分区按已在目标处理。
        let partition = match snapshot.containers.partition_of(&decision.target) {
            Some(partition) if decision.target != current => partition.clone(),
            _ => return Ok(self.pass(SuppressReason::AlreadyInTarget, &url)),
        };

        let relocation = Relocation {
            tab,
            request: OpenTabRequest {
                url: url.clone(),
                partition,
                active: foreground.unwrap_or(info.active),
                replaces: Some(tab),
            },
            url,
            from: current,
            to: decision.target,
        };
        if let Some(reason) = self.claim(&relocation) {
            return Ok(self.pass(reason, &relocation.url));
        }
        self.relocate(relocation).await
    }

    /// 有界等待首次初始化；超时只上报，不阻塞导航。
    async fn await_cold_start(&self) {
        if self.repository.is_ready() {
            return;
        }
        let timeout = self.settings.init_timeout();
        let ready = Box::pin(self.repository.wait_ready());
        let sleep = self.clock.sleep(timeout);
        if let Either::Right(_) = future::select(ready, sleep).await {
            self.observer.cold_start_timeout(timeout);
        }
    }

    /// 第一道去重：`(标签页, URL)` 检查并打戳，URL 窗口只检查。
    fn screen_request(&self, tab: TabId, url: &str) -> Option<SuppressReason> {
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();
        if ledger.needs_sweep() {
            ledger.sweep_all(now);
        }
        if ledger.requests.check_and_stamp((tab, url.to_owned()), now) {
            return Some(SuppressReason::DuplicateRequest);
        }
        if ledger.redirects.is_recent(url, now) {
            return Some(SuppressReason::DuplicateRedirect);
        }
        None
    }

    /// 第二道去重：复查 URL 与容器对窗口，通过后一次性打上三种时间戳。
    ///
    /// 查询标签页期间可能有其他导航完成迁移，因此 URL 窗口在这里需要再查一次；
    /// 检查与打戳处于同一临界区，两次并发迁移同一 URL 只有一个能通过。
    fn claim(&self, relocation: &Relocation) -> Option<SuppressReason> {
        let now = self.clock.now();
        let pair = (relocation.from.clone(), relocation.to.clone());
        let mut ledger = self.ledger.lock();
        if ledger.switches.is_recent(&pair, now) {
            return Some(SuppressReason::RedirectChain);
        }
        if ledger.redirects.is_recent(relocation.url.as_str(), now) {
            return Some(SuppressReason::DuplicateRedirect);
        }
        ledger.redirects.stamp(relocation.url.clone(), now);
        ledger
            .requests
            .stamp((relocation.tab, relocation.url.clone()), now);
        ledger.switches.stamp(pair, now);
        None
    }

    async fn relocate(&self, relocation: Relocation) -> Result<NavigationVerdict, InterceptError> {
        let Relocation {
            tab,
            url,
            from,
            to,
            request,
        } = relocation;

        let new_tab = self
            .tabs
            .open_tab(request)
            .await
            .map_err(|source| InterceptError::Relocation {
                target: to.clone(),
                source,
            })?;
        self.observer.relocated(&url, &from, &to, new_tab);

        // 新标签页已打开，关闭失败不回滚迁移。
        if let Err(err) = self.tabs.close_tab(tab).await {
            self.observer.close_failed(tab, &err);
        }
        Ok(NavigationVerdict::Cancel)
    }

    fn pass(&self, reason: SuppressReason, url: &str) -> NavigationVerdict {
        self.observer.suppressed(reason, url);
        NavigationVerdict::Proceed
    }
}
