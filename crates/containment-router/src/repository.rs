//! # 容器清单与规则集仓储
//!
//! ## 角色定位（Why）
//! - “有哪些容器”“配置了哪些规则”的唯一事实来源，分别镜像宿主的容器清单与键值存储；
//! - 容器创建/删除/改名、规则改写等事件可能密集甚至并发到达；若每个事件各自清空再回填缓存，
//!   拦截器会在决策途中读到残缺视图。
//!
//! ## 总体结构（How）
//! - 两份缓存都由 [`ArcSwap`] 持有，成功刷新时整体替换，读者只会看到完整的旧值或完整的新值；
//! - 每份缓存配一个世代计数（`0` 表示从未装载），与 `ArcSwap` 搭配形成可比较的快照版本；
//! - 每份缓存配一个“在途刷新”标记，内容是可共享的 Future：并发调用者克隆同一个 Future 并等待
//!   同一个结果；Future 完成时自行清除标记，下一次调用重新发起抓取；
//! - 刷新失败不触碰缓存，错误交给全部等待者，观察者只收到一次报告。
//!
//! ## 契约（What）
//! - [`Repository`] 是廉价可克隆的句柄，克隆体共享同一组缓存；
//! - [`Repository::current_snapshot`] 同步、非阻塞，首次装载前返回只含默认分区的空快照；
//! - 运行时中立：内部只依赖 `futures` 组合子，不绑定任何执行器。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwap;
use containment_core::{
    ContainerProvider, ContainerRegistry, JsonRuleCodec, RefreshKind, RoutingObserver, RuleCodec,
    RuleSet, RuleStore, TracingObserver,
};
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::RepositoryError;

type SharedLoad<T> = Shared<BoxFuture<'static, Result<Arc<T>, RepositoryError>>>;

/// 某一时刻两份缓存的只读视图。
#[derive(Clone, Debug)]
pub struct RoutingSnapshot {
    pub containers: Arc<ContainerRegistry>,
    pub rules: Arc<RuleSet>,
    pub container_epoch: u64,
    pub rule_epoch: u64,
}

impl RoutingSnapshot {
    /// 两份缓存都至少成功装载过一次。
    pub fn is_populated(&self) -> bool {
        self.container_epoch > 0 && self.rule_epoch > 0
    }
}

/// 构造 [`Repository`]；未显式指定时使用 [`JsonRuleCodec`] 与 [`TracingObserver`]。
pub struct RepositoryBuilder {
    provider: Arc<dyn ContainerProvider>,
    store: Arc<dyn RuleStore>,
    codec: Arc<dyn RuleCodec>,
    observer: Arc<dyn RoutingObserver>,
}

impl RepositoryBuilder {
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn RuleCodec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn RoutingObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build(self) -> Repository {
        let (ready_tx, ready_rx) = oneshot::channel();
        Repository {
            inner: Arc::new(Inner {
                provider: self.provider,
                store: self.store,
                codec: self.codec,
                observer: self.observer,
                containers: ArcSwap::from_pointee(ContainerRegistry::default()),
                rules: ArcSwap::from_pointee(RuleSet::default()),
                container_epoch: AtomicU64::new(0),
                rule_epoch: AtomicU64::new(0),
                containers_in_flight: Mutex::new(None),
                rules_in_flight: Mutex::new(None),
                last_init_failed: AtomicBool::new(false),
                ready: AtomicBool::new(false),
                ready_tx: Mutex::new(Some(ready_tx)),
                ready_rx: ready_rx.shared(),
            }),
        }
    }
}

/// 合并并发刷新的缓存仓储。
///
/// # 教案式说明
/// - **意图 (Why)**：把“全局可变缓存”收拢为一个拥有者，唯一的修改点是整体替换；
/// - **契约 (What)**：
///   - `refresh_*` 在已有在途刷新时返回同一结果，绝不重复抓取；
///   - 成功后缓存立即对后续读者可见，世代号严格递增；
///   - 失败时缓存与世代号均保持不变；
/// - **风险 (Trade-offs)**：在途 Future 持有仓储句柄，若所有等待者都在完成前放弃且不再有新调用，
///   该 Future 会一直驻留到下一次刷新请求把它推进完成。
#[derive(Clone)]
pub struct Repository {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn ContainerProvider>,
    store: Arc<dyn RuleStore>,
    codec: Arc<dyn RuleCodec>,
    observer: Arc<dyn RoutingObserver>,
    containers: ArcSwap<ContainerRegistry>,
    rules: ArcSwap<RuleSet>,
    container_epoch: AtomicU64,
    rule_epoch: AtomicU64,
    containers_in_flight: Mutex<Option<SharedLoad<ContainerRegistry>>>,
    rules_in_flight: Mutex<Option<SharedLoad<RuleSet>>>,
    last_init_failed: AtomicBool,
    ready: AtomicBool,
    ready_tx: Mutex<Option<oneshot::Sender<()>>>,
    ready_rx: Shared<oneshot::Receiver<()>>,
}

impl Repository {
    pub fn builder(
        provider: Arc<dyn ContainerProvider>,
        store: Arc<dyn RuleStore>,
    ) -> RepositoryBuilder {
        RepositoryBuilder {
            provider,
            store,
            codec: Arc::new(JsonRuleCodec),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn new(provider: Arc<dyn ContainerProvider>, store: Arc<dyn RuleStore>) -> Self {
        Self::builder(provider, store).build()
    }

    /// 重新枚举容器清单；并发调用共享同一次抓取。
    pub async fn refresh_containers(&self) -> Result<Arc<ContainerRegistry>, RepositoryError> {
        let load = {
            let mut slot = self.inner.containers_in_flight.lock();
            match slot.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let load = self.clone().load_containers().boxed().shared();
                    *slot = Some(load.clone());
                    load
                }
            }
        };
        load.await
    }

    /// 重新读取并解码规则集；在途标记与容器刷新相互独立。
    pub async fn refresh_rules(&self) -> Result<Arc<RuleSet>, RepositoryError> {
        let load = {
            let mut slot = self.inner.rules_in_flight.lock();
            match slot.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let load = self.clone().load_rules().boxed().shared();
                    *slot = Some(load.clone());
                    load
                }
            }
        };
        load.await
    }

    /// 按事件种类分派刷新。
    pub async fn refresh(&self, kind: RefreshKind) -> Result<RoutingSnapshot, RepositoryError> {
        match kind {
            RefreshKind::Containers => {
                self.refresh_containers().await?;
            }
            RefreshKind::Rules => {
                self.refresh_rules().await?;
            }
        }
        Ok(self.current_snapshot())
    }

    /// 先刷新容器、再刷新规则；规则求值依赖容器身份。
    ///
    /// 无论成功与否，首次完成都会解除 [`Self::wait_ready`] 的等待。
    pub async fn initialize(&self) -> Result<RoutingSnapshot, RepositoryError> {
        let result: Result<RoutingSnapshot, RepositoryError> = async {
            self.refresh_containers().await?;
            self.refresh_rules().await?;
            Ok(self.current_snapshot())
        }
        .await;

        self.inner
            .last_init_failed
            .store(result.is_err(), Ordering::Release);
        self.mark_ready();
        result
    }

    /// 两份缓存都已装载时直接返回，否则执行 [`Self::initialize`]。
    pub async fn get_or_load(&self) -> Result<RoutingSnapshot, RepositoryError> {
        let snapshot = self.current_snapshot();
        if snapshot.is_populated() {
            self.mark_ready();
            return Ok(snapshot);
        }
        self.initialize().await
    }

    pub fn current_snapshot(&self) -> RoutingSnapshot {
        // 先读世代号再读缓存：世代号大于零时读到的缓存至少与之一样新。
        let container_epoch = self.inner.container_epoch.load(Ordering::Acquire);
        let rule_epoch = self.inner.rule_epoch.load(Ordering::Acquire);
        RoutingSnapshot {
            containers: self.inner.containers.load_full(),
            rules: self.inner.rules.load_full(),
            container_epoch,
            rule_epoch,
        }
    }

    /// 就绪后完成的 Future：首次 [`Self::initialize`] 完成（成功或失败），
    /// 或两份缓存经由任意刷新路径都已装载，以先到者为准。
    pub fn wait_ready(&self) -> impl Future<Output = ()> + Send + 'static {
        let ready = self.inner.ready_rx.clone();
        async move {
            // 发送端只在就绪时使用，被丢弃同样意味着不再需要等待。
            let _ = ready.await;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// 最近一次 [`Self::initialize`] 是否失败。
    pub fn last_init_failed(&self) -> bool {
        self.inner.last_init_failed.load(Ordering::Acquire)
    }

    fn mark_ready(&self) {
        self.inner.ready.store(true, Ordering::Release);
        if let Some(tx) = self.inner.ready_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    async fn load_containers(self) -> Result<Arc<ContainerRegistry>, RepositoryError> {
        let result = self
            .inner
            .provider
            .list_containers()
            .await
            .map(|containers| Arc::new(ContainerRegistry::from_containers(containers)))
            .map_err(RepositoryError::ContainerLoad);

        if let Ok(registry) = &result {
            self.inner.containers.store(Arc::clone(registry));
        }
        self.finish(RefreshKind::Containers, &self.inner.container_epoch, &result);
        self.inner.containers_in_flight.lock().take();
        result
    }

    async fn load_rules(self) -> Result<Arc<RuleSet>, RepositoryError> {
        let result = match self.inner.store.load_rules_payload().await {
            Ok(payload) => self
                .inner
                .codec
                .decode(payload)
                .map(|rules| Arc::new(RuleSet::new(rules)))
                .map_err(RepositoryError::RuleDecode),
            Err(err) => Err(RepositoryError::RuleLoad(err)),
        };

        if let Ok(rules) = &result {
            self.inner.rules.store(Arc::clone(rules));
        }
        self.finish(RefreshKind::Rules, &self.inner.rule_epoch, &result);
        self.inner.rules_in_flight.lock().take();
        result
    }

    /// 成功时推进世代号，两份缓存都装载后标记就绪；两种结果都上报观察者。
    fn finish<T>(
        &self,
        kind: RefreshKind,
        epoch: &AtomicU64,
        result: &Result<Arc<T>, RepositoryError>,
    ) {
        match result {
            Ok(_) => {
                let epoch = epoch.fetch_add(1, Ordering::AcqRel) + 1;
                self.inner.observer.refresh_completed(kind, epoch);
                if self.current_snapshot().is_populated() {
                    self.mark_ready();
                }
            }
            Err(err) => self.inner.observer.refresh_failed(kind, err),
        }
    }
}
