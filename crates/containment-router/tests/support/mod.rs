//! 宿主协作方的内存实现，供仓储与拦截器的集成测试共享。
//!
//! - 每个假实现都记录调用次数，便于断言“只抓取了一次”；
//! - [`Gate`] 让异步调用停在半途，测试可以在刷新在途时发起并发调用，再手动放行。
#![allow(dead_code)]

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use containment_core::{
    Container, ContainerProvider, Decision, HostError, OpenTabRequest, PartitionId, RefreshKind,
    RoutingObserver, RuleStore, SuppressReason, TabHost, TabId, TabInfo,
};
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;

/// 一次性闸门：`open` 之前所有 `wait` 都挂起。
#[derive(Clone)]
pub struct Gate {
    opener: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    opened: Shared<oneshot::Receiver<()>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            opener: Arc::new(Mutex::new(Some(tx))),
            opened: rx.shared(),
        }
    }

    pub fn open(&self) {
        if let Some(tx) = self.opener.lock().take() {
            let _ = tx.send(());
        }
    }

    pub async fn wait(&self) {
        let _ = self.opened.clone().await;
    }
}

/// 共享调用日志，用于断言跨协作方的调用顺序。
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

pub struct FakeInventory {
    containers: Mutex<Result<Vec<Container>, HostError>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Gate>>,
    journal: Journal,
}

impl FakeInventory {
    pub fn new(containers: Vec<Container>, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            containers: Mutex::new(Ok(containers)),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            journal,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set(&self, containers: Vec<Container>) {
        *self.containers.lock() = Ok(containers);
    }

    pub fn fail(&self, detail: &str) {
        *self.containers.lock() = Err(HostError::new("contextualIdentities.query", detail));
    }

    /// 之后的调用在 `gate` 打开前挂起。
    pub fn hold(&self, gate: &Gate) {
        *self.gate.lock() = Some(gate.clone());
    }
}

#[async_trait]
impl ContainerProvider for FakeInventory {
    async fn list_containers(&self) -> Result<Vec<Container>, HostError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("containers");
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        self.containers.lock().clone()
    }
}

pub struct FakeStore {
    payload: Mutex<Result<Value, HostError>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Gate>>,
    journal: Journal,
}

impl FakeStore {
    pub fn new(payload: Value, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(Ok(payload)),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            journal,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set(&self, payload: Value) {
        *self.payload.lock() = Ok(payload);
    }

    pub fn fail(&self, detail: &str) {
        *self.payload.lock() = Err(HostError::new("storage.local.get", detail));
    }

    pub fn hold(&self, gate: &Gate) {
        *self.gate.lock() = Some(gate.clone());
    }
}

#[async_trait]
impl RuleStore for FakeStore {
    async fn load_rules_payload(&self) -> Result<Value, HostError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("rules");
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        self.payload.lock().clone()
    }
}

/// 标签页宿主：`close_tab` 只记录，不移除标签页，便于重复投递同一导航。
pub struct FakeTabs {
    tabs: Mutex<HashMap<TabId, TabInfo>>,
    opened: Mutex<Vec<OpenTabRequest>>,
    closed: Mutex<Vec<TabId>>,
    lookups: AtomicUsize,
    next_id: AtomicI64,
    fail_open: AtomicBool,
    fail_close: AtomicBool,
    lookup_gate: Mutex<Option<Gate>>,
}

impl FakeTabs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tabs: Mutex::new(HashMap::new()),
            opened: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            next_id: AtomicI64::new(1_000),
            fail_open: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            lookup_gate: Mutex::new(None),
        })
    }

    pub fn insert(&self, tab: i64, partition: &str, active: bool) {
        self.tabs.lock().insert(
            TabId(tab),
            TabInfo {
                partition: PartitionId::from(partition),
                active,
            },
        );
    }

    pub fn opened(&self) -> Vec<OpenTabRequest> {
        self.opened.lock().clone()
    }

    pub fn closed(&self) -> Vec<TabId> {
        self.closed.lock().clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn hold_lookups(&self, gate: &Gate) {
        *self.lookup_gate.lock() = Some(gate.clone());
    }
}

#[async_trait]
impl TabHost for FakeTabs {
    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, HostError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.lookup_gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        self.tabs
            .lock()
            .get(&tab)
            .cloned()
            .ok_or_else(|| HostError::new("tabs.get", format!("no such tab {tab}")))
    }

    async fn open_tab(&self, request: OpenTabRequest) -> Result<TabId, HostError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(HostError::new("tabs.create", "window closed"));
        }
        let id = TabId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.tabs.lock().insert(
            id,
            TabInfo {
                partition: request.partition.clone(),
                active: request.active,
            },
        );
        self.opened.lock().push(request);
        Ok(id)
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), HostError> {
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(HostError::new("tabs.remove", "tab already gone"));
        }
        self.closed.lock().push(tab);
        Ok(())
    }
}

/// 观察者事件的可断言副本。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observed {
    Decision { target: String },
    Suppressed(SuppressReason),
    Relocated { from: String, to: String },
    NavigationFailed(String),
    CloseFailed(TabId),
    RefreshCompleted(RefreshKind, u64),
    RefreshFailed(RefreshKind),
    ColdStartTimeout(Duration),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().clone()
    }

    pub fn suppressions(&self) -> Vec<SuppressReason> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Observed::Suppressed(reason) => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Observed) -> bool) -> usize {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }

    fn push(&self, event: Observed) {
        self.events.lock().push(event);
    }
}

impl RoutingObserver for RecordingObserver {
    fn decision(&self, _url: &str, _current: &str, decision: &Decision) {
        self.push(Observed::Decision {
            target: decision.target.clone(),
        });
    }

    fn suppressed(&self, reason: SuppressReason, _url: &str) {
        self.push(Observed::Suppressed(reason));
    }

    fn relocated(&self, _url: &str, from: &str, to: &str, _new_tab: TabId) {
        self.push(Observed::Relocated {
            from: from.to_owned(),
            to: to.to_owned(),
        });
    }

    fn navigation_failed(&self, _url: &str, error: &dyn Error) {
        self.push(Observed::NavigationFailed(error.to_string()));
    }

    fn close_failed(&self, tab: TabId, _error: &dyn Error) {
        self.push(Observed::CloseFailed(tab));
    }

    fn refresh_completed(&self, kind: RefreshKind, epoch: u64) {
        self.push(Observed::RefreshCompleted(kind, epoch));
    }

    fn refresh_failed(&self, kind: RefreshKind, _error: &dyn Error) {
        self.push(Observed::RefreshFailed(kind));
    }

    fn cold_start_timeout(&self, waited: Duration) {
        self.push(Observed::ColdStartTimeout(waited));
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}
