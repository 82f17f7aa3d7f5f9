use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, Future};
use parking_lot::Mutex;

/// `Sleep` 为时钟接口返回的统一延迟 Future 类型。
///
/// # 设计意图（Why）
/// - 以 `Pin<Box<dyn Future>>` 表达异步睡眠，避免把具体运行时（Tokio/async-std）渗透到路由引擎的 API；
/// - 统一 Future 形态便于在测试中替换为虚拟时钟。
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 可注入的时钟：提供“当前时间”与“等待指定时长”两种能力。
///
/// # 接口约束（What）
/// - `now` 返回单调时间点，且单调不减；
/// - `sleep` 返回的 Future 至少等待给定时长后才完成。
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> Sleep;
}

/// 基于标准库的系统时钟。
///
/// `sleep` 为每次等待启动一个辅助线程，到期后经 oneshot 通道唤醒等待方，不依赖任何异步运行时。
/// 路由引擎只在冷启动等待时睡眠，调用频率很低。
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        let (tx, rx) = oneshot::channel();
        thread::spawn(move || {
            thread::sleep(duration);
            let _ = tx.send(());
        });
        Box::pin(rx.map(|_| ()))
    }
}

/// 虚拟时钟：测试中手动推进时间，并立即唤醒到期的睡眠 Future。
///
/// - 每个睡眠者登记一个截止偏移与 oneshot 发送端，`advance` 按登记顺序发送；
/// - 睡眠 Future 被丢弃后接收端关闭，下次推进或计数时清理；
/// - 克隆后的实例共享同一时间线。
#[derive(Clone, Debug)]
pub struct ManualClock {
    inner: Arc<Mutex<Timeline>>,
}

#[derive(Debug)]
struct Timeline {
    origin: Instant,
    elapsed: Duration,
    sleepers: Vec<(Duration, oneshot::Sender<()>)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Timeline {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                sleepers: Vec::new(),
            })),
        }
    }

    /// 推进虚拟时间；返回前所有到期的睡眠 Future 均已被唤醒。
    pub fn advance(&self, delta: Duration) {
        let due = {
            let mut timeline = self.inner.lock();
            timeline.elapsed = timeline.elapsed.saturating_add(delta);
            let elapsed = timeline.elapsed;
            let (due, pending): (Vec<_>, Vec<_>) = mem::take(&mut timeline.sleepers)
                .into_iter()
                .filter(|(_, tx)| !tx.is_canceled())
                .partition(|(deadline, _)| *deadline <= elapsed);
            timeline.sleepers = pending;
            due
        };
        for (_, tx) in due {
            let _ = tx.send(());
        }
    }

    /// 尚未到期且仍有人等待的睡眠者数量。
    pub fn pending_sleepers(&self) -> usize {
        self.inner
            .lock()
            .sleepers
            .iter()
            .filter(|(_, tx)| !tx.is_canceled())
            .count()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let timeline = self.inner.lock();
        timeline.origin + timeline.elapsed
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        if duration.is_zero() {
            return Box::pin(future::ready(()));
        }
        let (tx, rx) = oneshot::channel();
        let mut timeline = self.inner.lock();
        let deadline = timeline.elapsed.saturating_add(duration);
        timeline.sleepers.push((deadline, tx));
        Box::pin(rx.map(|_| ()))
    }
}
