//! 时间抽象：去重窗口与冷启动等待都通过注入的 [`Clock`] 读取时间，测试可用 [`ManualClock`] 精确推进。

mod clock;

pub use clock::{Clock, ManualClock, Sleep, SystemClock};
