#![deny(unsafe_code)]
#![doc = "containment-router: 容器路由引擎的有状态部分。"]
#![doc = ""]
#![doc = "- [`Repository`]：缓存容器清单与规则集，合并并发刷新并整体替换缓存；"]
#![doc = "- [`NavigationInterceptor`]：消费导航事件，经多层去重后驱动宿主迁移标签页；"]
#![doc = "- [`RouterSettings`]：去重窗口、冷启动等待与特权协议等可调参数。"]
#![doc = ""]
#![doc = "本 crate 不绑定异步运行时：时间经由注入的 `Clock` 读取，并发原语只来自 `futures` 与 `parking_lot`。"]

pub mod dedup;
pub mod error;
pub mod interceptor;
pub mod repository;
pub mod settings;

pub use dedup::{DedupLedger, DedupWindow};
pub use error::{InterceptError, RepositoryError, SettingsError};
pub use interceptor::NavigationInterceptor;
pub use repository::{Repository, RepositoryBuilder, RoutingSnapshot};
pub use settings::RouterSettings;
