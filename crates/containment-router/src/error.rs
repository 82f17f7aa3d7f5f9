//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 仓储错误会越过 crate 边界交给调用方，拦截器错误则止步于 [`crate::NavigationInterceptor`] 的最外层；
//! - 配置错误只在构造阶段出现，与运行期错误分开声明，避免调用方匹配到不可能出现的变体。
//!
//! ## 设计要求（What）
//! - [`RepositoryError`] 必须 `Clone`：合并刷新的所有等待者共享同一个结果；
//! - 所有类型通过 `thiserror` 派生，保留 `source` 链供诊断输出。

use containment_core::{DecodeError, HostError, TabId};
use thiserror::Error;

/// 仓储刷新失败；缓存保持失败前的内容不变。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("failed to enumerate containers")]
    ContainerLoad(#[source] HostError),

    #[error("failed to read persisted rules")]
    RuleLoad(#[source] HostError),

    /// 载荷已读出但无法解码，包括遇到压缩载荷而缺少解压实现。
    #[error("failed to decode persisted rules")]
    RuleDecode(#[source] DecodeError),
}

/// 单次导航处理中的失败。
///
/// # 教案式说明
/// - **意图 (Why)**：拦截器是浏览正确性的最后防线，任何失败都只能降级为放行；
///   此类型只服务于诊断，在 [`crate::NavigationInterceptor::on_navigation`] 中被吞掉并上报观察者；
/// - **契约 (What)**：变体按处理阶段划分，分别对应“查询标签页”“打开目标标签页”“目标容器缺失”。
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("could not inspect {tab}")]
    TabLookup {
        tab: TabId,
        #[source]
        source: HostError,
    },

    #[error("could not open navigation in container `{target}`")]
    Relocation {
        target: String,
        #[source]
        source: HostError,
    },
}

/// 路由配置加载或校验失败。
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("router settings are not valid TOML")]
    Parse(#[from] toml::de::Error),

    #[error("invalid router setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
