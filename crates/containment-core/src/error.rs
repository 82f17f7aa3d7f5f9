//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 核心层只有两类错误会越过边界：宿主协作方失败（[`HostError`]）与规则载荷解码失败
//!   （[`DecodeError`]）；
//! - 模式匹配与规则求值是全函数，不产生错误，也不在此登记。
//!
//! ## 设计要求（What）
//! - 两个类型都实现 `Clone`：仓储合并并发刷新时，同一个失败结果要交给所有等待者。

use std::borrow::Cow;

use thiserror::Error;

/// 宿主平台协作方返回的失败。
///
/// # 教案式说明
/// - **意图 (Why)**：宿主 API（容器清单、存储、标签页）的失败原因对路由引擎是不透明的，
///   只需保留“哪个操作”与“人类可读的细节”用于诊断；
/// - **契约 (What)**：`operation` 使用稳定的点分名称（如 `"tabs.get"`），便于聚合告警；
/// - **风险 (Trade-offs)**：不保留底层错误链，换取 `Clone` 与跨线程传播的简单性。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("host operation `{operation}` failed: {detail}")]
pub struct HostError {
    pub operation: Cow<'static, str>,
    pub detail: String,
}

impl HostError {
    pub fn new(operation: impl Into<Cow<'static, str>>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

/// 规则载荷解码失败。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// 载荷形态无法识别，或规则字段缺失/类型错误。
    #[error("malformed rule payload: {detail}")]
    Malformed { detail: String },

    /// 带版本号的载荷使用了未知版本。
    #[error("unsupported rule payload version {version}")]
    UnsupportedVersion { version: u64 },

    /// 遇到压缩载荷，但当前运行时没有可用的解压实现。
    ///
    /// 与 `Malformed` 区分开，调用方据此提示用户升级而不是判定数据损坏。
    #[error("rule payload is compressed but no decompressor is available")]
    CompressionUnavailable,
}

impl DecodeError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}
