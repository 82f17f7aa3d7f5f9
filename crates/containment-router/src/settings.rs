//! 拦截器的可调参数。
//!
//! # 设计缘起（Why）
//! - 去重窗口与冷启动等待都是经验值，嵌入方需要按宿主事件源的行为调整，而不必改代码；
//! - 配置以 TOML 表达，字段全部可选，缺省值覆盖常见浏览器的重复投递间隔。
//!
//! # 契约（What）
//! - 未知字段直接拒绝，防止拼写错误静默回退到默认值；
//! - 所有时长以毫秒计，[`RouterSettings::validate`] 拒绝零窗口与倒置的窗口关系。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

const DEFAULT_PRIVILEGED_SCHEMES: [&str; 10] = [
    "about",
    "moz-extension",
    "chrome",
    "chrome-extension",
    "resource",
    "view-source",
    "data",
    "javascript",
    "file",
    "blob",
];

/// 导航拦截器配置。
///
/// # 字段速览
/// | 字段 | 缺省 | 作用 |
/// |---|---|---|
/// | `request_window_ms` | 1000 | `(标签页, URL)` 去重窗口 |
/// | `redirect_window_ms` | 2000 | 仅按 URL 去重的窗口，不得短于前者 |
/// | `switch_window_ms` | 1500 | `来源容器 → 目标容器` 重定向链窗口 |
/// | `sweep_threshold` | 100 | 任一去重表超过此规模即触发清扫 |
/// | `init_timeout_ms` | 3000 | 冷启动等待上限 |
/// | `privileged_schemes` | 见源码 | 永不迁移的协议 |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterSettings {
    pub request_window_ms: u64,
    pub redirect_window_ms: u64,
    pub switch_window_ms: u64,
    pub sweep_threshold: usize,
    pub init_timeout_ms: u64,
    pub privileged_schemes: Vec<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            request_window_ms: 1_000,
            redirect_window_ms: 2_000,
            switch_window_ms: 1_500,
            sweep_threshold: 100,
            init_timeout_ms: 3_000,
            privileged_schemes: DEFAULT_PRIVILEGED_SCHEMES
                .iter()
                .map(|scheme| (*scheme).to_owned())
                .collect(),
        }
    }
}

impl RouterSettings {
    /// 解析 TOML 文本并校验。
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let windows = [
            ("request_window_ms", self.request_window_ms),
            ("redirect_window_ms", self.redirect_window_ms),
            ("switch_window_ms", self.switch_window_ms),
            ("init_timeout_ms", self.init_timeout_ms),
        ];
        if let Some((field, _)) = windows.iter().find(|(_, value)| *value == 0) {
            return Err(SettingsError::Invalid {
                field: *field,
                reason: "must be greater than zero",
            });
        }
        if self.sweep_threshold == 0 {
            return Err(SettingsError::Invalid {
                field: "sweep_threshold",
                reason: "must be greater than zero",
            });
        }
        if self.redirect_window_ms < self.request_window_ms {
            return Err(SettingsError::Invalid {
                field: "redirect_window_ms",
                reason: "must not be shorter than request_window_ms",
            });
        }
        Ok(())
    }

    pub fn request_window(&self) -> Duration {
        Duration::from_millis(self.request_window_ms)
    }

    pub fn redirect_window(&self) -> Duration {
        Duration::from_millis(self.redirect_window_ms)
    }

    pub fn switch_window(&self) -> Duration {
        Duration::from_millis(self.switch_window_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// URL 是否属于特权/内部协议；协议名比较不区分大小写。
    pub fn is_privileged(&self, url: &str) -> bool {
        let Some((scheme, _)) = url.split_once(':') else {
            return false;
        };
        self.privileged_schemes
            .iter()
            .any(|privileged| privileged.eq_ignore_ascii_case(scheme))
    }
}
