//! # URL 模式匹配
//!
//! ## 两种模式（What）
//! - **定界正则**：以 `/` 开头且以 `/` 结尾、长度大于 2 的模式，取中间部分编译为正则后对 URL 求 `is_match`；
//! - **字面子串**：其余模式一律视为字面量，URL 原样包含即命中。
//!
//! ## 全函数约束（Why）
//! - 模式校验属于规则编写界面的职责；走到这里的损坏模式只能降级为“规则不适用”，
//!   因此编译失败与匹配期失败（回溯上限）都折算为未命中，永不向上传播。
//!
//! ## 实现取舍（How）
//! - 正则引擎选用 `fancy-regex`，支持环视与反向引用，与编写界面使用的正则方言更接近；
//! - [`CompiledPattern`] 在规则集装载时预编译一次，求值热路径不再重复编译。

use fancy_regex::Regex;

/// 判断 `url` 是否命中 `pattern`。
///
/// 纯函数，对任意输入都不会 panic 或返回错误。
pub fn matches(url: &str, pattern: &str) -> bool {
    CompiledPattern::compile(pattern).matches(url)
}

/// 预编译后的匹配模式。
#[derive(Clone, Debug)]
pub enum CompiledPattern {
    /// 空模式，永不命中。
    Empty,
    /// 字面子串。
    Literal(String),
    /// 定界正则，已成功编译。
    Regex(Regex),
    /// 定界正则但内部表达式非法，永不命中；保留原文便于诊断。
    Invalid(String),
}

impl CompiledPattern {
    /// 依据原始模式文本构建匹配器。
    pub fn compile(pattern: &str) -> Self {
        if pattern.is_empty() {
            return Self::Empty;
        }
        match delimited_body(pattern) {
            Some(body) => match Regex::new(body) {
                Ok(regex) => Self::Regex(regex),
                Err(_) => Self::Invalid(pattern.to_owned()),
            },
            None => Self::Literal(pattern.to_owned()),
        }
    }

    /// 对 `url` 求值；与 [`matches`] 的语义完全一致。
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Empty | Self::Invalid(_) => false,
            Self::Literal(needle) => url.contains(needle.as_str()),
            // 回溯超限等运行期错误同样按未命中处理。
            Self::Regex(regex) => regex.is_match(url).unwrap_or(false),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_) | Self::Invalid(_))
    }
}

/// 提取 `/…/` 定界模式的内部表达式；不满足定界条件时返回 `None`。
fn delimited_body(pattern: &str) -> Option<&str> {
    if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        // 两端都是单字节 ASCII，切片落在字符边界上。
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}
