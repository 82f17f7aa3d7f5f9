//! # 规则载荷编解码
//!
//! ## 角色定位（Why）
//! - 规则集写入宿主键值存储时可能经过压缩以适配配额；压缩算法本身属于外部协作方，
//!   核心层只定义 [`RuleCodec`] 接口并提供覆盖未压缩形态的 [`JsonRuleCodec`]；
//! - 历史上存在三种载荷形态，解码必须全部接受。
//!
//! ## 载荷形态（What）
//! 1. 裸数组：`[rule, ...]`；
//! 2. 带版本未压缩：`{"version": 1, "rules": [rule, ...]}`；
//! 3. 带版本压缩：`{"version": 1, "data": "lz:<payload>"}`。
//!
//! 缺失的载荷（`null`）视为空规则集。

use serde_json::{Map, Value, json};

use crate::error::DecodeError;
use crate::rule::{Rule, RuleSet};

/// 当前写出的载荷版本号。
pub const PAYLOAD_VERSION: u64 = 1;

/// 压缩载荷 `data` 字段的标记前缀。
pub const COMPRESSED_MARKER: &str = "lz:";

/// 规则集持久化编解码契约。
///
/// - **契约 (What)**：`decode` 必须接受模块文档列出的三种形态，压缩形态无法解压时返回
///   [`DecodeError::CompressionUnavailable`]；`encode` 的输出必须能被同一实现的 `decode` 还原；
/// - **线程安全**：实现需满足 `Send + Sync`，仓储会在刷新任务中共享同一实例。
pub trait RuleCodec: Send + Sync + 'static {
    fn encode(&self, rules: &RuleSet) -> Value;

    fn decode(&self, payload: Value) -> Result<Vec<Rule>, DecodeError>;
}

/// 不带解压能力的 JSON 编解码器。
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRuleCodec;

impl RuleCodec for JsonRuleCodec {
    fn encode(&self, rules: &RuleSet) -> Value {
        let rules: Vec<Value> = rules
            .iter()
            .map(|entry| {
                json!({
                    "containerName": entry.rule.container_name,
                    "kind": entry.rule.kind,
                    "urlPattern": entry.rule.url_pattern,
                    "highPriority": entry.rule.high_priority,
                })
            })
            .collect();
        json!({ "version": PAYLOAD_VERSION, "rules": rules })
    }

    fn decode(&self, payload: Value) -> Result<Vec<Rule>, DecodeError> {
        match payload {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => decode_rules(items),
            Value::Object(object) => decode_versioned(object),
            other => Err(DecodeError::malformed(format!(
                "expected array or object, found {}",
                value_kind(&other)
            ))),
        }
    }
}

fn decode_versioned(mut object: Map<String, Value>) -> Result<Vec<Rule>, DecodeError> {
    let version = object
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| DecodeError::malformed("versioned payload without numeric `version`"))?;
    if version != PAYLOAD_VERSION {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    match (object.remove("rules"), object.remove("data")) {
        (Some(Value::Array(items)), _) => decode_rules(items),
        (Some(other), _) => Err(DecodeError::malformed(format!(
            "`rules` must be an array, found {}",
            value_kind(&other)
        ))),
        (None, Some(Value::String(data))) if data.starts_with(COMPRESSED_MARKER) => {
            Err(DecodeError::CompressionUnavailable)
        }
        (None, Some(_)) => Err(DecodeError::malformed(
            "`data` is not a recognised compressed payload",
        )),
        (None, None) => Err(DecodeError::malformed(
            "versioned payload carries neither `rules` nor `data`",
        )),
    }
}

fn decode_rules(items: Vec<Value>) -> Result<Vec<Rule>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value(item)
                .map_err(|err| DecodeError::malformed(format!("rule #{position}: {err}")))
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
