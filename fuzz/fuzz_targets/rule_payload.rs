#![no_main]

use containment_core::{JsonRuleCodec, RuleCodec, RuleSet};
use libfuzzer_sys::fuzz_target;

// 任意字节先按 JSON 解析，解析成功的载荷交给解码器：解码只能返回错误，不能 panic；
// 解码成功的规则重新编码后必须还原出同样的序列。
fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(rules) = JsonRuleCodec.decode(payload) else {
        return;
    };
    let set = RuleSet::new(rules.clone());
    let reencoded = JsonRuleCodec.encode(&set);
    assert_eq!(JsonRuleCodec.decode(reencoded).ok(), Some(rules));
});
