#![no_main]

use arbitrary::Arbitrary;
use containment_core::{CompiledPattern, matches};
use libfuzzer_sys::fuzz_target;

/// 一次匹配输入。
///
/// - **Why**：规则模式来自用户编写，损坏的正则、超长回溯与多字节字符都可能到达求值路径；
/// - **What**：`delimited` 为真时把模式包成 `/…/`，迫使模糊器覆盖正则分支。
#[derive(Debug, Arbitrary)]
struct MatchCase {
    url: String,
    pattern: String,
    delimited: bool,
}

fuzz_target!(|case: MatchCase| {
    let pattern = if case.delimited {
        format!("/{}/", case.pattern)
    } else {
        case.pattern
    };

    // 预编译路径与一次性路径必须给出相同结果，且都不能 panic。
    let compiled = CompiledPattern::compile(&pattern);
    assert_eq!(compiled.matches(&case.url), matches(&case.url, &pattern));
});
