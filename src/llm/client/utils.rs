use std::time::Duration;

use rand::Rng;

use crate::error::InvocationError;

/// 按错误信息归类模型服务的失败
///
/// rig 的错误类型把 HTTP 状态和服务端报文揉进了字符串里，只能按关键字判断。
pub fn classify_error(message: &str) -> InvocationError {
    let lower = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["401", "403", "unauthorized", "forbidden", "api key", "api_key", "permission_denied"]) {
        InvocationError::AuthFailure(message.to_string())
    } else if has(&["429", "quota", "rate limit", "rate_limit", "resource_exhausted"]) {
        InvocationError::QuotaExceeded(message.to_string())
    } else if has(&["timed out", "timeout", "deadline"]) {
        // 传输层超时拿不到确切时长，记为 0
        InvocationError::Timeout(Duration::ZERO)
    } else if has(&["json", "parse", "decode", "deserialize", "invalid response"]) {
        InvocationError::MalformedResponse(message.to_string())
    } else {
        InvocationError::Provider(message.to_string())
    }
}

/// 第 `attempt` 次重试前的等待时长：指数退避加随机抖动
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exp = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(6));
    let jitter = if base_ms > 1 {
        rand::rng().random_range(0..=base_ms / 2)
    } else {
        0
    };
    Duration::from_millis(exp.saturating_add(jitter))
}
