//! Failure injection for the mock API

use research_protocol::ApiError;
use std::collections::HashMap;

/// Operations the mock API serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Create,
    Retrieve,
}

/// What to do instead of serving an operation
#[derive(Debug, Clone)]
pub enum FailureConfig {
    /// Reply with this HTTP status and error body
    Http { status: u16, error: ApiError },
    /// Drop the connection before any reply
    Disconnect,
    /// Time out before any reply
    Timeout,
}

impl FailureConfig {
    pub fn http(status: u16, error: ApiError) -> Self {
        FailureConfig::Http { status, error }
    }

    pub fn rate_limited() -> Self {
        Self::http(429, ApiError::rate_limited())
    }

    pub fn server_error() -> Self {
        Self::http(500, ApiError::server_error())
    }
}

#[derive(Debug, Clone)]
struct Injection {
    config: FailureConfig,
    /// Number of calls to fail before succeeding (None = always fail)
    fail_count: Option<u32>,
    calls: u32,
}

/// Failure injector for the mock API
#[derive(Debug, Default)]
pub struct FailureInjector {
    injections: HashMap<MockOp, Injection>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call to `op`
    pub fn inject(&mut self, op: MockOp, config: FailureConfig) {
        self.insert(op, config, None);
    }

    /// Fail the next `count` calls to `op`, then succeed
    pub fn inject_times(&mut self, op: MockOp, config: FailureConfig, count: u32) {
        self.insert(op, config, Some(count));
    }

    fn insert(&mut self, op: MockOp, config: FailureConfig, fail_count: Option<u32>) {
        self.injections.insert(
            op,
            Injection {
                config,
                fail_count,
                calls: 0,
            },
        );
    }

    pub fn clear(&mut self) {
        self.injections.clear();
    }

    pub fn clear_op(&mut self, op: MockOp) {
        self.injections.remove(&op);
    }

    /// The failure to apply to this call of `op`, if any
    pub fn check(&mut self, op: MockOp) -> Option<FailureConfig> {
        let injection = self.injections.get_mut(&op)?;
        injection.calls += 1;
        match injection.fail_count {
            Some(limit) if injection.calls > limit => None,
            _ => Some(injection.config.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_injection() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(MockOp::Create).is_none());
    }

    #[test]
    fn test_inject_always() {
        let mut injector = FailureInjector::new();
        injector.inject(MockOp::Retrieve, FailureConfig::Disconnect);

        for _ in 0..3 {
            assert!(matches!(
                injector.check(MockOp::Retrieve),
                Some(FailureConfig::Disconnect)
            ));
        }
        assert!(injector.check(MockOp::Create).is_none());
    }

    #[test]
    fn test_fail_count() {
        let mut injector = FailureInjector::new();
        injector.inject_times(MockOp::Retrieve, FailureConfig::rate_limited(), 2);

        assert!(injector.check(MockOp::Retrieve).is_some());
        assert!(injector.check(MockOp::Retrieve).is_some());
        assert!(injector.check(MockOp::Retrieve).is_none());
    }

    #[test]
    fn test_clear_op() {
        let mut injector = FailureInjector::new();
        injector.inject(MockOp::Create, FailureConfig::server_error());
        injector.clear_op(MockOp::Create);

        assert!(injector.check(MockOp::Create).is_none());
    }
}
