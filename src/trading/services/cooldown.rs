//! 调用间隔限制

use std::time::{Duration, Instant};

/// 两次调用之间的最小间隔
#[derive(Debug, Clone)]
pub struct Cooldown {
    last_invocation: Option<Instant>,
    min_interval: Duration,
}

impl Cooldown {
    pub fn new(last_invocation: Option<Instant>, min_interval: Duration) -> Self {
        Self {
            last_invocation,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// 距离下次可调用还需等待的时间
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_invocation {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// 可调用时记录本次调用时间并返回 true
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_invocation = Some(now);
        true
    }
}
