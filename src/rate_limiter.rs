use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as Governor,
};
use std::num::NonZeroU32;

/// Process-wide quota on calls forwarded to the scraping service.
pub struct RateLimiter {
    limiter: Governor<NotKeyed, InMemoryState, DefaultClock>,
}

impl RateLimiter {
    pub fn per_second(rate: NonZeroU32) -> Self {
        Self {
            limiter: Governor::direct(Quota::per_second(rate)),
        }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_is_spent_then_refused() {
        let limiter = RateLimiter::per_second(NonZeroU32::new(2).unwrap());
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
