//! Rate limiting for inbound remote fire commands

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Default cap on remote fire commands accepted from one peer per second
pub const FIRE_RATE_LIMIT: u32 = 20;

/// Per-sender limiters for remote fire invocations.
///
/// A shot refused here is dropped on the receiving side only; the sender's
/// own simulation is unaffected.
pub struct FireRateLimiter {
    per_second: u32,
    limiters: HashMap<Uuid, Arc<Limiter>>,
}

impl FireRateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second,
            limiters: HashMap::new(),
        }
    }

    /// Check if a fire command from `sender` is allowed (returns true if allowed)
    pub fn check(&mut self, sender: Uuid) -> bool {
        let per_second = self.per_second;
        self.limiters
            .entry(sender)
            .or_insert_with(|| create_limiter(per_second))
            .check()
            .is_ok()
    }

    /// Forget a peer that left the session
    pub fn forget(&mut self, sender: &Uuid) {
        self.limiters.remove(sender);
    }
}

impl Default for FireRateLimiter {
    fn default() -> Self {
        Self::new(FIRE_RATE_LIMIT)
    }
}
