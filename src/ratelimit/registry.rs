//! Per-sender limiter registry.

use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::window::SlidingWindowLimiter;

/// What a sweep does with a limiter that has never admitted anything.
///
/// Such a limiter has no last-admission instant to measure idleness from.
/// In practice this only happens for senders configured with a zero
/// capacity, since a positive-capacity limiter admits its first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeverAdmittedPolicy {
    /// Treat "never" as infinitely idle and evict on the next sweep.
    Evict,
    /// Keep the limiter until it has admitted at least once.
    Retain,
}

/// Policy used unless the registry is configured otherwise.
pub const DEFAULT_NEVER_ADMITTED_POLICY: NeverAdmittedPolicy = NeverAdmittedPolicy::Evict;

impl Default for NeverAdmittedPolicy {
    fn default() -> Self {
        DEFAULT_NEVER_ADMITTED_POLICY
    }
}

/// Maps each sender to its own [`SlidingWindowLimiter`].
///
/// Limiters are created on first use with the sender's override capacity,
/// or the default capacity when no override exists, and are dropped by
/// [`sweep_inactive`](Self::sweep_inactive) once idle. The capacity of a
/// limiter is fixed when it is created.
#[derive(Debug)]
pub struct IdentityLimiterRegistry {
    /// Live limiters indexed by sender
    entries: DashMap<String, SlidingWindowLimiter>,
    /// Per-sender capacity overrides
    overrides: HashMap<String, u32>,
    /// Capacity for senders without an override
    default_capacity: u32,
    /// Idle time after which a limiter is evicted
    inactivity_threshold: Duration,
    /// Eviction rule for limiters with no admissions
    never_admitted: NeverAdmittedPolicy,
}

impl IdentityLimiterRegistry {
    /// Create an empty registry.
    pub fn new(
        default_capacity: u32,
        overrides: HashMap<String, u32>,
        inactivity_threshold: Duration,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            overrides,
            default_capacity,
            inactivity_threshold,
            never_admitted: DEFAULT_NEVER_ADMITTED_POLICY,
        }
    }

    /// Set how sweeps treat limiters that have never admitted anything.
    pub fn with_never_admitted_policy(mut self, policy: NeverAdmittedPolicy) -> Self {
        self.never_admitted = policy;
        self
    }

    /// Resolve the capacity a limiter for `identity` is (or would be) created with.
    pub fn capacity_for(&self, identity: &str) -> u32 {
        self.overrides
            .get(identity)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    /// Admit one request for `identity` at `now`, creating its limiter if needed.
    ///
    /// Lookup and insertion go through the map's entry API, so concurrent
    /// first requests for the same sender share a single limiter.
    pub fn check_and_admit(&self, identity: &str, now: Instant) -> bool {
        if let Some(limiter) = self.entries.get(identity) {
            return limiter.try_admit_at(now);
        }

        let limiter = self
            .entries
            .entry(identity.to_owned())
            .or_insert_with(|| {
                let capacity = self.capacity_for(identity);
                debug!(
                    identity = %identity,
                    capacity = capacity,
                    "Creating sender limiter"
                );
                SlidingWindowLimiter::new(capacity)
            });

        limiter.try_admit_at(now)
    }

    /// Remove every limiter whose last admission is more than `threshold`
    /// before `now`. Returns the number of evicted senders.
    pub fn sweep_inactive(&self, now: Instant, threshold: Duration) -> usize {
        let mut evicted = 0;

        self.entries.retain(|identity, limiter| {
            let idle = match limiter.last_admitted() {
                Some(last) => now.saturating_duration_since(last) > threshold,
                None => self.never_admitted == NeverAdmittedPolicy::Evict,
            };
            if idle {
                debug!(identity = %identity, "Evicting inactive sender limiter");
                evicted += 1;
            }
            !idle
        });

        evicted
    }

    /// The configured idle threshold.
    pub fn inactivity_threshold(&self) -> Duration {
        self.inactivity_threshold
    }

    /// Whether a limiter currently exists for `identity`.
    pub fn identity_exists(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Number of live limiters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no limiters are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    const IDLE: Duration = Duration::from_secs(5);

    fn registry() -> IdentityLimiterRegistry {
        let overrides = HashMap::from([
            ("+1111111111".to_string(), 3),
            ("+0000000000".to_string(), 0),
        ]);
        IdentityLimiterRegistry::new(2, overrides, IDLE)
    }

    #[test]
    fn test_capacity_resolution() {
        let registry = registry();
        assert_eq!(registry.capacity_for("+1111111111"), 3);
        assert_eq!(registry.capacity_for("+9999999999"), 2);
    }

    #[test]
    fn test_creates_limiter_on_first_use() {
        let registry = registry();
        assert!(registry.is_empty());
        assert!(!registry.identity_exists("+1234567890"));

        assert!(registry.check_and_admit("+1234567890", Instant::now()));

        assert!(registry.identity_exists("+1234567890"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_limit_applied() {
        let registry = registry();
        let now = Instant::now();

        assert!(registry.check_and_admit("+9999999999", now));
        assert!(registry.check_and_admit("+9999999999", now));
        assert!(!registry.check_and_admit("+9999999999", now));
    }

    #[test]
    fn test_override_limit_applied() {
        let registry = registry();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(registry.check_and_admit("+1111111111", now));
        }
        assert!(!registry.check_and_admit("+1111111111", now));
    }

    #[test]
    fn test_identities_are_independent() {
        let registry = registry();
        let now = Instant::now();

        registry.check_and_admit("+1000000001", now);
        registry.check_and_admit("+1000000001", now);
        assert!(!registry.check_and_admit("+1000000001", now));
        assert!(registry.check_and_admit("+1000000002", now));
    }

    #[test]
    fn test_sweep_evicts_idle_limiters() {
        let registry = registry();
        let start = Instant::now();

        registry.check_and_admit("+1000000001", start);
        registry.check_and_admit("+1000000002", start + Duration::from_secs(3));

        // Exactly at the threshold nothing is evicted.
        assert_eq!(registry.sweep_inactive(start + IDLE, IDLE), 0);

        assert_eq!(registry.sweep_inactive(start + Duration::from_secs(6), IDLE), 1);
        assert!(!registry.identity_exists("+1000000001"));
        assert!(registry.identity_exists("+1000000002"));
    }

    #[test]
    fn test_recreated_limiter_has_clean_window() {
        let registry = registry();
        let start = Instant::now();

        registry.check_and_admit("+1000000001", start);
        registry.check_and_admit("+1000000001", start);
        assert!(!registry.check_and_admit("+1000000001", start));

        let later = start + Duration::from_secs(10);
        registry.sweep_inactive(later, IDLE);
        assert!(!registry.identity_exists("+1000000001"));

        assert!(registry.check_and_admit("+1000000001", later));
        assert!(registry.check_and_admit("+1000000001", later));
        assert!(!registry.check_and_admit("+1000000001", later));
    }

    #[test]
    fn test_never_admitted_evicted_by_default() {
        let registry = registry();
        let now = Instant::now();

        assert!(!registry.check_and_admit("+0000000000", now));
        assert!(registry.identity_exists("+0000000000"));

        assert_eq!(registry.sweep_inactive(now, IDLE), 1);
        assert!(!registry.identity_exists("+0000000000"));
    }

    #[test]
    fn test_never_admitted_retained_when_configured() {
        let registry = registry().with_never_admitted_policy(NeverAdmittedPolicy::Retain);
        let now = Instant::now();

        assert!(!registry.check_and_admit("+0000000000", now));
        assert_eq!(registry.sweep_inactive(now + Duration::from_secs(3600), IDLE), 0);
        assert!(registry.identity_exists("+0000000000"));
    }

    #[test]
    fn test_default_policy_is_evict() {
        assert_eq!(NeverAdmittedPolicy::default(), NeverAdmittedPolicy::Evict);
        assert_eq!(DEFAULT_NEVER_ADMITTED_POLICY, NeverAdmittedPolicy::Evict);
    }

    #[test]
    fn test_concurrent_first_use_creates_one_limiter() {
        let registry = Arc::new(registry());
        let barrier = Arc::new(Barrier::new(8));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.check_and_admit("+5555555555", now)
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        // Two limiters would have let up to four requests through.
        assert_eq!(admitted, 2);
        assert_eq!(registry.len(), 1);
    }
}
