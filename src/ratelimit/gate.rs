//! Two-tier admission gate.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::backend::AdmissionControl;
use super::clock::{Clock, SystemClock};
use super::registry::{IdentityLimiterRegistry, NeverAdmittedPolicy};
use super::window::SlidingWindowLimiter;
use crate::config::AdmissionConfig;
use crate::error::Result;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// The request may proceed.
    Admitted,
    /// The budget shared by all senders is exhausted.
    GlobalLimitExceeded,
    /// The sender's own budget is exhausted; carries the sender's capacity.
    IdentityLimitExceeded(u32),
}

impl GateResult {
    /// Whether the request may proceed.
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateResult::Admitted)
    }
}

/// Composes the global limiter and the per-sender registry.
///
/// The global limiter is checked first and its slot is spent even when the
/// sender's own budget then rejects the request. Global decisions are
/// serialized by the global limiter's lock, and per-sender decisions by the
/// sender's map entry, so requests from different senders only contend on
/// the global budget.
#[derive(Debug)]
pub struct AdmissionGate {
    global: SlidingWindowLimiter,
    registry: IdentityLimiterRegistry,
    clock: Arc<dyn Clock>,
}

impl AdmissionGate {
    /// Create a gate from an explicit global limiter and registry.
    pub fn new(global: SlidingWindowLimiter, registry: IdentityLimiterRegistry) -> Self {
        Self {
            global,
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Build a gate from validated admission settings.
    pub fn from_config(config: &AdmissionConfig) -> Result<Self> {
        config.validate()?;

        let policy = if config.evict_never_admitted {
            NeverAdmittedPolicy::Evict
        } else {
            NeverAdmittedPolicy::Retain
        };

        let registry = IdentityLimiterRegistry::new(
            config.default_sender_limit,
            config.sender_limits.clone(),
            Duration::from_secs(config.sender_inactivity_seconds),
        )
        .with_never_admitted_policy(policy);

        debug!(
            global_capacity = config.global_requests_per_second,
            default_sender_limit = config.default_sender_limit,
            overrides = config.sender_limits.len(),
            "Admission gate configured"
        );

        Ok(Self::new(
            SlidingWindowLimiter::new(config.global_requests_per_second),
            registry,
        ))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Decide whether a request from `identity` may proceed.
    ///
    /// An admitted request triggers a sweep of idle sender limiters.
    pub fn admit(&self, identity: &str) -> GateResult {
        let now = self.clock.now();

        if !self.global.try_admit_at(now) {
            debug!(identity = %identity, "Global limit exceeded");
            return GateResult::GlobalLimitExceeded;
        }

        if !self.registry.check_and_admit(identity, now) {
            let capacity = self.registry.capacity_for(identity);
            debug!(identity = %identity, capacity = capacity, "Sender limit exceeded");
            return GateResult::IdentityLimitExceeded(capacity);
        }

        let evicted = self
            .registry
            .sweep_inactive(now, self.registry.inactivity_threshold());
        if evicted > 0 {
            debug!(evicted = evicted, remaining = self.registry.len(), "Swept inactive senders");
        }

        trace!(identity = %identity, "Admitted");
        GateResult::Admitted
    }

    /// Whether a limiter currently exists for `identity`.
    pub fn identity_exists(&self, identity: &str) -> bool {
        self.registry.identity_exists(identity)
    }

    /// Capacity of the global limiter.
    pub fn global_capacity(&self) -> u32 {
        self.global.capacity()
    }
}

impl AdmissionControl for AdmissionGate {
    fn admit(&self, identity: &str) -> GateResult {
        AdmissionGate::admit(self, identity)
    }

    fn identity_exists(&self, identity: &str) -> bool {
        AdmissionGate::identity_exists(self, identity)
    }
}
