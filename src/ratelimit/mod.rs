//! Admission control: sliding-window limiters, the per-sender registry and
//! the two-tier gate composing them.

mod backend;
mod clock;
mod gate;
mod registry;
mod window;

pub use backend::AdmissionControl;
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
pub use clock::{Clock, SystemClock};
pub use gate::{AdmissionGate, GateResult};
pub use registry::{IdentityLimiterRegistry, NeverAdmittedPolicy, DEFAULT_NEVER_ADMITTED_POLICY};
pub use window::{SlidingWindowLimiter, WINDOW};
