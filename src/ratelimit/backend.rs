//! Admission trait used by the transport layer.

use super::gate::GateResult;

/// Trait for admission control implementations.
///
/// The gRPC service is generic over this trait so it can be driven by the
/// real [`AdmissionGate`](super::AdmissionGate) or by a stub in tests.
pub trait AdmissionControl: Send + Sync {
    /// Decide whether a request from `identity` may proceed.
    fn admit(&self, identity: &str) -> GateResult;

    /// Whether per-sender state currently exists for `identity`.
    fn identity_exists(&self, identity: &str) -> bool;
}
