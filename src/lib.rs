//! SmsGate - SMS gateway with two-tier admission control
//!
//! Every send request is checked against a global sliding-window budget
//! shared by all senders and then against a per-sender budget keyed by
//! phone number. Per-sender limiters are created on first use and evicted
//! once the sender has been idle past a configured threshold.

pub mod config;
pub mod error;
pub mod grpc;
pub mod ratelimit;
pub mod sms;
