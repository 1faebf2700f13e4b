//! Protobuf messages for the `smsgate.v1.SmsGateway` service.

/// Request to send a single SMS.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendSmsRequest {
    /// Destination phone number; also the rate-limited sender identity
    #[prost(string, tag = "1")]
    pub phone_number: ::prost::alloc::string::String,
    /// Message body
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

/// Result of a successful send.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendSmsResponse {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
}

/// Diagnostic query for per-sender limiter state.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SenderExistsRequest {
    #[prost(string, tag = "1")]
    pub phone_number: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SenderExistsResponse {
    #[prost(bool, tag = "1")]
    pub exists: bool,
}
