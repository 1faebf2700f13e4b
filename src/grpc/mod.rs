//! gRPC transport for the SMS gateway.

pub mod messages;
mod server;
mod service;

pub use server::GrpcServer;
pub use service::{SmsGatewayService, SENT_STATUS};

// Service stubs generated by build.rs
pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/smsgate.v1.SmsGateway.rs"));
}

// Re-export commonly used types
pub use messages::{SendSmsRequest, SendSmsResponse, SenderExistsRequest, SenderExistsResponse};
pub use proto::sms_gateway_server::SmsGatewayServer;
