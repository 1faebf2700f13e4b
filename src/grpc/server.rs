//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{error, info};

use super::proto::sms_gateway_server::SmsGatewayServer;
use super::service::SmsGatewayService;
use crate::error::{Result, SmsGateError};
use crate::ratelimit::AdmissionControl;
use crate::sms::SmsSender;

/// gRPC server for the SMS gateway.
pub struct GrpcServer<A: AdmissionControl + 'static, S: SmsSender + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission gate
    gate: Arc<A>,
    /// The delivery backend
    sender: Arc<S>,
}

impl<A: AdmissionControl + 'static, S: SmsSender + 'static> GrpcServer<A, S> {
    /// Create a new gRPC server.
    pub fn new(addr: SocketAddr, gate: Arc<A>, sender: Arc<S>) -> Self {
        Self { addr, gate, sender }
    }

    /// The address the server binds to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = SmsGatewayService::new(self.gate, self.sender);

        info!(addr = %self.addr, "Starting gRPC server for SmsGateway");

        Server::builder()
            .add_service(SmsGatewayServer::new(service))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                SmsGateError::Grpc(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdmissionConfig;
    use crate::ratelimit::AdmissionGate;
    use crate::sms::LoggingSmsSender;

    #[test]
    fn test_server_creation() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let gate = Arc::new(AdmissionGate::from_config(&AdmissionConfig::new(5)).unwrap());
        let server = GrpcServer::new(addr, gate, Arc::new(LoggingSmsSender));
        assert_eq!(server.addr(), addr);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_server() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let gate = Arc::new(AdmissionGate::from_config(&AdmissionConfig::new(5)).unwrap());
        let server = GrpcServer::new(addr, gate, Arc::new(LoggingSmsSender));

        let result = server.serve_with_shutdown(async {}).await;
        assert!(result.is_ok());
    }
}
